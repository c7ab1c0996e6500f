use serde::Deserialize;

use crate::result::Result;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_uri")]
    pub db_uri: String,
    #[serde(default = "default_db_database")]
    pub db_database: String,
    #[serde(default = "default_public_url")]
    public_url: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_files_dir")]
    pub files_dir: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

const PREFIX: &str = "POKEDEX_";

fn default_host() -> String {
    String::from("0.0.0.0")
}

fn default_port() -> u16 {
    3000
}

fn default_db_uri() -> String {
    String::from("mongodb://localhost:27017")
}

fn default_db_database() -> String {
    String::from("pokemon_dataset")
}

fn default_public_url() -> String {
    String::from("http://localhost:3000")
}

fn default_static_dir() -> String {
    String::from("public")
}

fn default_files_dir() -> String {
    String::from("files")
}

fn default_upload_dir() -> String {
    String::from("uploads")
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Ok(envy::prefixed(PREFIX).from_env::<Config>()?)
    }

    pub fn from_iter<Iter>(iter: Iter) -> Result<Config>
    where
        Iter: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(PREFIX).from_iter::<_, Config>(iter)?)
    }

    pub fn bind_name(&self) -> String {
        format!("{host}:{port}", host = self.host, port = self.port)
    }

    /// Base address embedded in generated asset URLs, without a trailing slash.
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}
