use tempfile::TempDir;

use crate::{app_data::AppData, context::Context, utils::config::Config};

pub use crate::mongo::test_util::with_mongo;

pub const BOUNDARY: &str = "----pokedexboundary7MA4YWxkTrZu0gW";

/// A client for a server nobody listens on: every query fails quickly.
pub async fn unreachable_context() -> Context {
    Context::build_in_test(
        "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=200&connectTimeoutMS=200",
        "pokedex_unreachable",
    )
    .await
    .unwrap()
}

/// App data whose directories all live below `dir`.
pub fn app_data(context: Context, dir: &TempDir) -> AppData {
    let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
    let config = Config::from_iter(vec![
        (String::from("POKEDEX_STATIC_DIR"), path("public")),
        (String::from("POKEDEX_FILES_DIR"), path("files")),
        (String::from("POKEDEX_UPLOAD_DIR"), path("uploads")),
    ])
    .unwrap();
    AppData::new(context, &config).unwrap()
}

pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}
