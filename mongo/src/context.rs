use log::{error, info};
use mongodm::{
    doc,
    mongo::{bson::Document, options::ClientOptions, Client, Collection, Database},
    CollectionConfig, Model,
};

use crate::utils::{config::Config, result::Result};

pub trait MongodmContext
where
    Self: Clone,
{
    fn database(&self) -> Database;

    /// Untyped handle on the collection backing `M`.
    #[inline]
    fn collection<M: Model>(&self) -> Collection<Document> {
        self.database()
            .collection::<Document>(M::CollConf::collection_name())
    }
}

#[derive(Clone, Debug)]
pub struct Context {
    client: Client,
    database_name: String,
}

impl Context {
    pub async fn new(config: &Config) -> Result<Self> {
        Self::build(&config.db_uri, &config.db_database).await
    }

    /// Builds the client and tries a single round-trip. An unreachable server
    /// is only logged: queries keep failing until it comes back.
    pub async fn connect(config: &Config) -> Result<Self> {
        let ctx = Self::new(config).await?;
        match ctx.ping().await {
            Ok(()) => info!("Connected to MongoDB successfully"),
            Err(err) => error!("Error connecting to MongoDB: {}", err),
        }
        Ok(ctx)
    }

    pub async fn build_in_test(uri: &str, database_name: &str) -> Result<Self> {
        Self::build(uri, database_name).await
    }

    async fn build(uri: &str, database_name: &str) -> Result<Self> {
        let mut option = ClientOptions::parse(uri).await?;
        option.app_name.get_or_insert_with(|| String::from("pokedex"));
        let client = Client::with_options(option)?;
        Ok(Context {
            client,
            database_name: String::from(database_name),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        self.database().run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await
    }
}

impl MongodmContext for Context {
    #[inline]
    fn database(&self) -> Database {
        self.client.database(&self.database_name)
    }
}
