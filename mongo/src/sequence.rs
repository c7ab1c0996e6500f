//! Named counters kept in their own collection.
//!
//! Every operation is a single server-side update, so two callers asking for
//! the next value at the same time never get the same number.

use mongodm::{
    bson::from_document,
    doc,
    mongo::options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
    CollectionConfig, Indexes, Model,
};
use serde::{Deserialize, Serialize};

use crate::{
    context::MongodmContext,
    utils::{result::Result, simple_error},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

pub struct CounterCfg {}

impl CollectionConfig for CounterCfg {
    fn collection_name() -> &'static str {
        "counters"
    }

    fn indexes() -> Indexes {
        Indexes::new()
    }
}

impl Model for Counter {
    type CollConf = CounterCfg;
}

pub struct Sequence<'a, Ctx: MongodmContext> {
    name: &'a str,
    ctx: &'a Ctx,
}

impl<'a, Ctx: MongodmContext> Sequence<'a, Ctx> {
    pub fn new(name: &'a str, ctx: &'a Ctx) -> Self {
        Self { name, ctx }
    }

    /// Moves the counter up to `floor` if it is behind. Never moves it down.
    pub async fn raise_to(&self, floor: i64) -> Result<()> {
        let option = UpdateOptions::builder().upsert(true).build();
        self.ctx
            .collection::<Counter>()
            .update_one(
                doc! { "_id": self.name },
                doc! { "$max": { "seq": floor } },
                option,
            )
            .await?;
        Ok(())
    }

    pub async fn next(&self) -> Result<i64> {
        let name = self.name;
        let option = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let doc = self
            .ctx
            .collection::<Counter>()
            .find_one_and_update(
                doc! { "_id": name },
                doc! { "$inc": { "seq": 1_i64 } },
                option,
            )
            .await?
            .ok_or_else(|| simple_error!("sequence {} was not upserted", name))?;
        Ok(from_document::<Counter>(doc)?.seq)
    }

    pub async fn current(&self) -> Result<Option<i64>> {
        let doc = self
            .ctx
            .collection::<Counter>()
            .find_one(doc! { "_id": self.name }, None)
            .await?;
        match doc {
            Some(doc) => Ok(Some(from_document::<Counter>(doc)?.seq)),
            None => Ok(None),
        }
    }
}
