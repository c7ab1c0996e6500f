use core::pin::Pin;
use std::marker::PhantomData;

use futures::{
    task::{Context, Poll},
    Stream,
};
use mongodm::{
    bson::{from_document, oid::ObjectId, to_document, Bson, Document},
    doc,
    mongo::{
        options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument},
        Collection, Cursor,
    },
    Model,
};

use crate::{
    context::MongodmContext,
    utils::{result::Result, simple_error},
};

pub type Id = ObjectId;

/// A model together with the `_id` the database assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct WithId<M>(pub Id, pub M);

pub struct RepositoryWithId<M>
where
    M: Model,
{
    coll: Collection<Document>,
    _pd: PhantomData<fn() -> M>,
}

impl<M> RepositoryWithId<M>
where
    M: Model,
{
    pub fn new(ctx: &impl MongodmContext) -> Self {
        Self {
            coll: ctx.collection::<M>(),
            _pd: PhantomData,
        }
    }

    pub async fn create(&self, model: &M) -> Result<Id> {
        let doc = to_document(model)?;
        Self::oid(self.coll.insert_one(doc, None).await?.inserted_id)
    }

    pub async fn count(&self, query: Document) -> Result<u64> {
        Ok(self.coll.count_documents(query, None).await?)
    }

    pub async fn find_one(
        &self,
        query: Document,
        option: impl Into<Option<FindOneOptions>>,
    ) -> Result<Option<WithId<M>>> {
        match self.coll.find_one(query, option).await? {
            Some(doc) => Ok(Some(Self::doc_to_model_with_id(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find_one_by_id(&self, id: &Id) -> Result<Option<WithId<M>>> {
        self.find_one(doc! {"_id": Bson::ObjectId(*id)}, None).await
    }

    pub async fn find(
        &self,
        query: Document,
        option: impl Into<Option<FindOptions>>,
    ) -> Result<ModelWithIdCursor<M>> {
        Ok(ModelWithIdCursor::from(self.coll.find(query, option).await?))
    }

    /// Applies `update` to the first match and returns the document as it is
    /// after the update.
    pub async fn find_one_and_update(
        &self,
        query: Document,
        update: Document,
    ) -> Result<Option<WithId<M>>> {
        let option = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        match self.coll.find_one_and_update(query, update, option).await? {
            Some(doc) => Ok(Some(Self::doc_to_model_with_id(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find_one_and_delete(&self, query: Document) -> Result<Option<WithId<M>>> {
        match self.coll.find_one_and_delete(query, None).await? {
            Some(doc) => Ok(Some(Self::doc_to_model_with_id(doc)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn oid(bson: Bson) -> Result<Id> {
        match bson {
            Bson::ObjectId(oid) => Ok(oid),
            _ => Err(simple_error!("value is not ObjectId")),
        }
    }

    pub(crate) fn get_id_from_doc(doc: &Document) -> Result<Id> {
        if let Some(id) = doc.get("_id") {
            Self::oid(id.clone())
        } else {
            Err(simple_error!("document doesn't have _id"))
        }
    }

    pub(crate) fn doc_to_model_with_id(doc: Document) -> Result<WithId<M>> {
        let id = Self::get_id_from_doc(&doc)?;
        Ok(WithId(id, from_document(doc)?))
    }
}

pub struct ModelWithIdCursor<M: Model> {
    inner: Cursor<Document>,
    _pd: PhantomData<fn() -> M>,
}

impl<M: Model> From<Cursor<Document>> for ModelWithIdCursor<M> {
    fn from(inner: Cursor<Document>) -> Self {
        Self {
            inner,
            _pd: PhantomData,
        }
    }
}

impl<M: Model> Stream for ModelWithIdCursor<M> {
    type Item = Result<WithId<M>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<WithId<M>>>> {
        match Pin::new(&mut self.get_mut().inner).poll_next(cx) {
            Poll::Ready(Some(Ok(doc))) => Poll::Ready(Some(
                RepositoryWithId::<M>::doc_to_model_with_id(doc),
            )),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod test {
    use futures::TryStreamExt;
    use mongodm::{f, CollectionConfig, Indexes};
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::test_util::with_mongo;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct Trainer {
        name: String,
        town: String,
        badges: i32,
    }

    struct TrainerCfg {}

    impl CollectionConfig for TrainerCfg {
        fn collection_name() -> &'static str {
            "Trainer"
        }

        fn indexes() -> Indexes {
            Indexes::new()
        }
    }

    impl Model for Trainer {
        type CollConf = TrainerCfg;
    }

    type Repo = RepositoryWithId<Trainer>;

    fn trainer(name: &str, town: &str, badges: i32) -> Trainer {
        Trainer {
            name: name.to_owned(),
            town: town.to_owned(),
            badges,
        }
    }

    static RED: Lazy<Trainer> = Lazy::new(|| trainer("red", "pallet", 8));
    static BLUE: Lazy<Trainer> = Lazy::new(|| trainer("blue", "pallet", 7));
    static MISTY: Lazy<Trainer> = Lazy::new(|| trainer("misty", "cerulean", 0));

    #[test]
    fn test_doc_without_id() {
        let doc = doc! { "name": "red", "town": "pallet", "badges": 8 };
        assert!(Repo::doc_to_model_with_id(doc).is_err());
    }

    #[test]
    fn test_doc_with_id() {
        let oid = ObjectId::new();
        let doc = doc! { "_id": oid, "name": "red", "town": "pallet", "badges": 8 };
        let WithId(id, model) = Repo::doc_to_model_with_id(doc).unwrap();
        assert_eq!(oid, id);
        assert_eq!(*RED, model);
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_create() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            let oid = repo.create(&RED).await?;
            let result = repo.find_one_by_id(&oid).await?.unwrap();
            assert_eq!(WithId(oid, RED.clone()), result);
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_count() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            assert_eq!(0, repo.count(doc! {}).await?);
            repo.create(&RED).await?;
            repo.create(&BLUE).await?;
            repo.create(&MISTY).await?;
            assert_eq!(3, repo.count(doc! {}).await?);
            assert_eq!(2, repo.count(doc! { f!(town in Trainer): "pallet" }).await?);
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_find_one() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            let _ = repo.create(&RED).await?;
            let id = repo.create(&MISTY).await?;
            let WithId(rid, result) = repo
                .find_one(doc! { f!(town in Trainer): "cerulean" }, None)
                .await?
                .unwrap();
            assert_eq!(id, rid);
            assert_eq!("misty", result.name);
            assert!(repo
                .find_one(doc! { f!(town in Trainer): "viridian" }, None)
                .await?
                .is_none());
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_find() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            let red_id = repo.create(&RED).await?;
            let blue_id = repo.create(&BLUE).await?;
            let _ = repo.create(&MISTY).await?;
            let opt = FindOptions::builder()
                .sort(doc! { f!(badges in Trainer): 1 })
                .build();
            let result = repo
                .find(doc! { f!(town in Trainer): "pallet" }, opt)
                .await?
                .try_collect::<Vec<_>>()
                .await?;
            assert_eq!(2, result.len());
            assert_eq!(blue_id, result[0].0);
            assert_eq!(red_id, result[1].0);
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_find_one_and_update() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            let id = repo.create(&MISTY).await?;
            let WithId(rid, result) = repo
                .find_one_and_update(
                    doc! { f!(name in Trainer): "misty" },
                    doc! { "$set": { f!(badges in Trainer): 1 } },
                )
                .await?
                .unwrap();
            assert_eq!(id, rid);
            assert_eq!(1, result.badges);
            assert!(repo
                .find_one_and_update(
                    doc! { f!(name in Trainer): "brock" },
                    doc! { "$set": { f!(badges in Trainer): 1 } },
                )
                .await?
                .is_none());
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_find_one_and_delete() {
        with_mongo(|ctx| async move {
            let repo = Repo::new(ctx.as_ref());
            let id = repo.create(&RED).await?;
            let _ = repo.create(&BLUE).await?;
            let deleted = repo
                .find_one_and_delete(doc! { f!(name in Trainer): "red" })
                .await?
                .unwrap();
            assert_eq!(WithId(id, RED.clone()), deleted);
            assert_eq!(1, repo.count(doc! {}).await?);
            assert!(repo
                .find_one_and_delete(doc! { f!(name in Trainer): "red" })
                .await?
                .is_none());
            Ok(())
        })
        .await
        .unwrap()
    }
}
