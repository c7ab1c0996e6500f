use std::{env::var, sync::Arc};

use mongodm::bson::oid::ObjectId;

use crate::context::{Context, MongodmContext};
use crate::utils::{result::Result, simple_error};

pub const TEST_URI: &str = "MONGO_TEST_URI";
pub const TEST_DATABASE: &str = "MONGO_TEST_DATABASE";

/// Runs `f` against a fresh database and drops it afterwards.
///
/// The database name is `MONGO_TEST_DATABASE` (default `pokedex_test`) with a
/// unique suffix, so tests can run in parallel. Fails when `MONGO_TEST_URI` is
/// not set; tests using it are `#[ignore]`d and run with `--ignored`.
pub async fn with_mongo<Fut>(f: impl FnOnce(Arc<Context>) -> Fut) -> Result<()>
where
    Fut: std::future::Future<Output = Result<()>>,
{
    let uri = var(TEST_URI).map_err(|err| simple_error!("{}: {}", TEST_URI, err))?;
    let database = format!(
        "{}_{}",
        var(TEST_DATABASE).unwrap_or_else(|_| String::from("pokedex_test")),
        ObjectId::new().to_hex()
    );
    let ctx = Arc::new(Context::build_in_test(&uri, &database).await?);
    let result = f(Arc::clone(&ctx)).await;
    ctx.database().drop(None).await?;
    result
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use mongodm::{bson::Document, doc};
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_with_mongo_requires_uri() {
        if var(TEST_URI).is_ok() {
            return;
        }
        let ran = RefCell::new(false);
        let ran_ref = &ran;
        let result = with_mongo(|_| async move {
            ran_ref.replace(true);
            Ok(())
        })
        .await;
        assert!(result.is_err());
        assert!(!ran.into_inner());
    }

    #[tokio::test]
    #[ignore = "needs MONGO_TEST_URI"]
    async fn test_with_mongo() -> Result<()> {
        let name = RefCell::new(None);
        let name_ref = &name;
        with_mongo(|ctx| async move {
            name_ref.replace(Some(ctx.database().name().to_owned()));
            let coll = ctx.database().collection::<Document>("pokemons");
            let docs = vec![
                doc! { "id": 1, "name": { "english": "Bulbasaur" } },
                doc! { "id": 2, "name": { "english": "Ivysaur" } },
                doc! { "id": 3, "name": { "english": "Venusaur" } },
            ];
            coll.insert_many(docs, None).await?;
            let count = coll.count_documents(None, None).await?;
            assert_eq!(3, count);
            Ok(())
        })
        .await?;
        if let (Some(name), Ok(uri)) = (name.into_inner(), var(TEST_URI)) {
            let ctx = Context::build_in_test(&uri, &name).await?;
            let count = ctx
                .database()
                .collection::<Document>("pokemons")
                .count_documents(None, None)
                .await?;
            assert_eq!(0, count);
        }
        Ok(())
    }
}
