use futures::TryStreamExt;
use mongodm::{
    bson::{to_bson, Document},
    doc,
    mongo::options::{FindOneOptions, FindOptions},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    context::Context,
    mongo::{
        sequence::Sequence,
        service::{
            BehaveDef, CountArgument, CountBehavior, DeleteOneArgument, FindManyArgument,
            FindOneArgument, UpdateOneArgument, WithIdCreateBehavior, WithIdDeleteOneBehavior,
            WithIdFindManyBehavior, WithIdFindOneBehavior, WithIdUpdateOneBehavior,
        },
        withid::WithId,
    },
    stores::pokemon::{
        validate_base, validate_types, BaseStats, Pokemon, PokemonName, ENGLISH_NAME_FIELD,
        ID_FIELD,
    },
    utils::result::Result,
};

pub const PAGE_SIZE: u64 = 20;
pub const SEQUENCE_NAME: &str = "pokemons";

/// Caller-owned fields of a record, as accepted on update and (from the
/// multipart fields) on creation.
#[derive(Deserialize, Validate, Clone, Debug)]
pub struct PokemonInput {
    #[validate]
    pub name: PokemonName,
    #[serde(rename = "type")]
    #[validate(custom = "validate_types")]
    pub type_: Vec<String>,
    #[validate(custom = "validate_base")]
    pub base: BaseStats,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PokemonOutput {
    #[serde(rename = "_id")]
    pub oid: String,
    pub id: i64,
    pub name: PokemonName,
    #[serde(rename = "type")]
    pub type_: Vec<String>,
    pub base: BaseStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<WithId<Pokemon>> for PokemonOutput {
    fn from(WithId(oid, pokemon): WithId<Pokemon>) -> Self {
        Self {
            oid: oid.to_hex(),
            id: pokemon.id,
            name: pokemon.name,
            type_: pokemon.type_,
            base: pokemon.base,
            image: pokemon.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PokemonQuery {
    ById(i64),
    ByEnglishName(String),
}

impl From<PokemonQuery> for FindOneArgument {
    fn from(query: PokemonQuery) -> Self {
        match query {
            PokemonQuery::ById(id) => FindOneArgument(doc! { ID_FIELD: id }, None),
            PokemonQuery::ByEnglishName(name) => {
                FindOneArgument(doc! { ENGLISH_NAME_FIELD: name }, None)
            }
        }
    }
}

/// Zero-based page of `PAGE_SIZE` records in storage order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page(pub u64);

impl Page {
    /// Records before this page, `None` when the driver cannot express it
    /// (it sends skip as a signed 64-bit integer).
    pub fn skip(&self) -> Option<u64> {
        self.0
            .checked_mul(PAGE_SIZE)
            .filter(|skip| i64::try_from(*skip).is_ok())
    }
}

impl From<Page> for Option<FindManyArgument> {
    fn from(page: Page) -> Self {
        let option = FindOptions::builder()
            .skip(page.skip()?)
            .limit(PAGE_SIZE as i64)
            .build();
        Some(FindManyArgument(doc! {}, Some(option)))
    }
}

fn english_name_filter(name: &str) -> Document {
    doc! { ENGLISH_NAME_FIELD: name }
}

/// `$set` for every caller-owned field; an absent image is removed rather
/// than kept from the old document.
fn replacement(input: PokemonInput) -> Result<Document> {
    let mut set = doc! {
        "name": to_bson(&input.name)?,
        "type": to_bson(&input.type_)?,
        "base": to_bson(&input.base)?,
    };
    let mut update = Document::new();
    match input.image {
        Some(image) => {
            set.insert("image", image);
        }
        None => {
            update.insert("$unset", doc! { "image": "" });
        }
    }
    update.insert("$set", set);
    Ok(update)
}

type Create = WithIdCreateBehavior<Pokemon, Context>;
type FindOne = WithIdFindOneBehavior<Pokemon, Context>;
type FindMany = WithIdFindManyBehavior<Pokemon, Context>;
type UpdateOne = WithIdUpdateOneBehavior<Pokemon, Context>;
type DeleteOne = WithIdDeleteOneBehavior<Pokemon, Context>;
type Count = CountBehavior<Pokemon, Context>;

pub struct PokemonService;

impl PokemonService {
    pub async fn find_all(ctx: &Context) -> Result<Vec<PokemonOutput>> {
        Self::find_many(FindManyArgument(doc! {}, None), ctx).await
    }

    pub async fn find_page(page: Page, ctx: &Context) -> Result<Vec<PokemonOutput>> {
        match Option::<FindManyArgument>::from(page) {
            Some(argument) => Self::find_many(argument, ctx).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn find_one(query: PokemonQuery, ctx: &Context) -> Result<Option<PokemonOutput>> {
        Ok(FindOne::def(query.into(), ctx).await?.map(PokemonOutput::from))
    }

    pub async fn count(ctx: &Context) -> Result<u64> {
        Count::def(CountArgument(doc! {}), ctx).await
    }

    /// Persists a new record under the next free `id`.
    pub async fn create(input: PokemonInput, ctx: &Context) -> Result<PokemonOutput> {
        let id = Self::next_id(ctx).await?;
        let pokemon = Pokemon {
            id,
            name: input.name,
            type_: input.type_,
            base: input.base,
            image: input.image,
        };
        Ok(Create::def(pokemon, ctx).await?.into())
    }

    pub async fn replace(
        name: &str,
        input: PokemonInput,
        ctx: &Context,
    ) -> Result<Option<PokemonOutput>> {
        let argument = UpdateOneArgument(english_name_filter(name), replacement(input)?);
        Ok(UpdateOne::def(argument, ctx).await?.map(PokemonOutput::from))
    }

    pub async fn delete(name: &str, ctx: &Context) -> Result<Option<PokemonOutput>> {
        let argument = DeleteOneArgument(english_name_filter(name));
        Ok(DeleteOne::def(argument, ctx).await?.map(PokemonOutput::from))
    }

    async fn find_many(argument: FindManyArgument, ctx: &Context) -> Result<Vec<PokemonOutput>> {
        FindMany::def(argument, ctx)
            .await?
            .map_ok(PokemonOutput::from)
            .try_collect()
            .await
    }

    async fn max_id(ctx: &Context) -> Result<i64> {
        let option = FindOneOptions::builder().sort(doc! { ID_FIELD: -1 }).build();
        let last = FindOne::def(FindOneArgument(doc! {}, Some(option)), ctx).await?;
        Ok(last.map(|WithId(_, pokemon)| pokemon.id).unwrap_or(0))
    }

    async fn next_id(ctx: &Context) -> Result<i64> {
        let sequence = Sequence::new(SEQUENCE_NAME, ctx);
        sequence.raise_to(Self::max_id(ctx).await?).await?;
        sequence.next().await
    }
}
