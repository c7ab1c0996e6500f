use std::marker::PhantomData;

use async_trait::async_trait;
use mongodm::{
    bson::Document,
    mongo::options::{FindOneOptions, FindOptions},
    Model,
};

use crate::{
    context::MongodmContext,
    utils::result::Result,
    withid::{Id, ModelWithIdCursor, RepositoryWithId, WithId},
};

/// One repository step: turns an input into an output against a context.
#[async_trait(?Send)]
pub trait BehaveDef {
    type In;
    type Out;
    type Ctx;

    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out>;
}

pub struct FindOneArgument(pub Document, pub Option<FindOneOptions>);

pub struct FindManyArgument(pub Document, pub Option<FindOptions>);

pub struct UpdateOneArgument(pub Document, pub Document);

pub struct DeleteOneArgument(pub Document);

pub struct CountArgument(pub Document);

pub struct WithIdCreateBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for WithIdCreateBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = M;
    type Out = WithId<M>;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        let id: Id = RepositoryWithId::<M>::new(ctx).create(&input).await?;
        Ok(WithId(id, input))
    }
}

pub struct WithIdFindOneBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for WithIdFindOneBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = FindOneArgument;
    type Out = Option<WithId<M>>;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        RepositoryWithId::<M>::new(ctx)
            .find_one(input.0, input.1)
            .await
    }
}

pub struct WithIdFindManyBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for WithIdFindManyBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = FindManyArgument;
    type Out = ModelWithIdCursor<M>;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        RepositoryWithId::<M>::new(ctx).find(input.0, input.1).await
    }
}

pub struct WithIdUpdateOneBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for WithIdUpdateOneBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = UpdateOneArgument;
    type Out = Option<WithId<M>>;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        RepositoryWithId::<M>::new(ctx)
            .find_one_and_update(input.0, input.1)
            .await
    }
}

pub struct WithIdDeleteOneBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for WithIdDeleteOneBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = DeleteOneArgument;
    type Out = Option<WithId<M>>;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        RepositoryWithId::<M>::new(ctx)
            .find_one_and_delete(input.0)
            .await
    }
}

pub struct CountBehavior<M, Ctx> {
    p: PhantomData<fn() -> (M, Ctx)>,
}

#[async_trait(?Send)]
impl<M, Ctx> BehaveDef for CountBehavior<M, Ctx>
where
    M: Model + 'static,
    Ctx: MongodmContext + 'static,
{
    type In = CountArgument;
    type Out = u64;
    type Ctx = Ctx;

    #[inline]
    async fn def(input: Self::In, ctx: &Self::Ctx) -> Result<Self::Out> {
        RepositoryWithId::<M>::new(ctx).count(input.0).await
    }
}
