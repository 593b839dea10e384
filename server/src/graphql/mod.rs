mod me;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Result, Schema,
    SimpleObject,
};
use platform_api::{ApiError, ApiResult};
use platform_db::DbPool;
use products_hr::{Caller, HrError, departments, users};
use serde::Serialize;
use tracing::instrument;

pub use me::{DepartmentNode, MePayload};

pub type SchemaType = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(pool: DbPool) -> SchemaType {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(pool)
        .finish()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self, ctx: &Context<'_>) -> ApiResult<HealthPayload> {
        let db_ok = platform_db::ping(ctx.data_unchecked::<DbPool>()).await;
        Ok(HealthPayload { ok: db_ok })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> ApiResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    #[instrument(name = "graphql.me", skip_all)]
    async fn me(&self, ctx: &Context<'_>) -> Result<MePayload> {
        let caller = caller(ctx)?;
        let user = users::me(pool(ctx), caller)
            .await
            .map_err(|err| api_error(err).extend())?;
        Ok(MePayload::from(user))
    }

    #[instrument(name = "graphql.departments", skip_all)]
    async fn departments(&self, ctx: &Context<'_>) -> Result<Vec<DepartmentNode>> {
        caller(ctx)?;
        let rows = departments::list(pool(ctx))
            .await
            .map_err(|err| api_error(err).extend())?;
        Ok(rows.into_iter().map(DepartmentNode::from).collect())
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

fn pool<'a>(ctx: &Context<'a>) -> &'a DbPool {
    ctx.data_unchecked::<DbPool>()
}

fn caller<'a>(ctx: &Context<'a>) -> Result<&'a Caller> {
    ctx.data_opt::<Caller>()
        .ok_or_else(|| ApiError::Unauthorized.extend())
}

fn api_error(err: HrError) -> ApiError {
    match err {
        HrError::NotFound(msg) => ApiError::NotFound(msg),
        HrError::Forbidden(msg) => ApiError::Forbidden(msg),
        HrError::Conflict(msg) | HrError::Duplicate(msg) => ApiError::Conflict(msg),
        HrError::Validation(msg) => ApiError::InvalidInput(msg),
        other => ApiError::internal(other.into()),
    }
}
