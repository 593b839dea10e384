use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use entity::timesheets;
use products_hr::timesheets as ops;
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, CurrentUser, HttpResult};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/timesheets/check", post(check))
        .route("/timesheets/{employee_id}", get(range))
}

#[derive(Deserialize)]
struct CheckQuery {
    check_in: bool,
}

#[derive(Deserialize)]
struct RangeQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn check(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<CheckQuery>,
) -> HttpResult<Json<timesheets::Model>> {
    Ok(Json(ops::check(&state.pool, &caller, query.check_in).await?))
}

async fn range(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(employee_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> HttpResult<Json<Vec<timesheets::Model>>> {
    let rows = ops::range(
        &state.pool,
        &caller,
        employee_id,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(Json(rows))
}
