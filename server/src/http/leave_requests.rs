use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use entity::leave_requests::{self, Status};
use products_hr::leave_requests::{self as ops, LeaveAssignment, LeaveSubmission};
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, CurrentUser, HttpResult};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/leaverequests", get(list).post(submit))
        .route("/leaverequests/assign", post(assign))
        .route("/leaverequests/{id}", patch(decide).delete(remove))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    status: Option<Status>,
}

#[derive(Deserialize)]
struct Decision {
    status: Status,
}

async fn submit(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<LeaveSubmission>,
) -> HttpResult<Json<leave_requests::Model>> {
    Ok(Json(ops::submit(&state.pool, &caller, input).await?))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<ListQuery>,
) -> HttpResult<Json<Vec<leave_requests::Model>>> {
    Ok(Json(ops::list(&state.pool, &caller, query.status).await?))
}

async fn decide(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Query(decision): Query<Decision>,
) -> HttpResult<Json<leave_requests::Model>> {
    Ok(Json(
        ops::decide(&state.pool, &caller, id, decision.status).await?,
    ))
}

async fn assign(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<LeaveAssignment>,
) -> HttpResult<Json<leave_requests::Model>> {
    Ok(Json(ops::assign(&state.pool, &caller, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> HttpResult<StatusCode> {
    ops::delete(&state.pool, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
