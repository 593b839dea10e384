use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use entity::employees;
use products_hr::employees::{
    self as ops, EmployeeChanges, EmployeeFilter, EmployeeListItem, NewEmployee,
};
use uuid::Uuid;

use super::{Ack, AppState, CurrentUser, HttpResult};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list).post(create))
        .route("/employees/me", get(me))
        .route("/employees/{id}", patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<EmployeeFilter>,
) -> HttpResult<Json<Vec<EmployeeListItem>>> {
    Ok(Json(ops::list(&state.pool, filter).await?))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> HttpResult<Json<employees::Model>> {
    Ok(Json(ops::me(&state.pool, &caller).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<NewEmployee>,
) -> HttpResult<Json<employees::Model>> {
    Ok(Json(ops::create(&state.pool, &caller, input).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<EmployeeChanges>,
) -> HttpResult<Json<employees::Model>> {
    Ok(Json(ops::update(&state.pool, &caller, id, changes).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<Ack>> {
    ops::delete(&state.pool, &caller, id).await?;
    Ok(Ack::ok())
}
