use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use entity::departments;
use products_hr::departments::{self as ops, DepartmentChanges, NewDepartment};
use uuid::Uuid;

use super::{Ack, AppState, CurrentUser, HttpResult};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list).post(create))
        .route("/departments/{id}", get(fetch).patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> HttpResult<Json<Vec<departments::Model>>> {
    Ok(Json(ops::list(&state.pool).await?))
}

async fn fetch(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<departments::Model>> {
    Ok(Json(ops::get(&state.pool, id).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<NewDepartment>,
) -> HttpResult<Json<departments::Model>> {
    Ok(Json(ops::create(&state.pool, &caller, input).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<DepartmentChanges>,
) -> HttpResult<Json<departments::Model>> {
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
