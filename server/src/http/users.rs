use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use products_hr::users::{
    self as ops, NewUser, Page, PasswordChange, ProfileChanges, UserChanges, UserPublic, UsersPage,
};
use uuid::Uuid;

use super::{AppState, CurrentUser, HttpResult, Message};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/me", get(me).patch(update_me).delete(remove_me))
        .route("/users/me/password", patch(change_password))
        .route("/users/managers", get(managers))
        .route("/users/{id}", get(fetch).patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(page): Query<Page>,
) -> HttpResult<Json<UsersPage>> {
    Ok(Json(ops::list(&state.pool, &caller, page).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<NewUser>,
) -> HttpResult<Json<UserPublic>> {
    Ok(Json(ops::create(&state.pool, &caller, input).await?))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> HttpResult<Json<UserPublic>> {
    Ok(Json(ops::me(&state.pool, &caller).await?))
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(changes): Json<ProfileChanges>,
) -> HttpResult<Json<UserPublic>> {
    Ok(Json(ops::update_me(&state.pool, &caller, changes).await?))
}

async fn remove_me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> HttpResult<Json<Message>> {
    ops::delete_me(&state.pool, &caller).await?;
    Ok(Message::json("User deleted successfully"))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(change): Json<PasswordChange>,
) -> HttpResult<Json<Message>> {
    ops::change_password(&state.pool, &caller, change).await?;
    Ok(Message::json("Password updated successfully"))
}

async fn managers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(page): Query<Page>,
) -> HttpResult<Json<UsersPage>> {
    Ok(Json(ops::list_managers(&state.pool, page).await?))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<UserPublic>> {
    Ok(Json(ops::get(&state.pool, &caller, id).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<UserChanges>,
) -> HttpResult<Json<UserPublic>> {
    Ok(Json(ops::update(&state.pool, &caller, id, changes).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> HttpResult<Json<Message>> {
    ops::delete(&state.pool, &caller, id).await?;
    Ok(Message::json("User deleted successfully"))
}
