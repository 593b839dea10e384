use axum::{
    Form, Json,
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use platform_authn::{TOKEN_TYPE, decode_token, issue_token};
use products_hr::{Caller, users};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AppState, HttpError, HttpResult};

/// The caller behind a valid bearer token. Role and active flag come from
/// the database, not from the token claims.
pub(crate) struct CurrentUser(pub Caller);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(auth) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| HttpError::unauthorized())?;
        let claims = decode_token(auth.token(), state.auth()).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            HttpError::unauthorized()
        })?;
        let caller = users::resolve_caller(&state.pool, claims.sub)
            .await?
            .ok_or_else(HttpError::unauthorized)?;
        Ok(CurrentUser(caller))
    }
}

#[derive(Deserialize)]
pub(super) struct LoginForm {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub(super) struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

pub(super) async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> HttpResult<Json<TokenResponse>> {
    let user = users::authenticate(&state.pool, &form.username, &form.password).await?;
    let role = products_hr::role_from_entity(user.role);
    let access_token = issue_token(user.id, role.as_str(), state.auth())
        .map_err(|err| HttpError::internal(err.into()))?;
    info!(user_id = %user.id, "access token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE,
    }))
}
