use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::{self, AuthError, SESSION_COOKIE};
use crate::database::models::User;
use crate::database::UserStore;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated identity resolved from the session cookie, injected as a
/// request extension for downstream handlers
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub user: User,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self { id: user.id, user }
    }
}

/// Session authentication middleware.
///
/// Reads the HTTP-only session cookie, verifies signature and expiry,
/// resolves the bound user, and attaches it to the request. Any failure
/// rejects with 401 before business logic runs (fail-closed).
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingToken)?;

    let secret = &crate::config::config().security.jwt_secret;
    let user_id = auth::verify_token(&token, secret)?;

    // A valid token can outlive its account; that case is distinct from a
    // bad token but still a 401
    let user = UserStore::new(state.db.pool().clone())
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    request.extensions_mut().insert(AuthUser::from(user));
    Ok(next.run(request).await)
}
