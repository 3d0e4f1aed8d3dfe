use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Extension};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Json;

use crate::auth::{self, password, SESSION_COOKIE};
use crate::database::models::user::is_valid_email;
use crate::database::models::{NewUser, UserResponse};
use crate::database::UserStore;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Fields default to empty when omitted so validation reports every missing
/// field by name instead of the body failing to deserialize
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();
        if !is_valid_email(self.email.trim()) {
            errors.insert("email".to_string(), "Please provide a valid email".to_string());
        }
        if self.password.chars().count() < 6 {
            errors.insert(
                "password".to_string(),
                "Password must be at least 6 characters long".to_string(),
            );
        }
        if self.first_name.trim().is_empty() {
            errors.insert("firstName".to_string(), "First name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.insert("lastName".to_string(), "Last name is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// Omitted fields fall through to the generic invalid-credentials 401
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create an account and start a session
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, (StatusCode, Json<Value>)), ApiError> {
    payload
        .validate()
        .map_err(|errors| ApiError::validation_error("Validation failed", Some(errors)))?;

    let new_user = NewUser {
        email: payload.email.trim().to_lowercase(),
        password_hash: password::hash_password(&payload.password)?,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
    };

    let user = UserStore::new(state.db.pool().clone()).create(&new_user).await?;

    let token = issue_session(user.id)?;
    let jar = jar.add(session_cookie(token));

    Ok((
        jar,
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "User registered successfully",
                "user": UserResponse::from(user),
            })),
        ),
    ))
}

/// POST /auth/login - verify credentials and start a session.
///
/// Wrong email and wrong password produce the identical response; the
/// no-such-user path runs a dummy hash verification so both take
/// comparable time.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, (StatusCode, Json<Value>)), ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = UserStore::new(state.db.pool().clone())
        .find_by_email(&email)
        .await?;

    let user = match user {
        Some(user) => user,
        None => {
            password::dummy_verify(&payload.password);
            return Err(invalid_credentials());
        }
    };

    if !password::verify_password(&user.password_hash, &payload.password) {
        return Err(invalid_credentials());
    }

    let token = issue_session(user.id)?;
    let jar = jar.add(session_cookie(token));

    Ok((
        jar,
        (
            StatusCode::OK,
            Json(json!({
                "message": "Login successful",
                "user": UserResponse::from(user),
            })),
        ),
    ))
}

/// POST /auth/logout - clear the session cookie.
///
/// There is no server-side revocation; a copied token stays valid until
/// its expiry.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);
    (jar, Json(json!({ "message": "Logout successful" })))
}

/// GET /auth/me - resolve the current identity
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({ "user": UserResponse::from(&auth_user.user) }))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

fn issue_session(user_id: uuid::Uuid) -> Result<String, ApiError> {
    let security = &crate::config::config().security;
    Ok(auth::issue_token(
        user_id,
        &security.jwt_secret,
        security.jwt_expiry_days,
    )?)
}

fn session_cookie(token: String) -> Cookie<'static> {
    let security = &crate::config::config().security;
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(security.jwt_expiry_days));
    // Cross-origin frontends need SameSite=None, which requires Secure
    cookie.set_secure(security.secure_cookies);
    cookie.set_same_site(if security.secure_cookies {
        SameSite::None
    } else {
        SameSite::Lax
    });
    cookie
}
