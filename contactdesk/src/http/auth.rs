use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::model::UserFields;

use super::error::{ApiError, OrFail};
use super::responses::{CreatedResponse, LoginRequest, SignupRequest, TokenResponse};
use super::state::AppState;

const SIGNUP_FAILED: &str = "Error creating user";
const LOGIN_FAILED: &str = "Error logging in";

pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(body) = body.or_auth_fail(SIGNUP_FAILED)?;
    let password = hash_password(body.password)
        .await
        .or_auth_fail(SIGNUP_FAILED)?;

    let user = state
        .store
        .users
        .insert_user(UserFields {
            username: body.username,
            email: body.email,
            password,
        })
        .await
        .or_auth_fail(SIGNUP_FAILED)?;
    info!(user_id = %user.id, username = %user.username, "user created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "User created successfully",
            id: user.id.to_hex(),
        }),
    ))
}

/// Unknown identity and wrong password produce the same response.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = body.or_auth_fail(LOGIN_FAILED)?;

    let user = state
        .store
        .users
        .find_user_by_login(body.username.as_deref(), body.email.as_deref())
        .await
        .or_auth_fail(LOGIN_FAILED)?;
    let Some(user) = user else {
        warn!("login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let user_id = user.id;
    let password = body
        .password
        .ok_or("Illegal arguments: password is undefined")
        .or_auth_fail(LOGIN_FAILED)?;
    let matches = verify_password(password, user.password)
        .await
        .or_auth_fail(LOGIN_FAILED)?;
    if !matches {
        warn!("login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(user_id).or_auth_fail(LOGIN_FAILED)?;
    info!(user_id = %user_id, "login succeeded");
    Ok(Json(TokenResponse { token }))
}
