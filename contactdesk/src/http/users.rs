use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{debug, info};

use crate::auth::hash_password;
use crate::model::{User, UserFields};
use crate::store::parse_id;

use super::error::{ApiError, OrFail, Resource};
use super::responses::{MessageResponse, UpdatedUserResponse, UserCountResponse, UserUpdateRequest};
use super::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .store
        .users
        .list_users()
        .await
        .or_fail("Failed to fetch users")?;
    debug!(users = users.len(), "users listed");
    Ok(Json(users))
}

pub async fn count_users(
    State(state): State<AppState>,
) -> Result<Json<UserCountResponse>, ApiError> {
    let total_users = state
        .store
        .users
        .count_users()
        .await
        .or_fail("Failed to fetch user count")?;
    Ok(Json(UserCountResponse { total_users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    const CONTEXT: &str = "Failed to fetch user";
    let id = parse_id(&id).or_fail(CONTEXT)?;

    state
        .store
        .users
        .find_user(id)
        .await
        .or_fail(CONTEXT)?
        .map(Json)
        .ok_or(ApiError::NotFound(Resource::User))
}

/// Rewrites every field and always re-hashes the password, even when the
/// caller left it out.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> Result<Json<UpdatedUserResponse>, ApiError> {
    const CONTEXT: &str = "Failed to update user";
    let Json(body) = body.or_fail(CONTEXT)?;
    let password = hash_password(body.password).await.or_fail(CONTEXT)?;
    let id = parse_id(&id).or_fail(CONTEXT)?;

    let updated_user = state
        .store
        .users
        .update_user(
            id,
            UserFields {
                username: body.username,
                email: body.email,
                password,
            },
        )
        .await
        .or_fail(CONTEXT)?
        .ok_or(ApiError::NotFound(Resource::User))?;
    info!(user_id = %id, "user updated");

    Ok(Json(UpdatedUserResponse {
        message: "User updated successfully",
        updated_user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    const CONTEXT: &str = "Failed to delete user";
    let id = parse_id(&id).or_fail(CONTEXT)?;

    state
        .store
        .users
        .delete_user(id)
        .await
        .or_fail(CONTEXT)?
        .ok_or(ApiError::NotFound(Resource::User))?;
    info!(user_id = %id, "user deleted");

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
