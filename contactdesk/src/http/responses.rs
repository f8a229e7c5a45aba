use serde::{Deserialize, Serialize};

use crate::model::{Contact, ContactFields, ContactStatus, User};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

/// Either identifier may be given; a user matching either one is tried.
/// A missing password only matters once a user has been found.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    pub fn into_fields(self) -> ContactFields {
        ContactFields {
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ContactStatus,
}

/// A missing password is hashed as the empty string, so every update rewrites it.
#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCountResponse {
    pub total_contacts: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountResponse {
    pub total_users: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedContactResponse {
    pub message: &'static str,
    pub updated_contact: Contact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUserResponse {
    pub message: &'static str,
    pub updated_user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub total_users: u64,
    pub total_contacts: u64,
    pub completed_contacts: u64,
    pub pending_contacts: u64,
}
