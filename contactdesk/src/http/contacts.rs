use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info};

use crate::model::{Contact, ContactStatus};
use crate::store::parse_id;

use super::error::{ApiError, OrFail, Resource};
use super::responses::{
    ContactCountResponse, ContactRequest, CreatedResponse, MessageResponse, StatusRequest,
    UpdatedContactResponse,
};
use super::state::AppState;

pub async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    const CONTEXT: &str = "Failed to save contact";
    let Json(body) = body.or_fail(CONTEXT)?;

    let contact = state
        .store
        .contacts
        .insert_contact(body.into_fields(), ContactStatus::Pending)
        .await
        .or_fail(CONTEXT)?;
    info!(contact_id = %contact.id, "contact saved");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Contact saved successfully!",
            id: contact.id.to_hex(),
        }),
    ))
}

pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .contacts
        .list_contacts(None)
        .await
        .or_fail("Failed to fetch contacts")?;
    debug!(contacts = contacts.len(), "contacts listed");
    Ok(Json(contacts))
}

pub async fn list_completed(
    State(state): State<AppState>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .contacts
        .list_contacts(Some(ContactStatus::Completed))
        .await
        .or_fail("Failed to fetch completed contacts")?;
    debug!(contacts = contacts.len(), "completed contacts listed");
    Ok(Json(contacts))
}

pub async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .contacts
        .list_contacts(Some(ContactStatus::Pending))
        .await
        .or_fail("Failed to fetch pending contacts")?;
    debug!(contacts = contacts.len(), "pending contacts listed");
    Ok(Json(contacts))
}

pub async fn count_contacts(
    State(state): State<AppState>,
) -> Result<Json<ContactCountResponse>, ApiError> {
    let total_contacts = state
        .store
        .contacts
        .count_contacts(None)
        .await
        .or_fail("Failed to fetch contact count")?;
    Ok(Json(ContactCountResponse { total_contacts }))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    const CONTEXT: &str = "Failed to fetch contact";
    let id = parse_id(&id).or_fail(CONTEXT)?;

    state
        .store
        .contacts
        .find_contact(id)
        .await
        .or_fail(CONTEXT)?
        .map(Json)
        .ok_or(ApiError::NotFound(Resource::Contact))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<UpdatedContactResponse>, ApiError> {
    const CONTEXT: &str = "Failed to update contact";
    let id = parse_id(&id).or_fail(CONTEXT)?;
    let Json(body) = body.or_fail(CONTEXT)?;

    let updated_contact = state
        .store
        .contacts
        .update_contact(id, body.into_fields())
        .await
        .or_fail(CONTEXT)?
        .ok_or(ApiError::NotFound(Resource::Contact))?;
    info!(contact_id = %id, "contact updated");

    Ok(Json(UpdatedContactResponse {
        message: "Contact updated successfully",
        updated_contact,
    }))
}

/// No transition guard: `Completed` may go back to `Pending`.
pub async fn update_contact_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<UpdatedContactResponse>, ApiError> {
    const CONTEXT: &str = "Failed to update status";
    let id = parse_id(&id).or_fail(CONTEXT)?;
    let Json(body) = body.or_fail(CONTEXT)?;

    let updated_contact = state
        .store
        .contacts
        .update_contact_status(id, body.status)
        .await
        .or_fail(CONTEXT)?
        .ok_or(ApiError::NotFound(Resource::Contact))?;
    info!(contact_id = %id, status = %body.status, "contact status updated");

    Ok(Json(UpdatedContactResponse {
        message: "Status updated successfully",
        updated_contact,
    }))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    const CONTEXT: &str = "Failed to delete contact";
    let id = parse_id(&id).or_fail(CONTEXT)?;

    state
        .store
        .contacts
        .delete_contact(id)
        .await
        .or_fail(CONTEXT)?
        .ok_or(ApiError::NotFound(Resource::Contact))?;
    info!(contact_id = %id, "contact deleted");

    Ok(Json(MessageResponse {
        message: "Contact deleted successfully",
    }))
}
