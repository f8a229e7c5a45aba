use axum::extract::State;
use axum::Json;

use crate::model::ContactStatus;

use super::error::{ApiError, OrFail};
use super::responses::ReportResponse;
use super::state::AppState;

/// Four independent counts. Concurrent writes may leave them mutually
/// inconsistent.
pub async fn report(State(state): State<AppState>) -> Result<Json<ReportResponse>, ApiError> {
    const CONTEXT: &str = "Failed to fetch report data";
    let store = &state.store;

    let total_users = store.users.count_users().await.or_fail(CONTEXT)?;
    let total_contacts = store.contacts.count_contacts(None).await.or_fail(CONTEXT)?;
    let completed_contacts = store
        .contacts
        .count_contacts(Some(ContactStatus::Completed))
        .await
        .or_fail(CONTEXT)?;
    let pending_contacts = store
        .contacts
        .count_contacts(Some(ContactStatus::Pending))
        .await
        .or_fail(CONTEXT)?;

    Ok(Json(ReportResponse {
        total_users,
        total_contacts,
        completed_contacts,
        pending_contacts,
    }))
}
