use axum::http::HeaderName;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{auth, contacts, reports, users};

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/api/contact", post(contacts::create_contact))
        .route("/api/contacts", get(contacts::list_contacts))
        .route("/api/contacts/count", get(contacts::count_contacts))
        .route("/api/contacts/completed", get(contacts::list_completed))
        .route("/api/contacts/pending", get(contacts::list_pending))
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route(
            "/api/contacts/{id}/status",
            put(contacts::update_contact_status),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/count", get(users::count_users))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/reports", get(reports::report))
        .route("/test", get(test_route))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            request_id_header(),
            MakeRequestUuid,
        ))
        .with_state(state)
}

async fn test_route() -> &'static str {
    "Server is running and routes are set up!"
}
