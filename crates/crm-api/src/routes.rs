//! Router assembly

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, csv, health, leads, notes, users};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Health probes at the root, everything else under `api_prefix`.
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let upload_limit = usize::try_from(state.csv_import.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/leads", get(leads::list_leads).post(leads::create_lead))
        .route("/leads/stats", get(leads::lead_stats))
        .route("/leads/export/csv", get(leads::export_csv))
        .route("/leads/{id}", get(leads::get_lead).put(leads::update_lead).delete(leads::delete_lead))
        .route("/leads/{id}/notes", post(notes::add_note))
        .route("/leads/{id}/notes/{note_id}", put(notes::edit_note).delete(notes::delete_note))
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route(
            "/csv/upload",
            post(csv::upload_csv).layer(DefaultBodyLimit::max(upload_limit)),
        );

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let prefix = api_prefix.trim_end_matches('/');
    let router = if prefix.is_empty() { router.merge(api) } else { router.nest(prefix, api) };
    router.with_state(state)
}
