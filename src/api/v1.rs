use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use super::{dr, status};
use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dr/load-up", post(dr::load_up))
        .route("/dr/critical-peak", post(dr::critical_peak))
        .route("/dr/grid-emergency", post(dr::grid_emergency))
        .route("/dr/end-curtailment", post(dr::end_curtailment))
        .route("/import-watts", put(dr::set_import_watts))
        .route("/export-watts", put(dr::set_export_watts))
        .route("/status", get(status::get_status))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
