//! Demand-response endpoints: DR events and import/export setpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
    domain::{OperationalState, PowerState},
};

/// Acknowledgement for a DR event. The module's answer arrives later and only
/// reaches the log.
#[derive(Debug, Serialize, Deserialize)]
pub struct DrAck {
    pub event: String,
    pub local_operational_state: OperationalState,
}

fn accepted(st: &AppState, event: &str) -> impl IntoResponse {
    let ack = DrAck {
        event: event.to_string(),
        local_operational_state: st.controller.local_operational_state(),
    };
    (StatusCode::ACCEPTED, ApiResponse::success(ack))
}

pub async fn load_up(State(st): State<AppState>) -> impl IntoResponse {
    st.controller.set_load_up();
    accepted(&st, "load_up")
}

pub async fn critical_peak(State(st): State<AppState>) -> impl IntoResponse {
    st.controller.set_critical_peak();
    accepted(&st, "critical_peak")
}

pub async fn grid_emergency(State(st): State<AppState>) -> impl IntoResponse {
    st.controller.set_grid_emergency();
    accepted(&st, "grid_emergency")
}

pub async fn end_curtailment(State(st): State<AppState>) -> impl IntoResponse {
    st.controller.end_curtailment();
    accepted(&st, "end_curtailment")
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetpointRequest {
    #[validate(range(min = 0.0))]
    pub watts: f64,
}

impl SetpointRequest {
    /// Unwrap the JSON body and range-check it.
    fn parse(body: Result<Json<Self>, JsonRejection>) -> Result<Self, ApiError> {
        let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        req.validate()?;
        Ok(req)
    }
}

pub async fn set_import_watts(
    State(st): State<AppState>,
    body: Result<Json<SetpointRequest>, JsonRejection>,
) -> Result<ApiResponse<PowerState>, ApiError> {
    let req = SetpointRequest::parse(body)?;
    st.controller.set_import_watts(req.watts);
    tracing::info!(watts = req.watts, "import setpoint updated");
    Ok(ApiResponse::success(st.controller.power_state()))
}

pub async fn set_export_watts(
    State(st): State<AppState>,
    body: Result<Json<SetpointRequest>, JsonRejection>,
) -> Result<ApiResponse<PowerState>, ApiError> {
    let req = SetpointRequest::parse(body)?;
    st.controller.set_export_watts(req.watts);
    tracing::info!(watts = req.watts, "export setpoint updated");
    Ok(ApiResponse::success(st.controller.power_state()))
}
