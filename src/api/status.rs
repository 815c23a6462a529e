use axum::extract::State;
use serde::Serialize;

use crate::{
    api::response::ApiResponse,
    controller::AppState,
    domain::{DerStatus, DistributedEnergyResource, PowerState},
};

/// Controller status response
#[derive(Debug, Serialize)]
pub struct ControllerStatus {
    pub der: DerStatus,
    pub power: PowerState,
    pub transport: String,
}

pub async fn get_status(State(st): State<AppState>) -> ApiResponse<ControllerStatus> {
    ApiResponse::success(ControllerStatus {
        der: st.controller.display(),
        power: st.controller.power_state(),
        transport: st.controller.transport(),
    })
}
