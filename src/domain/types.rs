use serde::{Deserialize, Serialize};
use strum::Display;

/// Demand-response posture recorded locally when a DR event is issued.
///
/// This is what the controller *told* the device. It is set optimistically at
/// command-issue time and never reconciled with [`DeviceOpState`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationalState {
    #[default]
    Normal,
    Curtailed,
    Heightened,
    LoadUp,
    CriticalPeak,
    GridEmergency,
}

impl OperationalState {
    /// Integer code kept compatible with the legacy controller log format.
    pub fn code(self) -> u8 {
        match self {
            OperationalState::Normal => 0,
            OperationalState::Curtailed => 1,
            OperationalState::Heightened => 2,
            OperationalState::LoadUp => 3,
            OperationalState::CriticalPeak => 4,
            OperationalState::GridEmergency => 5,
        }
    }
}

/// Operational state code as reported by the communication module (CEA-2045
/// basic operational state query response).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOpState {
    #[default]
    IdleNormal,
    RunningNormal,
    RunningCurtailedGrid,
    RunningHeightenedGrid,
    IdleGrid,
    SgdError,
    IdleHeightened,
    CycleOn,
    CycleOff,
    VariableFollowing,
    VariableNotFollowing,
    IdleOptedOut,
    RunningOptedOut,
    Unknown(u8),
}

impl DeviceOpState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DeviceOpState::IdleNormal,
            1 => DeviceOpState::RunningNormal,
            2 => DeviceOpState::RunningCurtailedGrid,
            3 => DeviceOpState::RunningHeightenedGrid,
            4 => DeviceOpState::IdleGrid,
            5 => DeviceOpState::SgdError,
            6 => DeviceOpState::IdleHeightened,
            7 => DeviceOpState::CycleOn,
            8 => DeviceOpState::CycleOff,
            9 => DeviceOpState::VariableFollowing,
            10 => DeviceOpState::VariableNotFollowing,
            11 => DeviceOpState::IdleOptedOut,
            12 => DeviceOpState::RunningOptedOut,
            other => DeviceOpState::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DeviceOpState::IdleNormal => 0,
            DeviceOpState::RunningNormal => 1,
            DeviceOpState::RunningCurtailedGrid => 2,
            DeviceOpState::RunningHeightenedGrid => 3,
            DeviceOpState::IdleGrid => 4,
            DeviceOpState::SgdError => 5,
            DeviceOpState::IdleHeightened => 6,
            DeviceOpState::CycleOn => 7,
            DeviceOpState::CycleOff => 8,
            DeviceOpState::VariableFollowing => 9,
            DeviceOpState::VariableNotFollowing => 10,
            DeviceOpState::IdleOptedOut => 11,
            DeviceOpState::RunningOptedOut => 12,
            DeviceOpState::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for DeviceOpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceOpState::IdleNormal => write!(f, "idle_normal"),
            DeviceOpState::RunningNormal => write!(f, "running_normal"),
            DeviceOpState::RunningCurtailedGrid => write!(f, "running_curtailed_grid"),
            DeviceOpState::RunningHeightenedGrid => write!(f, "running_heightened_grid"),
            DeviceOpState::IdleGrid => write!(f, "idle_grid"),
            DeviceOpState::SgdError => write!(f, "sgd_error"),
            DeviceOpState::IdleHeightened => write!(f, "idle_heightened"),
            DeviceOpState::CycleOn => write!(f, "cycle_on"),
            DeviceOpState::CycleOff => write!(f, "cycle_off"),
            DeviceOpState::VariableFollowing => write!(f, "variable_following"),
            DeviceOpState::VariableNotFollowing => write!(f, "variable_not_following"),
            DeviceOpState::IdleOptedOut => write!(f, "idle_opted_out"),
            DeviceOpState::RunningOptedOut => write!(f, "running_opted_out"),
            DeviceOpState::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Application-level acknowledgement returned by the module for a command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    Success,
    CommandNotImplemented,
    BadValue,
    CommandLengthError,
    ResponseLengthError,
    Busy,
    Other(u8),
}

impl ResponseCode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => ResponseCode::Success,
            0x01 => ResponseCode::CommandNotImplemented,
            0x02 => ResponseCode::BadValue,
            0x03 => ResponseCode::CommandLengthError,
            0x04 => ResponseCode::ResponseLengthError,
            0x05 => ResponseCode::Busy,
            other => ResponseCode::Other(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ResponseCode::Success)
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseCode::Success => write!(f, "success"),
            ResponseCode::CommandNotImplemented => write!(f, "command_not_implemented"),
            ResponseCode::BadValue => write!(f, "bad_value"),
            ResponseCode::CommandLengthError => write!(f, "command_length_error"),
            ResponseCode::ResponseLengthError => write!(f, "response_length_error"),
            ResponseCode::Busy => write!(f, "busy"),
            ResponseCode::Other(code) => write!(f, "other(0x{:02x})", code),
        }
    }
}

/// Basic DR commands understood by the module. All take an event duration in
/// seconds where `0` means "until further notice".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BasicCommand {
    Shed,
    EndShed,
    LoadUp,
    CriticalPeakEvent,
    GridEmergency,
}

/// Capability, property and state queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceQuery {
    SupportedDataLinkMessages,
    MaxPayload,
    SupportedIntermediateMessages,
    DeviceInformation,
    Commodity,
    OperationalState,
}

/// Outside communication connection status announced to the module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutsideCommStatus {
    NotFound,
    Found,
    PoorConnection,
}

/// Event duration meaning "as long as possible".
pub const INDEFINITE: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_state_codes_round_trip_for_known_values() {
        for code in 0..=12u8 {
            assert_eq!(DeviceOpState::from_code(code).code(), code);
        }
        assert_eq!(DeviceOpState::from_code(3), DeviceOpState::RunningHeightenedGrid);
        assert_eq!(DeviceOpState::from_code(200), DeviceOpState::Unknown(200));
    }

    #[test]
    fn local_state_codes_match_legacy_values() {
        assert_eq!(OperationalState::LoadUp.code(), 3);
        assert_eq!(OperationalState::CriticalPeak.code(), 4);
        assert_eq!(OperationalState::GridEmergency.code(), 5);
        assert_eq!(OperationalState::default(), OperationalState::Normal);
    }

    #[test]
    fn only_success_is_success() {
        assert!(ResponseCode::from_code(0).is_success());
        assert!(!ResponseCode::from_code(5).is_success());
        assert_eq!(ResponseCode::from_code(0x42), ResponseCode::Other(0x42));
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(BasicCommand::CriticalPeakEvent.to_string(), "critical_peak_event");
        assert_eq!(DeviceOpState::Unknown(99).to_string(), "unknown(99)");
    }
}
