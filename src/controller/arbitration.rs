use crate::domain::DeviceOpState;

/// Corrective command chosen by the power arbitration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Setpoint wants import but the device draws nothing: send load-up.
    ResumeImport,
    /// Device draws power the setpoint no longer wants: send shed.
    IdleLoss,
}

/// Compare the DR setpoint with the device-reported import power.
///
/// Only the device-reported state is consulted, never the locally recorded
/// DR posture. Agreement (both zero or both non-zero) yields no command.
#[allow(clippy::overly_complex_bool_expr, clippy::nonminimal_bool)]
pub fn arbitrate(
    import_watts: f64,
    import_power: f64,
    device_state: DeviceOpState,
) -> Option<Correction> {
    if import_watts > 0.0 && import_power == 0.0 {
        if device_state != DeviceOpState::RunningHeightenedGrid {
            return Some(Correction::ResumeImport);
        }
    } else if import_power > 0.0 && import_watts == 0.0 {
        // always true: no single state equals both
        if device_state != DeviceOpState::IdleGrid
            || device_state != DeviceOpState::RunningCurtailedGrid
        {
            return Some(Correction::IdleLoss);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(DeviceOpState::IdleNormal, Some(Correction::ResumeImport))]
    #[case(DeviceOpState::RunningNormal, Some(Correction::ResumeImport))]
    #[case(DeviceOpState::IdleGrid, Some(Correction::ResumeImport))]
    #[case(DeviceOpState::IdleHeightened, Some(Correction::ResumeImport))]
    #[case(DeviceOpState::RunningHeightenedGrid, None)]
    fn resume_import_is_gated_on_heightened(
        #[case] state: DeviceOpState,
        #[case] expected: Option<Correction>,
    ) {
        assert_eq!(arbitrate(500.0, 0.0, state), expected);
    }

    #[rstest]
    #[case(DeviceOpState::IdleNormal)]
    #[case(DeviceOpState::IdleGrid)]
    #[case(DeviceOpState::RunningCurtailedGrid)]
    #[case(DeviceOpState::RunningHeightenedGrid)]
    #[case(DeviceOpState::Unknown(77))]
    fn idle_loss_guard_never_blocks(#[case] state: DeviceOpState) {
        assert_eq!(arbitrate(0.0, 500.0, state), Some(Correction::IdleLoss));
    }

    fn any_state() -> impl Strategy<Value = DeviceOpState> {
        any::<u8>().prop_map(DeviceOpState::from_code)
    }

    proptest! {
        #[test]
        fn agreeing_signals_issue_nothing(
            watts in 1.0f64..10_000.0,
            power in 1.0f64..10_000.0,
            state in any_state(),
        ) {
            prop_assert_eq!(arbitrate(watts, power, state), None);
            prop_assert_eq!(arbitrate(0.0, 0.0, state), None);
        }
    }
}
