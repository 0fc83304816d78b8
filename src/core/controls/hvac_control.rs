// This module provides the deadband proportional controller driving the HVAC plant

use crate::core::units::WATTS_PER_KILOWATT;
use crate::errors::ConfigurationError;
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::Display;

/// Temperature error inside which the controller does nothing, in K
pub const DEADBAND_K: f64 = 0.25;
/// Error at which the controller reaches full capacity, in K
const FULL_OUTPUT_ERROR_K: f64 = 1.0;

/// Requested HVAC operating mode. Serialized as its numeric code.
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, Display, Eq, Hash, PartialEq, Serialize_repr)]
#[repr(u8)]
#[strum(serialize_all = "snake_case")]
pub enum HvacMode {
    Off = 0,
    Heat = 1,
    Cool = 2,
    #[default]
    Auto = 3,
}

impl TryFrom<u8> for HvacMode {
    type Error = ConfigurationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Off),
            1 => Ok(Self::Heat),
            2 => Ok(Self::Cool),
            3 => Ok(Self::Auto),
            other => Err(ConfigurationError::UnknownHvacMode(other)),
        }
    }
}

/// What the plant actually did.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HvacState {
    Off,
    Idle,
    Heating,
    Cooling,
}

/// Proportional controller with a symmetric deadband around the setpoint.
///
/// Output is signed thermal power in W: positive heats the interior, negative cools it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeadbandController {
    capacity_w: f64,
    gain_w_per_k: f64,
}

impl DeadbandController {
    pub fn new(capacity_kw: f64) -> Self {
        let capacity_w = capacity_kw.max(0.) * WATTS_PER_KILOWATT as f64;
        Self {
            capacity_w,
            gain_w_per_k: capacity_w / FULL_OUTPUT_ERROR_K,
        }
    }

    pub fn gain_w_per_k(&self) -> f64 {
        self.gain_w_per_k
    }

    pub fn capacity_w(&self) -> f64 {
        self.capacity_w
    }

    pub fn output(&self, mode: HvacMode, setpoint: f64, interior_temp: f64) -> (f64, HvacState) {
        let error = setpoint - interior_temp;
        let wants_heat = error > DEADBAND_K;
        let wants_cool = error < -DEADBAND_K;

        match mode {
            HvacMode::Off => (0., HvacState::Off),
            HvacMode::Heat | HvacMode::Auto if wants_heat => (
                (self.gain_w_per_k * error).min(self.capacity_w),
                HvacState::Heating,
            ),
            HvacMode::Cool | HvacMode::Auto if wants_cool => (
                (self.gain_w_per_k * error).max(-self.capacity_w),
                HvacState::Cooling,
            ),
            _ => (0., HvacState::Idle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn controller() -> DeadbandController {
        DeadbandController::new(100.)
    }

    #[rstest]
    #[case(HvacMode::Auto, 22.1, HvacState::Idle)]
    #[case(HvacMode::Auto, 21.5, HvacState::Heating)]
    #[case(HvacMode::Auto, 22.5, HvacState::Cooling)]
    #[case(HvacMode::Heat, 23.0, HvacState::Idle)]
    #[case(HvacMode::Cool, 21.0, HvacState::Idle)]
    #[case(HvacMode::Off, 15.0, HvacState::Off)]
    fn should_select_state_from_mode_and_error(
        controller: DeadbandController,
        #[case] mode: HvacMode,
        #[case] interior_temp: f64,
        #[case] expected: HvacState,
    ) {
        assert_eq!(controller.output(mode, 22., interior_temp).1, expected);
    }

    #[rstest]
    fn should_be_proportional_then_saturate(controller: DeadbandController) {
        let (power, _) = controller.output(HvacMode::Heat, 22., 21.5);
        assert_relative_eq!(power, 50_000.);
        let (power, _) = controller.output(HvacMode::Heat, 22., 15.);
        assert_relative_eq!(power, 100_000.);
        let (power, _) = controller.output(HvacMode::Cool, 22., 30.);
        assert_relative_eq!(power, -100_000.);
    }

    #[rstest]
    fn should_convert_codes() {
        assert_eq!(HvacMode::try_from(2), Ok(HvacMode::Cool));
        assert_eq!(
            HvacMode::try_from(7),
            Err(ConfigurationError::UnknownHvacMode(7))
        );
    }

    #[rstest]
    fn should_serialize_as_numeric_code() {
        assert_eq!(serde_json::to_string(&HvacMode::Heat).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<Vec<HvacMode>>("[0, 3]").unwrap(),
            vec![HvacMode::Off, HvacMode::Auto]
        );
        assert!(serde_json::from_str::<HvacMode>("9").is_err());
    }
}
