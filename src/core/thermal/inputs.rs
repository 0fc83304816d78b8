use crate::core::controls::hvac_control::HvacMode;
use crate::errors::InputError;
use crate::simulation_time::SimulationTime;
use serde::{Deserialize, Serialize};

/// Electricity price assumed for any step without an explicit price, in EUR/kWh
pub const DEFAULT_ELECTRICITY_PRICE: f64 = 0.15;

/// Aligned exogenous series driving one simulation run, plus the initial state.
///
/// Every series must have the same length as `timestamps`, and timestamps must advance by exactly
/// `timestep_seconds`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationInputs {
    pub timestamps: Vec<i64>,
    #[serde(default = "default_timestep_seconds")]
    pub timestep_seconds: u32,
    pub outdoor_temp: Vec<f64>,
    pub solar_irradiance: Vec<f64>,
    pub occupancy: Vec<f64>,
    pub setpoint: Vec<f64>,
    pub hvac_mode: Vec<HvacMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity_price: Option<Vec<f64>>,
    pub initial_interior_temp: f64,
    pub initial_envelope_temp: f64,
}

fn default_timestep_seconds() -> u32 {
    3_600
}

impl SimulationInputs {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn price_at(&self, index: usize) -> f64 {
        self.electricity_price
            .as_ref()
            .and_then(|prices| prices.get(index).copied())
            .unwrap_or(DEFAULT_ELECTRICITY_PRICE)
    }

    /// Check the shape and values of every series and derive the simulation time they describe.
    pub fn validate(&self) -> Result<SimulationTime, InputError> {
        let simulation_time = SimulationTime::from_timestamps(&self.timestamps, self.timestep_seconds)?;
        let expected = simulation_time.total_steps();

        let mut series: Vec<(&'static str, &[f64])> = vec![
            ("outdoor_temp", self.outdoor_temp.as_slice()),
            ("solar_irradiance", self.solar_irradiance.as_slice()),
            ("occupancy", self.occupancy.as_slice()),
            ("setpoint", self.setpoint.as_slice()),
        ];
        if let Some(prices) = &self.electricity_price {
            series.push(("electricity_price", prices.as_slice()));
        }
        for (name, values) in series {
            check_series(name, values, expected)?;
        }
        if self.hvac_mode.len() != expected {
            return Err(InputError::MismatchedLength {
                series: "hvac_mode",
                expected,
                actual: self.hvac_mode.len(),
            });
        }

        check_scalar("initial_interior_temp", self.initial_interior_temp)?;
        check_scalar("initial_envelope_temp", self.initial_envelope_temp)?;

        Ok(simulation_time)
    }
}

pub(crate) fn check_series(name: &'static str, values: &[f64], expected: usize) -> Result<(), InputError> {
    if values.len() != expected {
        return Err(InputError::MismatchedLength {
            series: name,
            expected,
            actual: values.len(),
        });
    }
    match values.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(InputError::NonFinite {
            series: name,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_scalar(name: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFiniteScalar { name, value })
    }
}
