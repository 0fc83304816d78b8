use crate::core::controls::hvac_control::HvacMode;
use crate::core::thermal::inputs::SimulationInputs;
use crate::core::units::{hour_of_day, SECONDS_PER_HOUR};
use crate::simulation_time::SimulationTime;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 2024-07-15T00:00:00Z
const SUMMER_START: i64 = 1_721_001_600;
/// 2024-01-15T00:00:00Z
const WINTER_START: i64 = 1_705_276_800;

/// Shape of the synthesized "business as usual" day that scenarios are compared against.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineProfile {
    /// Unix timestamp of the first step
    pub start_timestamp: i64,
    pub outdoor_mean_temp: f64,
    pub outdoor_amplitude: f64,
    pub outdoor_min_temp: f64,
    pub outdoor_max_temp: f64,
    /// Irradiance at the top of the daytime half-sine, in W/m2
    pub peak_irradiance: f64,
    /// Occupants during core office hours (08:00-18:59)
    pub core_occupancy: f64,
    /// Occupants in the hour either side of core hours
    pub shoulder_occupancy: f64,
    pub setpoint: f64,
    pub hvac_mode: HvacMode,
    pub off_peak_price: f64,
    pub peak_price: f64,
    /// First and last hour (inclusive) of the tariff peak
    pub peak_hours: (u32, u32),
}

impl Default for BaselineProfile {
    fn default() -> Self {
        Self::summer()
    }
}

impl BaselineProfile {
    pub fn summer() -> Self {
        Self {
            start_timestamp: SUMMER_START,
            outdoor_mean_temp: 25.,
            outdoor_amplitude: 8.,
            outdoor_min_temp: 15.,
            outdoor_max_temp: 38.,
            peak_irradiance: 800.,
            core_occupancy: 50.,
            shoulder_occupancy: 20.,
            setpoint: 23.,
            hvac_mode: HvacMode::Auto,
            off_peak_price: 0.15,
            peak_price: 0.25,
            peak_hours: (14, 18),
        }
    }

    pub fn winter() -> Self {
        Self {
            start_timestamp: WINTER_START,
            outdoor_mean_temp: 4.,
            outdoor_amplitude: 4.,
            outdoor_min_temp: -10.,
            outdoor_max_temp: 15.,
            peak_irradiance: 300.,
            setpoint: 21.,
            peak_hours: (17, 20),
            ..Self::summer()
        }
    }

    pub fn outdoor_temp(&self, hour: u32) -> f64 {
        let temp = self.outdoor_mean_temp + self.outdoor_amplitude * diurnal_phase(hour).sin();
        temp.clamp(self.outdoor_min_temp, self.outdoor_max_temp)
    }

    pub fn solar_irradiance(&self, hour: u32) -> f64 {
        if (6..=20).contains(&hour) {
            self.peak_irradiance * ((hour as f64 - 6.) * PI / 14.).sin()
        } else {
            0.
        }
    }

    pub fn occupancy(&self, hour: u32) -> f64 {
        match hour {
            8..=18 => self.core_occupancy,
            7 | 19 => self.shoulder_occupancy,
            _ => 0.,
        }
    }

    pub fn price(&self, hour: u32) -> f64 {
        let (first, last) = self.peak_hours;
        if (first..=last).contains(&hour) {
            self.peak_price
        } else {
            self.off_peak_price
        }
    }

    /// Hourly inputs for `duration_hours` hours from the profile's start, beginning at the
    /// setpoint with the envelope in equilibrium.
    pub fn generate(&self, duration_hours: usize) -> SimulationInputs {
        let simulation_time = SimulationTime::hourly(self.start_timestamp, duration_hours);
        let hours: Vec<u32> = simulation_time
            .iter()
            .map(|step| step.hour_of_day())
            .collect();
        let series = |f: &dyn Fn(u32) -> f64| -> Vec<f64> { hours.iter().map(|&hour| f(hour)).collect() };

        SimulationInputs {
            timestamps: simulation_time.timestamps(),
            timestep_seconds: SECONDS_PER_HOUR,
            outdoor_temp: series(&|hour| self.outdoor_temp(hour)),
            solar_irradiance: series(&|hour| self.solar_irradiance(hour)),
            occupancy: series(&|hour| self.occupancy(hour)),
            setpoint: vec![self.setpoint; duration_hours],
            hvac_mode: vec![self.hvac_mode; duration_hours],
            electricity_price: Some(series(&|hour| self.price(hour))),
            initial_interior_temp: self.setpoint,
            initial_envelope_temp: self.setpoint,
        }
    }
}

/// Angle of the daily temperature wave, lowest at 00:00 and highest at 12:00.
fn diurnal_phase(hour: u32) -> f64 {
    (hour as f64 - 6.) * PI / 12.
}

/// Hour of the day of each step of `inputs`.
pub(crate) fn step_hours_of_day(inputs: &SimulationInputs) -> Vec<u32> {
    inputs.timestamps.iter().map(|&t| hour_of_day(t)).collect()
}
