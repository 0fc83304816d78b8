use crate::core::controls::hvac_control::HvacState;
use serde::{Deserialize, Serialize};

/// Points lost from the comfort score per kelvin of mean deviation from setpoint
const COMFORT_PENALTY_PER_K: f64 = 20.0;

/// Trajectory produced by one simulation run.
///
/// Temperature and cumulative energy series hold N + 1 samples (the initial state first); the
/// per-step series hold N values, one per timestep.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SimulationResult {
    pub sample_times: Vec<i64>,
    pub interior_temps: Vec<f64>,
    pub envelope_temps: Vec<f64>,
    /// Mean signed thermal HVAC power over each step, in kW (positive heating, negative cooling)
    pub hvac_power_kw: Vec<f64>,
    /// Electrical energy used in each step, in kWh
    pub step_energy_kwh: Vec<f64>,
    pub cumulative_energy_kwh: Vec<f64>,
    /// Absolute deviation from setpoint at the end of each step, in K
    pub comfort_violation: Vec<f64>,
    pub realized_modes: Vec<HvacState>,
    pub total_energy_kwh: f64,
    pub total_cost_eur: f64,
    pub avg_comfort_score: f64,
    pub peak_power_kw: f64,
    pub heating_hours: f64,
    pub cooling_hours: f64,
    /// Number of steps in which a temperature had to be clamped to its plausible range
    pub clamped_steps: usize,
    pub timestep_seconds: u32,
}

impl SimulationResult {
    pub fn total_steps(&self) -> usize {
        self.hvac_power_kw.len()
    }

    pub fn final_interior_temp(&self) -> Option<f64> {
        self.interior_temps.last().copied()
    }
}

/// Score out of 100 for a mean absolute deviation from setpoint; 5 K of mean deviation scores 0.
pub fn comfort_score(mean_violation: f64) -> f64 {
    (100. - mean_violation * COMFORT_PENALTY_PER_K).max(0.)
}
