use std::f64::consts::PI;
use thermal_twin::{HvacMode, SimulationInputs};

/// Hourly inputs from midnight UTC with no sun and nobody in.
pub fn hourly_inputs(
    outdoor_temp: Vec<f64>,
    setpoint: f64,
    mode: HvacMode,
    initial_interior_temp: f64,
    initial_envelope_temp: f64,
) -> SimulationInputs {
    let steps = outdoor_temp.len();
    SimulationInputs {
        timestamps: (0..steps as i64).map(|i| i * 3_600).collect(),
        timestep_seconds: 3_600,
        outdoor_temp,
        solar_irradiance: vec![0.; steps],
        occupancy: vec![0.; steps],
        setpoint: vec![setpoint; steps],
        hvac_mode: vec![mode; steps],
        electricity_price: None,
        initial_interior_temp,
        initial_envelope_temp,
    }
}

/// `mean + amplitude * sin((h - 6) pi / 12)` for each hour from midnight.
pub fn diurnal(steps: usize, mean: f64, amplitude: f64) -> Vec<f64> {
    (0..steps)
        .map(|h| mean + amplitude * ((h as f64 - 6.) * PI / 12.).sin())
        .collect()
}
