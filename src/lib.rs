pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod registry;
pub mod scenarios;
pub mod simulation_time;
mod statistics;

pub use crate::core::controls::hvac_control::{HvacMode, HvacState};
pub use crate::core::mpc::forecasts::{DefaultForecasts, Season};
pub use crate::core::mpc::{quick_optimize, MpcConfig, MpcController, MpcResult, OptimizationStatus};
pub use crate::core::thermal::inputs::SimulationInputs;
pub use crate::core::thermal::model::{simulate, CalibrationReport, ThermalModel};
pub use crate::core::thermal::parameters::ThermalParameters;
pub use crate::core::thermal::result::SimulationResult;
pub use crate::errors::{ConfigurationError, InputError, TwinError};
pub use crate::registry::BuildingRegistry;
pub use crate::scenarios::comparison::ScenarioComparison;
pub use crate::scenarios::config::{ScenarioConfig, ScenarioType};
pub use crate::scenarios::ScenarioEngine;

use crate::input::{ingest_optimization_request, ingest_scenario_request, ingest_simulation_request};
use crate::output::{write_schedule_csv, write_simulation_csv, Output};
use std::io::Read;
use tracing::info;

/// Run a JSON simulation request, writing the trajectory as CSV to `output`.
pub fn run_simulation(
    input: impl Read,
    output: impl Output,
    registry: &BuildingRegistry,
) -> anyhow::Result<SimulationResult> {
    let request = ingest_simulation_request(input)?;
    let model = ThermalModel::new(request.resolve_parameters(registry));
    let result = model.simulate(&request.inputs)?;
    info!(
        steps = result.total_steps(),
        total_energy_kwh = result.total_energy_kwh,
        "Simulation complete"
    );
    write_simulation_csv(&output, "simulation", &result)?;

    Ok(result)
}

/// Run a JSON optimization request, writing the planned schedule as CSV to `output`.
pub fn run_optimization(
    input: impl Read,
    output: impl Output,
    registry: &BuildingRegistry,
) -> anyhow::Result<MpcResult> {
    let request = ingest_optimization_request(input)?;
    let parameters = match &request.building_id {
        Some(building_id) => registry.parameters_for(building_id),
        None => ThermalParameters::default(),
    };
    let config = request.resolve_config(&parameters);
    let forecasts = request.resolve_forecasts(&config);

    let mut controller = MpcController::new(config).with_thermal_parameters(parameters);
    if request.heuristic_only {
        controller = controller.heuristic_only();
    }
    let result = controller.optimize(
        request.current_temp,
        &forecasts.weather,
        &forecasts.occupancy,
        &forecasts.prices,
        request.preferred_setpoint,
        request.current_hour,
    )?;
    write_schedule_csv(&output, "schedule", &result)?;

    Ok(result)
}

/// Run a JSON scenario request against the synthesized baseline.
pub fn run_scenario(input: impl Read, registry: &BuildingRegistry) -> anyhow::Result<ScenarioComparison> {
    let request = ingest_scenario_request(input)?;
    let scenario = request.resolve_scenario()?;
    let mut engine = ScenarioEngine::new(registry);
    if let Some(profile) = request.baseline.clone() {
        engine = engine.with_baseline_profile(profile);
    }

    Ok(engine.run_scenario(&scenario, &request.building_id, request.duration_hours)?)
}
