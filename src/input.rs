use crate::core::mpc::forecasts::{DefaultForecasts, Season};
use crate::core::mpc::MpcConfig;
use crate::core::thermal::inputs::SimulationInputs;
use crate::core::thermal::parameters::ThermalParameters;
use crate::registry::BuildingRegistry;
use crate::scenarios::baseline::BaselineProfile;
use crate::scenarios::config::{preset_by_id, ScenarioConfig};
use crate::scenarios::DEFAULT_DURATION_HOURS;
use anyhow::bail;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufReader, Read};

fn ingest<T: DeserializeOwned>(json: impl Read) -> anyhow::Result<T> {
    let reader = BufReader::new(json);
    Ok(serde_json::from_reader(reader)?)
}

pub fn ingest_simulation_request(json: impl Read) -> anyhow::Result<SimulationRequest> {
    ingest(json)
}

pub fn ingest_optimization_request(json: impl Read) -> anyhow::Result<OptimizationRequest> {
    ingest(json)
}

pub fn ingest_scenario_request(json: impl Read) -> anyhow::Result<ScenarioRequest> {
    ingest(json)
}

/// Simulate a building over an explicit input trajectory. Explicit `parameters` take precedence
/// over the registry entry for `building_id`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationRequest {
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub parameters: Option<ThermalParameters>,
    pub inputs: SimulationInputs,
}

impl SimulationRequest {
    pub fn resolve_parameters(&self, registry: &BuildingRegistry) -> ThermalParameters {
        match (&self.parameters, &self.building_id) {
            (Some(parameters), _) => *parameters,
            (None, Some(building_id)) => registry.parameters_for(building_id),
            (None, None) => ThermalParameters::default(),
        }
    }
}

fn default_preferred_setpoint() -> f64 {
    22.
}

/// Plan a setpoint schedule from the current state. Missing forecasts are filled in with the
/// default seasonal profiles for the configured horizon.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationRequest {
    #[serde(default)]
    pub building_id: Option<String>,
    pub current_temp: f64,
    #[serde(default = "default_preferred_setpoint")]
    pub preferred_setpoint: f64,
    #[serde(default)]
    pub current_hour: u32,
    #[serde(default)]
    pub weather_forecast: Option<Vec<f64>>,
    #[serde(default)]
    pub occupancy_forecast: Option<Vec<f64>>,
    #[serde(default)]
    pub price_forecast: Option<Vec<f64>>,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub config: Option<MpcConfig>,
    #[serde(default)]
    pub heuristic_only: bool,
}

impl OptimizationRequest {
    /// The optimizer configuration, taking COPs from the building when none is given.
    pub fn resolve_config(&self, parameters: &ThermalParameters) -> MpcConfig {
        self.config.clone().unwrap_or_else(|| MpcConfig {
            cop_heat: parameters.cop_heat,
            cop_cool: parameters.cop_cool,
            ..Default::default()
        })
    }

    pub fn resolve_forecasts(&self, config: &MpcConfig) -> DefaultForecasts {
        let defaults = DefaultForecasts::generate(config.horizon_hours, self.current_hour, self.season);
        DefaultForecasts {
            weather: self.weather_forecast.clone().unwrap_or(defaults.weather),
            occupancy: self.occupancy_forecast.clone().unwrap_or(defaults.occupancy),
            prices: self.price_forecast.clone().unwrap_or(defaults.prices),
        }
    }
}

fn default_building_id() -> String {
    "pleiades-a".into()
}

fn default_duration_hours() -> usize {
    DEFAULT_DURATION_HOURS
}

/// Run one what-if scenario. The scenario is given as a full config, a preset id, or a family
/// tag with a parameter bag, checked in that order.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioRequest {
    #[serde(default = "default_building_id")]
    pub building_id: String,
    #[serde(default)]
    pub scenario: Option<ScenarioConfig>,
    #[serde(default)]
    pub scenario_id: Option<String>,
    #[serde(default)]
    pub scenario_type: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: usize,
    #[serde(default)]
    pub baseline: Option<BaselineProfile>,
}

impl ScenarioRequest {
    pub fn resolve_scenario(&self) -> anyhow::Result<ScenarioConfig> {
        Ok(match (&self.scenario, &self.scenario_id, &self.scenario_type) {
            (Some(scenario), _, _) => scenario.clone(),
            (None, Some(scenario_id), _) => preset_by_id(scenario_id)?,
            (None, None, Some(scenario_type)) => {
                ScenarioConfig::custom(scenario_type, self.parameters.clone().unwrap_or_default())?
            }
            (None, None, None) => {
                bail!("Scenario request needs one of 'scenario', 'scenario_id' or 'scenario_type'")
            }
        })
    }
}
