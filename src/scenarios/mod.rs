//! What-if analysis: run a building through a synthesized baseline day and through a transformed
//! copy of it, then compare the two runs.

pub mod baseline;
pub mod comparison;
pub mod config;
pub mod transform;

use crate::core::thermal::inputs::SimulationInputs;
use crate::errors::TwinError;
use crate::registry::BuildingRegistry;
use baseline::BaselineProfile;
use comparison::ScenarioComparison;
use config::{preset_by_id, preset_scenarios, ScenarioConfig};
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_DURATION_HOURS: usize = 24;

pub struct ScenarioEngine<'a> {
    registry: &'a BuildingRegistry,
    baseline_profile: BaselineProfile,
}

impl<'a> ScenarioEngine<'a> {
    pub fn new(registry: &'a BuildingRegistry) -> Self {
        Self {
            registry,
            baseline_profile: BaselineProfile::default(),
        }
    }

    pub fn with_baseline_profile(mut self, baseline_profile: BaselineProfile) -> Self {
        self.baseline_profile = baseline_profile;
        self
    }

    pub fn baseline_profile(&self) -> &BaselineProfile {
        &self.baseline_profile
    }

    pub fn presets(&self) -> Vec<ScenarioConfig> {
        preset_scenarios()
    }

    pub fn scenario_by_id(&self, scenario_id: &str) -> Result<ScenarioConfig, TwinError> {
        Ok(preset_by_id(scenario_id)?)
    }

    /// Compare `config` against this engine's baseline profile over `duration_hours` hours.
    pub fn run_scenario(
        &self,
        config: &ScenarioConfig,
        building_id: &str,
        duration_hours: usize,
    ) -> Result<ScenarioComparison, TwinError> {
        let baseline = self.baseline_profile.generate(duration_hours);
        self.compare_with_baseline(config, building_id, &baseline)
    }

    pub fn run_preset(
        &self,
        scenario_id: &str,
        building_id: &str,
        duration_hours: usize,
    ) -> Result<ScenarioComparison, TwinError> {
        self.run_scenario(&self.scenario_by_id(scenario_id)?, building_id, duration_hours)
    }

    /// Build an ad hoc scenario from a family tag and a parameter bag, then run it.
    pub fn run_custom_scenario(
        &self,
        building_id: &str,
        scenario_type: &str,
        parameters: Value,
        duration_hours: usize,
    ) -> Result<ScenarioComparison, TwinError> {
        let config = ScenarioConfig::custom(scenario_type, parameters)?;
        self.run_scenario(&config, building_id, duration_hours)
    }

    /// Compare `config` against an explicit baseline trajectory.
    pub fn compare_with_baseline(
        &self,
        config: &ScenarioConfig,
        building_id: &str,
        baseline: &SimulationInputs,
    ) -> Result<ScenarioComparison, TwinError> {
        baseline.validate()?;
        let model = self.registry.model_for(building_id);
        let (scenario_inputs, scenario_model) = config.parameters.apply(baseline, &model);

        let baseline_result = model.simulate(baseline)?;
        let scenario_result = scenario_model.simulate(&scenario_inputs)?;
        debug!(
            baseline_energy_kwh = baseline_result.total_energy_kwh,
            scenario_energy_kwh = scenario_result.total_energy_kwh,
            "Simulated baseline and scenario"
        );

        let comparison = ScenarioComparison::new(config, building_id, &baseline_result, &scenario_result);
        info!(
            scenario_id = %config.id,
            building_id,
            energy_savings_percent = comparison.energy_savings_percent,
            cost_savings_eur = comparison.cost_savings_eur,
            "Scenario complete"
        );

        Ok(comparison)
    }
}
