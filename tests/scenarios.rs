use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::json;
use thermal_twin::scenarios::baseline::BaselineProfile;
use thermal_twin::scenarios::comparison::{ScenarioComparison, TimelinePoint};
use thermal_twin::scenarios::DEFAULT_DURATION_HOURS;
use thermal_twin::{
    BuildingRegistry, ConfigurationError, HvacMode, ScenarioEngine, ThermalModel, TwinError,
};

#[fixture]
fn registry() -> BuildingRegistry {
    BuildingRegistry::default()
}

/// Summed magnitude of HVAC power over the steps starting at the given hours of a day run from
/// midnight.
fn power_during(timeline: &[TimelinePoint], hours: &[usize]) -> f64 {
    // timeline point k + 1 carries the power of step k
    hours
        .iter()
        .map(|&hour| timeline[hour + 1].hvac_power_kw.abs())
        .sum()
}

#[rstest]
fn should_save_energy_with_night_setback(registry: BuildingRegistry) {
    let cold_office = BaselineProfile {
        outdoor_mean_temp: 0.,
        outdoor_amplitude: 2.,
        setpoint: 22.,
        hvac_mode: HvacMode::Heat,
        ..BaselineProfile::winter()
    };
    let engine = ScenarioEngine::new(&registry).with_baseline_profile(cold_office);
    let comparison = engine
        .run_preset("setpoint-night-setback", "pleiades-c", DEFAULT_DURATION_HOURS)
        .unwrap();

    assert!(comparison.energy_savings_kwh > 0., "{comparison:?}");
    assert!(comparison.scenario_energy_kwh <= comparison.baseline_energy_kwh);
    assert!(comparison.carbon_savings_kg > 0.);
}

#[rstest]
fn should_shave_peak_hour_power(registry: BuildingRegistry) {
    let engine = ScenarioEngine::new(&registry);
    let comparison = engine
        .run_preset("dr-peak-shaving", "pleiades-a", DEFAULT_DURATION_HOURS)
        .unwrap();

    let peak_hours = [14, 15, 16, 17];
    let baseline = power_during(&comparison.baseline_timeline, &peak_hours);
    let scenario = power_during(&comparison.scenario_timeline, &peak_hours);
    assert!(scenario < baseline, "scenario {scenario} kW, baseline {baseline} kW");
}

#[rstest]
fn should_reject_unrecognised_scenario_type(registry: BuildingRegistry) {
    let engine = ScenarioEngine::new(&registry);
    let result = engine.run_custom_scenario("pleiades-a", "schedule_optimization", json!({}), 24);

    match result {
        Err(TwinError::InvalidConfiguration(ConfigurationError::UnknownScenarioType(tag))) => {
            assert_eq!(tag, "schedule_optimization")
        }
        other => panic!("expected unknown scenario type, got {other:?}"),
    }
}

#[rstest]
fn should_run_hypothetical_building_with_default_parameters(registry: BuildingRegistry) {
    let engine = ScenarioEngine::new(&registry);
    let comparison = engine
        .run_preset("weather-mild", "hypothetical-tower", DEFAULT_DURATION_HOURS)
        .unwrap();

    let baseline = BaselineProfile::default().generate(DEFAULT_DURATION_HOURS);
    let expected = ThermalModel::default().simulate(&baseline).unwrap();
    assert_eq!(comparison.baseline_energy_kwh, expected.total_energy_kwh);
    assert_eq!(comparison.building_id, "hypothetical-tower");
}

#[rstest]
fn should_run_every_preset(registry: BuildingRegistry) {
    let engine = ScenarioEngine::new(&registry);
    for preset in engine.presets() {
        let comparison: ScenarioComparison = engine
            .run_scenario(&preset, "pleiades-b", DEFAULT_DURATION_HOURS)
            .unwrap();

        assert_eq!(comparison.scenario_id, preset.id);
        assert!(!comparison.recommendations.is_empty());
        assert_eq!(comparison.scenario_timeline.len(), DEFAULT_DURATION_HOURS + 1);
    }
}
