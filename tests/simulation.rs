mod common;

use approx::assert_relative_eq;
use common::{diurnal, hourly_inputs};
use pretty_assertions::assert_eq;
use rstest::*;
use thermal_twin::{
    simulate, HvacMode, HvacState, InputError, ThermalModel, ThermalParameters, TwinError,
};

#[fixture]
fn office() -> ThermalParameters {
    ThermalParameters {
        c_i: 6e6,
        c_w: 6e7,
        r_iw: 0.002,
        r_we: 0.001,
        hvac_capacity_kw: 150.,
        ..Default::default()
    }
}

#[rstest]
fn should_track_setpoint_through_a_warm_day(office: ThermalParameters) {
    let inputs = hourly_inputs(diurnal(24, 25., 8.), 22., HvacMode::Auto, 22., 22.);
    let result = simulate(&office, &inputs).unwrap();

    assert!(result.total_energy_kwh > 0.);
    assert!(result.avg_comfort_score >= 90., "comfort {}", result.avg_comfort_score);
    assert!(result.peak_power_kw <= 150.);
    assert_eq!(result.interior_temps.len(), 25);
    assert_eq!(result.cumulative_energy_kwh.len(), 25);
    assert_eq!(result.hvac_power_kw.len(), 24);
    assert_eq!(result.clamped_steps, 0);
}

#[rstest]
fn should_account_energy_per_step(office: ThermalParameters) {
    let inputs = hourly_inputs(diurnal(48, 10., 6.), 21., HvacMode::Auto, 18., 12.);
    let result = simulate(&office, &inputs).unwrap();

    let summed: f64 = result.step_energy_kwh.iter().sum();
    assert_relative_eq!(result.total_energy_kwh, summed, max_relative = 1e-12);
    assert_relative_eq!(
        result.total_energy_kwh,
        *result.cumulative_energy_kwh.last().unwrap(),
        max_relative = 1e-12
    );
    assert!(result
        .cumulative_energy_kwh
        .windows(2)
        .all(|pair| pair[1] >= pair[0]));
    assert_relative_eq!(
        result.total_cost_eur,
        result.total_energy_kwh * 0.15,
        max_relative = 1e-9
    );
}

#[rstest]
fn should_be_deterministic(office: ThermalParameters) {
    let inputs = hourly_inputs(diurnal(24, 30., 5.), 23., HvacMode::Cool, 26., 28.);
    let model = ThermalModel::new(office);

    assert_eq!(model.simulate(&inputs).unwrap(), model.simulate(&inputs).unwrap());
}

#[rstest]
fn should_settle_towards_setpoint_without_overshoot() {
    let inputs = hourly_inputs(vec![22.; 24], 22., HvacMode::Auto, 30., 30.);
    let result = ThermalModel::default().simulate(&inputs).unwrap();

    let deviations: Vec<f64> = result
        .interior_temps
        .iter()
        .map(|temp| (temp - 22.).abs())
        .collect();
    assert!(deviations[1] < deviations[0]);
    assert!(deviations[1..].iter().all(|&deviation| deviation < 1.), "{deviations:?}");
    assert!(result.interior_temps.iter().all(|&temp| temp >= 22. - 0.25));
}

#[rstest]
fn should_reject_bad_inputs_before_integrating(office: ThermalParameters) {
    let mut inputs = hourly_inputs(vec![10.; 6], 21., HvacMode::Heat, 20., 15.);
    inputs.outdoor_temp[3] = f64::NAN;
    assert!(matches!(
        simulate(&office, &inputs),
        Err(TwinError::InvalidInput(InputError::NonFinite {
            series: "outdoor_temp",
            index: 3,
            ..
        }))
    ));

    let empty = hourly_inputs(vec![], 21., HvacMode::Heat, 20., 15.);
    assert!(matches!(
        simulate(&office, &empty),
        Err(TwinError::InvalidInput(InputError::Empty { .. }))
    ));

    let mut irregular = hourly_inputs(vec![10.; 3], 21., HvacMode::Heat, 20., 15.);
    irregular.timestamps[2] = 9_000;
    assert!(matches!(
        simulate(&office, &irregular),
        Err(TwinError::InvalidInput(InputError::IrregularTimestep { index: 2, .. }))
    ));
}

#[rstest]
fn should_honour_sub_hourly_timesteps(office: ThermalParameters) {
    let mut inputs = hourly_inputs(vec![5.; 8], 21., HvacMode::Heat, 21., 15.);
    inputs.timestep_seconds = 900;
    inputs.timestamps = (0..8).map(|i| i * 900).collect();
    let result = simulate(&office, &inputs).unwrap();

    assert_eq!(result.timestep_seconds, 900);
    let active_steps = result
        .realized_modes
        .iter()
        .filter(|state| matches!(state, HvacState::Heating | HvacState::Cooling))
        .count();
    assert_relative_eq!(result.heating_hours + result.cooling_hours, active_steps as f64 * 0.25);
}
