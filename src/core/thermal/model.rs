use crate::core::controls::hvac_control::{DeadbandController, HvacMode, HvacState};
use crate::core::thermal::gains::StepGains;
use crate::core::thermal::inputs::{check_series, SimulationInputs};
use crate::core::thermal::parameters::ThermalParameters;
use crate::core::thermal::result::{comfort_score, SimulationResult};
use crate::core::units::{electrical_energy_kwh, watts_to_kilowatts};
use crate::errors::{InputError, TwinError};
use crate::statistics::{max_abs, mean_or_zero, successive_difference_std_dev};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, warn};

const INTERIOR_TEMP_BOUNDS: (f64, f64) = (10., 40.);
const ENVELOPE_TEMP_BOUNDS: (f64, f64) = (-20., 50.);

/// Integration sub-step as a fraction of the fastest time constant in the system
const SUB_STEP_FRACTION_OF_TAU: f64 = 0.1;
const MAX_SUB_STEPS: usize = 3_600;

// Calibration thresholds
const MIN_CALIBRATION_TEMP_SAMPLES: usize = 2;
const HEAVY_MASS_MAX_TEMP_CHANGE_STD_DEV: f64 = 0.5;
const LIGHT_MASS_MIN_TEMP_CHANGE_STD_DEV: f64 = 1.5;
const WELL_INSULATED_MAX_KWH_PER_M2: f64 = 0.01;
const POORLY_INSULATED_MIN_KWH_PER_M2: f64 = 0.03;

/// Lumped two-node (interior air, envelope mass) thermal model of one building.
///
/// ```text
///   T_ext --[R_we]-- T_w --[R_iw]-- T_i
///                     |              |
///                    C_w            C_i
///               (solar gain)  (internal + HVAC)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ThermalModel {
    parameters: ThermalParameters,
    is_calibrated: bool,
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self::new(ThermalParameters::default())
    }
}

impl ThermalModel {
    pub fn new(parameters: ThermalParameters) -> Self {
        Self {
            parameters,
            is_calibrated: false,
        }
    }

    pub fn parameters(&self) -> &ThermalParameters {
        &self.parameters
    }

    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    /// A model of the same building with its heating and cooling COPs multiplied by `factor`.
    pub fn with_cop_scaled(&self, factor: f64) -> Self {
        Self {
            parameters: self.parameters.with_cop_scaled(factor),
            is_calibrated: self.is_calibrated,
        }
    }

    /// Run the model over the whole input trajectory.
    ///
    /// Inputs and parameters are checked before the first step; once integration starts the run
    /// cannot fail. Temperatures leaving their plausible range are clamped and counted in
    /// [`SimulationResult::clamped_steps`].
    pub fn simulate(&self, inputs: &SimulationInputs) -> Result<SimulationResult, TwinError> {
        let simulation_time = inputs.validate()?;
        let parameters = *self.parameters.checked()?;

        let controller = DeadbandController::new(parameters.hvac_capacity_kw);
        let step_seconds = simulation_time.step_seconds() as f64;
        let sub_steps = sub_steps_for(&parameters, &controller, step_seconds);
        let sub_step_seconds = step_seconds / sub_steps as f64;

        let total_steps = simulation_time.total_steps();
        let mut interior_temps = Vec::with_capacity(total_steps + 1);
        let mut envelope_temps = Vec::with_capacity(total_steps + 1);
        let mut cumulative_energy_kwh = Vec::with_capacity(total_steps + 1);
        let mut hvac_power_kw = Vec::with_capacity(total_steps);
        let mut step_energy_kwh = Vec::with_capacity(total_steps);
        let mut comfort_violation = Vec::with_capacity(total_steps);
        let mut realized_modes = Vec::with_capacity(total_steps);

        let mut t_i = inputs.initial_interior_temp;
        let mut t_w = inputs.initial_envelope_temp;
        let mut total_energy_kwh = 0.;
        let mut total_cost_eur = 0.;
        let mut heating_steps = 0usize;
        let mut cooling_steps = 0usize;
        let mut clamped_steps = 0usize;

        interior_temps.push(t_i);
        envelope_temps.push(t_w);
        cumulative_energy_kwh.push(0.);

        for step in simulation_time.iter() {
            let idx = step.index;
            let mode = inputs.hvac_mode[idx];
            let setpoint = inputs.setpoint[idx];
            let t_ext = inputs.outdoor_temp[idx];
            let gains = StepGains::for_hour(
                &parameters,
                step.hour_of_day(),
                inputs.occupancy[idx],
                inputs.solar_irradiance[idx],
            );

            let mut heating_j = 0.;
            let mut cooling_j = 0.;
            let mut clamped = false;

            for _ in 0..sub_steps {
                let (q_hvac, _) = controller.output(mode, setpoint, t_i);
                let q_envelope_to_interior = (t_w - t_i) / parameters.r_iw;
                let q_envelope_to_outdoor = (t_ext - t_w) / parameters.r_we;

                let dt_i = (q_envelope_to_interior + q_hvac + gains.internal_w) / parameters.c_i;
                let dt_w = (-q_envelope_to_interior + q_envelope_to_outdoor + gains.solar_w)
                    / parameters.c_w;

                let (next_t_i, clamped_i) = clamp_temp(t_i + dt_i * sub_step_seconds, INTERIOR_TEMP_BOUNDS);
                let (next_t_w, clamped_w) = clamp_temp(t_w + dt_w * sub_step_seconds, ENVELOPE_TEMP_BOUNDS);
                t_i = next_t_i;
                t_w = next_t_w;
                clamped |= clamped_i || clamped_w;

                if q_hvac > 0. {
                    heating_j += q_hvac * sub_step_seconds;
                } else {
                    cooling_j -= q_hvac * sub_step_seconds;
                }
            }

            let net_thermal_j = heating_j - cooling_j;
            let state = match mode {
                HvacMode::Off => HvacState::Off,
                _ if net_thermal_j > 0. => HvacState::Heating,
                _ if net_thermal_j < 0. => HvacState::Cooling,
                _ => HvacState::Idle,
            };
            match state {
                HvacState::Heating => heating_steps += 1,
                HvacState::Cooling => cooling_steps += 1,
                _ => {}
            }
            if clamped {
                clamped_steps += 1;
            }

            let energy_kwh =
                electrical_energy_kwh(heating_j, cooling_j, parameters.cop_heat, parameters.cop_cool);
            total_energy_kwh += energy_kwh;
            total_cost_eur += energy_kwh * inputs.price_at(idx);

            interior_temps.push(t_i);
            envelope_temps.push(t_w);
            hvac_power_kw.push(watts_to_kilowatts(net_thermal_j / step_seconds));
            step_energy_kwh.push(energy_kwh);
            cumulative_energy_kwh.push(total_energy_kwh);
            comfort_violation.push((t_i - setpoint).abs());
            realized_modes.push(state);
        }

        if clamped_steps > 0 {
            warn!(
                clamped_steps,
                "Interior or envelope temperature left its plausible range and was clamped"
            );
        }

        let step_hours = simulation_time.step_hours();
        let result = SimulationResult {
            sample_times: simulation_time.sample_timestamps(),
            avg_comfort_score: comfort_score(mean_or_zero(&comfort_violation)),
            peak_power_kw: max_abs(&hvac_power_kw),
            interior_temps,
            envelope_temps,
            hvac_power_kw,
            step_energy_kwh,
            cumulative_energy_kwh,
            comfort_violation,
            realized_modes,
            total_energy_kwh,
            total_cost_eur,
            heating_hours: heating_steps as f64 * step_hours,
            cooling_hours: cooling_steps as f64 * step_hours,
            clamped_steps,
            timestep_seconds: simulation_time.step_seconds(),
        };
        debug!(
            steps = total_steps,
            sub_steps,
            total_energy_kwh = result.total_energy_kwh,
            avg_comfort_score = result.avg_comfort_score,
            "Simulation complete"
        );

        Ok(result)
    }

    /// Adjust capacitances and envelope resistance from measured history.
    ///
    /// This is a coarse classification, not a regression fit: thermal mass is judged from how
    /// smoothly the interior temperature moves between samples, insulation from the mean energy
    /// use per square metre of floor. Each is compared against two fixed thresholds and parameters
    /// between the thresholds are left unchanged.
    ///
    /// Arguments:
    /// * `interior_temps` - historical interior temperature samples, in deg C
    /// * `energy_kwh` - historical energy use per sample, in kWh
    pub fn calibrate(
        &mut self,
        interior_temps: &[f64],
        energy_kwh: &[f64],
    ) -> Result<CalibrationReport, InputError> {
        if interior_temps.len() < MIN_CALIBRATION_TEMP_SAMPLES {
            return Err(InputError::InsufficientHistory {
                series: "interior_temps",
                required: MIN_CALIBRATION_TEMP_SAMPLES,
                actual: interior_temps.len(),
            });
        }
        if energy_kwh.is_empty() {
            return Err(InputError::InsufficientHistory {
                series: "energy_kwh",
                required: 1,
                actual: 0,
            });
        }
        check_series("interior_temps", interior_temps, interior_temps.len())?;
        check_series("energy_kwh", energy_kwh, energy_kwh.len())?;

        let temp_change_std_dev = successive_difference_std_dev(interior_temps);
        let energy_intensity_kwh_per_m2 = mean_or_zero(energy_kwh) / self.parameters.floor_area_m2;

        let thermal_mass = if temp_change_std_dev < HEAVY_MASS_MAX_TEMP_CHANGE_STD_DEV {
            self.parameters.c_i = 8e6;
            self.parameters.c_w = 8e7;
            ThermalMassClass::Heavy
        } else if temp_change_std_dev > LIGHT_MASS_MIN_TEMP_CHANGE_STD_DEV {
            self.parameters.c_i = 3e6;
            self.parameters.c_w = 3e7;
            ThermalMassClass::Light
        } else {
            ThermalMassClass::Medium
        };

        let insulation = if energy_intensity_kwh_per_m2 < WELL_INSULATED_MAX_KWH_PER_M2 {
            self.parameters.r_we = 0.002;
            InsulationClass::Good
        } else if energy_intensity_kwh_per_m2 > POORLY_INSULATED_MIN_KWH_PER_M2 {
            self.parameters.r_we = 0.0005;
            InsulationClass::Poor
        } else {
            InsulationClass::Average
        };

        self.is_calibrated = true;
        debug!(%thermal_mass, %insulation, "Calibrated thermal model");

        Ok(CalibrationReport {
            thermal_mass,
            insulation,
            temp_change_std_dev,
            energy_intensity_kwh_per_m2,
        })
    }
}

/// Convenience wrapper for a one-off run with the given parameters.
pub fn simulate(
    parameters: &ThermalParameters,
    inputs: &SimulationInputs,
) -> Result<SimulationResult, TwinError> {
    ThermalModel::new(*parameters).simulate(inputs)
}

fn clamp_temp(temp: f64, (lower, upper): (f64, f64)) -> (f64, bool) {
    let clamped = temp.clamp(lower, upper);
    (clamped, clamped != temp)
}

/// Number of explicit Euler sub-steps per timestep that keeps the fastest mode well resolved.
fn sub_steps_for(parameters: &ThermalParameters, controller: &DeadbandController, step_seconds: f64) -> usize {
    let mut tau_min = (parameters.c_i * parameters.r_iw)
        .min(parameters.c_w / (1. / parameters.r_iw + 1. / parameters.r_we));
    if controller.gain_w_per_k() > 0. {
        tau_min = tau_min.min(parameters.c_i / controller.gain_w_per_k());
    }

    let sub_steps = (step_seconds / (SUB_STEP_FRACTION_OF_TAU * tau_min)).ceil();
    if sub_steps.is_finite() {
        (sub_steps as usize).clamp(1, MAX_SUB_STEPS)
    } else {
        MAX_SUB_STEPS
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThermalMassClass {
    Light,
    Medium,
    Heavy,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsulationClass {
    Poor,
    Average,
    Good,
}

/// What calibration concluded, and the two statistics it based that on.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub thermal_mass: ThermalMassClass,
    pub insulation: InsulationClass,
    pub temp_change_std_dev: f64,
    pub energy_intensity_kwh_per_m2: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thermal::inputs::tests::constant_inputs;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn model() -> ThermalModel {
        ThermalModel::default()
    }

    #[rstest]
    fn should_produce_n_plus_one_samples(model: ThermalModel) {
        let result = model.simulate(&constant_inputs(6, 18., 22.)).unwrap();

        assert_eq!(result.interior_temps.len(), 7);
        assert_eq!(result.envelope_temps.len(), 7);
        assert_eq!(result.cumulative_energy_kwh.len(), 7);
        assert_eq!(result.sample_times.len(), 7);
        assert_eq!(result.hvac_power_kw.len(), 6);
        assert_eq!(result.comfort_violation.len(), 6);
        assert_eq!(result.realized_modes.len(), 6);
        assert_eq!(result.interior_temps[0], 22.);
        assert_eq!(result.cumulative_energy_kwh[0], 0.);
        assert_eq!(result.timestep_seconds, 3_600);
    }

    #[rstest]
    fn should_accumulate_step_energy_into_total(model: ThermalModel) {
        let mut inputs = constant_inputs(12, 5., 21.);
        inputs.electricity_price = Some(vec![0.2; 12]);
        let result = model.simulate(&inputs).unwrap();

        assert!(result.total_energy_kwh > 0.);
        assert_relative_eq!(
            result.total_energy_kwh,
            result.step_energy_kwh.iter().sum::<f64>(),
            max_relative = 1e-12
        );
        assert_relative_eq!(result.total_cost_eur, result.total_energy_kwh * 0.2, max_relative = 1e-12);
        assert_eq!(
            result.cumulative_energy_kwh.last().copied(),
            Some(result.total_energy_kwh)
        );
    }

    #[rstest]
    fn should_do_nothing_with_hvac_off(model: ThermalModel) {
        let mut inputs = constant_inputs(4, 5., 21.);
        inputs.hvac_mode = vec![HvacMode::Off; 4];
        let result = model.simulate(&inputs).unwrap();

        assert_eq!(result.total_energy_kwh, 0.);
        assert_eq!(result.peak_power_kw, 0.);
        assert!(result.realized_modes.iter().all(|mode| *mode == HvacState::Off));
    }

    #[rstest]
    fn should_heat_in_cold_weather_and_record_heating_hours() {
        let model = ThermalModel::new(ThermalParameters {
            floor_area_m2: 500.,
            ..Default::default()
        });
        let mut inputs = constant_inputs(6, -5., 21.);
        inputs.hvac_mode = vec![HvacMode::Heat; 6];
        inputs.initial_envelope_temp = 10.;
        let result = model.simulate(&inputs).unwrap();

        assert!(result.hvac_power_kw.iter().all(|power| *power > 0.));
        assert_eq!(result.heating_hours, 6.);
        assert_eq!(result.cooling_hours, 0.);
        assert!(result.peak_power_kw <= model.parameters().hvac_capacity_kw);
    }

    #[rstest]
    fn should_clamp_runaway_temperatures_without_failing() {
        let model = ThermalModel::new(ThermalParameters {
            c_i: 1.,
            c_w: 1.,
            ..Default::default()
        });
        let mut inputs = constant_inputs(3, 45., 22.);
        inputs.hvac_mode = vec![HvacMode::Off; 3];
        inputs.solar_irradiance = vec![1_000.; 3];
        let result = model.simulate(&inputs).unwrap();

        assert_eq!(result.clamped_steps, 3);
        assert!(result
            .interior_temps
            .iter()
            .all(|temp| (10.0..=40.0).contains(temp)));
    }

    #[rstest]
    fn should_scale_electrical_energy_with_cop(model: ThermalModel) {
        let inputs = constant_inputs(6, 0., 21.);
        let base = model.simulate(&inputs).unwrap();
        let upgraded = model.with_cop_scaled(2.).simulate(&inputs).unwrap();

        assert!(base.total_energy_kwh > 0.);
        assert_relative_eq!(
            upgraded.total_energy_kwh,
            base.total_energy_kwh / 2.,
            max_relative = 1e-9
        );
        assert_eq!(upgraded.interior_temps, base.interior_temps);
    }

    #[rstest]
    fn should_reject_invalid_parameters_before_running() {
        let model = ThermalModel::new(ThermalParameters {
            cop_heat: -1.,
            ..Default::default()
        });
        assert!(matches!(
            model.simulate(&constant_inputs(2, 10., 21.)),
            Err(TwinError::InvalidConfiguration(_))
        ));
    }

    #[rstest]
    fn should_use_more_sub_steps_for_stiffer_buildings() {
        let parameters = ThermalParameters::default();
        let controller = DeadbandController::new(parameters.hvac_capacity_kw);
        // fastest time constant is C_i / gain = 50 s
        assert_eq!(sub_steps_for(&parameters, &controller, 3_600.), 720);
        assert_eq!(sub_steps_for(&parameters, &DeadbandController::new(0.), 3_600.), 4);
    }

    #[rstest]
    #[case(&[21., 21.1, 21.2, 21.1, 21.0], &[20.], ThermalMassClass::Heavy, InsulationClass::Good)]
    #[case(&[18., 21., 17., 22., 16.], &[200.], ThermalMassClass::Light, InsulationClass::Poor)]
    #[case(&[20., 21., 20., 21.], &[90.], ThermalMassClass::Medium, InsulationClass::Average)]
    fn should_classify_history_on_calibration(
        mut model: ThermalModel,
        #[case] interior_temps: &[f64],
        #[case] energy_kwh: &[f64],
        #[case] thermal_mass: ThermalMassClass,
        #[case] insulation: InsulationClass,
    ) {
        let report = model.calibrate(interior_temps, energy_kwh).unwrap();

        assert_eq!(report.thermal_mass, thermal_mass);
        assert_eq!(report.insulation, insulation);
        assert!(model.is_calibrated());
        match thermal_mass {
            ThermalMassClass::Heavy => assert_eq!(model.parameters().c_i, 8e6),
            ThermalMassClass::Light => assert_eq!(model.parameters().c_w, 3e7),
            ThermalMassClass::Medium => assert_eq!(model.parameters().c_i, 5e6),
        }
        match insulation {
            InsulationClass::Good => assert_abs_diff_eq!(model.parameters().r_we, 0.002),
            InsulationClass::Poor => assert_abs_diff_eq!(model.parameters().r_we, 0.0005),
            InsulationClass::Average => assert_abs_diff_eq!(model.parameters().r_we, 0.001),
        }
    }

    #[rstest]
    fn should_reject_too_little_history(mut model: ThermalModel) {
        assert_eq!(
            model.calibrate(&[21.], &[1.]),
            Err(InputError::InsufficientHistory {
                series: "interior_temps",
                required: 2,
                actual: 1,
            })
        );
        assert_eq!(
            model.calibrate(&[21., 22.], &[]),
            Err(InputError::InsufficientHistory {
                series: "energy_kwh",
                required: 1,
                actual: 0,
            })
        );
        assert!(!model.is_calibrated());
    }
}
