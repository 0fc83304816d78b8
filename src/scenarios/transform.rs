use crate::core::thermal::inputs::SimulationInputs;
use crate::core::thermal::model::ThermalModel;
use crate::scenarios::baseline::step_hours_of_day;
use crate::scenarios::config::{
    DemandResponse, EquipmentEfficiency, OccupancyPattern, ScenarioParameters, SetpointChange,
    WeatherForecast,
};

/// Outdoor temperature above which a step is treated as cooling-dominated, in deg C
pub const COOLING_DOMINANT_OUTDOOR_TEMP: f64 = 25.0;
/// Occupancy below which a step counts as nearly empty
pub const LOW_OCCUPANCY_THRESHOLD: f64 = 5.0;
/// Setpoint relaxation through a demand-response peak at 100% reduction, in K
const PEAK_BIAS_K: f64 = 3.0;
/// Share of the deadband expansion applied as an alternating setpoint offset
const DEADBAND_ALTERNATION: f64 = 0.3;
const DEFAULT_SETBACK_K: f64 = 2.0;

fn is_cooling_dominant(outdoor_temp: f64) -> bool {
    outdoor_temp > COOLING_DOMINANT_OUTDOOR_TEMP
}

/// Sign that moves a setpoint in the direction that saves energy at this outdoor temperature.
fn relax_direction(outdoor_temp: f64) -> f64 {
    if is_cooling_dominant(outdoor_temp) {
        1.
    } else {
        -1.
    }
}

impl ScenarioParameters {
    /// Derive the scenario's inputs and model from the baseline ones. The baseline is never
    /// modified.
    pub fn apply(
        &self,
        baseline: &SimulationInputs,
        model: &ThermalModel,
    ) -> (SimulationInputs, ThermalModel) {
        let mut inputs = baseline.clone();
        let hours = step_hours_of_day(baseline);

        match self {
            ScenarioParameters::SetpointChange(p) => p.apply(&mut inputs, &hours),
            ScenarioParameters::OccupancyPattern(p) => p.apply(&mut inputs, baseline),
            ScenarioParameters::WeatherForecast(p) => p.apply(&mut inputs),
            ScenarioParameters::DemandResponse(p) => p.apply(&mut inputs, &hours),
            ScenarioParameters::EquipmentEfficiency(p) => return (inputs, p.apply(model)),
        }

        (inputs, model.clone())
    }
}

impl SetpointChange {
    fn apply(&self, inputs: &mut SimulationInputs, hours: &[u32]) {
        for (i, (setpoint, hour)) in inputs.setpoint.iter_mut().zip(hours).enumerate() {
            if self.hours.contains(hour) {
                *setpoint += self.delta_temp;
            }
            if self.deadband_expansion > 0. {
                let alternation = if i % 2 == 0 { 1. } else { -1. };
                *setpoint += alternation * self.deadband_expansion * DEADBAND_ALTERNATION;
            }
        }
    }
}

impl OccupancyPattern {
    fn apply(&self, inputs: &mut SimulationInputs, baseline: &SimulationInputs) {
        for occupancy in inputs.occupancy.iter_mut() {
            *occupancy *= self.occupancy_factor;
        }

        let steps = inputs.len();
        for i in 0..steps {
            if inputs.occupancy[i] >= LOW_OCCUPANCY_THRESHOLD || self.arrival_within(baseline, i) {
                continue;
            }
            let outdoor_temp = baseline.outdoor_temp[i];
            inputs.setpoint[i] = match (self.min_temp, self.max_temp) {
                (Some(min_temp), Some(max_temp)) => {
                    if is_cooling_dominant(outdoor_temp) {
                        max_temp
                    } else {
                        min_temp
                    }
                }
                _ => baseline.setpoint[i] + relax_direction(outdoor_temp) * DEFAULT_SETBACK_K,
            };
        }
    }

    /// Whether the baseline building fills up within the pre-conditioning window after `step`.
    fn arrival_within(&self, baseline: &SimulationInputs, step: usize) -> bool {
        let window = self.pre_condition_hours as usize;
        baseline
            .occupancy
            .iter()
            .skip(step + 1)
            .take(window)
            .any(|&occupancy| occupancy >= LOW_OCCUPANCY_THRESHOLD)
    }
}

impl WeatherForecast {
    fn apply(&self, inputs: &mut SimulationInputs) {
        for temp in inputs.outdoor_temp.iter_mut() {
            *temp = match self.temp_set {
                Some(temp_set) => temp_set,
                None => *temp + self.temp_delta,
            };
        }
        for irradiance in inputs.solar_irradiance.iter_mut() {
            *irradiance *= self.solar_factor;
        }
    }
}

impl DemandResponse {
    fn apply(&self, inputs: &mut SimulationInputs, hours: &[u32]) {
        let peak_hours = self.effective_peak_hours();
        let recovery_hours = self.recovery_window();
        let peak_bias = PEAK_BIAS_K * self.reduction_percent / 100.;

        for (i, hour) in hours.iter().enumerate() {
            let direction = relax_direction(inputs.outdoor_temp[i]);
            if self.pre_cool_hours.contains(hour) {
                // pre-condition against the coming relaxation
                inputs.setpoint[i] -= direction * self.pre_cool_delta.abs();
            } else if peak_hours.contains(hour) {
                inputs.setpoint[i] += direction * peak_bias;
            } else if recovery_hours.contains(hour) {
                inputs.setpoint[i] += direction * peak_bias / 2.;
            }
        }
    }
}

impl EquipmentEfficiency {
    fn apply(&self, model: &ThermalModel) -> ThermalModel {
        model.with_cop_scaled(self.cop_factor())
    }
}
