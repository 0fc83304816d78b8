pub mod forecasts;
pub mod heuristic;
#[cfg(feature = "clarabel")]
pub mod qp;

use crate::core::mpc::forecasts::{DefaultForecasts, Season};
use crate::core::mpc::heuristic::HeuristicOptimizer;
use crate::core::thermal::inputs::{check_scalar, check_series};
use crate::core::thermal::parameters::ThermalParameters;
use crate::core::units::{electrical_power_kw, HOURS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::errors::{ConfigurationError, InputError, TwinError};
use crate::registry::BuildingRegistry;
use crate::statistics::mean_or_zero;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::time::Instant;
use strum::Display;
use tracing::{info, warn};

/// Forecast occupancy above which a step counts as occupied
pub const OCCUPANCY_THRESHOLD: f64 = 5.0;
/// Extra margin on the hard temperature bounds, in K
pub const HARD_BOUND_MARGIN_K: f64 = 2.0;
/// Simplified HVAC effort assumed by the no-optimization baseline, in kW per K of setpoint error
const BASELINE_KW_PER_K: f64 = 5.0;
const SCHEDULE_POWER_THRESHOLD_KW: f64 = 5.0;
const SCHEDULE_SETPOINT_OFFSET_K: f64 = 0.5;
const COMFORT_PENALTY_PER_K: f64 = 5.0;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct MpcConfig {
    #[validate(minimum = 1)]
    #[validate(maximum = 48)]
    pub horizon_hours: usize,
    #[validate(minimum = 1)]
    #[validate(maximum = 1440)]
    pub timestep_minutes: u32,
    #[validate(minimum = 0.)]
    pub comfort_band: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    #[validate(minimum = 0.)]
    pub energy_weight: f64,
    #[validate(minimum = 0.)]
    pub comfort_weight: f64,
    #[validate(minimum = 0.)]
    pub ramp_weight: f64,
    #[validate(minimum = 0.)]
    pub max_heating_kw: f64,
    #[validate(minimum = 0.)]
    pub max_cooling_kw: f64,
    #[validate(minimum = 0.)]
    pub ramp_limit_kw: f64,
    #[validate(exclusive_minimum = 0.)]
    pub cop_heat: f64,
    #[validate(exclusive_minimum = 0.)]
    pub cop_cool: f64,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            horizon_hours: 24,
            timestep_minutes: 60,
            comfort_band: 1.0,
            min_temp: 19.0,
            max_temp: 26.0,
            energy_weight: 1.0,
            comfort_weight: 10.0,
            ramp_weight: 0.1,
            max_heating_kw: 50.0,
            max_cooling_kw: 100.0,
            ramp_limit_kw: 20.0,
            cop_heat: 4.0,
            cop_cool: 3.5,
        }
    }
}

impl MpcConfig {
    fn checked(&self) -> Result<&Self, ConfigurationError> {
        self.validate()
            .map_err(|errors| ConfigurationError::invalid_parameters("MPC configuration", errors))?;
        if !(self.min_temp.is_finite() && self.max_temp.is_finite()) || self.min_temp > self.max_temp {
            return Err(ConfigurationError::InvalidParameters {
                subject: "MPC configuration",
                reason: format!(
                    "min_temp ({}) must not exceed max_temp ({})",
                    self.min_temp, self.max_temp
                ),
            });
        }
        Ok(self)
    }

    pub fn step_seconds(&self) -> f64 {
        self.timestep_minutes as f64 * SECONDS_PER_MINUTE as f64
    }

    pub fn step_hours(&self) -> f64 {
        self.step_seconds() / SECONDS_PER_HOUR as f64
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OptimizationStatus {
    Optimal,
    OptimalInaccurate,
    Heuristic,
}

/// First-order linearization of the building used inside the optimizer:
/// `T[k+1] = a T[k] + b T_ext[k] + c Q[k]`, with Q in kW.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearDynamics {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LinearDynamics {
    pub fn from_parameters(parameters: &ThermalParameters, step_seconds: f64) -> Self {
        let tau = parameters.c_i * parameters.r_total();
        let a = (-step_seconds / tau).exp();
        let b = 1. - a;
        Self {
            a,
            b,
            c: parameters.r_total() * 1_000. * b,
        }
    }
}

/// Everything an optimizer needs to plan one horizon.
#[derive(Clone, Debug)]
pub struct HorizonProblem<'a> {
    pub config: &'a MpcConfig,
    pub dynamics: LinearDynamics,
    pub current_temp: f64,
    pub outdoor_temps: &'a [f64],
    pub occupancy: &'a [f64],
    pub prices: &'a [f64],
    pub preferred_setpoint: f64,
}

impl HorizonProblem<'_> {
    pub fn steps(&self) -> usize {
        self.outdoor_temps.len()
    }

    pub fn is_occupied(&self, step: usize) -> bool {
        self.occupancy[step] > OCCUPANCY_THRESHOLD
    }

    /// Soft comfort bounds on the temperature at the end of `step`.
    pub fn comfort_bounds(&self, step: usize) -> (f64, f64) {
        if self.is_occupied(step) {
            (
                self.preferred_setpoint - self.config.comfort_band,
                self.preferred_setpoint + self.config.comfort_band,
            )
        } else {
            (self.config.min_temp, self.config.max_temp)
        }
    }

    pub fn hard_bounds(&self) -> (f64, f64) {
        (
            self.config.min_temp - HARD_BOUND_MARGIN_K,
            self.config.max_temp + HARD_BOUND_MARGIN_K,
        )
    }
}

/// Planned temperature (N + 1 points) and signed thermal power (N points, kW) trajectories.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub temps: Vec<f64>,
    pub power_kw: Vec<f64>,
    pub status: OptimizationStatus,
}

/// A way of planning HVAC power over a horizon.
pub trait Optimizer {
    fn name(&self) -> &'static str;

    fn plan(&self, problem: &HorizonProblem) -> anyhow::Result<Trajectory>;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub hour: u32,
    pub step: usize,
    pub setpoint: f64,
    pub predicted_temp: f64,
    pub predicted_power_kw: f64,
    pub electricity_price: f64,
    pub occupancy: f64,
    pub outdoor_temp: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MpcResult {
    pub optimal_setpoints: Vec<f64>,
    pub predicted_temps: Vec<f64>,
    pub predicted_power_kw: Vec<f64>,
    pub predicted_energy_kwh: Vec<f64>,
    pub total_energy_kwh: f64,
    pub total_cost_eur: f64,
    pub baseline_energy_kwh: f64,
    pub baseline_cost_eur: f64,
    pub cost_savings_percent: f64,
    pub comfort_score: f64,
    pub status: OptimizationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub solve_time_ms: f64,
    pub horizon_steps: usize,
    pub schedule: Vec<ScheduleEntry>,
}

/// Receding-horizon optimizer for one building.
///
/// Tries the convex QP first (when built with the `clarabel` feature) and falls back to the
/// rule-based heuristic when the solver is missing or does not reach an optimal status.
#[derive(Clone, Debug, Default)]
pub struct MpcController {
    config: MpcConfig,
    parameters: ThermalParameters,
    heuristic_only: bool,
}

impl MpcController {
    pub fn new(config: MpcConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_thermal_parameters(mut self, parameters: ThermalParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Skip the QP and always plan with the heuristic.
    pub fn heuristic_only(mut self) -> Self {
        self.heuristic_only = true;
        self
    }

    pub fn config(&self) -> &MpcConfig {
        &self.config
    }

    /// Arguments:
    /// * `current_temp` - current interior temperature, in deg C
    /// * `weather_forecast` - outdoor temperature per step, in deg C
    /// * `occupancy_forecast` - occupants per step
    /// * `price_forecast` - electricity price per step, in EUR/kWh
    /// * `preferred_setpoint` - target temperature while occupied, in deg C
    /// * `current_hour` - hour of day of the first step
    pub fn optimize(
        &self,
        current_temp: f64,
        weather_forecast: &[f64],
        occupancy_forecast: &[f64],
        price_forecast: &[f64],
        preferred_setpoint: f64,
        current_hour: u32,
    ) -> Result<MpcResult, TwinError> {
        let config = self.config.checked()?;
        self.parameters.checked()?;
        check_scalar("current_temp", current_temp)?;
        check_scalar("preferred_setpoint", preferred_setpoint)?;

        let horizon = weather_forecast
            .len()
            .min(config.horizon_hours)
            .min(occupancy_forecast.len())
            .min(price_forecast.len());
        if horizon == 0 {
            return Err(InputError::EmptyHorizon.into());
        }
        let outdoor_temps = &weather_forecast[..horizon];
        let occupancy = &occupancy_forecast[..horizon];
        let prices = &price_forecast[..horizon];
        check_series("weather_forecast", outdoor_temps, horizon)?;
        check_series("occupancy_forecast", occupancy, horizon)?;
        check_series("price_forecast", prices, horizon)?;

        let problem = HorizonProblem {
            config,
            dynamics: LinearDynamics::from_parameters(&self.parameters, config.step_seconds()),
            current_temp,
            outdoor_temps,
            occupancy,
            prices,
            preferred_setpoint,
        };

        let started = Instant::now();
        let planned = self
            .primary_optimizer()
            .and_then(|optimizer| {
                optimizer
                    .plan(&problem)
                    .map_err(|e| format!("{} optimizer failed: {e}", optimizer.name()))
            });
        let (trajectory, fallback_reason) = match planned {
            Ok(trajectory) => (trajectory, None),
            Err(reason) => {
                warn!(%reason, "Falling back to heuristic optimizer");
                (HeuristicOptimizer::plan_horizon(&problem), Some(reason))
            }
        };
        let solve_time_ms = started.elapsed().as_secs_f64() * 1_000.;

        let result = build_result(&problem, trajectory, fallback_reason, solve_time_ms, current_hour);
        info!(
            status = %result.status,
            horizon = result.horizon_steps,
            cost_savings_percent = result.cost_savings_percent,
            "Optimization complete"
        );

        Ok(result)
    }

    fn primary_optimizer(&self) -> Result<&'static dyn Optimizer, String> {
        if self.heuristic_only {
            return Err("heuristic planning was requested".into());
        }
        qp_optimizer()
    }
}

#[cfg(feature = "clarabel")]
fn qp_optimizer() -> Result<&'static dyn Optimizer, String> {
    Ok(&qp::QpOptimizer)
}

#[cfg(not(feature = "clarabel"))]
fn qp_optimizer() -> Result<&'static dyn Optimizer, String> {
    Err("no QP solver is available in this build".into())
}

fn build_result(
    problem: &HorizonProblem,
    trajectory: Trajectory,
    fallback_reason: Option<String>,
    solve_time_ms: f64,
    current_hour: u32,
) -> MpcResult {
    let config = problem.config;
    let step_hours = config.step_hours();
    let horizon = problem.steps();

    let predicted_energy_kwh = trajectory
        .power_kw
        .iter()
        .map(|&power| electrical_power_kw(power, config.cop_heat, config.cop_cool) * step_hours)
        .collect::<Vec<_>>();
    let total_energy_kwh = predicted_energy_kwh.iter().sum::<f64>();
    let total_cost_eur = predicted_energy_kwh
        .iter()
        .zip(problem.prices)
        .map(|(energy, price)| energy * price)
        .sum::<f64>();

    let baseline_energy_kwh = problem
        .outdoor_temps
        .iter()
        .map(|t_ext| (problem.preferred_setpoint - t_ext).abs() * BASELINE_KW_PER_K / config.cop_cool * step_hours)
        .sum::<f64>();
    let baseline_cost_eur = baseline_energy_kwh * mean_or_zero(problem.prices);
    let cost_savings_percent = if baseline_cost_eur > 0. {
        (baseline_cost_eur - total_cost_eur) / baseline_cost_eur * 100.
    } else {
        0.
    };

    let accumulated_deviation = (0..horizon)
        .filter(|&k| problem.is_occupied(k))
        .map(|k| (trajectory.temps[k + 1] - problem.preferred_setpoint).abs())
        .sum::<f64>();
    let comfort_score = (100. - COMFORT_PENALTY_PER_K * accumulated_deviation).max(0.);

    let optimal_setpoints = (0..horizon)
        .map(|k| {
            let temp = trajectory.temps[k + 1];
            let power = trajectory.power_kw[k];
            let setpoint = if power > SCHEDULE_POWER_THRESHOLD_KW {
                temp + SCHEDULE_SETPOINT_OFFSET_K
            } else if power < -SCHEDULE_POWER_THRESHOLD_KW {
                temp - SCHEDULE_SETPOINT_OFFSET_K
            } else {
                temp
            };
            setpoint.clamp(config.min_temp, config.max_temp)
        })
        .collect::<Vec<_>>();

    let schedule = (0..horizon)
        .map(|k| ScheduleEntry {
            hour: (current_hour + (k as f64 * step_hours).floor() as u32) % HOURS_PER_DAY,
            step: k,
            setpoint: optimal_setpoints[k],
            predicted_temp: trajectory.temps[k + 1],
            predicted_power_kw: trajectory.power_kw[k],
            electricity_price: problem.prices[k],
            occupancy: problem.occupancy[k],
            outdoor_temp: problem.outdoor_temps[k],
        })
        .collect();

    MpcResult {
        optimal_setpoints,
        predicted_temps: trajectory.temps,
        predicted_power_kw: trajectory.power_kw,
        predicted_energy_kwh,
        total_energy_kwh,
        total_cost_eur,
        baseline_energy_kwh,
        baseline_cost_eur,
        cost_savings_percent,
        comfort_score,
        status: trajectory.status,
        fallback_reason,
        solve_time_ms,
        horizon_steps: horizon,
        schedule,
    }
}

/// Optimize the next 24 hours for a registered building using the default summer forecasts.
pub fn quick_optimize(
    registry: &BuildingRegistry,
    building_id: &str,
    current_temp: f64,
    preferred_setpoint: f64,
    current_hour: u32,
) -> Result<MpcResult, TwinError> {
    let parameters = registry.parameters_for(building_id);
    let config = MpcConfig {
        cop_heat: parameters.cop_heat,
        cop_cool: parameters.cop_cool,
        ..Default::default()
    };
    let forecasts = DefaultForecasts::generate(config.horizon_hours, current_hour, Season::Summer);

    MpcController::new(config)
        .with_thermal_parameters(parameters)
        .optimize(
            current_temp,
            &forecasts.weather,
            &forecasts.occupancy,
            &forecasts.prices,
            preferred_setpoint,
            current_hour,
        )
}
