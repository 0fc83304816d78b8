use crate::core::mpc::{HorizonProblem, OptimizationStatus, Optimizer, Trajectory};
use crate::statistics::mean_or_zero;

/// A step is high-price when its price exceeds the horizon mean by this factor
const HIGH_PRICE_FACTOR: f64 = 1.2;
/// Outdoor temperature above which the building is assumed to be in cooling season, in deg C
const COOLING_SEASON_OUTDOOR_TEMP: f64 = 25.0;
const UNOCCUPIED_SETBACK_K: f64 = 2.0;
const PRECONDITION_SHIFT_K: f64 = 1.5;
const HIGH_PRICE_DRIFT_K: f64 = 1.5;
/// Proportional gain of the rule-based controller, in kW per K
const GAIN_KW_PER_K: f64 = 10.0;
const ERROR_BAND_K: f64 = 0.5;
/// Time constant of the single-state proxy model, in s. This is deliberately independent of the
/// building's 2R2C parameters.
const PROXY_TIME_CONSTANT_S: f64 = 10_000.0;
/// Temperature rise per kW of HVAC power per second in the proxy model, in K/(kW s)
const PROXY_CONTROL_INFLUENCE: f64 = 2e-4;
const PROXY_CLAMP_MARGIN_K: f64 = 1.0;

/// Rule-based planner used when no QP solution is available.
///
/// Tracks the preferred setpoint while occupied, sets back while empty, pre-conditions ahead of
/// expensive steps and lets the temperature drift during expensive empty steps. The resulting
/// setpoint error is turned into power by a fixed gain and the temperature is advanced with a
/// single-state exponential decay model.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicOptimizer;

impl HeuristicOptimizer {
    pub fn plan_horizon(problem: &HorizonProblem) -> Trajectory {
        let config = problem.config;
        let steps = problem.steps();
        let high_price_threshold = mean_or_zero(problem.prices) * HIGH_PRICE_FACTOR;
        let is_high_price = |k: usize| problem.prices[k] > high_price_threshold;

        let step_seconds = config.step_seconds();
        let decay = (-step_seconds / PROXY_TIME_CONSTANT_S).exp();

        let mut temps = Vec::with_capacity(steps + 1);
        let mut power_kw = Vec::with_capacity(steps);
        let mut current = problem.current_temp;
        temps.push(current);

        for k in 0..steps {
            let t_ext = problem.outdoor_temps[k];
            let cooling_season = t_ext > COOLING_SEASON_OUTDOOR_TEMP;
            // +1 moves the target in the direction that saves energy this season
            let relax_direction = if cooling_season { 1. } else { -1. };
            let occupied = problem.is_occupied(k);
            let high_price = is_high_price(k);
            let next_high_price = k + 1 < steps && is_high_price(k + 1);

            let mut target = problem.preferred_setpoint;
            if !occupied {
                target += relax_direction * UNOCCUPIED_SETBACK_K;
            }
            if next_high_price && !high_price {
                target -= relax_direction * PRECONDITION_SHIFT_K;
            }
            if high_price && !occupied {
                target += relax_direction * HIGH_PRICE_DRIFT_K;
            }

            let error = target - current;
            let power = if error.abs() > ERROR_BAND_K {
                (error * GAIN_KW_PER_K).clamp(-config.max_cooling_kw, config.max_heating_kw)
            } else {
                0.
            };
            power_kw.push(power);

            let next = decay * current
                + (1. - decay) * t_ext
                + PROXY_CONTROL_INFLUENCE * power * step_seconds;
            current = next.clamp(
                config.min_temp - PROXY_CLAMP_MARGIN_K,
                config.max_temp + PROXY_CLAMP_MARGIN_K,
            );
            temps.push(current);
        }

        Trajectory {
            temps,
            power_kw,
            status: OptimizationStatus::Heuristic,
        }
    }
}

impl Optimizer for HeuristicOptimizer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn plan(&self, problem: &HorizonProblem) -> anyhow::Result<Trajectory> {
        Ok(Self::plan_horizon(problem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mpc::{LinearDynamics, MpcConfig};
    use crate::core::thermal::parameters::ThermalParameters;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn problem<'a>(
        config: &'a MpcConfig,
        current_temp: f64,
        outdoor_temps: &'a [f64],
        occupancy: &'a [f64],
        prices: &'a [f64],
    ) -> HorizonProblem<'a> {
        HorizonProblem {
            config,
            dynamics: LinearDynamics::from_parameters(&ThermalParameters::default(), config.step_seconds()),
            current_temp,
            outdoor_temps,
            occupancy,
            prices,
            preferred_setpoint: 22.,
        }
    }

    #[rstest]
    fn should_hold_still_inside_error_band() {
        let config = MpcConfig::default();
        let trajectory = HeuristicOptimizer
            .plan(&problem(&config, 22.2, &[22.], &[50.], &[0.2]))
            .unwrap();

        assert_eq!(trajectory.power_kw, vec![0.]);
        assert_eq!(trajectory.status, OptimizationStatus::Heuristic);
        assert_relative_eq!(trajectory.temps[1], 22. + 0.2 * (-0.36f64).exp());
    }

    #[rstest]
    fn should_advance_proxy_with_decay_and_control_influence() {
        let config = MpcConfig::default();
        let trajectory = HeuristicOptimizer::plan_horizon(&problem(&config, 21., &[10.], &[50.], &[0.2]));

        // error +1 K at 10 kW/K, held for one hour
        assert_relative_eq!(trajectory.power_kw[0], 10.);
        let decay = (-0.36f64).exp();
        assert_relative_eq!(
            trajectory.temps[1],
            decay * 21. + (1. - decay) * 10. + 2e-4 * 10. * 3_600.,
            max_relative = 1e-12
        );
        assert_relative_eq!(trajectory.temps[1], 24.874_439_6, epsilon = 1e-6);
    }

    #[rstest]
    fn should_cool_towards_setpoint_when_occupied_and_hot() {
        let config = MpcConfig::default();
        let trajectory = HeuristicOptimizer::plan_horizon(&problem(&config, 25., &[30.], &[50.], &[0.2]));

        // error -3 K at 10 kW/K
        assert_relative_eq!(trajectory.power_kw[0], -30.);
        assert!(trajectory.temps[1] <= config.max_temp + 1.);
    }

    #[rstest]
    fn should_set_back_when_unoccupied_and_drift_in_expensive_steps() {
        let config = MpcConfig::default();
        // Cooling season, empty building; second step is expensive
        let trajectory = HeuristicOptimizer::plan_horizon(&problem(
            &config,
            22.,
            &[30., 30.],
            &[0., 0.],
            &[0.1, 0.3],
        ));

        // step 0: setback +2 then pre-cool -1.5 gives target 22.5, inside band
        assert_eq!(trajectory.power_kw[0], 0.);
        // step 1: setback +2 and drift +1.5 gives target 25.5
        let error = 25.5 - trajectory.temps[1];
        if error.abs() > ERROR_BAND_K {
            assert_relative_eq!(trajectory.power_kw[1], error * GAIN_KW_PER_K);
        } else {
            assert_eq!(trajectory.power_kw[1], 0.);
        }
    }

    #[rstest]
    fn should_respect_power_limits() {
        let config = MpcConfig {
            max_heating_kw: 15.,
            ..Default::default()
        };
        let trajectory = HeuristicOptimizer::plan_horizon(&problem(&config, 17., &[5.], &[50.], &[0.2]));
        assert_eq!(trajectory.power_kw[0], 15.);
    }
}
