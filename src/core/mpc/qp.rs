use crate::core::mpc::{HorizonProblem, OptimizationStatus, Optimizer, Trajectory};
use crate::core::solvers::{ConstraintRows, QpStatus, QuadraticProgram, TripletMatrix};

/// Column layout of the decision vector: temperatures T[0..=N], heating power Qh[0..N],
/// cooling power Qc[0..N] and comfort slack s[0..N]. Power is in kW and both parts are
/// non-negative, so net thermal power is Qh - Qc.
#[derive(Clone, Copy, Debug)]
struct Layout {
    steps: usize,
}

impl Layout {
    fn temp(&self, k: usize) -> usize {
        k
    }

    fn heating(&self, k: usize) -> usize {
        self.steps + 1 + k
    }

    fn cooling(&self, k: usize) -> usize {
        2 * self.steps + 1 + k
    }

    fn slack(&self, k: usize) -> usize {
        3 * self.steps + 1 + k
    }

    fn variables(&self) -> usize {
        4 * self.steps + 1
    }

    /// Coefficients of the net power change Q[k+1] - Q[k].
    fn power_change(&self, k: usize) -> [(usize, f64); 4] {
        [
            (self.heating(k + 1), 1.),
            (self.cooling(k + 1), -1.),
            (self.heating(k), -1.),
            (self.cooling(k), 1.),
        ]
    }
}

/// Plans the horizon as a convex quadratic program solved with Clarabel.
///
/// Objective: energy cost of heating and cooling (each through its own COP), plus the weighted
/// comfort slack, plus the weighted sum of squared power changes between steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct QpOptimizer;

impl QpOptimizer {
    fn program(problem: &HorizonProblem) -> QuadraticProgram {
        let config = problem.config;
        let steps = problem.steps();
        let layout = Layout { steps };
        let n = layout.variables();
        let step_hours = config.step_hours();
        let dynamics = problem.dynamics;

        let mut q = vec![0.; n];
        for k in 0..steps {
            let energy_price = config.energy_weight * problem.prices[k] * step_hours;
            q[layout.heating(k)] = energy_price / config.cop_heat;
            q[layout.cooling(k)] = energy_price / config.cop_cool;
            q[layout.slack(k)] = config.comfort_weight;
        }

        // ramp_weight * sum (d_k . x)^2 == 0.5 x' P x with P = 2 ramp_weight sum d_k d_k'
        let mut p = TripletMatrix::new(n, n);
        for k in 0..steps.saturating_sub(1) {
            let change = layout.power_change(k);
            for &(row, row_value) in &change {
                for &(col, col_value) in &change {
                    if row <= col {
                        p.push(row, col, 2. * config.ramp_weight * row_value * col_value);
                    }
                }
            }
        }

        let mut equalities = ConstraintRows::new(n);
        equalities.add(&[(layout.temp(0), 1.)], problem.current_temp);
        for k in 0..steps {
            equalities.add(
                &[
                    (layout.temp(k + 1), 1.),
                    (layout.temp(k), -dynamics.a),
                    (layout.heating(k), -dynamics.c),
                    (layout.cooling(k), dynamics.c),
                ],
                dynamics.b * problem.outdoor_temps[k],
            );
        }

        let mut inequalities = ConstraintRows::new(n);
        let (hard_min, hard_max) = problem.hard_bounds();
        for k in 0..steps {
            let temp = layout.temp(k + 1);
            let slack = layout.slack(k);
            let (comfort_min, comfort_max) = problem.comfort_bounds(k);

            inequalities.add(&[(temp, -1.), (slack, -1.)], -comfort_min);
            inequalities.add(&[(temp, 1.), (slack, -1.)], comfort_max);
            inequalities.add(&[(temp, -1.)], -hard_min);
            inequalities.add(&[(temp, 1.)], hard_max);
            inequalities.add(&[(slack, -1.)], 0.);
            inequalities.add(&[(layout.heating(k), -1.)], 0.);
            inequalities.add(&[(layout.heating(k), 1.)], config.max_heating_kw);
            inequalities.add(&[(layout.cooling(k), -1.)], 0.);
            inequalities.add(&[(layout.cooling(k), 1.)], config.max_cooling_kw);
        }
        for k in 0..steps.saturating_sub(1) {
            let change = layout.power_change(k);
            inequalities.add(&change, config.ramp_limit_kw);
            inequalities.add(&change.map(|(col, value)| (col, -value)), config.ramp_limit_kw);
        }

        QuadraticProgram {
            p,
            q,
            equalities,
            inequalities,
        }
    }
}

impl Optimizer for QpOptimizer {
    fn name(&self) -> &'static str {
        "qp"
    }

    fn plan(&self, problem: &HorizonProblem) -> anyhow::Result<Trajectory> {
        let layout = Layout {
            steps: problem.steps(),
        };
        let solution = Self::program(problem).solve()?;

        let temps = (0..=layout.steps)
            .map(|k| solution.x[layout.temp(k)])
            .collect();
        let power_kw = (0..layout.steps)
            .map(|k| solution.x[layout.heating(k)] - solution.x[layout.cooling(k)])
            .collect();
        let status = match solution.status {
            QpStatus::Solved => OptimizationStatus::Optimal,
            QpStatus::AlmostSolved => OptimizationStatus::OptimalInaccurate,
        };

        Ok(Trajectory {
            temps,
            power_kw,
            status,
        })
    }
}
