use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use thiserror::Error;

/// Sparse matrix assembled from (row, column, value) triplets. Repeated entries are summed.
#[derive(Clone, Debug, Default)]
pub(crate) struct TripletMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletMatrix {
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![],
        }
    }

    pub(crate) fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.entries.push((row, col, value));
    }

    /// Compressed sparse column form as (column pointers, row indices, values).
    pub(crate) fn to_csc_parts(&self) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|&(row, col, _)| (col, row));

        let mut colptr = vec![0; self.cols + 1];
        let mut rowval: Vec<usize> = Vec::with_capacity(entries.len());
        let mut nzval: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in entries {
            if last == Some((row, col)) {
                if let Some(previous) = nzval.last_mut() {
                    *previous += value;
                }
                continue;
            }
            rowval.push(row);
            nzval.push(value);
            colptr[col + 1] += 1;
            last = Some((row, col));
        }
        for col in 0..self.cols {
            colptr[col + 1] += colptr[col];
        }

        (colptr, rowval, nzval)
    }

    fn to_csc(&self) -> CscMatrix<f64> {
        let (colptr, rowval, nzval) = self.to_csc_parts();
        CscMatrix::new(self.rows, self.cols, colptr, rowval, nzval)
    }
}

/// Linear constraint rows over a fixed number of variables, each row `a . x (op) b`.
#[derive(Clone, Debug)]
pub(crate) struct ConstraintRows {
    variables: usize,
    coefficients: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
}

impl ConstraintRows {
    pub(crate) fn new(variables: usize) -> Self {
        Self {
            variables,
            coefficients: vec![],
            rhs: vec![],
        }
    }

    pub(crate) fn add(&mut self, coefficients: &[(usize, f64)], rhs: f64) {
        debug_assert!(coefficients.iter().all(|&(col, _)| col < self.variables));
        self.coefficients.push(coefficients.to_vec());
        self.rhs.push(rhs);
    }

    pub(crate) fn len(&self) -> usize {
        self.rhs.len()
    }
}

/// Convex quadratic program
///
/// minimise 0.5 x'Px + q'x subject to `equalities` (a . x = b) and `inequalities` (a . x <= b).
/// Only the upper triangle of `p` is read.
#[derive(Clone, Debug)]
pub(crate) struct QuadraticProgram {
    pub(crate) p: TripletMatrix,
    pub(crate) q: Vec<f64>,
    pub(crate) equalities: ConstraintRows,
    pub(crate) inequalities: ConstraintRows,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum QpStatus {
    Solved,
    AlmostSolved,
}

#[derive(Clone, Debug)]
pub(crate) struct QpSolution {
    pub(crate) x: Vec<f64>,
    pub(crate) status: QpStatus,
}

#[derive(Debug, Error)]
pub(crate) enum QpError {
    #[error("QP solver could not be set up: {0}")]
    Setup(String),
    #[error("QP solver finished with status {0}")]
    NotSolved(String),
}

impl QuadraticProgram {
    pub(crate) fn variables(&self) -> usize {
        self.q.len()
    }

    pub(crate) fn solve(&self) -> Result<QpSolution, QpError> {
        let n = self.variables();
        let m_eq = self.equalities.len();
        let m_ineq = self.inequalities.len();

        let mut a = TripletMatrix::new(m_eq + m_ineq, n);
        for (row, coefficients) in self
            .equalities
            .coefficients
            .iter()
            .chain(self.inequalities.coefficients.iter())
            .enumerate()
        {
            for &(col, value) in coefficients {
                a.push(row, col, value);
            }
        }
        let b = self
            .equalities
            .rhs
            .iter()
            .chain(self.inequalities.rhs.iter())
            .copied()
            .collect::<Vec<_>>();
        let cones = [
            SupportedConeT::ZeroConeT(m_eq),
            SupportedConeT::NonnegativeConeT(m_ineq),
        ];

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .build()
            .map_err(|e| QpError::Setup(e.to_string()))?;
        let mut solver = DefaultSolver::new(&self.p.to_csc(), &self.q, &a.to_csc(), &b, &cones, settings)
            .map_err(|e| QpError::Setup(format!("{e:?}")))?;
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => QpStatus::Solved,
            SolverStatus::AlmostSolved => QpStatus::AlmostSolved,
            other => return Err(QpError::NotSolved(format!("{other:?}"))),
        };
        if solver.solution.x.iter().any(|value| !value.is_finite()) {
            return Err(QpError::NotSolved("non-finite solution".into()));
        }

        Ok(QpSolution {
            x: solver.solution.x.clone(),
            status,
        })
    }
}
