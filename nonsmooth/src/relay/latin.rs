use super::{project_on_box, DIAGONAL_THRESHOLD};
use crate::linalg::DenseCholesky;
use crate::{
    Error, Outcome, RelayProblem, Solver, SolverId, SolverOptions, Status, DPARAM_K_LATIN,
};

/// Parameters for the LATIN method.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatinParams {
    pub max_iter: u32,
    pub tolerance: f64,
    /// Search direction scale. The search direction matrix is `k_latin * diag(M)`.
    pub k_latin: f64,
    pub verbose: u8,
}

impl From<&SolverOptions> for LatinParams {
    fn from(options: &SolverOptions) -> Self {
        LatinParams {
            max_iter: options.max_iter(),
            tolerance: options.tolerance(),
            k_latin: options.dparam[DPARAM_K_LATIN],
            verbose: options.verbose,
        }
    }
}

/// Buffers used by one LATIN solve.
struct LatinWorkspace {
    /// Diagonal of the search direction.
    k: Vec<f64>,
    /// Local stage iterates.
    zc: Vec<f64>,
    wc: Vec<f64>,
    /// Local stage predictor.
    zt: Vec<f64>,
}

impl LatinWorkspace {
    fn new(n: usize) -> Self {
        LatinWorkspace {
            k: vec![0.0; n],
            zc: vec![0.0; n],
            wc: vec![0.0; n],
            zt: vec![0.0; n],
        }
    }
}

/// Solves a relay problem with the LATIN (LArge Time INcrement) method.
///
/// The method alternates between a linear stage, which satisfies `M z - w = q` exactly using a
/// Cholesky factorization of `Mᵗ + K`, and a local stage, which satisfies the box constraints
/// exactly. Here `K = k_latin * diag(M)` is the search direction.
///
/// On success `z` and `w` hold the last linear stage iterate. Early aborts leave them zeroed.
pub fn latin(problem: &RelayProblem, z: &mut [f64], w: &mut [f64], params: &LatinParams) -> Outcome {
    let n = z.len();
    let m = problem.m();
    let q = problem.q();
    let (a, b) = (problem.a(), problem.b());

    z.iter_mut().for_each(|x| *x = 0.0);
    w.iter_mut().for_each(|x| *x = 0.0);

    let mut ws = LatinWorkspace::new(n);

    for (i, k) in ws.k.iter_mut().enumerate() {
        *k = params.k_latin * m[(i, i)];
    }
    if let Some(i) = ws.k.iter().position(|k| k.abs() <= DIAGONAL_THRESHOLD) {
        log::warn!("LATIN: vanishing search direction at index {}", i);
        return Outcome::aborted(Status::DegenerateInput);
    }

    let mut mtx = m.transpose();
    for (i, &k) in ws.k.iter().enumerate() {
        mtx[(i, i)] += k;
    }
    let chol = match DenseCholesky::new(mtx) {
        Ok(chol) => chol,
        Err(err) => {
            log::warn!("LATIN: {}", err);
            return Outcome::aborted(Status::from(err));
        }
    };

    let LatinWorkspace { k, zc, wc, zt } = &mut ws;

    let mut iterations = 0;
    let mut err = 1.0;
    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;

        // Linear stage.
        for (wc, &k, &zc) in utils::zip!(wc.iter_mut(), k.iter(), zc.iter()) {
            *wc += k * zc;
        }
        for (z, &q, &wc) in utils::zip!(z.iter_mut(), q.iter(), wc.iter()) {
            *z = q + wc;
        }
        chol.solve_in_place(z);
        for (w, &wc, &k, &z) in utils::zip!(w.iter_mut(), wc.iter(), k.iter(), z.iter()) {
            *w = wc - k * z;
        }

        // Local stage.
        for (zt, &w, &k, &z) in utils::zip!(zt.iter_mut(), w.iter(), k.iter(), z.iter()) {
            *zt = w - k * z;
        }
        for i in 0..n {
            wc[i] = project_on_box(zt[i], a[i], b[i]);
            zc[i] = (wc[i] - zt[i]) / k[i];
        }

        err = latin_error(z, w, zc, wc, k);

        if params.verbose > 1 {
            log::debug!("LATIN iteration {}: error = {:e}", iterations, err);
        }
    }

    let status = Status::from_error(err, params.tolerance);
    if params.verbose > 0 {
        log::info!(
            "LATIN: {:?} after {} iterations, error = {:e}",
            status,
            iterations,
            err
        );
    }
    Outcome {
        status,
        iterations,
        residual: err,
    }
}

/// Relative gap between the linear and local stage iterates, measured in the norm induced by
/// the search direction.
fn latin_error(z: &[f64], w: &[f64], zc: &[f64], wc: &[f64], k: &[f64]) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for (&z, &w, &zc, &wc, &k) in utils::zip!(z.iter(), w.iter(), zc.iter(), wc.iter(), k.iter()) {
        let kinv = 1.0 / k;
        let gap = (w - wc) + k * (z - zc);
        num += kinv * gap * gap;
        den += kinv * (w + wc) * (w + wc) + k * (z + zc) * (z + zc);
    }
    if den > 0.0 {
        (num / den).sqrt()
    } else {
        num.sqrt()
    }
}

/// LATIN method for relay problems.
#[derive(Copy, Clone, Debug, Default)]
pub struct LatinSolver;

impl Solver<RelayProblem> for LatinSolver {
    fn id(&self) -> SolverId {
        SolverId::RelayLatin
    }

    fn solve(
        &self,
        problem: &RelayProblem,
        reaction: &mut [f64],
        velocity: &mut [f64],
        options: &SolverOptions,
    ) -> Result<Outcome, Error> {
        Ok(latin(problem, reaction, velocity, &LatinParams::from(options)))
    }
}
