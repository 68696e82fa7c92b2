mod test_utils;

use approx::assert_relative_eq;
use nonsmooth::*;
use test_utils::*;

/// Checks `M z - w = q`, `w ∈ [-b, a]` and the sign conditions of `z` at active bounds.
fn check_relay_solution(problem: &RelayProblem, z: &[f64], w: &[f64], tol: f64) {
    let m = problem.m();
    for i in 0..z.len() {
        let mz = (0..z.len()).map(|j| m[(i, j)] * z[j]).sum::<f64>();
        assert_relative_eq!(mz - w[i], problem.q()[i], epsilon = tol);

        let (a, b) = (problem.a()[i], problem.b()[i]);
        assert!(w[i] <= a + tol && w[i] >= -b - tol);
        if w[i] < a - tol {
            assert!(z[i] >= -tol);
        }
        if w[i] > -b + tol {
            assert!(z[i] <= tol);
        }
    }
}

#[test]
fn zero_is_feasible() -> Result<(), Error> {
    init_logger();
    let problem = RelayProblem::new(
        na::DMatrix::identity(2, 2) * 2.0,
        vec![-1.0, -1.0],
        vec![1.0, 1.0],
        vec![1.0, 1.0],
    )?;
    for id in [SolverId::RelayLatin, SolverId::RelayPgs] {
        let mut builder = SolverOptions::builder(id).max_iter(100);
        if id == SolverId::RelayLatin {
            builder = builder.dparam(DPARAM_K_LATIN, 1.0);
        }
        let mut options = builder.build()?;
        let result = solve_relay(&problem, &mut options)?;
        assert_eq!(result.status, Status::Converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.reaction, vec![0.0, 0.0]);
        assert_eq!(result.velocity, vec![1.0, 1.0]);
        assert_eq!(options.iterations_done(), 0);
        assert_eq!(options.residual(), 0.0);
        check_relay_solution(&problem, &result.reaction, &result.velocity, 1e-12);
    }
    Ok(())
}

#[test]
fn pgs_and_latin_agree() -> Result<(), Error> {
    init_logger();
    let problem = box_relay_problem()?;
    let driver = Driver::relay();

    let mut pgs = SolverOptions::new(SolverId::RelayPgs);
    let mut latin = SolverOptions::new(SolverId::RelayLatin);
    let pgs = driver.solve(&problem, &mut pgs)?;
    let latin = driver.solve(&problem, &mut latin)?;
    assert_eq!(pgs.status, Status::Converged);
    assert_eq!(latin.status, Status::Converged);

    let z = [8.0 / 9.0, -37.0 / 18.0, 7.0 / 9.0];
    let w = [-0.5, 0.5, -1.0];
    compare_vectors(&pgs.reaction, &z, 1e-5);
    compare_vectors(&latin.reaction, &z, 1e-5);
    compare_vectors(&pgs.velocity, &w, 1e-5);
    compare_vectors(&latin.velocity, &w, 1e-5);
    // The linear stage of LATIN satisfies the equation exactly at every iteration.
    check_relay_solution(&problem, &latin.reaction, &latin.velocity, 1e-5);
    Ok(())
}

#[test]
fn random_problems() -> Result<(), Error> {
    init_logger();
    let driver = Driver::relay();
    for seed in 0..5 {
        let problem = random_relay_problem(20, seed)?;
        let pgs = driver.solve(&problem, &mut SolverOptions::new(SolverId::RelayPgs))?;
        let latin = driver.solve(&problem, &mut SolverOptions::new(SolverId::RelayLatin))?;
        assert_eq!(pgs.status, Status::Converged);
        assert_eq!(latin.status, Status::Converged);
        compare_vectors(&pgs.reaction, &latin.reaction, 1e-4);
        check_relay_solution(&problem, &pgs.reaction, &pgs.velocity, 1e-4);
    }
    Ok(())
}

#[test]
fn latin_degenerate_diagonal() -> Result<(), Error> {
    init_logger();
    let problem = box_relay_problem()?;
    let mut options = SolverOptions::builder(SolverId::RelayLatin)
        .dparam(DPARAM_K_LATIN, 0.0)
        .build()?;
    let result = solve_relay(&problem, &mut options)?;
    assert_eq!(result.status, Status::DegenerateInput);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.reaction, vec![0.0; 3]);
    assert_eq!(result.velocity, vec![0.0; 3]);
    Ok(())
}

#[test]
fn latin_diagonal_at_threshold() -> Result<(), Error> {
    init_logger();
    let relay_problem = |m00: f64| {
        RelayProblem::new(
            na::DMatrix::from_diagonal(&na::DVector::from_vec(vec![m00, 2.0])),
            vec![-3.0, 2.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )
    };
    let options = SolverOptions::builder(SolverId::RelayLatin)
        .dparam(DPARAM_K_LATIN, 1.0)
        .build()?;

    // `k_latin * M[0,0]` lands exactly on the threshold.
    let problem = relay_problem(relay::DIAGONAL_THRESHOLD)?;
    let result = solve_relay(&problem, &mut options.clone())?;
    assert_eq!(result.status, Status::DegenerateInput);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.reaction, vec![0.0; 2]);
    assert_eq!(result.velocity, vec![0.0; 2]);

    let problem = relay_problem(2.0 * relay::DIAGONAL_THRESHOLD)?;
    let result = solve_relay(&problem, &mut options.clone())?;
    assert_ne!(result.status, Status::DegenerateInput);
    assert_ne!(result.status, Status::FactorizationFailed);
    Ok(())
}

#[test]
fn latin_indefinite_system() -> Result<(), Error> {
    init_logger();
    let problem = RelayProblem::new(
        na::DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 1.0]),
        vec![3.0, -3.0],
        vec![1.0, 1.0],
        vec![1.0, 1.0],
    )?;
    let mut options = SolverOptions::builder(SolverId::RelayLatin)
        .dparam(DPARAM_K_LATIN, 1.0)
        .build()?;
    let result = solve_relay(&problem, &mut options)?;
    assert_eq!(result.status, Status::FactorizationFailed);
    assert_eq!(result.reaction, vec![0.0; 2]);
    Ok(())
}

#[test]
fn latin_iteration_cap() -> Result<(), Error> {
    init_logger();
    let problem = box_relay_problem()?;
    let mut options = SolverOptions::builder(SolverId::RelayLatin)
        .max_iter(3)
        .tolerance(1e-12)
        .build()?;
    let result = solve_relay(&problem, &mut options)?;
    assert_eq!(result.status, Status::NotConverged);
    assert_eq!(result.iterations, 3);
    assert!(result.residual > 1e-12);
    assert!(result.residual.is_finite());
    assert_eq!(options.iterations_done(), 3);
    // Best effort outputs still satisfy the linear equation.
    let m = problem.m();
    for i in 0..3 {
        let mz = (0..3).map(|j| m[(i, j)] * result.reaction[j]).sum::<f64>();
        assert_relative_eq!(mz - result.velocity[i], problem.q()[i], epsilon = 1e-10);
    }
    Ok(())
}
