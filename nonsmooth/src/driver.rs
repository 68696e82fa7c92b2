//! Algorithm selection.
//!
//! A [`Driver`] owns a registry of algorithms for one problem family and routes each solve
//! to the algorithm named by the configuration tree.

use std::ops::{Deref, DerefMut};

use ahash::AHashMap;
use rayon::prelude::*;

use crate::{
    Error, FrictionContactProblem, GlobalOptions, Problem, RelayProblem, SolveResult, Solver,
    SolverId, SolverOptions, Status,
};

/// Applies global settings to a configuration for as long as it is alive.
struct ScopedOptions<'a> {
    options: &'a mut SolverOptions,
    saved_verbose: u8,
}

impl<'a> ScopedOptions<'a> {
    fn new(options: &'a mut SolverOptions, globals: Option<&GlobalOptions>) -> Self {
        let saved_verbose = options.verbose;
        if let Some(globals) = globals {
            options.verbose = globals.verbose;
        }
        ScopedOptions {
            options,
            saved_verbose,
        }
    }
}

impl Drop for ScopedOptions<'_> {
    fn drop(&mut self) {
        self.options.verbose = self.saved_verbose;
    }
}

impl Deref for ScopedOptions<'_> {
    type Target = SolverOptions;
    fn deref(&self) -> &SolverOptions {
        self.options
    }
}

impl DerefMut for ScopedOptions<'_> {
    fn deref_mut(&mut self) -> &mut SolverOptions {
        self.options
    }
}

/// Dispatches solves of problems of type `P` to registered algorithms.
pub struct Driver<P> {
    registry: AHashMap<SolverId, Box<dyn Solver<P>>>,
}

impl<P: Problem> Default for Driver<P> {
    fn default() -> Self {
        Driver::new()
    }
}

impl Driver<FrictionContactProblem> {
    /// A driver with every frictional contact algorithm registered.
    pub fn friction_contact() -> Self {
        let mut driver = Driver::new();
        for solver in crate::friction::solvers() {
            driver.register(solver);
        }
        driver
    }
}

impl Driver<RelayProblem> {
    /// A driver with every relay algorithm registered.
    pub fn relay() -> Self {
        let mut driver = Driver::new();
        for solver in crate::relay::solvers() {
            driver.register(solver);
        }
        driver
    }
}

impl<P: Problem> Driver<P> {
    /// Creates a driver with an empty registry.
    pub fn new() -> Self {
        Driver {
            registry: AHashMap::default(),
        }
    }

    /// Registers an algorithm under its own identifier, returning any algorithm it replaces.
    pub fn register(&mut self, solver: Box<dyn Solver<P>>) -> Option<Box<dyn Solver<P>>> {
        self.registry.insert(solver.id(), solver)
    }

    pub fn is_registered(&self, id: SolverId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Solves `problem` with the algorithm configured by `options`.
    ///
    /// Missing parameters are filled with defaults first. The output fields of `options`
    /// receive the number of iterations and the final residual.
    pub fn solve(&self, problem: &P, options: &mut SolverOptions) -> Result<SolveResult, Error> {
        self.solve_with_globals(problem, options, None)
    }

    /// Same as [`Driver::solve`], with global settings overriding those of the top level
    /// configuration node for the duration of the call.
    pub fn solve_with_globals(
        &self,
        problem: &P,
        options: &mut SolverOptions,
        globals: Option<&GlobalOptions>,
    ) -> Result<SolveResult, Error> {
        let mut options = ScopedOptions::new(options, globals);

        options.fill_defaults();
        options.validate()?;

        let id = options.solver_id;
        let solver = self
            .registry
            .get(&id)
            .ok_or_else(|| Error::UnregisteredSolver {
                id,
                family: problem.family(),
            })?;
        solver.check_problem(problem)?;

        let n = problem.size();
        let mut reaction = vec![0.0; n];
        let mut velocity = vec![0.0; n];

        if problem.trivial_solution(&mut reaction, &mut velocity) {
            if options.verbose > 0 {
                log::info!("{}: trivial solution", id);
            }
            options.record(0, 0.0);
            return Ok(SolveResult {
                reaction,
                velocity,
                status: Status::Converged,
                iterations: 0,
                residual: 0.0,
            });
        }

        if options.verbose > 0 {
            log::info!("{}: solving a problem of size {}", id, n);
        }
        let outcome = solver.solve(problem, &mut reaction, &mut velocity, &options)?;
        options.record(outcome.iterations, outcome.residual);

        Ok(SolveResult {
            reaction,
            velocity,
            status: outcome.status,
            iterations: outcome.iterations,
            residual: outcome.residual,
        })
    }

    /// Solves independent problems in parallel.
    ///
    /// Each problem is solved with its own copy of the configuration. Results are returned in
    /// the order of `items`.
    pub fn solve_batch(&self, items: &[(P, SolverOptions)]) -> Vec<Result<SolveResult, Error>> {
        items
            .par_iter()
            .map(|(problem, options)| {
                let mut options = options.clone();
                self.solve(problem, &mut options)
            })
            .collect()
    }
}

/// Solves a frictional contact problem with the default registry.
pub fn solve_friction_contact(
    problem: &FrictionContactProblem,
    options: &mut SolverOptions,
) -> Result<SolveResult, Error> {
    Driver::friction_contact().solve(problem, options)
}

/// Solves a relay problem with the default registry.
pub fn solve_relay(
    problem: &RelayProblem,
    options: &mut SolverOptions,
) -> Result<SolveResult, Error> {
    Driver::relay().solve(problem, options)
}
