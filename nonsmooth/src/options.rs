//! Solver configuration trees.
//!
//! A [`SolverOptions`] node stores its parameters in two positional arrays, `iparam` and
//! `dparam`. The offsets below are a stable contract: configuration files and nested solvers
//! rely on them, and each node is always interpreted by the algorithm it is tagged with, never
//! by its parent.
//!
//! | offset | `iparam`                          | `dparam`                                |
//! |--------|-----------------------------------|-----------------------------------------|
//! | 0      | maximum number of iterations      | tolerance                               |
//! | 1      | iterations performed (output)     | final residual (output)                 |
//! | 2      | error evaluation strategy         | step size `ρ` (or `k_latin` for LATIN)  |
//! | 3      | line search iteration cap         | relaxation `ω`                          |
//! | 4      | internal tolerance policy         | step shrink factor `τ`                  |
//! | 5      |                                   | line search / step control coefficient  |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

pub const IPARAM_MAX_ITER: usize = 0;
pub const IPARAM_ITER_DONE: usize = 1;
pub const IPARAM_ERROR_EVALUATION: usize = 2;
pub const IPARAM_LINE_SEARCH_MAX_ITER: usize = 3;
pub const IPARAM_INTERNAL_TOLERANCE_POLICY: usize = 4;
pub const IPARAM_LEN: usize = 5;

pub const DPARAM_TOL: usize = 0;
pub const DPARAM_RESIDU: usize = 1;
pub const DPARAM_RHO: usize = 2;
pub const DPARAM_K_LATIN: usize = 2;
pub const DPARAM_RELAXATION: usize = 3;
pub const DPARAM_LS_TAU: usize = 4;
pub const DPARAM_LS_COEFF: usize = 5;
pub const DPARAM_LEN: usize = 6;

/// The class of problems an algorithm is written for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Box constrained ("dual relay") problems.
    Relay,
    /// Two dimensional frictional contact.
    FrictionContact2D,
    /// Three dimensional frictional contact.
    FrictionContact3D,
    /// Single contact sub-problems. These are only used as internal solvers.
    OneContact,
}

/// Identifiers of every algorithm known to the engine.
///
/// The numeric codes and names are versioned and must not be reused. Configuration files
/// refer to algorithms by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverId {
    #[serde(rename = "DR_PGS")]
    RelayPgs,
    #[serde(rename = "DR_LATIN")]
    RelayLatin,
    #[serde(rename = "F2D_NSGS")]
    Fc2dNsgs,
    #[serde(rename = "F3D_NSGS")]
    Fc3dNsgs,
    #[serde(rename = "F3D_TFP")]
    Fc3dTrescaFixedPoint,
    #[serde(rename = "F3D_DeSaxceFixedPoint")]
    Fc3dDeSaxceFixedPoint,
    #[serde(rename = "F3D_FixedPointProjection")]
    Fc3dFixedPointProjection,
    #[serde(rename = "F3D_ExtraGradient")]
    Fc3dExtraGradient,
    #[serde(rename = "F3D_HyperplaneProjection")]
    Fc3dHyperplaneProjection,
    #[serde(rename = "F3D_ProjectionOnCone")]
    OneContactProjectionOnCone,
    #[serde(rename = "F3D_ProjectionOnConeWithLocalIteration")]
    OneContactProjectionOnConeWithLocalIteration,
    #[serde(rename = "F3D_projectionOnCylinder")]
    OneContactProjectionOnCylinder,
    #[serde(rename = "F3D_LOCAL_NSN_AC")]
    OneContactNsnAlartCurnier,
}

impl SolverId {
    pub const ALL: [SolverId; 13] = [
        SolverId::RelayPgs,
        SolverId::RelayLatin,
        SolverId::Fc2dNsgs,
        SolverId::Fc3dNsgs,
        SolverId::Fc3dTrescaFixedPoint,
        SolverId::Fc3dDeSaxceFixedPoint,
        SolverId::Fc3dFixedPointProjection,
        SolverId::Fc3dExtraGradient,
        SolverId::Fc3dHyperplaneProjection,
        SolverId::OneContactProjectionOnCone,
        SolverId::OneContactProjectionOnConeWithLocalIteration,
        SolverId::OneContactProjectionOnCylinder,
        SolverId::OneContactNsnAlartCurnier,
    ];

    pub fn code(self) -> i32 {
        match self {
            SolverId::RelayPgs => 300,
            SolverId::RelayLatin => 301,
            SolverId::Fc2dNsgs => 400,
            SolverId::Fc3dNsgs => 500,
            SolverId::Fc3dTrescaFixedPoint => 501,
            SolverId::Fc3dDeSaxceFixedPoint => 502,
            SolverId::Fc3dFixedPointProjection => 503,
            SolverId::Fc3dExtraGradient => 504,
            SolverId::Fc3dHyperplaneProjection => 505,
            SolverId::OneContactProjectionOnCone => 550,
            SolverId::OneContactProjectionOnConeWithLocalIteration => 551,
            SolverId::OneContactProjectionOnCylinder => 552,
            SolverId::OneContactNsnAlartCurnier => 553,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverId::RelayPgs => "DR_PGS",
            SolverId::RelayLatin => "DR_LATIN",
            SolverId::Fc2dNsgs => "F2D_NSGS",
            SolverId::Fc3dNsgs => "F3D_NSGS",
            SolverId::Fc3dTrescaFixedPoint => "F3D_TFP",
            SolverId::Fc3dDeSaxceFixedPoint => "F3D_DeSaxceFixedPoint",
            SolverId::Fc3dFixedPointProjection => "F3D_FixedPointProjection",
            SolverId::Fc3dExtraGradient => "F3D_ExtraGradient",
            SolverId::Fc3dHyperplaneProjection => "F3D_HyperplaneProjection",
            SolverId::OneContactProjectionOnCone => "F3D_ProjectionOnCone",
            SolverId::OneContactProjectionOnConeWithLocalIteration => {
                "F3D_ProjectionOnConeWithLocalIteration"
            }
            SolverId::OneContactProjectionOnCylinder => "F3D_projectionOnCylinder",
            SolverId::OneContactNsnAlartCurnier => "F3D_LOCAL_NSN_AC",
        }
    }

    /// Looks up an identifier by its numeric code.
    pub fn from_code(code: i32) -> Result<SolverId, Error> {
        SolverId::ALL
            .iter()
            .copied()
            .find(|id| id.code() == code)
            .ok_or_else(|| Error::UnknownSolver {
                id: code.to_string(),
            })
    }

    pub fn family(self) -> Family {
        match self {
            SolverId::RelayPgs | SolverId::RelayLatin => Family::Relay,
            SolverId::Fc2dNsgs => Family::FrictionContact2D,
            SolverId::Fc3dNsgs
            | SolverId::Fc3dTrescaFixedPoint
            | SolverId::Fc3dDeSaxceFixedPoint
            | SolverId::Fc3dFixedPointProjection
            | SolverId::Fc3dExtraGradient
            | SolverId::Fc3dHyperplaneProjection => Family::FrictionContact3D,
            SolverId::OneContactProjectionOnCone
            | SolverId::OneContactProjectionOnConeWithLocalIteration
            | SolverId::OneContactProjectionOnCylinder
            | SolverId::OneContactNsnAlartCurnier => Family::OneContact,
        }
    }

    /// Whether `dparam[DPARAM_RHO]` is a step size of this algorithm.
    fn uses_step_size(self) -> bool {
        matches!(
            self,
            SolverId::Fc3dDeSaxceFixedPoint
                | SolverId::Fc3dFixedPointProjection
                | SolverId::Fc3dExtraGradient
                | SolverId::Fc3dHyperplaneProjection
                | SolverId::OneContactProjectionOnConeWithLocalIteration
        )
    }

    /// Whether `dparam[DPARAM_LS_TAU]` shrinks a step during a search.
    fn uses_step_shrink(self) -> bool {
        matches!(
            self,
            SolverId::Fc3dFixedPointProjection
                | SolverId::Fc3dExtraGradient
                | SolverId::Fc3dHyperplaneProjection
                | SolverId::OneContactProjectionOnConeWithLocalIteration
                | SolverId::OneContactNsnAlartCurnier
        )
    }

    /// Identifiers accepted as the internal solver of this algorithm.
    ///
    /// `None` means the algorithm does not take an internal solver at all.
    pub fn allowed_internal_solvers(self) -> Option<&'static [SolverId]> {
        match self {
            SolverId::Fc3dNsgs => Some(&[
                SolverId::OneContactProjectionOnCone,
                SolverId::OneContactProjectionOnConeWithLocalIteration,
                SolverId::OneContactProjectionOnCylinder,
                SolverId::OneContactNsnAlartCurnier,
            ]),
            SolverId::Fc3dTrescaFixedPoint => Some(&[SolverId::Fc3dNsgs]),
            _ => None,
        }
    }

    /// The internal solver tree built by default for composite algorithms.
    fn default_internal_solver(self) -> Option<SolverOptions> {
        match self {
            SolverId::Fc3dNsgs => Some(SolverOptions::new(
                SolverId::OneContactProjectionOnConeWithLocalIteration,
            )),
            SolverId::Fc3dTrescaFixedPoint => {
                let mut nsgs = SolverOptions::new(SolverId::Fc3dNsgs);
                nsgs.internal_solver = Some(Box::new(SolverOptions::new(
                    SolverId::OneContactProjectionOnCylinder,
                )));
                Some(nsgs)
            }
            _ => None,
        }
    }

    /// Default parameter arrays for this algorithm.
    fn default_params(self) -> ([i32; IPARAM_LEN], [f64; DPARAM_LEN]) {
        // max_iter, iter_done, error evaluation, line search cap, internal tolerance policy
        let global_iparam = [1000, 0, 0, 20, 0];
        // tol, residual, rho, omega, tau, coeff
        let global_dparam = [1e-6, 0.0, 1.0, 1.0, 2.0 / 3.0, 0.9];
        let local_iparam = [100, 0, 0, 20, 0];
        let local_dparam = [1e-12, 0.0, 1.0, 1.0, 2.0 / 3.0, 0.9];

        match self {
            SolverId::RelayLatin => {
                let mut dparam = global_dparam;
                dparam[DPARAM_K_LATIN] = 0.3;
                (global_iparam, dparam)
            }
            SolverId::Fc3dNsgs => {
                let mut iparam = global_iparam;
                iparam[IPARAM_ERROR_EVALUATION] = ErrorEvaluation::Light as i32;
                (iparam, global_dparam)
            }
            SolverId::Fc3dTrescaFixedPoint => {
                let mut iparam = global_iparam;
                iparam[IPARAM_MAX_ITER] = 100;
                iparam[IPARAM_INTERNAL_TOLERANCE_POLICY] = 1;
                (iparam, global_dparam)
            }
            SolverId::Fc3dHyperplaneProjection => {
                let mut dparam = global_dparam;
                dparam[DPARAM_LS_TAU] = 0.6;
                (global_iparam, dparam)
            }
            SolverId::OneContactNsnAlartCurnier => {
                let mut iparam = local_iparam;
                iparam[IPARAM_MAX_ITER] = 50;
                let mut dparam = local_dparam;
                dparam[DPARAM_LS_TAU] = 0.5;
                dparam[DPARAM_LS_COEFF] = 1e-4;
                (iparam, dparam)
            }
            _ if self.family() == Family::OneContact => (local_iparam, local_dparam),
            _ => (global_iparam, global_dparam),
        }
    }
}

impl fmt::Display for SolverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SolverId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolverId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| Error::UnknownSolver { id: s.to_string() })
    }
}

/// How Gauss-Seidel methods measure progress after each sweep.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorEvaluation {
    /// Evaluate the full problem error after every sweep.
    Full = 0,
    /// Check the relative increment first and only evaluate the full error once the increment
    /// is below tolerance.
    Light = 1,
}

impl From<i32> for ErrorEvaluation {
    fn from(v: i32) -> Self {
        if v == ErrorEvaluation::Light as i32 {
            ErrorEvaluation::Light
        } else {
            ErrorEvaluation::Full
        }
    }
}

/// Settings shared by every solve call made by one caller.
///
/// When passed to the driver, these override the corresponding fields of the top level
/// [`SolverOptions`] for the duration of the call only.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub verbose: u8,
}

/// A node in a solver configuration tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Algorithm configured by this node.
    pub solver_id: SolverId,
    /// Set once the parameters have been filled in and the tree validated.
    pub is_set: bool,
    /// Verbosity: 0 is silent, 1 reports the outcome of a solve and 2 reports every iteration.
    pub verbose: u8,
    pub iparam: Vec<i32>,
    pub dparam: Vec<f64>,
    /// Configuration of the internal solver used by composite algorithms.
    pub internal_solver: Option<Box<SolverOptions>>,
}

impl SolverOptions {
    /// Creates a fully populated configuration for the given algorithm, including the default
    /// internal solver tree for composite algorithms.
    pub fn new(solver_id: SolverId) -> SolverOptions {
        let mut options = SolverOptions::uninitialized(solver_id);
        options.fill_defaults();
        options
    }

    /// Creates an empty configuration.
    ///
    /// The parameters are filled in with defaults by the driver on first use.
    pub fn uninitialized(solver_id: SolverId) -> SolverOptions {
        SolverOptions {
            solver_id,
            is_set: false,
            verbose: 0,
            iparam: Vec::new(),
            dparam: Vec::new(),
            internal_solver: None,
        }
    }

    /// Builds a configuration from the positional legacy representation.
    pub fn from_legacy(
        solver_code: i32,
        iparam: Vec<i32>,
        dparam: Vec<f64>,
        internal_solver: Option<SolverOptions>,
    ) -> Result<SolverOptions, Error> {
        let mut options = SolverOptions {
            solver_id: SolverId::from_code(solver_code)?,
            is_set: true,
            verbose: 0,
            iparam,
            dparam,
            internal_solver: internal_solver.map(Box::new),
        };
        options.fill_defaults();
        options.validate()?;
        Ok(options)
    }

    pub fn builder(solver_id: SolverId) -> SolverOptionsBuilder {
        SolverOptionsBuilder::new(solver_id)
    }

    /// Fills in default parameters for every node of the tree that was not set yet.
    ///
    /// Nodes that are already set keep their parameters, but their internal solvers are
    /// still visited. Calling this more than once has no further effect.
    pub fn fill_defaults(&mut self) {
        if !self.is_set {
            let (iparam, dparam) = self.solver_id.default_params();
            self.iparam = iparam.to_vec();
            self.dparam = dparam.to_vec();
            if self.internal_solver.is_none() {
                self.internal_solver = self.solver_id.default_internal_solver().map(Box::new);
            }
            self.is_set = true;
        }
        if let Some(internal) = self.internal_solver.as_mut() {
            internal.fill_defaults();
        }
    }

    /// Checks the shape of the whole configuration tree.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_node(None)
    }

    fn validate_node(&self, parent: Option<SolverId>) -> Result<(), Error> {
        let invalid = |reason: String| Error::InvalidConfiguration {
            id: self.solver_id,
            reason,
        };

        if self.iparam.len() != IPARAM_LEN {
            return Err(invalid(format!(
                "expected {} integer parameters, found {}",
                IPARAM_LEN,
                self.iparam.len()
            )));
        }
        if self.dparam.len() != DPARAM_LEN {
            return Err(invalid(format!(
                "expected {} real parameters, found {}",
                DPARAM_LEN,
                self.dparam.len()
            )));
        }
        if self.iparam[IPARAM_MAX_ITER] < 0 {
            return Err(invalid("negative iteration cap".to_string()));
        }
        if !(self.dparam[DPARAM_TOL] >= 0.0) {
            return Err(invalid("tolerance must be non-negative".to_string()));
        }
        if self.solver_id.uses_step_size() && !(self.dparam[DPARAM_RHO] > 0.0) {
            return Err(invalid(format!(
                "step size must be positive, got {}",
                self.dparam[DPARAM_RHO]
            )));
        }
        if self.solver_id.uses_step_shrink() {
            let tau = self.dparam[DPARAM_LS_TAU];
            if !(tau > 0.0 && tau < 1.0) {
                return Err(invalid(format!(
                    "step shrink factor must lie in (0, 1), got {}",
                    tau
                )));
            }
        }

        if self.solver_id == SolverId::OneContactProjectionOnCylinder
            && parent != Some(SolverId::Fc3dTrescaFixedPoint)
        {
            return Err(invalid(
                "projection on cylinder needs thresholds from a Tresca fixed point".to_string(),
            ));
        }

        match (
            self.solver_id.allowed_internal_solvers(),
            self.internal_solver.as_deref(),
        ) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(invalid("does not take an internal solver".to_string())),
            (Some(_), None) => Err(invalid("missing internal solver".to_string())),
            (Some(allowed), Some(internal)) => {
                if !allowed.contains(&internal.solver_id) {
                    return Err(invalid(format!(
                        "{} is not a valid internal solver",
                        internal.solver_id
                    )));
                }
                if self.solver_id == SolverId::Fc3dNsgs
                    && parent == Some(SolverId::Fc3dTrescaFixedPoint)
                    && internal.solver_id != SolverId::OneContactProjectionOnCylinder
                {
                    return Err(invalid(
                        "a Tresca fixed point needs cylinder projections".to_string(),
                    ));
                }
                // Thresholds are threaded through the Gauss-Seidel layer, so the grandparent
                // is what matters for the cylinder projection.
                let inherited = if self.solver_id == SolverId::Fc3dTrescaFixedPoint {
                    Some(SolverId::Fc3dTrescaFixedPoint)
                } else {
                    parent
                };
                internal.validate_node(inherited)
            }
        }
    }

    pub fn internal_solver(&self) -> Result<&SolverOptions, Error> {
        self.internal_solver
            .as_deref()
            .ok_or_else(|| Error::InvalidConfiguration {
                id: self.solver_id,
                reason: "missing internal solver".to_string(),
            })
    }

    pub fn max_iter(&self) -> u32 {
        self.iparam[IPARAM_MAX_ITER].max(0) as u32
    }

    pub fn tolerance(&self) -> f64 {
        self.dparam[DPARAM_TOL]
    }

    /// Number of iterations performed by the last solve.
    pub fn iterations_done(&self) -> u32 {
        self.iparam[IPARAM_ITER_DONE].max(0) as u32
    }

    /// Residual reached by the last solve.
    pub fn residual(&self) -> f64 {
        self.dparam[DPARAM_RESIDU]
    }

    /// Writes the output fields.
    pub(crate) fn record(&mut self, iterations: u32, residual: f64) {
        self.iparam[IPARAM_ITER_DONE] = i32::try_from(iterations).unwrap_or(i32::MAX);
        self.dparam[DPARAM_RESIDU] = residual;
    }
}

/// Builds a validated [`SolverOptions`] tree.
#[derive(Clone, Debug)]
pub struct SolverOptionsBuilder {
    options: SolverOptions,
}

impl SolverOptionsBuilder {
    pub fn new(solver_id: SolverId) -> Self {
        SolverOptionsBuilder {
            options: SolverOptions::new(solver_id),
        }
    }

    pub fn max_iter(mut self, max_iter: u32) -> Self {
        self.options.iparam[IPARAM_MAX_ITER] = i32::try_from(max_iter).unwrap_or(i32::MAX);
        self
    }

    pub fn tolerance(mut self, tol: f64) -> Self {
        self.options.dparam[DPARAM_TOL] = tol;
        self
    }

    pub fn verbose(mut self, verbose: u8) -> Self {
        self.options.verbose = verbose;
        self
    }

    /// Sets an integer parameter at the given offset.
    ///
    /// # Panics
    ///
    /// This function panics if `offset` is not a valid integer parameter offset.
    pub fn iparam(mut self, offset: usize, value: i32) -> Self {
        self.options.iparam[offset] = value;
        self
    }

    /// Sets a real parameter at the given offset.
    ///
    /// # Panics
    ///
    /// This function panics if `offset` is not a valid real parameter offset.
    pub fn dparam(mut self, offset: usize, value: f64) -> Self {
        self.options.dparam[offset] = value;
        self
    }

    /// Replaces the internal solver configuration.
    pub fn internal_solver(mut self, internal: SolverOptions) -> Self {
        self.options.internal_solver = Some(Box::new(internal));
        self
    }

    pub fn build(mut self) -> Result<SolverOptions, Error> {
        self.options.fill_defaults();
        self.options.validate()?;
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_names_round_trip() -> Result<(), Error> {
        for id in SolverId::ALL.iter().copied() {
            assert_eq!(SolverId::from_code(id.code())?, id);
            assert_eq!(id.name().parse::<SolverId>()?, id);
        }
        Ok(())
    }

    #[test]
    fn unknown_identifiers() {
        assert!(matches!(
            SolverId::from_code(9999),
            Err(Error::UnknownSolver { .. })
        ));
        assert!(matches!(
            "F3D_DOES_NOT_EXIST".parse::<SolverId>(),
            Err(Error::UnknownSolver { .. })
        ));
    }

    #[test]
    fn default_trees_are_valid() -> Result<(), Error> {
        for id in SolverId::ALL.iter().copied() {
            if id == SolverId::OneContactProjectionOnCylinder {
                continue;
            }
            SolverOptions::new(id).validate()?;
        }

        let tfp = SolverOptions::new(SolverId::Fc3dTrescaFixedPoint);
        let nsgs = tfp.internal_solver()?;
        assert_eq!(nsgs.solver_id, SolverId::Fc3dNsgs);
        assert_eq!(
            nsgs.internal_solver()?.solver_id,
            SolverId::OneContactProjectionOnCylinder
        );
        Ok(())
    }

    #[test]
    fn fill_defaults_is_idempotent() {
        let mut options = SolverOptions::uninitialized(SolverId::RelayLatin);
        options.fill_defaults();
        options.dparam[DPARAM_K_LATIN] = 2.0;
        options.fill_defaults();
        assert_eq!(options.dparam[DPARAM_K_LATIN], 2.0);
        assert_eq!(options, {
            let mut expected = SolverOptions::new(SolverId::RelayLatin);
            expected.dparam[DPARAM_K_LATIN] = 2.0;
            expected
        });
    }

    #[test]
    fn nested_defaults_are_filled_lazily() -> Result<(), Error> {
        let mut options = SolverOptions::new(SolverId::Fc3dNsgs);
        options.internal_solver = Some(Box::new(SolverOptions::uninitialized(
            SolverId::OneContactNsnAlartCurnier,
        )));
        options.dparam[DPARAM_RELAXATION] = 0.9;
        options.fill_defaults();
        options.validate()?;
        assert_eq!(options.dparam[DPARAM_RELAXATION], 0.9);
        assert_eq!(
            *options.internal_solver()?,
            SolverOptions::new(SolverId::OneContactNsnAlartCurnier)
        );

        // Two levels down, below a Tresca fixed point.
        let mut nsgs = SolverOptions::new(SolverId::Fc3dNsgs);
        nsgs.internal_solver = Some(Box::new(SolverOptions::uninitialized(
            SolverId::OneContactProjectionOnCylinder,
        )));
        let tfp = SolverOptions::builder(SolverId::Fc3dTrescaFixedPoint)
            .internal_solver(nsgs)
            .build()?;
        assert!(tfp.internal_solver()?.internal_solver()?.is_set);
        Ok(())
    }

    #[test]
    fn step_controls_are_checked() -> Result<(), Error> {
        for id in [
            SolverId::Fc3dDeSaxceFixedPoint,
            SolverId::Fc3dFixedPointProjection,
            SolverId::Fc3dExtraGradient,
            SolverId::Fc3dHyperplaneProjection,
        ] {
            let res = SolverOptions::builder(id).dparam(DPARAM_RHO, 0.0).build();
            assert!(matches!(res, Err(Error::InvalidConfiguration { .. })));
        }
        for id in [
            SolverId::Fc3dFixedPointProjection,
            SolverId::Fc3dExtraGradient,
            SolverId::Fc3dHyperplaneProjection,
        ] {
            for tau in [0.0, 1.0, f64::NAN] {
                let res = SolverOptions::builder(id).dparam(DPARAM_LS_TAU, tau).build();
                assert!(matches!(res, Err(Error::InvalidConfiguration { .. })));
            }
        }
        let mut newton = SolverOptions::new(SolverId::OneContactNsnAlartCurnier);
        newton.dparam[DPARAM_LS_TAU] = 1.5;
        let res = SolverOptions::builder(SolverId::Fc3dNsgs)
            .internal_solver(newton)
            .build();
        assert!(matches!(res, Err(Error::InvalidConfiguration { .. })));

        // The relay LATIN method reads the same slot as `k_latin`.
        SolverOptions::builder(SolverId::RelayLatin)
            .dparam(DPARAM_K_LATIN, 0.0)
            .build()?;
        Ok(())
    }

    #[test]
    fn tree_shape_is_checked_at_build_time() {
        // A composite algorithm with a child it cannot use.
        let res = SolverOptions::builder(SolverId::Fc3dNsgs)
            .internal_solver(SolverOptions::new(SolverId::RelayPgs))
            .build();
        assert!(matches!(res, Err(Error::InvalidConfiguration { .. })));

        // A leaf algorithm with a child.
        let res = SolverOptions::builder(SolverId::RelayLatin)
            .internal_solver(SolverOptions::new(SolverId::RelayPgs))
            .build();
        assert!(matches!(res, Err(Error::InvalidConfiguration { .. })));

        // Cylinder projections need Tresca thresholds.
        let mut nsgs = SolverOptions::new(SolverId::Fc3dNsgs);
        nsgs.internal_solver = Some(Box::new(SolverOptions::new(
            SolverId::OneContactProjectionOnCylinder,
        )));
        assert!(matches!(
            nsgs.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn legacy_arrays() -> Result<(), Error> {
        let options = SolverOptions::from_legacy(
            SolverId::RelayLatin.code(),
            vec![100, 0, 0, 0, 0],
            vec![1e-8, 0.0, 1.0, 1.0, 0.5, 0.9],
            None,
        )?;
        assert_eq!(options.solver_id, SolverId::RelayLatin);
        assert_eq!(options.max_iter(), 100);
        assert_eq!(options.tolerance(), 1e-8);

        let short = SolverOptions::from_legacy(
            SolverId::RelayLatin.code(),
            vec![100],
            vec![1e-8],
            None,
        );
        assert!(matches!(short, Err(Error::InvalidConfiguration { .. })));

        let unknown = SolverOptions::from_legacy(42, vec![0; 5], vec![0.0; 6], None);
        assert!(matches!(unknown, Err(Error::UnknownSolver { .. })));
        Ok(())
    }
}
