//! Optimization pipeline: model build, exact solve, extraction, and the
//! heuristic fallback.
//!
//! Solver selection mirrors a two-tier setup: the Gurobi MILP path is tried
//! first (when compiled in), and the greedy router takes over when no solver
//! backend is available or the backend itself fails. Solver-reported
//! infeasibility is a legitimate outcome and is returned as a structured
//! result, not an error.

use crate::extract::{extract_solution, ExtractionError};
use crate::heuristic::{GreedyRouter, HeuristicError};
use crate::instance::{ValidationError, VrpInstance};
use crate::model::{FleetModelBuilder, InfeasibleError};
use crate::solution::FleetSolution;
use crate::solver::{GurobiSolver, MilpSolver, SolveConfig, SolveStatus, SolverError};

/// Any failure the pipeline can surface.
#[derive(Debug)]
pub enum Error {
    Validation(ValidationError),
    Infeasible(InfeasibleError),
    Solver(SolverError),
    Extraction(ExtractionError),
    Heuristic(HeuristicError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "validation failed: {}", e),
            Error::Infeasible(e) => write!(f, "instance is infeasible by construction: {}", e),
            Error::Solver(e) => write!(f, "solve failed: {}", e),
            Error::Extraction(e) => write!(f, "solution extraction failed: {}", e),
            Error::Heuristic(e) => write!(f, "heuristic routing failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(e) => Some(e),
            Error::Infeasible(e) => Some(e),
            Error::Solver(e) => Some(e),
            Error::Extraction(e) => Some(e),
            Error::Heuristic(e) => Some(e),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<InfeasibleError> for Error {
    fn from(e: InfeasibleError) -> Self {
        Error::Infeasible(e)
    }
}

impl From<SolverError> for Error {
    fn from(e: SolverError) -> Self {
        Error::Solver(e)
    }
}

impl From<ExtractionError> for Error {
    fn from(e: ExtractionError) -> Self {
        Error::Extraction(e)
    }
}

impl From<HeuristicError> for Error {
    fn from(e: HeuristicError) -> Self {
        Error::Heuristic(e)
    }
}

/// End-to-end fleet optimizer.
pub struct Optimizer {
    pub solve_config: SolveConfig,
    /// Fall back to the greedy router when the exact path is unavailable
    pub fallback: bool,
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer { solve_config: SolveConfig::default(), fallback: true }
    }

    pub fn with_config(solve_config: SolveConfig) -> Self {
        Optimizer { solve_config, fallback: true }
    }

    /// Build the MILP, solve it, and extract routes. When the solver backend
    /// is unavailable or errors and `fallback` is set, the greedy router
    /// produces the solution instead.
    pub fn optimize(&self, instance: &VrpInstance) -> Result<FleetSolution, Error> {
        let built = FleetModelBuilder::build(instance)?;
        let solver = GurobiSolver::new();

        match solver.solve(&built.model, &self.solve_config) {
            Ok(result) => {
                if result.assignment.is_some() {
                    Ok(extract_solution(instance, &built, &result, solver.name())?)
                } else {
                    // infeasible / unbounded / timed out with no incumbent
                    Ok(empty_solution(result.status, solver.name()))
                }
            }
            Err(err) if self.fallback => {
                log::info!("exact solve unavailable ({}), using greedy fallback", err);
                Ok(GreedyRouter::new().route(instance)?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_solution(status: SolveStatus, solver_name: &str) -> FleetSolution {
    FleetSolution {
        routes: Vec::new(),
        status,
        objective_value: f64::INFINITY,
        trucks_used: 0,
        total_distance: 0.0,
        solver: solver_name.to_string(),
    }
}
