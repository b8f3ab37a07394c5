//! Gurobi backend for the solver adapter.
//!
//! Marshals a solver-agnostic [`MilpModel`] into a Gurobi model via the `grb`
//! crate, runs the solve under the configured limits, and reads the raw
//! variable assignment back. No modeling decisions are made here.

use super::{Assignment, MilpSolver, SolveConfig, SolveResult, SolveStatus, SolverError};
use crate::model::{ConstrSense, MilpModel, VarType};
use grb::prelude::*;

/// Gurobi-based MILP solver. Requires the `gurobi` feature and a Gurobi
/// licence at runtime.
#[derive(Debug, Default)]
pub struct GurobiSolver {
    _private: (),
}

impl GurobiSolver {
    pub fn new() -> Self {
        GurobiSolver { _private: () }
    }

    pub fn available() -> bool {
        true
    }
}

impl MilpSolver for GurobiSolver {
    fn solve(&self, ir: &MilpModel, config: &SolveConfig) -> Result<SolveResult, SolverError> {
        let env = Env::new("")
            .map_err(|e| SolverError::Backend(format!("failed to create environment: {}", e)))?;

        let mut model = Model::with_env("fleet_vrp", env)
            .map_err(|e| SolverError::Backend(format!("failed to create model: {}", e)))?;

        model
            .set_param(param::TimeLimit, config.time_limit)
            .map_err(|e| SolverError::Backend(format!("failed to set time limit: {}", e)))?;
        model
            .set_param(param::MIPGap, config.mip_gap)
            .map_err(|e| SolverError::Backend(format!("failed to set MIP gap: {}", e)))?;
        model
            .set_param(param::Threads, config.threads)
            .map_err(|e| SolverError::Backend(format!("failed to set threads: {}", e)))?;
        if !config.verbose {
            model
                .set_param(param::OutputFlag, 0)
                .map_err(|e| SolverError::Backend(format!("failed to set output flag: {}", e)))?;
        }

        // Declare variables in VarId order so assignments line up with the IR
        let mut vars: Vec<Var> = Vec::with_capacity(ir.num_variables());
        for variable in ir.variables() {
            let var = match variable.vtype {
                VarType::Binary => add_binvar!(model, name: &variable.name),
                VarType::Continuous { lb, ub } => {
                    add_ctsvar!(model, name: &variable.name, bounds: lb..ub)
                }
            }
            .map_err(|e| {
                SolverError::Backend(format!("failed to add variable {}: {}", variable.name, e))
            })?;
            vars.push(var);
        }

        model
            .update()
            .map_err(|e| SolverError::Backend(format!("failed to update model: {}", e)))?;

        for constr in ir.constraints() {
            let lhs: Expr = constr
                .expr
                .terms()
                .iter()
                .map(|&(vid, coef)| coef * vars[vid.index()])
                .grb_sum();
            let result = match constr.sense {
                ConstrSense::Eq => model.add_constr(&constr.name, c!(lhs == constr.rhs)),
                ConstrSense::Le => model.add_constr(&constr.name, c!(lhs <= constr.rhs)),
                ConstrSense::Ge => model.add_constr(&constr.name, c!(lhs >= constr.rhs)),
            };
            result.map_err(|e| {
                SolverError::Backend(format!("failed to add constraint {}: {}", constr.name, e))
            })?;
        }

        let objective: Expr = ir
            .objective()
            .terms()
            .iter()
            .map(|&(vid, coef)| coef * vars[vid.index()])
            .grb_sum();
        model
            .set_objective(objective, Minimize)
            .map_err(|e| SolverError::Backend(format!("failed to set objective: {}", e)))?;

        model
            .optimize()
            .map_err(|e| SolverError::Backend(format!("optimization failed: {}", e)))?;

        let status = model
            .status()
            .map_err(|e| SolverError::Backend(format!("failed to get status: {}", e)))?;
        let sol_count: i32 = model
            .get_attr(attr::SolCount)
            .map_err(|e| SolverError::Backend(format!("failed to get solution count: {}", e)))?;

        let solve_status = match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::TimeLimit => SolveStatus::TimedOut,
            Status::Infeasible => SolveStatus::Infeasible,
            Status::Unbounded | Status::InfOrUnbd => SolveStatus::Unbounded,
            _ if sol_count > 0 => {
                let gap = model.get_attr(attr::MIPGap).unwrap_or(1.0);
                SolveStatus::Feasible { gap }
            }
            other => {
                return Err(SolverError::Backend(format!(
                    "solver stopped without a solution: {:?}",
                    other
                )))
            }
        };

        let (assignment, objective) = if solve_status.has_solution() && sol_count > 0 {
            let mut values = Vec::with_capacity(vars.len());
            for var in &vars {
                let v = model.get_obj_attr(attr::X, var).map_err(|e| {
                    SolverError::Backend(format!("failed to read variable value: {}", e))
                })?;
                values.push(v);
            }
            let obj = model
                .get_attr(attr::ObjVal)
                .map_err(|e| SolverError::Backend(format!("failed to read objective: {}", e)))?;
            (Some(Assignment::new(values)), Some(obj))
        } else {
            (None, None)
        };

        log::info!(
            "gurobi finished: status {}, {} incumbent(s)",
            solve_status,
            sol_count
        );

        Ok(SolveResult { status: solve_status, assignment, objective })
    }

    fn name(&self) -> &str {
        "gurobi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{DistanceMatrix, FleetConfig, OrderRecord, VrpInstance};
    use crate::model::FleetModelBuilder;

    // Needs a Gurobi licence; run with
    //   cargo test --features gurobi -- --ignored
    #[test]
    #[ignore]
    fn test_solves_worked_example_to_two_trucks() {
        let orders = vec![
            OrderRecord::lbs("A", 500.0),
            OrderRecord::lbs("B", 300.0),
            OrderRecord::lbs("C", 400.0),
        ];
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 10.0, 15.0, 20.0],
            vec![10.0, 0.0, 8.0, 12.0],
            vec![15.0, 8.0, 0.0, 6.0],
            vec![20.0, 12.0, 6.0, 0.0],
        ]);
        let instance =
            VrpInstance::new(orders, FleetConfig::new(2, 3, 1000.0), matrix).unwrap();
        let built = FleetModelBuilder::build(&instance).unwrap();

        let result = GurobiSolver::new()
            .solve(&built.model, &SolveConfig::default())
            .unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);

        let assignment = result.assignment.unwrap();
        let trucks_used: usize = instance
            .trucks()
            .filter(|&k| assignment.is_active(built.vars.z(k)))
            .count();
        assert_eq!(trucks_used, 2);
    }
}
