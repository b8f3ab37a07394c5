//! MILP model construction for the multi-truck VRP.
//!
//! The formulation assigns orders to trucks and sequences each truck's stops
//! in a single mixed-integer program:
//!
//! - `x[i,j,k]` binary — truck k travels arc (i -> j), nodes 0 = depot,
//!   1..=n = delivery stops.
//! - `y[i,k]` binary — stop i is served by truck k.
//! - `z[k]` binary — truck k is activated.
//! - `u[i,k]` continuous in [0, n] — position of node i in truck k's route
//!   (MTZ subtour elimination).
//!
//! Objective (lexicographic via big-M weighting):
//!
//! ```text
//! min  BIG_M * sum_k z[k]  +  sum_{i!=j,k} d[i][j] * x[i,j,k]
//! ```
//!
//! BIG_M strictly exceeds the total distance of any feasible solution, so the
//! solver first minimizes the truck count and then the travel distance within
//! that count.
//!
//! Constraints:
//!
//! ```text
//! C1.  sum_k y[i,k] = 1                        for each stop i
//! C2.  sum_j x[0,j,k] = z[k]                   for each k (depot egress)
//! C3.  sum_i x[i,0,k] = z[k]                   for each k (depot ingress)
//! C4.  sum_i y[i,k] <= max_stops               for each k
//! C5.  sum_i w[i]*y[i,k] <= max_load_lbs       for each k
//! C6.  y[i,k] <= z[k]                          for each stop i, k
//! C7.  sum_j x[j,i,k] = y[i,k]  and
//!      sum_j x[i,j,k] = y[i,k]                 for each stop i, k (flow)
//! C8.  u[i,k] - u[j,k] + n*x[i,j,k] <= n-1     for stops i != j, each k (MTZ)
//! C9.  u[0,k] = 0                              for each k (depot anchor)
//! C10. z[k] >= z[k+1]                          for k < num_trucks (symmetry)
//! ```
//!
//! The model is emitted into a solver-agnostic [`MilpModel`] so that the
//! solving backend stays swappable.

use crate::instance::VrpInstance;

/// Handle to a variable inside a [`MilpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarType {
    Binary,
    Continuous { lb: f64, ub: f64 },
}

/// A declared decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub vtype: VarType,
}

/// Linear expression as (variable, coefficient) terms.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        LinExpr { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        LinExpr { terms: Vec::with_capacity(capacity) }
    }

    /// Append `coef * var` to the expression.
    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Coefficient of `var`, summing repeated terms
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.iter().filter(|(v, _)| *v == var).map(|(_, c)| c).sum()
    }

    /// Evaluate against a dense value vector indexed by variable id
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.index()]).sum()
    }
}

impl FromIterator<(VarId, f64)> for LinExpr {
    fn from_iter<T: IntoIterator<Item = (VarId, f64)>>(iter: T) -> Self {
        LinExpr { terms: iter.into_iter().collect() }
    }
}

/// Constraint direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstrSense {
    Eq,
    Le,
    Ge,
}

/// A linear constraint `expr <sense> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub sense: ConstrSense,
    pub rhs: f64,
}

/// Solver-agnostic MILP: declared variables, linear constraints, and a
/// linear objective to be minimized. Built once, then handed read-only to a
/// solving backend.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl MilpModel {
    pub fn new() -> Self {
        MilpModel::default()
    }

    pub fn add_binary(&mut self, name: String) -> VarId {
        self.variables.push(Variable { name, vtype: VarType::Binary });
        VarId(self.variables.len() - 1)
    }

    pub fn add_continuous(&mut self, name: String, lb: f64, ub: f64) -> VarId {
        self.variables.push(Variable { name, vtype: VarType::Continuous { lb, ub } });
        VarId(self.variables.len() - 1)
    }

    pub fn add_constr(&mut self, name: String, expr: LinExpr, sense: ConstrSense, rhs: f64) {
        self.constraints.push(Constraint { name, expr, sense, rhs });
    }

    /// Set the minimization objective.
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// Lookup table from (node, truck) coordinates to variable handles.
#[derive(Debug, Clone)]
pub struct FleetVars {
    x: std::collections::HashMap<(usize, usize, usize), VarId>,
    y: std::collections::HashMap<(usize, usize), VarId>,
    z: Vec<VarId>,
    u: std::collections::HashMap<(usize, usize), VarId>,
}

impl FleetVars {
    /// Arc variable: truck `k` travels `i -> j`. Panics on i == j, which has
    /// no variable.
    #[inline]
    pub fn x(&self, i: usize, j: usize, k: usize) -> VarId {
        self.x[&(i, j, k)]
    }

    /// Assignment variable: stop `i` served by truck `k`
    #[inline]
    pub fn y(&self, i: usize, k: usize) -> VarId {
        self.y[&(i, k)]
    }

    /// Activation variable for truck `k` (1-based)
    #[inline]
    pub fn z(&self, k: usize) -> VarId {
        self.z[k - 1]
    }

    /// Position variable for node `i` on truck `k`
    #[inline]
    pub fn u(&self, i: usize, k: usize) -> VarId {
        self.u[&(i, k)]
    }
}

/// Raised when capacity arithmetic proves the instance unsatisfiable before
/// any solver is invoked.
#[derive(Debug, Clone, PartialEq)]
pub enum InfeasibleError {
    /// num_trucks * max_stops cannot cover all delivery stops
    NotEnoughStopCapacity { num_stops: usize, num_trucks: usize, max_stops: usize },
    /// num_trucks * max_load_lbs cannot cover the total order weight
    NotEnoughLoadCapacity { total_weight_lbs: f64, num_trucks: usize, max_load_lbs: f64 },
}

impl std::fmt::Display for InfeasibleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibleError::NotEnoughStopCapacity { num_stops, num_trucks, max_stops } => {
                write!(
                    f,
                    "{} trucks x {} stops cannot serve {} delivery stops",
                    num_trucks, max_stops, num_stops
                )
            }
            InfeasibleError::NotEnoughLoadCapacity {
                total_weight_lbs,
                num_trucks,
                max_load_lbs,
            } => {
                write!(
                    f,
                    "{} trucks x {} lb cannot carry {} lb of orders",
                    num_trucks, max_load_lbs, total_weight_lbs
                )
            }
        }
    }
}

impl std::error::Error for InfeasibleError {}

/// The built model together with its variable handles and the big-M weight
/// used in the objective.
#[derive(Debug, Clone)]
pub struct FleetModel {
    pub model: MilpModel,
    pub vars: FleetVars,
    pub big_m: f64,
}

/// Emits the complete MILP for a [`VrpInstance`].
pub struct FleetModelBuilder;

impl FleetModelBuilder {
    /// Build the model, failing fast when the fleet provably cannot serve
    /// the order set.
    pub fn build(instance: &VrpInstance) -> Result<FleetModel, InfeasibleError> {
        let n = instance.num_stops();
        let fleet = instance.fleet();

        if fleet.num_trucks * fleet.max_stops < n {
            return Err(InfeasibleError::NotEnoughStopCapacity {
                num_stops: n,
                num_trucks: fleet.num_trucks,
                max_stops: fleet.max_stops,
            });
        }
        let total_weight = instance.total_weight_lbs();
        if fleet.num_trucks as f64 * fleet.max_load_lbs < total_weight {
            return Err(InfeasibleError::NotEnoughLoadCapacity {
                total_weight_lbs: total_weight,
                num_trucks: fleet.num_trucks,
                max_load_lbs: fleet.max_load_lbs,
            });
        }

        let big_m = Self::big_m(instance);
        let mut model = MilpModel::new();

        // ---- Variables ------------------------------------------------
        let mut x = std::collections::HashMap::new();
        let mut y = std::collections::HashMap::new();
        let mut z = Vec::with_capacity(fleet.num_trucks);
        let mut u = std::collections::HashMap::new();

        for k in instance.trucks() {
            for i in instance.nodes() {
                for j in instance.nodes() {
                    if i != j {
                        let var = model.add_binary(format!("x_{}_{}_{}", i, j, k));
                        x.insert((i, j, k), var);
                    }
                }
            }
        }
        for i in instance.stops() {
            for k in instance.trucks() {
                let var = model.add_binary(format!("y_{}_{}", i, k));
                y.insert((i, k), var);
            }
        }
        for k in instance.trucks() {
            z.push(model.add_binary(format!("z_{}", k)));
        }
        for i in instance.nodes() {
            for k in instance.trucks() {
                let var = model.add_continuous(format!("u_{}_{}", i, k), 0.0, n as f64);
                u.insert((i, k), var);
            }
        }

        let vars = FleetVars { x, y, z, u };

        // ---- Objective ------------------------------------------------
        let mut objective = LinExpr::new();
        for k in instance.trucks() {
            objective.add_term(vars.z(k), big_m);
        }
        for k in instance.trucks() {
            for i in instance.nodes() {
                for j in instance.nodes() {
                    if i != j {
                        objective.add_term(vars.x(i, j, k), instance.distance(i, j));
                    }
                }
            }
        }
        model.set_objective(objective);

        // ---- Constraints ----------------------------------------------
        // C1: every order served exactly once
        for i in instance.stops() {
            let expr = instance.trucks().map(|k| (vars.y(i, k), 1.0)).collect();
            model.add_constr(format!("serve_{}", i), expr, ConstrSense::Eq, 1.0);
        }

        for k in instance.trucks() {
            // C2: truck departs depot iff activated
            let mut egress: LinExpr = instance.stops().map(|j| (vars.x(0, j, k), 1.0)).collect();
            egress.add_term(vars.z(k), -1.0);
            model.add_constr(format!("dep_out_{}", k), egress, ConstrSense::Eq, 0.0);

            // C3: truck returns to depot iff activated
            let mut ingress: LinExpr = instance.stops().map(|i| (vars.x(i, 0, k), 1.0)).collect();
            ingress.add_term(vars.z(k), -1.0);
            model.add_constr(format!("dep_ret_{}", k), ingress, ConstrSense::Eq, 0.0);

            // C4: stop limit
            let expr = instance.stops().map(|i| (vars.y(i, k), 1.0)).collect();
            model.add_constr(
                format!("maxstops_{}", k),
                expr,
                ConstrSense::Le,
                fleet.max_stops as f64,
            );

            // C5: weight limit
            let expr = instance
                .stops()
                .map(|i| (vars.y(i, k), instance.weight_lbs(i)))
                .collect();
            model.add_constr(format!("weight_{}", k), expr, ConstrSense::Le, fleet.max_load_lbs);

            // C6: only deliver on active trucks
            for i in instance.stops() {
                let mut expr = LinExpr::with_capacity(2);
                expr.add_term(vars.y(i, k), 1.0);
                expr.add_term(vars.z(k), -1.0);
                model.add_constr(format!("active_{}_{}", i, k), expr, ConstrSense::Le, 0.0);
            }

            // C9: depot position anchor (MTZ reference)
            let mut expr = LinExpr::with_capacity(1);
            expr.add_term(vars.u(0, k), 1.0);
            model.add_constr(format!("depot_pos_{}", k), expr, ConstrSense::Eq, 0.0);
        }

        // C7: flow conservation at delivery stops (in = out = assignment)
        for i in instance.stops() {
            for k in instance.trucks() {
                let mut inbound: LinExpr = instance
                    .nodes()
                    .filter(|&j| j != i)
                    .map(|j| (vars.x(j, i, k), 1.0))
                    .collect();
                inbound.add_term(vars.y(i, k), -1.0);
                model.add_constr(format!("arrive_{}_{}", i, k), inbound, ConstrSense::Eq, 0.0);

                let mut outbound: LinExpr = instance
                    .nodes()
                    .filter(|&j| j != i)
                    .map(|j| (vars.x(i, j, k), 1.0))
                    .collect();
                outbound.add_term(vars.y(i, k), -1.0);
                model.add_constr(format!("depart_{}_{}", i, k), outbound, ConstrSense::Eq, 0.0);
            }
        }

        // C8: MTZ subtour elimination over delivery stops
        for i in instance.stops() {
            for j in instance.stops() {
                if i != j {
                    for k in instance.trucks() {
                        let mut expr = LinExpr::with_capacity(3);
                        expr.add_term(vars.u(i, k), 1.0);
                        expr.add_term(vars.u(j, k), -1.0);
                        expr.add_term(vars.x(i, j, k), n as f64);
                        model.add_constr(
                            format!("mtz_{}_{}_{}", i, j, k),
                            expr,
                            ConstrSense::Le,
                            n as f64 - 1.0,
                        );
                    }
                }
            }
        }

        // C10: symmetry breaking, fill trucks by increasing index
        for k in 1..fleet.num_trucks {
            let mut expr = LinExpr::with_capacity(2);
            expr.add_term(vars.z(k), 1.0);
            expr.add_term(vars.z(k + 1), -1.0);
            model.add_constr(format!("sym_{}", k), expr, ConstrSense::Ge, 0.0);
        }

        log::debug!(
            "built fleet model: {} variables, {} constraints, big_m = {}",
            model.num_variables(),
            model.num_constraints(),
            big_m
        );

        Ok(FleetModel { model, vars, big_m })
    }

    /// Big-M weight for the truck-count term: strictly larger than
    /// num_trucks * n * max(d), an upper bound on any feasible total distance.
    pub fn big_m(instance: &VrpInstance) -> f64 {
        (instance.fleet().num_trucks * instance.num_stops()) as f64 * instance.max_distance() + 1.0
    }
}
