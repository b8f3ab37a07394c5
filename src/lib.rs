//! Multi-Truck VRP Solver Library
//!
//! Assigns weighted delivery orders to a fleet of capacity- and stop-limited
//! trucks and sequences each truck's visits into a depot-anchored route,
//! minimizing first the number of trucks used and second the total travel
//! distance.
//!
//! # Features
//!
//! - Instance normalization and validation (orders, fleet, distance matrix)
//! - Solver-agnostic MILP construction: arc/assignment/activation variables,
//!   MTZ subtour elimination, activation symmetry breaking, lexicographic
//!   big-M objective
//! - Exact solving through Gurobi (`gurobi` feature, `grb` crate)
//! - Route extraction with full invariant verification
//! - Greedy fallback router (first-fit bin-pack + nearest-neighbour + 2-opt)
//!
//! # Example
//!
//! ```
//! use fleet_vrp_solver::{DistanceMatrix, FleetConfig, Optimizer, OrderRecord, VrpInstance};
//!
//! let orders = vec![
//!     OrderRecord::lbs("A", 500.0),
//!     OrderRecord::lbs("B", 300.0),
//!     OrderRecord::lbs("C", 400.0),
//! ];
//! let matrix = DistanceMatrix::from_rows(vec![
//!     vec![0.0, 10.0, 15.0, 20.0],
//!     vec![10.0, 0.0, 8.0, 12.0],
//!     vec![15.0, 8.0, 0.0, 6.0],
//!     vec![20.0, 12.0, 6.0, 0.0],
//! ]);
//!
//! let instance = VrpInstance::new(orders, FleetConfig::new(2, 3, 1000.0), matrix).unwrap();
//! let solution = Optimizer::new().optimize(&instance).unwrap();
//!
//! // 1200 lb of orders cannot fit one 1000 lb truck
//! assert_eq!(solution.trucks_used, 2);
//! println!("{}", solution);
//! ```

pub mod extract;
pub mod heuristic;
pub mod instance;
pub mod model;
pub mod optimizer;
pub mod solution;
pub mod solver;

pub use instance::{DistanceMatrix, FleetConfig, OrderRecord, VrpInstance, WeightUnit};
pub use optimizer::{Error, Optimizer};
pub use solution::{FleetSolution, ShipmentType, TruckRoute};
pub use solver::{SolveConfig, SolveStatus};
