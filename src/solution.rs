//! Solution representation for the multi-truck VRP.
//!
//! A [`FleetSolution`] holds one depot-anchored route per activated truck
//! plus the objective breakdown reported to downstream consumers.

use crate::solver::SolveStatus;
use serde::{Deserialize, Serialize};

/// Below this total weight a multi-stop truck ships as less-than-truckload.
pub const LTL_MAX_LBS: f64 = 18_000.0;

/// Conventional full-truckload weight cap.
pub const TL_MAX_LBS: f64 = 45_000.0;

/// Freight classification of a single truck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentType {
    /// Single delivery stop
    Individual,
    /// Less-than-truckload
    Ltl,
    /// Full truckload
    Tl,
}

impl ShipmentType {
    pub fn classify(total_weight_lbs: f64, num_stops: usize) -> Self {
        if num_stops == 1 {
            ShipmentType::Individual
        } else if total_weight_lbs < LTL_MAX_LBS {
            ShipmentType::Ltl
        } else {
            ShipmentType::Tl
        }
    }
}

impl std::fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipmentType::Individual => write!(f, "Individual"),
            ShipmentType::Ltl => write!(f, "LTL"),
            ShipmentType::Tl => write!(f, "TL"),
        }
    }
}

/// One activated truck's route and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckRoute {
    /// Truck slot index (1-based)
    pub truck_index: usize,
    /// Visited nodes, starting and ending at the depot (node 0)
    pub node_sequence: Vec<usize>,
    /// Order ids in delivery order
    pub order_ids: Vec<String>,
    /// Total load in pounds
    pub total_weight_lbs: f64,
    /// Closed-tour travel distance
    pub total_distance: f64,
    pub shipment_type: ShipmentType,
}

impl TruckRoute {
    /// Number of delivery stops (depot visits excluded)
    pub fn num_stops(&self) -> usize {
        self.node_sequence.len().saturating_sub(2)
    }
}

/// Complete solver output: routes, status, and objective breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSolution {
    /// One route per activated truck, ordered by truck index
    pub routes: Vec<TruckRoute>,
    pub status: SolveStatus,
    /// Raw objective value (big-M truck term + distance term)
    pub objective_value: f64,
    pub trucks_used: usize,
    /// Sum of per-truck travel distances
    pub total_distance: f64,
    /// Solving path that produced this solution
    pub solver: String,
}

impl FleetSolution {
    /// All delivery nodes across routes, in visit order per truck
    pub fn served_nodes(&self) -> Vec<usize> {
        self.routes
            .iter()
            .flat_map(|r| r.node_sequence.iter().filter(|&&n| n != 0).cloned())
            .collect()
    }

    pub fn route_for_truck(&self, truck_index: usize) -> Option<&TruckRoute> {
        self.routes.iter().find(|r| r.truck_index == truck_index)
    }
}

impl std::fmt::Display for FleetSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fleet solution ({})", self.solver)?;
        writeln!(f, "  Status: {}", self.status)?;
        writeln!(f, "  Trucks used: {}", self.trucks_used)?;
        writeln!(f, "  Total distance: {:.2}", self.total_distance)?;
        for route in &self.routes {
            writeln!(
                f,
                "  Truck {} [{}]: {:?}  ({:.1} lb, {:.2} distance)",
                route.truck_index,
                route.shipment_type,
                route.node_sequence,
                route.total_weight_lbs,
                route.total_distance
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_solution() -> FleetSolution {
        FleetSolution {
            routes: vec![
                TruckRoute {
                    truck_index: 1,
                    node_sequence: vec![0, 1, 2, 0],
                    order_ids: vec!["A".to_string(), "B".to_string()],
                    total_weight_lbs: 800.0,
                    total_distance: 33.0,
                    shipment_type: ShipmentType::Ltl,
                },
                TruckRoute {
                    truck_index: 2,
                    node_sequence: vec![0, 3, 0],
                    order_ids: vec!["C".to_string()],
                    total_weight_lbs: 400.0,
                    total_distance: 40.0,
                    shipment_type: ShipmentType::Individual,
                },
            ],
            status: SolveStatus::Optimal,
            objective_value: 200_073.0,
            trucks_used: 2,
            total_distance: 73.0,
            solver: "gurobi".to_string(),
        }
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(ShipmentType::classify(40_000.0, 1), ShipmentType::Individual);
        assert_eq!(ShipmentType::classify(500.0, 3), ShipmentType::Ltl);
        assert_eq!(ShipmentType::classify(17_999.9, 2), ShipmentType::Ltl);
        assert_eq!(ShipmentType::classify(18_000.0, 2), ShipmentType::Tl);
    }

    #[test]
    fn test_served_nodes_skips_depot() {
        let solution = sample_solution();
        assert_eq!(solution.served_nodes(), vec![1, 2, 3]);
    }

    #[test]
    fn test_route_lookup_and_stop_count() {
        let solution = sample_solution();
        let route = solution.route_for_truck(2).unwrap();
        assert_eq!(route.num_stops(), 1);
        assert!(solution.route_for_truck(3).is_none());
    }

    #[test]
    fn test_serializes_round_trip() {
        let solution = sample_solution();
        let json = serde_json::to_string(&solution).unwrap();
        let back: FleetSolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trucks_used, 2);
        assert_eq!(back.routes[0].node_sequence, vec![0, 1, 2, 0]);
    }
}
