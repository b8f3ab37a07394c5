//! Instance normalization for the multi-truck VRP.
//!
//! This module turns raw order records, fleet parameters, and a distance
//! matrix into a validated, immutable [`VrpInstance`] with a canonical node
//! layout: node 0 is the depot, nodes 1..=n are delivery stops, one per order.

use serde::{Deserialize, Serialize};

/// Conversion factor from kilograms to pounds.
pub const KG_TO_LB: f64 = 2.20462;

/// Unit in which an order's weight was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    Lb,
    Kg,
}

impl WeightUnit {
    /// Convert a quantity in this unit to pounds.
    pub fn to_lbs(self, quantity: f64) -> f64 {
        match self {
            WeightUnit::Lb => quantity,
            WeightUnit::Kg => quantity * KG_TO_LB,
        }
    }
}

/// A raw delivery order as supplied by the caller.
///
/// The destination is identified positionally: the i-th record (0-based)
/// becomes delivery node i+1, and the distance matrix must be laid out the
/// same way with the depot at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Caller-supplied identifier, unique across the order set
    pub id: String,
    /// Shipment weight in `unit`
    pub weight: f64,
    /// Unit of `weight`
    pub unit: WeightUnit,
}

impl OrderRecord {
    pub fn new(id: impl Into<String>, weight: f64, unit: WeightUnit) -> Self {
        OrderRecord { id: id.into(), weight, unit }
    }

    /// Convenience constructor for weights already in pounds
    pub fn lbs(id: impl Into<String>, weight_lbs: f64) -> Self {
        OrderRecord::new(id, weight_lbs, WeightUnit::Lb)
    }
}

/// Homogeneous fleet parameters.
///
/// Trucks are interchangeable slots indexed 1..=num_trucks; index order
/// drives the activation symmetry-breaking constraints in the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of available truck slots
    pub num_trucks: usize,
    /// Maximum delivery stops per truck
    pub max_stops: usize,
    /// Maximum load per truck in pounds
    pub max_load_lbs: f64,
}

impl FleetConfig {
    pub fn new(num_trucks: usize, max_stops: usize, max_load_lbs: f64) -> Self {
        FleetConfig { num_trucks, max_stops, max_load_lbs }
    }
}

/// Dense node-to-node distance matrix over depot + delivery stops.
///
/// Distances may be asymmetric; the diagonal must be zero and no entry may
/// be negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrix {
    entries: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Build from explicit rows. Dimension checks happen in
    /// [`VrpInstance::new`] against the order count.
    pub fn from_rows(entries: Vec<Vec<f64>>) -> Self {
        DistanceMatrix { entries }
    }

    /// Build a `dimension x dimension` matrix from a distance provider.
    /// The provider is only consulted for off-diagonal pairs.
    pub fn from_fn<F>(dimension: usize, mut provider: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let entries = (0..dimension)
            .map(|i| {
                (0..dimension)
                    .map(|j| if i == j { 0.0 } else { provider(i, j) })
                    .collect()
            })
            .collect();
        DistanceMatrix { entries }
    }

    /// Number of nodes covered (depot included)
    pub fn dimension(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.entries[i][j]
    }

    /// Largest entry, 0.0 for a degenerate matrix
    pub fn max_distance(&self) -> f64 {
        self.entries.iter().flatten().cloned().fold(0.0, f64::max)
    }
}

/// Raised when raw input is malformed or self-contradictory.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyOrderSet,
    DuplicateOrderId(String),
    NegativeWeight { order_id: String, weight_lbs: f64 },
    OrderExceedsTruckCapacity { order_id: String, weight_lbs: f64, max_load_lbs: f64 },
    NoTrucks,
    ZeroMaxStops,
    NegativeMaxLoad(f64),
    MatrixDimensionMismatch { expected: usize, found: usize },
    MissingMatrixEntry { row: usize, len: usize, expected: usize },
    NegativeDistance { from: usize, to: usize, distance: f64 },
    NonzeroDiagonal { node: usize, distance: f64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyOrderSet => write!(f, "order set is empty"),
            ValidationError::DuplicateOrderId(id) => {
                write!(f, "duplicate order id '{}'", id)
            }
            ValidationError::NegativeWeight { order_id, weight_lbs } => {
                write!(f, "order '{}' has negative weight {} lb", order_id, weight_lbs)
            }
            ValidationError::OrderExceedsTruckCapacity { order_id, weight_lbs, max_load_lbs } => {
                write!(
                    f,
                    "order '{}' weighs {} lb, more than any truck can carry ({} lb)",
                    order_id, weight_lbs, max_load_lbs
                )
            }
            ValidationError::NoTrucks => write!(f, "fleet has no trucks"),
            ValidationError::ZeroMaxStops => write!(f, "max_stops must be at least 1"),
            ValidationError::NegativeMaxLoad(v) => {
                write!(f, "max_load_lbs must be non-negative, got {}", v)
            }
            ValidationError::MatrixDimensionMismatch { expected, found } => {
                write!(
                    f,
                    "distance matrix covers {} nodes, expected {} (depot + stops)",
                    found, expected
                )
            }
            ValidationError::MissingMatrixEntry { row, len, expected } => {
                write!(f, "distance matrix row {} has {} entries, expected {}", row, len, expected)
            }
            ValidationError::NegativeDistance { from, to, distance } => {
                write!(f, "negative distance {} on arc {} -> {}", distance, from, to)
            }
            ValidationError::NonzeroDiagonal { node, distance } => {
                write!(f, "d[{}][{}] must be 0, got {}", node, node, distance)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated, immutable multi-truck VRP instance.
///
/// Weights are canonicalized to pounds. Node 0 is the depot; delivery node i
/// (1-based) carries the order at `orders[i-1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VrpInstance {
    orders: Vec<OrderRecord>,
    weights_lbs: Vec<f64>,
    fleet: FleetConfig,
    matrix: DistanceMatrix,
}

impl VrpInstance {
    /// Validate and normalize raw input into an instance.
    pub fn new(
        orders: Vec<OrderRecord>,
        fleet: FleetConfig,
        matrix: DistanceMatrix,
    ) -> Result<Self, ValidationError> {
        if orders.is_empty() {
            return Err(ValidationError::EmptyOrderSet);
        }
        if fleet.num_trucks == 0 {
            return Err(ValidationError::NoTrucks);
        }
        if fleet.max_stops == 0 {
            return Err(ValidationError::ZeroMaxStops);
        }
        if fleet.max_load_lbs < 0.0 {
            return Err(ValidationError::NegativeMaxLoad(fleet.max_load_lbs));
        }

        let mut seen = std::collections::HashSet::new();
        let mut weights_lbs = Vec::with_capacity(orders.len() + 1);
        weights_lbs.push(0.0); // depot carries no order

        for order in &orders {
            if !seen.insert(order.id.as_str()) {
                return Err(ValidationError::DuplicateOrderId(order.id.clone()));
            }
            let lbs = order.unit.to_lbs(order.weight);
            if lbs < 0.0 {
                return Err(ValidationError::NegativeWeight {
                    order_id: order.id.clone(),
                    weight_lbs: lbs,
                });
            }
            if lbs > fleet.max_load_lbs {
                return Err(ValidationError::OrderExceedsTruckCapacity {
                    order_id: order.id.clone(),
                    weight_lbs: lbs,
                    max_load_lbs: fleet.max_load_lbs,
                });
            }
            weights_lbs.push(lbs);
        }

        let dimension = orders.len() + 1;
        Self::check_matrix(&matrix, dimension)?;

        Ok(VrpInstance { orders, weights_lbs, fleet, matrix })
    }

    fn check_matrix(matrix: &DistanceMatrix, dimension: usize) -> Result<(), ValidationError> {
        if matrix.entries.len() != dimension {
            return Err(ValidationError::MatrixDimensionMismatch {
                expected: dimension,
                found: matrix.entries.len(),
            });
        }
        for (i, row) in matrix.entries.iter().enumerate() {
            if row.len() != dimension {
                return Err(ValidationError::MissingMatrixEntry {
                    row: i,
                    len: row.len(),
                    expected: dimension,
                });
            }
            for (j, &d) in row.iter().enumerate() {
                if d < 0.0 {
                    return Err(ValidationError::NegativeDistance { from: i, to: j, distance: d });
                }
                if i == j && d != 0.0 {
                    return Err(ValidationError::NonzeroDiagonal { node: i, distance: d });
                }
            }
        }
        Ok(())
    }

    /// Number of delivery stops (excluding the depot)
    #[inline]
    pub fn num_stops(&self) -> usize {
        self.orders.len()
    }

    /// Number of nodes including the depot
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.orders.len() + 1
    }

    /// Delivery node indices 1..=n
    pub fn stops(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.num_stops()
    }

    /// All node indices 0..=n
    pub fn nodes(&self) -> std::ops::RangeInclusive<usize> {
        0..=self.num_stops()
    }

    /// Truck indices 1..=num_trucks
    pub fn trucks(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.fleet.num_trucks
    }

    #[inline]
    pub fn fleet(&self) -> FleetConfig {
        self.fleet
    }

    /// Weight in pounds carried at `node` (0 for the depot)
    #[inline]
    pub fn weight_lbs(&self, node: usize) -> f64 {
        self.weights_lbs[node]
    }

    /// Sum of all order weights in pounds
    pub fn total_weight_lbs(&self) -> f64 {
        self.weights_lbs.iter().sum()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.matrix.distance(i, j)
    }

    pub fn max_distance(&self) -> f64 {
        self.matrix.max_distance()
    }

    /// Order served at delivery node `node` (panics on the depot index)
    pub fn order_at(&self, node: usize) -> &OrderRecord {
        &self.orders[node - 1]
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    /// Total length of a node sequence, following consecutive arcs
    pub fn route_distance(&self, sequence: &[usize]) -> f64 {
        sequence.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_order_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 10.0, 15.0],
            vec![10.0, 0.0, 8.0],
            vec![15.0, 8.0, 0.0],
        ])
    }

    fn orders() -> Vec<OrderRecord> {
        vec![OrderRecord::lbs("A", 500.0), OrderRecord::lbs("B", 300.0)]
    }

    #[test]
    fn test_normalizes_node_layout() {
        let instance =
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), two_order_matrix())
                .unwrap();

        assert_eq!(instance.num_nodes(), 3);
        assert_eq!(instance.num_stops(), 2);
        assert_eq!(instance.weight_lbs(0), 0.0);
        assert_eq!(instance.weight_lbs(1), 500.0);
        assert_eq!(instance.order_at(2).id, "B");
        assert_eq!(instance.distance(1, 2), 8.0);
    }

    #[test]
    fn test_kg_weights_canonicalized_to_lbs() {
        let orders = vec![OrderRecord::new("A", 100.0, WeightUnit::Kg)];
        let matrix = DistanceMatrix::from_rows(vec![vec![0.0, 5.0], vec![5.0, 0.0]]);
        let instance =
            VrpInstance::new(orders, FleetConfig::new(1, 1, 1000.0), matrix).unwrap();

        assert!((instance.weight_lbs(1) - 220.462).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty_order_set() {
        let err = VrpInstance::new(
            vec![],
            FleetConfig::new(1, 1, 100.0),
            DistanceMatrix::from_rows(vec![vec![0.0]]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyOrderSet);
    }

    #[test]
    fn test_rejects_duplicate_order_ids() {
        let orders = vec![OrderRecord::lbs("A", 1.0), OrderRecord::lbs("A", 2.0)];
        let err = VrpInstance::new(orders, FleetConfig::new(1, 2, 100.0), two_order_matrix())
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateOrderId("A".to_string()));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let orders = vec![OrderRecord::lbs("A", -1.0), OrderRecord::lbs("B", 2.0)];
        let err = VrpInstance::new(orders, FleetConfig::new(1, 2, 100.0), two_order_matrix())
            .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeWeight { .. }));
    }

    #[test]
    fn test_rejects_order_heavier_than_any_truck() {
        let orders = vec![OrderRecord::lbs("A", 1500.0), OrderRecord::lbs("B", 2.0)];
        let err = VrpInstance::new(orders, FleetConfig::new(2, 2, 1000.0), two_order_matrix())
            .unwrap_err();
        assert!(matches!(err, ValidationError::OrderExceedsTruckCapacity { .. }));
    }

    #[test]
    fn test_zero_weight_order_is_legal() {
        let orders = vec![OrderRecord::lbs("A", 0.0), OrderRecord::lbs("B", 2.0)];
        assert!(
            VrpInstance::new(orders, FleetConfig::new(1, 2, 100.0), two_order_matrix()).is_ok()
        );
    }

    #[test]
    fn test_rejects_undersized_matrix() {
        let matrix = DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let err =
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), matrix).unwrap_err();
        assert_eq!(err, ValidationError::MatrixDimensionMismatch { expected: 3, found: 2 });
    }

    #[test]
    fn test_rejects_ragged_matrix_row() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0],
            vec![2.0, 1.0, 0.0],
        ]);
        let err =
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), matrix).unwrap_err();
        assert!(matches!(err, ValidationError::MissingMatrixEntry { row: 1, .. }));
    }

    #[test]
    fn test_rejects_negative_distance_and_nonzero_diagonal() {
        let negative = DistanceMatrix::from_rows(vec![
            vec![0.0, -1.0, 2.0],
            vec![1.0, 0.0, 2.0],
            vec![2.0, 1.0, 0.0],
        ]);
        assert!(matches!(
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), negative).unwrap_err(),
            ValidationError::NegativeDistance { from: 0, to: 1, .. }
        ));

        let diagonal = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 3.0, 2.0],
            vec![2.0, 1.0, 0.0],
        ]);
        assert!(matches!(
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), diagonal).unwrap_err(),
            ValidationError::NonzeroDiagonal { node: 1, .. }
        ));
    }

    #[test]
    fn test_matrix_from_provider() {
        let matrix = DistanceMatrix::from_fn(3, |i, j| ((i + j) * 2) as f64);
        assert_eq!(matrix.distance(0, 0), 0.0);
        assert_eq!(matrix.distance(1, 2), 6.0);
        assert_eq!(matrix.max_distance(), 6.0);
    }

    #[test]
    fn test_route_distance_follows_consecutive_arcs() {
        let instance =
            VrpInstance::new(orders(), FleetConfig::new(2, 3, 1000.0), two_order_matrix())
                .unwrap();
        assert_eq!(instance.route_distance(&[0, 1, 2, 0]), 10.0 + 8.0 + 15.0);
    }
}
