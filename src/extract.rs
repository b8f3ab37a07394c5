//! Solution extraction: decoding a raw variable assignment into validated
//! per-truck routes.
//!
//! For each activated truck the extractor starts at the depot and follows the
//! unique active arc `x[i,j,k]` until it returns to node 0. Every structural
//! invariant the model guarantees is re-checked here; a violation means a
//! modeling or tolerance defect and aborts extraction with full context.

use crate::instance::VrpInstance;
use crate::model::FleetModel;
use crate::solution::{FleetSolution, ShipmentType, TruckRoute};
use crate::solver::{Assignment, SolveResult};

/// Slack for floating-point weight comparisons against the load cap.
const WEIGHT_EPS: f64 = 1e-6;

/// Internal inconsistency between solved variables and the expected route
/// structure. Always a defect, never a recoverable user error.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Result carried no variable assignment to decode
    NoAssignment,
    /// Truck marked active but no arc leaves the depot for it
    MissingDepotArc { truck: usize },
    /// Route re-entered a node before returning to the depot
    NodeRevisited { truck: usize, node: usize },
    /// Route reached a node with no active outgoing arc
    NoOutgoingArc { truck: usize, node: usize },
    /// Visited stop count disagrees with the assignment variables
    StopCountMismatch { truck: usize, assigned: usize, visited: usize },
    /// Truck k is active while a lower-indexed truck is not
    ActivationGap { truck: usize },
    /// A delivery node appears on two trucks' routes
    NodeServedTwice { node: usize, first_truck: usize, second_truck: usize },
    /// A delivery node appears on no route
    NodeUnserved { node: usize, order_id: String },
    /// Decoded route exceeds the truck's load cap
    LoadExceedsCap { truck: usize, load_lbs: f64, max_load_lbs: f64 },
    /// Decoded route exceeds the truck's stop cap
    StopsExceedCap { truck: usize, stops: usize, max_stops: usize },
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::NoAssignment => {
                write!(f, "solve result carries no variable assignment")
            }
            ExtractionError::MissingDepotArc { truck } => {
                write!(f, "truck {} is active but has no outgoing depot arc", truck)
            }
            ExtractionError::NodeRevisited { truck, node } => {
                write!(f, "truck {} revisits node {} before returning to depot", truck, node)
            }
            ExtractionError::NoOutgoingArc { truck, node } => {
                write!(f, "truck {} is stranded at node {} with no outgoing arc", truck, node)
            }
            ExtractionError::StopCountMismatch { truck, assigned, visited } => {
                write!(
                    f,
                    "truck {}: route visits {} stops but {} assignment variables are set",
                    truck, visited, assigned
                )
            }
            ExtractionError::ActivationGap { truck } => {
                write!(f, "truck {} is active while a lower-indexed truck is idle", truck)
            }
            ExtractionError::NodeServedTwice { node, first_truck, second_truck } => {
                write!(
                    f,
                    "node {} is served by both truck {} and truck {}",
                    node, first_truck, second_truck
                )
            }
            ExtractionError::NodeUnserved { node, order_id } => {
                write!(f, "order '{}' at node {} appears on no route", order_id, node)
            }
            ExtractionError::LoadExceedsCap { truck, load_lbs, max_load_lbs } => {
                write!(
                    f,
                    "truck {} carries {} lb, above its {} lb cap",
                    truck, load_lbs, max_load_lbs
                )
            }
            ExtractionError::StopsExceedCap { truck, stops, max_stops } => {
                write!(f, "truck {} makes {} stops, above its {} stop cap", truck, stops, max_stops)
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Decode a solve result into per-truck routes, verifying every invariant.
///
/// `solver_name` labels the producing path in the returned solution.
pub fn extract_solution(
    instance: &VrpInstance,
    built: &FleetModel,
    result: &SolveResult,
    solver_name: &str,
) -> Result<FleetSolution, ExtractionError> {
    let assignment = result.assignment.as_ref().ok_or(ExtractionError::NoAssignment)?;

    let mut routes = Vec::new();
    let mut served_by: Vec<Option<usize>> = vec![None; instance.num_nodes()];
    let mut previous_active = true;

    for k in instance.trucks() {
        let active = assignment.is_active(built.vars.z(k));
        if active && !previous_active {
            return Err(ExtractionError::ActivationGap { truck: k });
        }
        previous_active = active;
        if !active {
            continue;
        }

        let sequence = trace_route(instance, built, assignment, k)?;

        let assigned = instance
            .stops()
            .filter(|&i| assignment.is_active(built.vars.y(i, k)))
            .count();
        let visited = sequence.len() - 2;
        if assigned != visited {
            return Err(ExtractionError::StopCountMismatch { truck: k, assigned, visited });
        }

        for &node in &sequence[1..sequence.len() - 1] {
            if let Some(first_truck) = served_by[node] {
                return Err(ExtractionError::NodeServedTwice {
                    node,
                    first_truck,
                    second_truck: k,
                });
            }
            served_by[node] = Some(k);
        }

        routes.push(build_route(instance, k, sequence)?);
    }

    for node in instance.stops() {
        if served_by[node].is_none() {
            return Err(ExtractionError::NodeUnserved {
                node,
                order_id: instance.order_at(node).id.clone(),
            });
        }
    }

    let trucks_used = routes.len();
    let total_distance: f64 = routes.iter().map(|r| r.total_distance).sum();
    let objective_value = built.big_m * trucks_used as f64 + total_distance;

    log::debug!(
        "extracted {} route(s), total distance {:.2}",
        trucks_used,
        total_distance
    );

    Ok(FleetSolution {
        routes,
        status: result.status,
        objective_value,
        trucks_used,
        total_distance,
        solver: solver_name.to_string(),
    })
}

/// Follow active arcs from the depot until the route closes.
fn trace_route(
    instance: &VrpInstance,
    built: &FleetModel,
    assignment: &Assignment,
    k: usize,
) -> Result<Vec<usize>, ExtractionError> {
    let first = instance
        .stops()
        .find(|&j| assignment.is_active(built.vars.x(0, j, k)))
        .ok_or(ExtractionError::MissingDepotArc { truck: k })?;

    let mut sequence = vec![0, first];
    let mut visited = vec![false; instance.num_nodes()];
    visited[0] = true;
    visited[first] = true;

    let mut current = first;
    loop {
        let next = instance
            .nodes()
            .filter(|&j| j != current)
            .find(|&j| assignment.is_active(built.vars.x(current, j, k)))
            .ok_or(ExtractionError::NoOutgoingArc { truck: k, node: current })?;

        if next == 0 {
            sequence.push(0);
            return Ok(sequence);
        }
        if visited[next] {
            return Err(ExtractionError::NodeRevisited { truck: k, node: next });
        }
        visited[next] = true;
        sequence.push(next);
        current = next;
    }
}

/// Assemble a [`TruckRoute`] and enforce the truck's own caps.
fn build_route(
    instance: &VrpInstance,
    k: usize,
    sequence: Vec<usize>,
) -> Result<TruckRoute, ExtractionError> {
    let fleet = instance.fleet();
    let stops: Vec<usize> = sequence[1..sequence.len() - 1].to_vec();

    if stops.len() > fleet.max_stops {
        return Err(ExtractionError::StopsExceedCap {
            truck: k,
            stops: stops.len(),
            max_stops: fleet.max_stops,
        });
    }

    let load_lbs: f64 = stops.iter().map(|&i| instance.weight_lbs(i)).sum();
    if load_lbs > fleet.max_load_lbs + WEIGHT_EPS {
        return Err(ExtractionError::LoadExceedsCap {
            truck: k,
            load_lbs,
            max_load_lbs: fleet.max_load_lbs,
        });
    }

    let order_ids = stops.iter().map(|&i| instance.order_at(i).id.clone()).collect();
    let total_distance = instance.route_distance(&sequence);

    Ok(TruckRoute {
        truck_index: k,
        shipment_type: ShipmentType::classify(load_lbs, stops.len()),
        node_sequence: sequence,
        order_ids,
        total_weight_lbs: load_lbs,
        total_distance,
    })
}
