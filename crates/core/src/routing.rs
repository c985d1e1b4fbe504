//! Typed routing tables for workflow template steps.
//!
//! Each step carries a JSONB mapping from a human decision label (e.g.
//! `"approve"`, `"needs_rework"`) to the next step order, where `0` is the
//! terminal "workflow complete" sentinel. The mapping is modelled as a
//! tagged [`RouteTarget`] rather than a bare integer, and validated eagerly
//! at template save time instead of lazily during traversal.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Terminal sentinel value in the stored integer form.
pub const TERMINAL_SENTINEL: i32 = 0;

/// Where a decision routes the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Advance to the step with this `step_order`.
    Step(i32),
    /// The workflow is complete (stored as `0`).
    Complete,
}

impl RouteTarget {
    /// The stored integer form (`0` for [`RouteTarget::Complete`]).
    pub fn as_i32(&self) -> i32 {
        match self {
            RouteTarget::Step(order) => *order,
            RouteTarget::Complete => TERMINAL_SENTINEL,
        }
    }

    /// Build from the stored integer form. Negative targets are invalid.
    pub fn from_i32(raw: i32) -> Result<RouteTarget, String> {
        match raw {
            TERMINAL_SENTINEL => Ok(RouteTarget::Complete),
            n if n > 0 => Ok(RouteTarget::Step(n)),
            n => Err(format!("routing target must be >= 0, got {n}")),
        }
    }
}

impl Serialize for RouteTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for RouteTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        RouteTarget::from_i32(raw).map_err(D::Error::custom)
    }
}

/// A single invalid routing entry, collected during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingError {
    /// The step whose routing table holds the bad entry.
    pub step_order: i32,
    /// The decision key pointing at the bad target.
    pub decision: String,
    /// The offending target step order.
    pub target: i32,
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "step {} decision '{}' routes to nonexistent step {}",
            self.step_order, self.decision, self.target
        )
    }
}

/// Per-step mapping from decision key to [`RouteTarget`].
///
/// Serializes to the JSONB form `{"approve": 2, "reject": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable(pub BTreeMap<String, RouteTarget>);

impl RoutingTable {
    /// Look up the target for a decision key, if present.
    pub fn resolve(&self, decision: &str) -> Option<RouteTarget> {
        self.0.get(decision).copied()
    }

    /// Collect every entry whose target is neither the terminal sentinel nor
    /// an existing step order. Not fail-fast: a configuration UI surfaces
    /// all violations at once.
    pub fn validate(&self, step_order: i32, valid_orders: &BTreeSet<i32>) -> Vec<RoutingError> {
        self.0
            .iter()
            .filter_map(|(decision, target)| match target {
                RouteTarget::Complete => None,
                RouteTarget::Step(order) if valid_orders.contains(order) => None,
                RouteTarget::Step(order) => Some(RoutingError {
                    step_order,
                    decision: decision.clone(),
                    target: *order,
                }),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate the routing tables of a whole template.
///
/// `steps` pairs each step order with its routing table. Violations from all
/// steps are concatenated in step order.
pub fn validate_template_routing(steps: &[(i32, RoutingTable)]) -> Vec<RoutingError> {
    let valid_orders: BTreeSet<i32> = steps.iter().map(|(order, _)| *order).collect();
    steps
        .iter()
        .flat_map(|(order, table)| table.validate(*order, &valid_orders))
        .collect()
}
