use super::ConversionGraph;
use crate::error::RoutingError;
use crate::ident::{TypeKey, VariationSet};
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::EdgeIndex;
use std::any::Any;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// One candidate path in the frontier, ending on the logical node
/// `(node, variations)`.
///
/// Ordering is the search's whole tie-break policy: cheapest total cost
/// first; among equal costs the path consuming more required variations,
/// then the one with fewer edges, then the lexicographically smallest
/// edge-index sequence (earlier registration).
struct FrontierEntry {
    cost: u64,
    /// Required variations consumed along the path so far.
    specificity: u64,
    path: Vec<EdgeIndex>,
    node: TypeKey,
    variations: VariationSet,
}

impl FrontierEntry {
    fn rank(&self) -> (u64, Reverse<u64>, usize, &[EdgeIndex]) {
        (
            self.cost,
            Reverse(self.specificity),
            self.path.len(),
            self.path.as_slice(),
        )
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// The search's vertex identity. Two states are the same node iff their type
/// keys and variation sets are both equal.
#[derive(Clone, PartialEq, Eq, Hash)]
struct NodeState {
    key: TypeKey,
    variations: VariationSet,
}

/// Best-first search over the conversion graph for one goal.
///
/// Nodes are logical `(TypeKey, VariationSet)` pairs materialized as the
/// frontier reaches them, so the search tolerates cyclic graphs: each
/// traversal either grows the variation set monotonically or lands on an
/// already-closed state and is dropped.
pub(crate) struct PathSearch<'a> {
    graph: &'a ConversionGraph,
    want: &'a TypeKey,
    want_variations: &'a VariationSet,
}

impl<'a> PathSearch<'a> {
    pub(crate) fn new(
        graph: &'a ConversionGraph,
        want: &'a TypeKey,
        want_variations: &'a VariationSet,
    ) -> Self {
        PathSearch {
            graph,
            want,
            want_variations,
        }
    }

    /// Find the cheapest traversable edge sequence from `(start, variations)`
    /// to a node satisfying the goal, skipping `forbidden` edges. `value` is
    /// the live value revealers observe; edges are not executed here.
    ///
    /// With `permit_identity` unset, the zero-edge result is rejected and the
    /// start state is left reopenable so a cycle returning to it still
    /// counts as reaching the goal.
    ///
    /// Returns `None` when the frontier empties without a goal dequeue.
    pub(crate) fn run(
        &self,
        start: &TypeKey,
        start_variations: &VariationSet,
        value: &dyn Any,
        permit_identity: bool,
        forbidden: &IndexSet<EdgeIndex>,
    ) -> Result<Option<Vec<EdgeIndex>>, RoutingError> {
        let mut frontier: BinaryHeap<Reverse<FrontierEntry>> = BinaryHeap::new();
        let mut best: IndexMap<NodeState, u64> = IndexMap::new();
        let mut closed: IndexSet<NodeState> = IndexSet::new();
        // The live value is fixed for the duration of one search, so revealer
        // output is memoized per type.
        let mut revealed: IndexMap<TypeKey, VariationSet> = IndexMap::new();

        if permit_identity {
            best.insert(
                NodeState {
                    key: start.clone(),
                    variations: start_variations.clone(),
                },
                0,
            );
        }
        frontier.push(Reverse(FrontierEntry {
            cost: 0,
            specificity: 0,
            path: Vec::new(),
            node: start.clone(),
            variations: start_variations.clone(),
        }));

        while let Some(Reverse(entry)) = frontier.pop() {
            let state = NodeState {
                key: entry.node.clone(),
                variations: entry.variations.clone(),
            };
            let identity_probe = entry.path.is_empty() && !permit_identity;
            if !identity_probe && !closed.insert(state) {
                continue;
            }

            if entry.node == *self.want
                && self.want_variations.is_subset(&entry.variations)
                && !identity_probe
            {
                debug!(
                    cost = entry.cost,
                    steps = entry.path.len(),
                    "conversion path found"
                );
                return Ok(Some(entry.path));
            }

            // Revealer contributions widen this visit's variations for edge
            // gating only; successors carry the un-widened set so node
            // identity stays independent of value history.
            let effective = if self.graph.has_revealers(&entry.node) {
                let contributed = revealed
                    .entry(entry.node.clone())
                    .or_insert_with(|| self.graph.revealed_variations(&entry.node, value));
                entry.variations.union(contributed)
            } else {
                entry.variations.clone()
            };

            for edge_id in self.graph.out_edges(&entry.node) {
                if forbidden.contains(&edge_id) {
                    continue;
                }
                let conversion = self.graph.conversion(edge_id)?;
                if !conversion.requires.is_subset(&effective) {
                    continue;
                }

                let variations = entry.variations.union(&conversion.produces);
                let successor = NodeState {
                    key: conversion.target.clone(),
                    variations: variations.clone(),
                };
                let cost = entry.cost + conversion.cost;
                match best.get(&successor) {
                    // A strictly better path to this state is already known.
                    Some(&known) if known < cost => continue,
                    // An equal-cost path already won the tie-break and closed.
                    Some(&known) if known == cost && closed.contains(&successor) => continue,
                    _ => {}
                }
                best.insert(successor, cost);

                let mut path = entry.path.clone();
                path.push(edge_id);
                trace!(edge = edge_id.index(), cost, "frontier push");
                frontier.push(Reverse(FrontierEntry {
                    cost,
                    specificity: entry.specificity + conversion.specificity(),
                    path,
                    node: conversion.target.clone(),
                    variations,
                }));
            }
        }

        trace!("search frontier exhausted");
        Ok(None)
    }
}
