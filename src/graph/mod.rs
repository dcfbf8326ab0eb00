use crate::error::{EdgeSummary, RoutingError};
use crate::ident::{TypeKey, VariationSet};
use crate::transmute::{Reveal, Transmute, Value};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use tracing::debug;

pub(crate) mod executor;
pub(crate) mod search;

/// A node in the conversion graph: one domain type. Variation sets are not
/// part of node storage; `(TypeKey, VariationSet)` pairs exist only as
/// logical states inside a search.
#[derive(Debug)]
pub(crate) struct TypeNode {
    pub(crate) key: TypeKey,
}

/// One registered conversion step. Immutable after registration.
pub struct Conversion {
    pub(crate) cost: u64,
    pub(crate) source: TypeKey,
    pub(crate) target: TypeKey,
    /// Variations the current node must already possess for this edge to be
    /// traversable.
    pub(crate) requires: VariationSet,
    /// Variations added to the node's variation set after traversal.
    pub(crate) produces: VariationSet,
    pub(crate) transmute: Box<dyn Transmute>,
}

impl Conversion {
    /// Required variations this edge consumes. Among equal-cost paths the
    /// search prefers the one consuming more of them.
    pub(crate) fn specificity(&self) -> u64 {
        self.requires.len() as u64
    }

    pub(crate) fn summary(&self) -> EdgeSummary {
        EdgeSummary {
            cost: self.cost,
            source: self.source.clone(),
            target: self.target.clone(),
            requires: self.requires.clone(),
            produces: self.produces.clone(),
        }
    }
}

impl Debug for Conversion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversion")
            .field("cost", &self.cost)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("requires", &self.requires)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// Options for [`ConversionGraph::convert`].
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// The destination type.
    pub want: TypeKey,
    /// Variations the destination node must possess.
    pub want_variations: VariationSet,
    /// The start type. Defaults to the dynamic type of the value, which only
    /// matches registrations made with [`TypeKey::of`]; name-keyed registries
    /// must set this explicitly.
    pub have: Option<TypeKey>,
    /// Variations the start node already possesses.
    pub have_variations: VariationSet,
    /// Reject the zero-edge result: a start node that already satisfies the
    /// goal does not short-circuit, and a path of at least one edge is
    /// required.
    pub explicit: bool,
}

impl ConvertRequest {
    pub fn new(want: TypeKey) -> Self {
        ConvertRequest {
            want,
            want_variations: VariationSet::new(),
            have: None,
            have_variations: VariationSet::new(),
            explicit: false,
        }
    }

    pub fn wanting(mut self, variations: VariationSet) -> Self {
        self.want_variations = variations;
        self
    }

    pub fn having(mut self, have: TypeKey) -> Self {
        self.have = Some(have);
        self
    }

    pub fn having_variations(mut self, variations: VariationSet) -> Self {
        self.have_variations = variations;
        self
    }

    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }
}

/// The registry: a directed multigraph of typed conversions plus the
/// revealers attached to types.
///
/// Ownership is flat even when the graph is cyclic: the registry owns every
/// edge and revealer; searches and executions hold non-owning references into
/// it. Registration is additive; nothing is removed or mutated afterwards,
/// which is what lets [`EdgeIndex`] double as registration order.
pub struct ConversionGraph {
    graph: DiGraph<TypeNode, Conversion>,
    types_to_nodes: IndexMap<TypeKey, NodeIndex>,
    revealers: IndexMap<TypeKey, Vec<Box<dyn Reveal>>>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        ConversionGraph {
            graph: DiGraph::new(),
            types_to_nodes: IndexMap::new(),
            revealers: IndexMap::new(),
        }
    }

    /// Register one conversion step. No dedup: multiple edges with identical
    /// endpoints are all candidates.
    pub fn add_conversion(
        &mut self,
        cost: u64,
        source: TypeKey,
        requires: VariationSet,
        target: TypeKey,
        produces: VariationSet,
        transmute: impl Transmute + 'static,
    ) {
        let source_node = self.intern(source.clone());
        let target_node = self.intern(target.clone());
        let conversion = Conversion {
            cost,
            source,
            target,
            requires,
            produces,
            transmute: Box::new(transmute),
        };
        let edge = self.graph.add_edge(source_node, target_node, conversion);
        debug!(edge = edge.index(), "registered conversion");
    }

    /// Attach a revealer to a type. Multiple revealers per type are permitted
    /// and their contributions union.
    pub fn add_revealer(&mut self, key: TypeKey, reveal: impl Reveal + 'static) {
        self.revealers.entry(key).or_default().push(Box::new(reveal));
    }

    /// Top-level entry: find the cheapest conversion chain satisfying
    /// `request` and run `value` through it.
    pub fn convert(&self, value: Value, request: ConvertRequest) -> Result<Value, RoutingError> {
        executor::execute(self, value, request)
    }

    pub fn conversion_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn type_count(&self) -> usize {
        self.graph.node_count()
    }

    fn intern(&mut self, key: TypeKey) -> NodeIndex {
        if let Some(&node) = self.types_to_nodes.get(&key) {
            return node;
        }
        let node = self.graph.add_node(TypeNode { key: key.clone() });
        self.types_to_nodes.insert(key, node);
        node
    }

    /// Outgoing conversions of a type in registration order. A type that was
    /// never registered has none.
    pub(crate) fn out_edges(&self, key: &TypeKey) -> Vec<EdgeIndex> {
        let Some(&node) = self.types_to_nodes.get(key) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        // petgraph yields outgoing edges most-recent first; index order is
        // registration order.
        edges.sort_unstable();
        edges
    }

    pub(crate) fn conversion(&self, edge: EdgeIndex) -> Result<&Conversion, RoutingError> {
        self.graph
            .edge_weight(edge)
            .ok_or_else(|| RoutingError::internal("conversion unexpectedly missing"))
    }

    pub(crate) fn has_revealers(&self, key: &TypeKey) -> bool {
        self.revealers.contains_key(key)
    }

    /// Union of all revealer contributions for `key` applied to `value`.
    /// A revealer that errors contributes nothing.
    pub(crate) fn revealed_variations(&self, key: &TypeKey, value: &dyn Any) -> VariationSet {
        let mut revealed = VariationSet::new();
        if let Some(revealers) = self.revealers.get(key) {
            for reveal in revealers {
                match reveal.reveal(value) {
                    Ok(variations) => revealed.extend(variations),
                    Err(error) => {
                        debug!(key = %key, error = %error, "revealer failed, contributing nothing")
                    }
                }
            }
        }
        revealed
    }

    /// The key as it was first registered, so diagnostics carry its label
    /// even when the caller's copy was derived from a live value.
    pub(crate) fn registered_key(&self, key: &TypeKey) -> Option<&TypeKey> {
        self.types_to_nodes
            .get(key)
            .and_then(|&node| self.graph.node_weight(node))
            .map(|weight| &weight.key)
    }
}

impl Default for ConversionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ConversionGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionGraph")
            .field("types", &self.graph.node_count())
            .field("conversions", &self.graph.edge_count())
            .field("revealers", &self.revealers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Variation;
    use anyhow::anyhow;

    fn noop(value: &dyn Any) -> Result<Value, anyhow::Error> {
        let text = value
            .downcast_ref::<String>()
            .ok_or_else(|| anyhow!("expected a string value"))?;
        Ok(Box::new(text.clone()) as Value)
    }

    #[test]
    fn out_edges_follow_registration_order() {
        let mut graph = ConversionGraph::new();
        let a = TypeKey::named("A");
        graph.add_conversion(
            1,
            a.clone(),
            VariationSet::new(),
            TypeKey::named("C"),
            VariationSet::new(),
            noop,
        );
        graph.add_conversion(
            1,
            a.clone(),
            VariationSet::new(),
            TypeKey::named("B"),
            VariationSet::new(),
            noop,
        );

        let edges = graph.out_edges(&a);
        assert_eq!(edges.len(), 2);
        let targets: Vec<_> = edges
            .iter()
            .map(|&edge| graph.conversion(edge).unwrap().target.label().to_owned())
            .collect();
        assert_eq!(targets, ["C", "B"]);
        assert!(graph.out_edges(&TypeKey::named("B")).is_empty());
    }

    #[test]
    fn revealers_union_and_absorb_failures() {
        let mut graph = ConversionGraph::new();
        let a = TypeKey::named("A");
        graph.add_revealer(a.clone(), |_: &dyn Any| -> Result<Vec<Variation>, anyhow::Error> {
            Ok(vec![Variation::new("x")])
        });
        graph.add_revealer(a.clone(), |_: &dyn Any| -> Result<Vec<Variation>, anyhow::Error> {
            Err(anyhow!("broken revealer"))
        });
        graph.add_revealer(a.clone(), |_: &dyn Any| -> Result<Vec<Variation>, anyhow::Error> {
            Ok(vec![Variation::new("y"), Variation::new("x")])
        });

        let revealed = graph.revealed_variations(&a, &"value".to_string());
        let expected: VariationSet = ["x", "y"].into_iter().collect();
        assert_eq!(revealed, expected);
        assert!(!graph.has_revealers(&TypeKey::named("B")));
    }
}
