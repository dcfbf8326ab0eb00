use super::search::PathSearch;
use super::{ConversionGraph, ConvertRequest};
use crate::error::{ConversionError, EdgeSummary, NoPathError, NodeSummary, RoutingError};
use crate::ident::TypeKey;
use crate::transmute::Value;
use indexmap::IndexSet;
use petgraph::graph::EdgeIndex;
use std::collections::VecDeque;
use tracing::debug;

/// Run one `convert` call: search for the cheapest path, then walk it,
/// invoking each conversion in order.
///
/// Converters may be heuristic, so a step failing is routine: the failed
/// edge joins a call-local forbidden set, and the search re-runs from the
/// current node with the live value over the remaining subgraph. A fresh
/// path splices in; exhaustion escalates as [`ConversionError`].
pub(crate) fn execute(
    graph: &ConversionGraph,
    value: Value,
    request: ConvertRequest,
) -> Result<Value, RoutingError> {
    let have = match &request.have {
        Some(key) => key.clone(),
        None => TypeKey::of_val(value.as_ref()),
    };
    // Prefer the registered key so diagnostics carry its label.
    let have = graph.registered_key(&have).cloned().unwrap_or(have);

    let search = PathSearch::new(graph, &request.want, &request.want_variations);
    let permit_identity = !request.explicit;

    let mut current = value;
    let mut variations = request.have_variations.clone();
    let mut forbidden: IndexSet<EdgeIndex> = IndexSet::new();
    let mut taken: Vec<EdgeSummary> = Vec::new();

    let Some(path) = search.run(
        &have,
        &variations,
        current.as_ref(),
        permit_identity,
        &forbidden,
    )?
    else {
        return Err(NoPathError {
            start: NodeSummary {
                type_key: have,
                variations: request.have_variations,
            },
            goal: NodeSummary {
                type_key: request.want.clone(),
                variations: request.want_variations.clone(),
            },
        }
        .into());
    };
    let mut pending: VecDeque<EdgeIndex> = path.into();

    while let Some(&edge_id) = pending.front() {
        let conversion = graph.conversion(edge_id)?;
        match conversion.transmute.transmute(current.as_ref()) {
            Ok(next) => {
                current = next;
                variations.merge(&conversion.produces);
                taken.push(conversion.summary());
                pending.pop_front();
            }
            Err(cause) => {
                debug!(edge = edge_id.index(), error = %cause, "conversion step failed, rerouting");
                forbidden.insert(edge_id);
                // Reroute from the node the failed edge left from; the input
                // value of the failed step is still live.
                match search.run(
                    &conversion.source,
                    &variations,
                    current.as_ref(),
                    permit_identity,
                    &forbidden,
                )? {
                    Some(path) => pending = path.into(),
                    None => {
                        return Err(ConversionError {
                            edge: conversion.summary(),
                            cause,
                            path: taken,
                        }
                        .into())
                    }
                }
            }
        }
    }

    Ok(current)
}
