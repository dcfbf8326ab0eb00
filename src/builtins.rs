use crate::graph::ConversionGraph;
use crate::ident::{TypeKey, VariationSet};
use crate::transmute::Value;
use anyhow::anyhow;
use std::any::Any;

fn expect<S: Any>(value: &dyn Any) -> Result<&S, anyhow::Error> {
    value
        .downcast_ref::<S>()
        .ok_or_else(|| anyhow!("builtin cast fed a value of the wrong runtime type"))
}

fn register<S, T, F>(graph: &mut ConversionGraph, convert: F)
where
    S: Any,
    T: Any + Send,
    F: Fn(&S) -> Result<T, anyhow::Error> + Send + Sync + 'static,
{
    graph.add_conversion(
        1,
        TypeKey::of::<S>(),
        VariationSet::new(),
        TypeKey::of::<T>(),
        VariationSet::new(),
        move |value: &dyn Any| -> Result<Value, anyhow::Error> {
            Ok(Box::new(convert(expect::<S>(value)?)?) as Value)
        },
    );
}

/// Seed for the default registry: cost-1 casts between the scalar quartet,
/// keyed by runtime type. Parsing casts are heuristic and fail on
/// non-numeric text, which is what lets the executor route e.g.
/// `"abc" -> i64` through truthiness instead.
pub(crate) fn scalar_casts() -> ConversionGraph {
    let mut graph = ConversionGraph::new();

    register::<String, String, _>(&mut graph, |s| Ok(s.clone()));
    register::<String, i64, _>(&mut graph, |s| Ok(s.parse()?));
    register::<String, f64, _>(&mut graph, |s| Ok(s.parse()?));
    register::<String, bool, _>(&mut graph, |s| Ok(!s.is_empty()));

    register::<i64, String, _>(&mut graph, |n| Ok(n.to_string()));
    register::<i64, i64, _>(&mut graph, |n| Ok(*n));
    register::<i64, f64, _>(&mut graph, |n| Ok(*n as f64));
    register::<i64, bool, _>(&mut graph, |n| Ok(*n != 0));

    register::<f64, String, _>(&mut graph, |x| Ok(x.to_string()));
    register::<f64, i64, _>(&mut graph, |x| Ok(*x as i64));
    register::<f64, f64, _>(&mut graph, |x| Ok(*x));
    register::<f64, bool, _>(&mut graph, |x| Ok(*x != 0.0));

    register::<bool, String, _>(&mut graph, |b| Ok(b.to_string()));
    register::<bool, i64, _>(&mut graph, |b| Ok(i64::from(*b)));
    register::<bool, f64, _>(&mut graph, |b| Ok(if *b { 1.0 } else { 0.0 }));
    register::<bool, bool, _>(&mut graph, |b| Ok(*b));

    graph
}
