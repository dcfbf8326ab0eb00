//! Type-conversion routing.
//!
//! A [`ConversionGraph`] holds single-step converters as edges of a directed
//! multigraph over opaque [`TypeKey`]s. [`ConversionGraph::convert`] finds
//! the cheapest chain of converters whose endpoint satisfies the requested
//! type and [variation](Variation) tags, runs the value through it, and
//! reroutes through costlier alternatives when a converter fails along the
//! way.
//!
//! The free functions [`to`], [`cast`], [`add_conversion`] and
//! [`add_revealer`] operate on a process-wide default registry seeded with
//! casts between `String`, `i64`, `f64` and `bool`. Library code that wants
//! isolation builds its own [`ConversionGraph`]. Converters registered on
//! the default registry must not call back into it.

mod builtins;
pub mod error;
pub mod graph;
pub mod ident;
pub mod transmute;

pub use crate::error::{ConversionError, NoPathError, RoutingError};
pub use crate::graph::{ConversionGraph, ConvertRequest};
pub use crate::ident::{TypeKey, Variation, VariationSet};
pub use crate::transmute::{Reveal, Transmute, Value};

use lazy_static::lazy_static;
use std::any::Any;
use std::sync::{PoisonError, RwLock};

lazy_static! {
    static ref DEFAULT_GRAPH: RwLock<ConversionGraph> =
        RwLock::new(builtins::scalar_casts());
}

/// Convert `value` against the default registry.
pub fn to(value: Value, request: ConvertRequest) -> Result<Value, RoutingError> {
    DEFAULT_GRAPH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .convert(value, request)
}

/// Convert `value` to the Rust type `T` against the default registry.
pub fn cast<T: Any + Send>(value: impl Any + Send) -> Result<T, RoutingError> {
    let converted = to(Box::new(value), ConvertRequest::new(TypeKey::of::<T>()))?;
    converted.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        RoutingError::internal("conversion chain produced a value of the wrong runtime type")
    })
}

/// Register a conversion on the default registry.
pub fn add_conversion(
    cost: u64,
    source: TypeKey,
    requires: VariationSet,
    target: TypeKey,
    produces: VariationSet,
    transmute: impl Transmute + 'static,
) {
    DEFAULT_GRAPH
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add_conversion(cost, source, requires, target, produces, transmute)
}

/// Attach a revealer to a type on the default registry.
pub fn add_revealer(key: TypeKey, reveal: impl Reveal + 'static) {
    DEFAULT_GRAPH
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add_revealer(key, reveal)
}
