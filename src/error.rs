use crate::ident::{TypeKey, VariationSet};
use std::fmt::{Display, Formatter};

/// A `(type, variations)` node as it appears in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub type_key: TypeKey,
    pub variations: VariationSet,
}

impl Display for NodeSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_key)?;
        if !self.variations.is_empty() {
            write!(f, " {}", self.variations)?;
        }
        Ok(())
    }
}

/// A registered conversion step as it appears in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSummary {
    pub cost: u64,
    pub source: TypeKey,
    pub target: TypeKey,
    pub requires: VariationSet,
    pub produces: VariationSet,
}

impl Display for EdgeSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// No chain of converters leads from the start node to a node satisfying the
/// goal.
#[derive(Debug, thiserror::Error)]
#[error("no conversion path from {start} to {goal}")]
pub struct NoPathError {
    pub start: NodeSummary,
    pub goal: NodeSummary,
}

/// A converter failed during execution and no alternative path could be found
/// to route around it.
#[derive(Debug, thiserror::Error)]
#[error("conversion step {edge} failed after {} completed steps: {cause}", .path.len())]
pub struct ConversionError {
    /// The step whose converter failed.
    pub edge: EdgeSummary,
    #[source]
    pub cause: anyhow::Error,
    /// The steps that had executed successfully before the failure.
    pub path: Vec<EdgeSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error(transparent)]
    NoPath(#[from] NoPathError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("internal: {message}")]
    Internal { message: String },
}

impl RoutingError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        RoutingError::Internal {
            message: message.into(),
        }
    }
}
