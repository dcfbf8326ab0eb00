use crate::ident::Variation;
use std::any::Any;

/// A value travelling through a conversion chain. The engine never inspects
/// it; converters and revealers do.
pub type Value = Box<dyn Any + Send>;

/// A single registered conversion step's callable.
///
/// The input is borrowed rather than consumed so that the executor still owns
/// the live value when a step fails and the remainder of the chain has to be
/// rerouted through it.
pub trait Transmute: Send + Sync {
    fn transmute(&self, value: &dyn Any) -> Result<Value, anyhow::Error>;
}

impl<F> Transmute for F
where
    F: Fn(&dyn Any) -> Result<Value, anyhow::Error> + Send + Sync,
{
    fn transmute(&self, value: &dyn Any) -> Result<Value, anyhow::Error> {
        self(value)
    }
}

/// Derives variation tags from a concrete value at search time.
///
/// Revealers are treated as pure: within one search the engine invokes each
/// at most once and memoizes the result. A revealer that errors contributes
/// no variations; it never aborts a search.
pub trait Reveal: Send + Sync {
    fn reveal(&self, value: &dyn Any) -> Result<Vec<Variation>, anyhow::Error>;
}

impl<F> Reveal for F
where
    F: Fn(&dyn Any) -> Result<Vec<Variation>, anyhow::Error> + Send + Sync,
{
    fn reveal(&self, value: &dyn Any) -> Result<Vec<Variation>, anyhow::Error> {
        self(value)
    }
}
