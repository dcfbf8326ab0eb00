use itertools::Itertools;
use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque identity for a domain type.
///
/// The engine never inspects what a key stands for; it only compares keys and
/// uses them as map indices. Two construction conventions exist and may be
/// mixed freely within one registry (they never compare equal to each other):
/// - [`TypeKey::of`] derives the key from a Rust runtime type, which lets
///   [`ConvertRequest::have`](crate::graph::ConvertRequest) default to the
///   dynamic type of a live value;
/// - [`TypeKey::named`] builds the key from an arbitrary label, for domains
///   whose type vocabulary is not Rust types.
///
/// Equality and hashing consider only the identity; the label is carried for
/// display and error messages.
#[derive(Debug, Clone)]
pub struct TypeKey {
    id: TypeKeyId,
    label: Arc<str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::From, derive_more::IsVariant)]
enum TypeKeyId {
    Runtime(TypeId),
    Named(Arc<str>),
}

impl TypeKey {
    /// Key for the Rust type `T`, labelled with its type name.
    pub fn of<T: Any>() -> Self {
        TypeKey {
            id: TypeId::of::<T>().into(),
            label: std::any::type_name::<T>().into(),
        }
    }

    /// Key for the dynamic type of a live value. Equal to `TypeKey::of::<T>()`
    /// for the concrete `T` behind the reference, though without its label.
    pub fn of_val(value: &dyn Any) -> Self {
        TypeKey {
            id: value.type_id().into(),
            label: Arc::from("{runtime}"),
        }
    }

    /// Key identified by an arbitrary name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        TypeKey {
            id: TypeKeyId::Named(name.clone()),
            label: name,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_runtime(&self) -> bool {
        self.id.is_runtime()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// An opaque tag expressing a contextual property of a value, e.g.
/// `"validated"` or `"normalized"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variation(Arc<str>);

impl Variation {
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Variation(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variation {
    fn from(tag: &str) -> Self {
        Variation::new(tag)
    }
}

impl From<String> for Variation {
    fn from(tag: String) -> Self {
        Variation::new(tag)
    }
}

impl Display for Variation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unordered set of [`Variation`]s with set-equality and subset semantics.
///
/// Backed by an ordered representation so that two sets built in different
/// insertion orders are equal, hash identically, and can key the search's
/// visited map.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariationSet(BTreeSet<Variation>);

impl VariationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, variation: &Variation) -> bool {
        self.0.contains(variation)
    }

    pub fn insert(&mut self, variation: impl Into<Variation>) -> bool {
        self.0.insert(variation.into())
    }

    pub fn is_subset(&self, other: &VariationSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn union(&self, other: &VariationSet) -> VariationSet {
        VariationSet(self.0.union(&other.0).cloned().collect())
    }

    /// Union `other` into `self` in place.
    pub fn merge(&mut self, other: &VariationSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variation> {
        self.0.iter()
    }
}

impl<V: Into<Variation>> FromIterator<V> for VariationSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        VariationSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Variation>> Extend<V> for VariationSet {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl Display for VariationSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}
