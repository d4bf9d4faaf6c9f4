//! Ordered, typed parameter sets.
//!
//! A [`ParameterSet`] is the request payload before transport: an ordered
//! mapping from catalog [`Field`] to [`ParamValue`]. Request sub-models
//! contribute partial sets through the [`Parameters`] trait and are combined
//! with a right-biased [`ParameterSet::merge`].

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::catalog::{Field, YesNo};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A string value, sent as-is.
    Text(String),
    /// An integer value, rendered in decimal.
    Integer(i64),
    /// A nested set, rendered as `parent[child]=value`.
    Nested(ParameterSet),
}

impl ParamValue {
    /// Returns the text when this is a [`ParamValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested set when this is a [`ParamValue::Nested`].
    #[must_use]
    pub const fn as_nested(&self) -> Option<&ParameterSet> {
        match self {
            Self::Nested(set) => Some(set),
            _ => None,
        }
    }

    /// Renders a scalar the way it appears on the wire.
    ///
    /// Returns `None` for nested sets, which have no single rendering.
    #[must_use]
    pub fn to_wire_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Nested(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<YesNo> for ParamValue {
    fn from(value: YesNo) -> Self {
        Self::Text(value.as_str().to_owned())
    }
}

impl From<ParameterSet> for ParamValue {
    fn from(value: ParameterSet) -> Self {
        Self::Nested(value)
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Nested(set) => set.serialize(serializer),
        }
    }
}

/// Ordered mapping from [`Field`] to [`ParamValue`].
///
/// Keys are unique. Inserting an existing key replaces its value in place, so
/// the key keeps its first position. Equality compares content and order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(Field, ParamValue)>,
}

impl ParameterSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&mut self, field: Field, value: impl Into<ParamValue>) -> Option<ParamValue> {
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((field, value));
        None
    }

    /// Builder form of [`ParameterSet::insert`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<ParamValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts the value only when it is `Some`.
    #[must_use]
    pub fn with_opt<V: Into<ParamValue>>(mut self, field: Field, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(field, value);
        }
        self
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: Field) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(f, _)| *f == field)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns the value stored for `field`.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find_map(|(f, v)| (*f == field).then_some(v))
    }

    /// Returns a mutable reference to the value stored for `field`.
    pub fn get_mut(&mut self, field: Field) -> Option<&mut ParamValue> {
        self.entries
            .iter_mut()
            .find_map(|(f, v)| (*f == field).then_some(v))
    }

    /// Returns the text stored for `field`, if it is a text value.
    #[must_use]
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(ParamValue::as_text)
    }

    /// Returns `true` when `field` is present.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &ParamValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    /// Iterates keys in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    /// Right-biased union: entries of `overlay` replace those of `base`.
    ///
    /// Keys of `base` keep their position; new keys from `overlay` are
    /// appended in `overlay` order. `merge(merge(a, b), c)` equals
    /// `merge(a, merge(b, c))` only when the key sets are disjoint, which
    /// callers composing sub-models are expected to ensure.
    #[must_use]
    pub fn merge(mut base: Self, overlay: Self) -> Self {
        base.extend(overlay);
        base
    }

    /// Returns `self` merged with `overlay` without consuming either.
    #[must_use]
    pub fn merged(&self, overlay: &Self) -> Self {
        Self::merge(self.clone(), overlay.clone())
    }

    /// Folds the contributions of `parts`, left to right.
    #[must_use]
    pub fn from_parts(parts: &[&dyn Parameters]) -> Self {
        parts
            .iter()
            .fold(Self::new(), |acc, part| Self::merge(acc, part.parameters()))
    }
}

impl Extend<(Field, ParamValue)> for ParameterSet {
    fn extend<T: IntoIterator<Item = (Field, ParamValue)>>(&mut self, iter: T) {
        for (field, value) in iter {
            self.insert(field, value);
        }
    }
}

impl FromIterator<(Field, ParamValue)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (Field, ParamValue)>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for ParameterSet {
    type Item = (Field, ParamValue);
    type IntoIter = std::vec::IntoIter<(Field, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParameterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field.wire_name(), value)?;
        }
        map.end()
    }
}

/// Anything that contributes fields to a request.
pub trait Parameters {
    /// Returns this value's contribution. Absent optional data is omitted.
    fn parameters(&self) -> ParameterSet;
}

impl Parameters for ParameterSet {
    fn parameters(&self) -> ParameterSet {
        self.clone()
    }
}

impl<T: Parameters> Parameters for Option<T> {
    fn parameters(&self) -> ParameterSet {
        self.as_ref().map(Parameters::parameters).unwrap_or_default()
    }
}

impl<T: Parameters + ?Sized> Parameters for &T {
    fn parameters(&self) -> ParameterSet {
        (**self).parameters()
    }
}
