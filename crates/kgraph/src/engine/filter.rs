//! Property filters pushed down into the graph engine.

use crate::domain::{keys, Edge, PropertyValue, Vertex};

/// Anything a [`Filter`] can be evaluated against.
pub trait PropertySource {
    /// Look up a property by engine key.
    fn property(&self, key: &str) -> Option<PropertyValue>;
}

impl PropertySource for Vertex {
    fn property(&self, key: &str) -> Option<PropertyValue> {
        Vertex::property(self, key)
    }
}

impl PropertySource for Edge {
    fn property(&self, key: &str) -> Option<PropertyValue> {
        Edge::property(self, key)
    }
}

/// A boolean predicate over element properties.
///
/// Filters are plain data so they can be shipped to a remote engine; the
/// [`matches`](Filter::matches) method gives the reference semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches everything.
    Always,
    /// Element label is one of the given labels.
    HasLabel(Vec<String>),
    /// Property equals the value.
    Eq(String, PropertyValue),
    /// Property equals one of the values.
    Within(String, Vec<PropertyValue>),
    /// Multi-valued property contains the value.
    Contains(String, String),
    /// All sub-filters match. An empty list matches.
    And(Vec<Filter>),
    /// At least one sub-filter matches. An empty list never matches.
    Or(Vec<Filter>),
    /// The sub-filter does not match.
    Not(Box<Filter>),
}

impl Filter {
    /// Property equality.
    pub fn eq(key: &str, value: impl Into<PropertyValue>) -> Self {
        Filter::Eq(key.to_string(), value.into())
    }

    /// Property set membership.
    pub fn within<I, V>(key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropertyValue>,
    {
        Filter::Within(key.to_string(), values.into_iter().map(Into::into).collect())
    }

    /// Multi-valued property contains `value`.
    pub fn contains(key: &str, value: impl Into<String>) -> Self {
        Filter::Contains(key.to_string(), value.into())
    }

    /// Element id equality.
    pub fn id(id: impl Into<String>) -> Self {
        Filter::Eq(keys::ID.to_string(), PropertyValue::Text(id.into()))
    }

    /// Label membership.
    pub fn label<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::HasLabel(labels.into_iter().map(Into::into).collect())
    }

    /// Conjunction with another filter, flattening nested ANDs.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Always, f) | (f, Filter::Always) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Evaluate the filter against an element.
    pub fn matches<P: PropertySource + ?Sized>(&self, element: &P) -> bool {
        match self {
            Filter::Always => true,
            Filter::HasLabel(labels) => match element.property(keys::LABEL) {
                Some(PropertyValue::Text(label)) => labels.iter().any(|l| *l == label),
                _ => false,
            },
            Filter::Eq(key, value) => element.property(key).as_ref() == Some(value),
            Filter::Within(key, values) => element
                .property(key)
                .is_some_and(|actual| values.contains(&actual)),
            Filter::Contains(key, value) => match element.property(key) {
                Some(PropertyValue::Set(set)) => set.contains(value),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(element)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(element)),
            Filter::Not(inner) => !inner.matches(element),
        }
    }

    /// The element id this filter pins, if every match must have that id.
    ///
    /// Engines use this to turn a full scan into an index lookup.
    pub fn pinned_id(&self) -> Option<&str> {
        match self {
            Filter::Eq(key, PropertyValue::Text(id)) if key == keys::ID => Some(id),
            Filter::And(filters) => filters.iter().find_map(Filter::pinned_id),
            _ => None,
        }
    }
}
