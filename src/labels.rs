use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::types::Matcher;

/// Set of label name/value pairs supplied by the operator
///
/// Names are unique. Equality does not depend on the order the pairs were
/// written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Create an empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value,key=value` string
    ///
    /// Each entry is split on its first `=`. Entries that do not yield a
    /// non-empty name and a non-empty value are dropped without error, so
    /// `"a=1,bad,c=3"` parses to `{a: 1, c: 3}`. A repeated name keeps the
    /// last value.
    pub fn parse(input: &str) -> Self {
        let labels = input
            .split(',')
            .filter_map(|entry| entry.split_once('='))
            .filter(|(name, value)| !name.is_empty() && !value.is_empty())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self(labels)
    }

    /// Add a label, replacing any previous value for `name`
    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.as_str())
    }

    /// Iterate over pairs in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the `filter` query expression understood by Alertmanager
    ///
    /// Returns an empty string for an empty set.
    pub fn filter_expr(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Exact-match matchers, one per label
    pub fn to_matchers(&self) -> Vec<Matcher> {
        self.iter()
            .map(|(name, value)| Matcher::exact(name, value))
            .collect()
    }

    pub fn signature(&self) -> Signature {
        Signature::of_labels(self)
    }
}

/// Parse labels from a flat `key=value,...` string
///
/// See [`LabelSet::parse`] for the handling of malformed entries.
pub fn parse_labels(input: &str) -> LabelSet {
    LabelSet::parse(input)
}

/// Canonical, order-independent encoding of a label set
///
/// Pairs are sorted by name and each name is directly followed by its value,
/// with no separator. Two signatures are equal iff the underlying name/value
/// sets are equal. Regex flags on matchers are not part of the signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn of_labels(labels: &LabelSet) -> Self {
        Self::from_sorted(labels.iter())
    }

    /// Signature of a matcher list in whatever order the API returned it
    pub fn of_matchers(matchers: &[Matcher]) -> Self {
        let mut pairs: Vec<(&str, &str)> = matchers
            .iter()
            .map(|m| (m.name.as_str(), m.value.as_str()))
            .collect();
        pairs.sort_by_key(|(name, _)| *name);

        Self::from_sorted(pairs.into_iter())
    }

    fn from_sorted<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Self {
        let mut flat = String::new();
        for (name, value) in pairs {
            flat.push_str(name);
            flat.push_str(value);
        }
        Self(flat)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
