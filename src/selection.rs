//! Attribute selection: which attributes a GET/search response should
//! include (spec.md §4.7).

use std::collections::HashSet;

/// Either every attribute the descriptor knows about, or exactly the named
/// subset. Mirrors a SCIM `attributes`/`excludedAttributes` query parameter
/// already resolved down to an inclusion set by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelection {
    All,
    Named(HashSet<String>),
}

impl AttributeSelection {
    pub fn named(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        AttributeSelection::Named(names.into_iter().map(Into::into).collect())
    }

    pub fn is_requested(&self, name: &str) -> bool {
        match self {
            AttributeSelection::All => true,
            AttributeSelection::Named(names) => names.contains(name),
        }
    }
}

impl Default for AttributeSelection {
    fn default() -> Self {
        AttributeSelection::All
    }
}
