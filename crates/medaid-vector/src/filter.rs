//! Exact-match metadata filter.

use medaid_core::types::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conjunctive equality filter over document metadata.
///
/// A document passes when every key in `equals` is present in its metadata
/// with an equal JSON value. An empty filter passes everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter {
    pub equals: Metadata,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`.
    pub fn require(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }
}

impl From<Metadata> for MetadataFilter {
    fn from(equals: Metadata) -> Self {
        Self { equals }
    }
}
