//! Chat-facing retrieval over the first-aid collection.
//!
//! FirstAidRetriever wraps a shared [`CollectionStore`], clamps caller limits,
//! and turns a missing collection into "no guidance" so the assistant can
//! still answer without grounding.

use std::fmt::Write as _;
use std::sync::Arc;

use medaid_core::config::RetrievalConfig;
use tracing::{debug, warn};

use crate::error::VectorError;
use crate::filter::MetadataFilter;
use crate::store::{CollectionStore, QueryHit, DEFAULT_QUERY_LIMIT};

/// Retrieves first-aid guides relevant to a user message.
#[derive(Debug, Clone)]
pub struct FirstAidRetriever {
    store: Arc<CollectionStore>,
    collection: String,
    default_limit: usize,
    max_limit: usize,
}

impl FirstAidRetriever {
    pub fn new(store: Arc<CollectionStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            default_limit: DEFAULT_QUERY_LIMIT,
            max_limit: usize::MAX,
        }
    }

    pub fn from_config(store: Arc<CollectionStore>, config: &RetrievalConfig) -> Self {
        Self {
            store,
            collection: config.first_aid_collection.clone(),
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Ranked guides for `query`. A missing collection yields an empty list.
    pub async fn relevant_guides(
        &self,
        query: &str,
        limit: Option<usize>,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryHit>, VectorError> {
        let limit = limit.unwrap_or(self.default_limit).min(self.max_limit);

        match self
            .store
            .query_collection(&self.collection, query, limit, filter)
            .await
        {
            Err(e) if e.is_not_found() => {
                warn!(
                    collection = %self.collection,
                    "No guide collection; answering without context"
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Render the closest guides as a context block for the assistant prompt.
    ///
    /// Returns an empty string when nothing relevant was found.
    pub async fn context_for(&self, query: &str) -> Result<String, VectorError> {
        let hits = self
            .relevant_guides(query, None, &MetadataFilter::new())
            .await?;
        debug!(query_len = query.len(), guides = hits.len(), "Assembled guide context");
        Ok(render_context(&hits))
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn render_context(hits: &[QueryHit]) -> String {
    if hits.is_empty() {
        return String::new();
    }

    let mut out = String::from("Relevant first-aid guidance:\n");
    for (i, hit) in hits.iter().enumerate() {
        let title = hit
            .document
            .metadata
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(&hit.document.id);
        let _ = write!(out, "\n[{}] {}\n{}\n", i + 1, title, hit.document.text);
    }
    out
}
