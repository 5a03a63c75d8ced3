//! In-memory collection store with document ingestion and similarity queries.
//!
//! Each collection keeps its documents in insertion order. Queries are a
//! brute-force scan: embed the query once, filter by metadata, score every
//! surviving document by cosine distance and keep the closest `limit`.
//!
//! The store is owned by the caller and built with one embedding service.
//! Embeddings are computed before the write lock is taken, so no lock is held
//! across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use medaid_core::config::EmbeddingConfig;
use medaid_core::types::{CollectionInfo, Document, Metadata, NewDocument};

use crate::distance::cosine_distance;
use crate::embedding::{embedder_from_config, DynEmbeddingService, EmbeddingService};
use crate::error::VectorError;
use crate::filter::MetadataFilter;

/// Number of hits returned when the caller does not choose a limit.
pub const DEFAULT_QUERY_LIMIT: usize = 5;

/// A ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub document: Document,
    /// Cosine distance to the query; lower is closer. `inf` when the vectors
    /// are not comparable.
    pub distance: f64,
}

/// Outcome of a successful `add_documents` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents appended from the batch (after in-batch dedup).
    pub added: usize,
    /// Previously stored documents removed because the batch reused their id.
    pub replaced: usize,
}

#[derive(Debug)]
struct Collection {
    metadata: Metadata,
    documents: Vec<Document>,
    created_at: DateTime<Utc>,
}

impl Collection {
    fn info(&self, name: &str) -> CollectionInfo {
        CollectionInfo {
            name: name.to_string(),
            metadata: self.metadata.clone(),
            document_count: self.documents.len(),
            created_at: self.created_at,
        }
    }
}

/// Named collections of embedded documents.
pub struct CollectionStore {
    collections: RwLock<HashMap<String, Collection>>,
    embedder: Box<dyn DynEmbeddingService>,
}

impl CollectionStore {
    /// Create an empty store that embeds with `embedder`.
    pub fn new(embedder: impl EmbeddingService + 'static) -> Self {
        Self::new_dyn(Box::new(embedder))
    }

    /// Create an empty store from a pre-boxed embedding service.
    pub fn new_dyn(embedder: Box<dyn DynEmbeddingService>) -> Self {
        debug!(dimensions = embedder.dimensions(), "Collection store opened");
        Self {
            collections: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    /// Create an empty store with the backend named in `config`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, VectorError> {
        Ok(Self::new_dyn(embedder_from_config(config)?))
    }

    /// Dimensionality of the vectors this store produces.
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Register a new, empty collection.
    ///
    /// Fails with [`VectorError::CollectionExists`] if the name is taken; the
    /// existing collection is left untouched.
    pub fn create_collection(&self, name: &str, metadata: Metadata) -> Result<(), VectorError> {
        let mut collections = self.write()?;
        if collections.contains_key(name) {
            warn!(collection = name, "Collection already exists");
            return Err(VectorError::CollectionExists(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            Collection {
                metadata,
                documents: Vec::new(),
                created_at: Utc::now(),
            },
        );
        info!(collection = name, "Collection created");
        Ok(())
    }

    /// Snapshot of a collection, or `None` if it does not exist.
    ///
    /// The lookup accessors below also return nothing when the lock is
    /// poisoned. That case is logged at warn level; `add_documents` and
    /// `query_collection` report it as [`VectorError::Lock`].
    pub fn get_collection(&self, name: &str) -> Option<CollectionInfo> {
        let collections = self.read_logged("get_collection")?;
        collections.get(name).map(|c| c.info(name))
    }

    /// Snapshots of all collections, sorted by name.
    pub fn list_collections(&self) -> Vec<CollectionInfo> {
        let Some(collections) = self.read_logged("list_collections") else {
            return Vec::new();
        };
        let mut infos: Vec<CollectionInfo> =
            collections.iter().map(|(name, c)| c.info(name)).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Number of documents in a collection.
    pub fn document_count(&self, name: &str) -> Option<usize> {
        let collections = self.read_logged("document_count")?;
        collections.get(name).map(|c| c.documents.len())
    }

    /// Fetch a stored document by id.
    pub fn get_document(&self, name: &str, id: &str) -> Option<Document> {
        let collections = self.read_logged("get_document")?;
        collections
            .get(name)?
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Embed and store a batch of documents.
    ///
    /// Stored documents whose id appears in the batch are dropped, then the
    /// batch is appended in order. If an id repeats inside the batch, its last
    /// occurrence wins. Any embedding failure aborts the call before the
    /// collection is touched. Whether blank text fails depends on the backend:
    /// the placeholder backends embed it, ONNX rejects it.
    pub async fn add_documents(
        &self,
        name: &str,
        documents: Vec<NewDocument>,
    ) -> Result<IngestReport, VectorError> {
        self.ensure_exists(name)?;

        let batch = dedup_last_wins(documents);
        let mut embedded = Vec::with_capacity(batch.len());
        for doc in batch {
            let embedding = self.embedder.embed_boxed(&doc.text).await?;
            embedded.push(Document {
                id: doc.id,
                text: doc.text,
                metadata: doc.metadata.unwrap_or_default(),
                embedding,
            });
        }

        let report = {
            let mut collections = self.write()?;
            let collection = collections
                .get_mut(name)
                .ok_or_else(|| VectorError::CollectionNotFound(name.to_string()))?;
            merge_batch(&mut collection.documents, embedded)
        };

        info!(
            collection = name,
            added = report.added,
            replaced = report.replaced,
            "Documents ingested"
        );
        Ok(report)
    }

    /// Rank the documents of a collection against `query_text`.
    ///
    /// Only documents matching `filter` are scored. Results are sorted by
    /// ascending cosine distance, ties keep stored order, and at most `limit`
    /// hits are returned.
    pub async fn query_collection(
        &self,
        name: &str,
        query_text: &str,
        limit: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryHit>, VectorError> {
        self.ensure_exists(name)?;

        let query = self.embedder.embed_boxed(query_text).await?;

        let collections = self.read()?;
        let collection = collections
            .get(name)
            .ok_or_else(|| VectorError::CollectionNotFound(name.to_string()))?;

        let hits = rank(&query, &collection.documents, filter, limit);
        debug!(
            collection = name,
            candidates = collection.documents.len(),
            returned = hits.len(),
            "Query completed"
        );
        Ok(hits)
    }

    /// Tear the store down, returning how many documents were released.
    pub fn shutdown(self) -> usize {
        let collections = self
            .collections
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let released: usize = collections.values().map(|c| c.documents.len()).sum();
        info!(
            collections = collections.len(),
            documents = released,
            "Collection store shut down"
        );
        released
    }

    fn ensure_exists(&self, name: &str) -> Result<(), VectorError> {
        if self.read()?.contains_key(name) {
            Ok(())
        } else {
            warn!(collection = name, "Collection not found");
            Err(VectorError::CollectionNotFound(name.to_string()))
        }
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>, VectorError> {
        self.collections
            .read()
            .map_err(|e| VectorError::Lock(e.to_string()))
    }

    fn read_logged(
        &self,
        operation: &'static str,
    ) -> Option<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        match self.read() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!(operation, error = %e, "Collection store lock poisoned");
                None
            }
        }
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>, VectorError> {
        self.collections
            .write()
            .map_err(|e| VectorError::Lock(e.to_string()))
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("collections", &self.list_collections().len())
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

/// Drop earlier duplicates of an id so only its last occurrence survives.
fn dedup_last_wins(documents: Vec<NewDocument>) -> Vec<NewDocument> {
    let last_index: HashMap<&str, usize> = documents
        .iter()
        .enumerate()
        .map(|(i, d)| (d.id.as_str(), i))
        .collect();
    let keep: Vec<bool> = documents
        .iter()
        .enumerate()
        .map(|(i, d)| last_index.get(d.id.as_str()) == Some(&i))
        .collect();

    documents
        .into_iter()
        .zip(keep)
        .filter_map(|(doc, keep)| keep.then_some(doc))
        .collect()
}

fn merge_batch(stored: &mut Vec<Document>, batch: Vec<Document>) -> IngestReport {
    let incoming: HashSet<&str> = batch.iter().map(|d| d.id.as_str()).collect();
    let before = stored.len();
    stored.retain(|d| !incoming.contains(d.id.as_str()));
    let replaced = before - stored.len();
    let added = batch.len();
    stored.extend(batch);
    IngestReport { added, replaced }
}

fn rank(
    query: &[f32],
    documents: &[Document],
    filter: &MetadataFilter,
    limit: usize,
) -> Vec<QueryHit> {
    let mut scored: Vec<(&Document, f64)> = documents
        .iter()
        .filter(|d| filter.matches(&d.metadata))
        .map(|d| (d, cosine_distance(query, &d.embedding)))
        .collect();

    // `sort_by` is stable, so equal distances keep stored order.
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(doc, distance)| QueryHit {
            document: doc.clone(),
            distance,
        })
        .collect()
}
