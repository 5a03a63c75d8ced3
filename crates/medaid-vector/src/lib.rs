//! MedAid vector crate - embedding services, collection store, and retrieval.
//!
//! Provides an in-memory collection store with cosine-distance queries,
//! an embedding service trait with random, hash-based and ONNX backends,
//! the built-in first-aid corpus, and the retriever used by the chat assistant.

pub mod corpus;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod retriever;
pub mod store;

pub use corpus::{first_aid_guides, seed_first_aid};
pub use distance::cosine_distance;
pub use embedding::{
    embedder_from_config, DynEmbeddingService, EmbeddingService, HashEmbedding,
    OnnxEmbeddingService, RandomEmbedding,
};
pub use error::VectorError;
pub use filter::MetadataFilter;
pub use retriever::FirstAidRetriever;
pub use store::{CollectionStore, IngestReport, QueryHit, DEFAULT_QUERY_LIMIT};
