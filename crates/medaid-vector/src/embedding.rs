//! Embedding service trait and implementations.
//!
//! - `OnnxEmbeddingService` loads a sentence-transformer ONNX model (e.g.
//!   all-MiniLM-L6-v2) via ort and tokenizes with the HuggingFace tokenizers
//!   crate. Token embeddings are mean-pooled into one vector per text.
//! - `RandomEmbedding` produces uniformly random vectors. They carry no
//!   meaning and only exercise the store's plumbing.
//! - `HashEmbedding` provides deterministic hash-based vectors for testing.
//!
//! A deployment picks exactly one backend; the store never branches on it.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use medaid_core::config::{EmbeddingBackend, EmbeddingConfig};
use ort::session::Session;
use ort::value::TensorRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenizers::Tokenizer;
use tracing::info;

use crate::error::VectorError;

/// Service for generating text embeddings.
///
/// Used for both ingestion and query; both sides of a collection must use the
/// same implementation for distances to mean anything.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, VectorError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future`, so it cannot be used as a
/// trait object. Every `EmbeddingService` gets this trait through the blanket
/// impl below.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, VectorError>> + Send + 'a>>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, VectorError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

/// Build the embedding backend selected in configuration.
pub fn embedder_from_config(
    config: &EmbeddingConfig,
) -> Result<Box<dyn DynEmbeddingService>, VectorError> {
    let embedder: Box<dyn DynEmbeddingService> = match config.backend {
        EmbeddingBackend::Random => match config.seed {
            Some(seed) => Box::new(RandomEmbedding::seeded(config.dimensions, seed)),
            None => Box::new(RandomEmbedding::new(config.dimensions)),
        },
        EmbeddingBackend::Hash => Box::new(HashEmbedding::new(config.dimensions)),
        EmbeddingBackend::Onnx => {
            let dir = config.model_dir.as_deref().ok_or_else(|| {
                VectorError::Embedding("onnx backend needs a model directory".to_string())
            })?;
            Box::new(OnnxEmbeddingService::from_directory(Path::new(dir))?)
        }
    };

    info!(
        backend = ?config.backend,
        dimensions = embedder.dimensions(),
        "Embedding backend ready"
    );
    Ok(embedder)
}

fn reject_empty(text: &str) -> Result<(), VectorError> {
    if text.trim().is_empty() {
        return Err(VectorError::Embedding("Cannot embed empty text".to_string()));
    }
    Ok(())
}

fn l2_normalize(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in values.iter_mut() {
            *val /= norm;
        }
    }
}

// ---------------------------------------------------------------------------
// OnnxEmbeddingService - feature extraction with mean pooling
// ---------------------------------------------------------------------------

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// ort::Session is Send + Sync internally (uses Arc<SharedSessionInner>).
unsafe impl Send for OnnxModel {}
unsafe impl Sync for OnnxModel {}

/// ONNX Runtime-backed embedding service using a sentence-transformer model.
///
/// Expects a model directory containing:
/// - `model.onnx` (the sentence-transformer export)
/// - `tokenizer.json` (the HuggingFace fast-tokenizer file)
///
/// The model takes `input_ids`, `attention_mask` and `token_type_ids` as i64
/// inputs and yields token-level embeddings of shape
/// `[1, seq_len, hidden_dim]`.
#[derive(Clone)]
pub struct OnnxEmbeddingService {
    model: Arc<OnnxModel>,
    dimensions: usize,
}

impl std::fmt::Debug for OnnxEmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingService")
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl OnnxEmbeddingService {
    /// Load a sentence-transformer model from the given directory.
    pub fn from_directory(model_dir: &Path) -> Result<Self, VectorError> {
        Self::from_files(
            &model_dir.join("model.onnx"),
            &model_dir.join("tokenizer.json"),
        )
    }

    /// Load from explicit model and tokenizer file paths.
    pub fn from_files(model_path: &Path, tokenizer_path: &Path) -> Result<Self, VectorError> {
        if !model_path.exists() {
            return Err(VectorError::Embedding(format!(
                "ONNX model not found at {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.exists() {
            return Err(VectorError::Embedding(format!(
                "Tokenizer not found at {}",
                tokenizer_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| VectorError::Embedding(format!("ONNX session builder: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| VectorError::Embedding(format!("ONNX set threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| VectorError::Embedding(format!("ONNX load model: {}", e)))?;

        // Last axis of [batch, seq_len, hidden_dim]; MiniLM-sized fallback.
        let dimensions = session
            .outputs()
            .first()
            .and_then(|out| out.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .map(|d| if d > 0 { d as usize } else { 384 })
            .unwrap_or(384);

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| VectorError::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        info!(
            model = %model_path.display(),
            dimensions,
            "Loaded ONNX embedding model"
        );

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
            }),
            dimensions,
        })
    }
}

impl OnnxModel {
    /// Tokenize, run inference, and mean-pool the output.
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        reject_empty(text)?;

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| VectorError::Embedding(format!("Tokenization failed: {}", e)))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let seq_len = input_ids.len();
        let shape_err =
            |e: ndarray::ShapeError| VectorError::Embedding(format!("input shape: {}", e));
        let ids_array =
            ndarray::Array2::from_shape_vec((1, seq_len), input_ids).map_err(shape_err)?;
        let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(shape_err)?;
        let type_array =
            ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids).map_err(shape_err)?;

        let ids_ref = TensorRef::from_array_view(&ids_array)
            .map_err(|e| VectorError::Embedding(format!("TensorRef input_ids: {}", e)))?;
        let mask_ref = TensorRef::from_array_view(&mask_array)
            .map_err(|e| VectorError::Embedding(format!("TensorRef attention_mask: {}", e)))?;
        let type_ref = TensorRef::from_array_view(&type_array)
            .map_err(|e| VectorError::Embedding(format!("TensorRef token_type_ids: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| VectorError::Lock(format!("ONNX session: {}", e)))?;
        let outputs = session
            .run(ort::inputs![ids_ref, mask_ref, type_ref])
            .map_err(|e| VectorError::Embedding(format!("ONNX inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VectorError::Embedding(format!("Extract embeddings: {}", e)))?;

        let hidden_dim = match shape.iter().copied().collect::<Vec<i64>>().as_slice() {
            [_, .., last] if *last > 0 => *last as usize,
            dims => {
                return Err(VectorError::Embedding(format!(
                    "Unexpected output shape: {:?}",
                    dims
                )))
            }
        };

        Ok(mean_pool(data, &attention_mask, hidden_dim))
    }
}

/// Average the token rows whose attention mask is set, then L2-normalize.
fn mean_pool(token_embeddings: &[f32], attention_mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut count = 0.0f32;

    for (tok_idx, &mask_val) in attention_mask.iter().enumerate() {
        if mask_val <= 0 {
            continue;
        }
        let offset = tok_idx * hidden_dim;
        let Some(row) = token_embeddings.get(offset..offset + hidden_dim) else {
            break;
        };
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for val in &mut pooled {
            *val /= count;
        }
    }

    l2_normalize(&mut pooled);
    pooled
}

impl EmbeddingService for OnnxEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        // Inference is CPU-bound; run it on a blocking thread.
        let model = Arc::clone(&self.model);
        let text_owned = text.to_string();

        tokio::task::spawn_blocking(move || model.embed_sync(&text_owned))
            .await
            .map_err(|e| VectorError::Embedding(format!("Embedding task panicked: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// RandomEmbedding - uniform placeholder vectors
// ---------------------------------------------------------------------------

/// Placeholder embedding service returning uniformly random vectors in `[0, 1)`.
///
/// Any text, including an empty string, gets a vector. Two calls with the
/// same text return different vectors, so query results are arbitrary. Use a
/// seed to make a run reproducible.
#[derive(Debug)]
pub struct RandomEmbedding {
    dimensions: usize,
    rng: Mutex<StdRng>,
}

impl RandomEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(dimensions: usize, seed: u64) -> Self {
        Self {
            dimensions,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn sample(&self) -> Result<Vec<f32>, VectorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| VectorError::Lock(format!("random embedding rng: {}", e)))?;
        Ok((0..self.dimensions).map(|_| rng.random::<f32>()).collect())
    }
}

impl EmbeddingService for RandomEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, VectorError> {
        self.sample()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// HashEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Embedding service that derives unit vectors from a hash of the input text.
///
/// Identical inputs always produce identical outputs, so a document queried by
/// its own text comes back at distance zero. Empty text hashes like any other.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result: Vec<f32> = (0..self.dimensions)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                i.hash(&mut hasher);
                let h = hasher.finish();
                (((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0) as f32
            })
            .collect();
        l2_normalize(&mut result);
        result
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
