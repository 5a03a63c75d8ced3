use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MedaidError, Result};

/// Top-level configuration for MedAid.
///
/// Loaded from `~/.medaid/config.toml` by default. Every section falls back to
/// its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedaidConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl MedaidConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MedaidConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make retrieval meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimensions == 0 {
            return Err(MedaidError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.default_limit == 0 {
            return Err(MedaidError::Config(
                "retrieval.default_limit must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.default_limit > self.retrieval.max_limit {
            return Err(MedaidError::Config(format!(
                "retrieval.default_limit ({}) exceeds retrieval.max_limit ({})",
                self.retrieval.default_limit, self.retrieval.max_limit
            )));
        }
        if self.embedding.backend == EmbeddingBackend::Onnx && self.embedding.model_dir.is_none()
        {
            return Err(MedaidError::Config(
                "embedding.model_dir is required for the onnx backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which embedding strategy a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Uniformly random vectors. Structural testing only.
    Random,
    /// Deterministic hash-derived vectors.
    Hash,
    /// ONNX sentence-transformer with mean pooling.
    Onnx,
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Vector dimensionality for the random and hash backends. The ONNX
    /// backend reads it from the model.
    pub dimensions: usize,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
    /// Seed for the random backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hash,
            dimensions: 384,
            model_dir: None,
            seed: None,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Collection holding the built-in first-aid guides.
    pub first_aid_collection: String,
    /// Number of results when the caller does not ask for a limit.
    pub default_limit: usize,
    /// Upper bound on caller-supplied limits.
    pub max_limit: usize,
    /// Load the first-aid guides into the store on startup.
    pub seed_first_aid: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            first_aid_collection: "first_aid".to_string(),
            default_limit: 5,
            max_limit: 50,
            seed_first_aid: true,
        }
    }
}

/// Password reset settings for the external auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public base URL of the web app.
    pub site_url: String,
    /// Path the reset email links back to.
    pub reset_path: String,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:3000".to_string(),
            reset_path: "/reset-password".to_string(),
            min_password_length: 6,
        }
    }
}
