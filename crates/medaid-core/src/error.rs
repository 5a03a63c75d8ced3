use thiserror::Error;

/// Top-level error type for the MedAid workspace.
///
/// Subsystem crates define their own error enums and implement
/// `From<SubsystemError> for MedaidError`, so the binary can use `?` across
/// crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MedaidError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MedaidError {
    fn from(err: toml::de::Error) -> Self {
        MedaidError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MedaidError {
    fn from(err: toml::ser::Error) -> Self {
        MedaidError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MedaidError {
    fn from(err: serde_json::Error) -> Self {
        MedaidError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for MedAid operations.
pub type Result<T> = std::result::Result<T, MedaidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MedaidError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(MedaidError, &str)> = vec![
            (
                MedaidError::Embedding("model missing".to_string()),
                "Embedding error: model missing",
            ),
            (
                MedaidError::Retrieval("lock poisoned".to_string()),
                "Retrieval error: lock poisoned",
            ),
            (
                MedaidError::NotFound("first_aid".to_string()),
                "Collection not found: first_aid",
            ),
            (
                MedaidError::Auth("invalid email".to_string()),
                "Authentication error: invalid email",
            ),
            (
                MedaidError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MedaidError = io_err.into();
        assert!(matches!(err, MedaidError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: MedaidError = err.unwrap_err().into();
        assert!(matches!(err, MedaidError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: MedaidError = err.unwrap_err().into();
        assert!(matches!(err, MedaidError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
