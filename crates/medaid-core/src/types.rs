//! Shared domain types for collections and documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to collections and documents.
pub type Metadata = Map<String, Value>;

/// A document as supplied by the caller, before it has been embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Identifier, unique within a collection.
    pub id: String,
    /// Raw text that gets embedded.
    pub text: String,
    /// Optional metadata; absent is treated the same as empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl NewDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: None,
        }
    }

    /// Attach metadata to the document.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A stored document together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Read-only view of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub metadata: Metadata,
    pub document_count: usize,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_document_builder() {
        let mut meta = Metadata::new();
        meta.insert("type".to_string(), json!("burn"));

        let doc = NewDocument::new("burn-1", "Cool the burn").with_metadata(meta.clone());
        assert_eq!(doc.id, "burn-1");
        assert_eq!(doc.text, "Cool the burn");
        assert_eq!(doc.metadata, Some(meta));
    }

    #[test]
    fn test_new_document_deserializes_without_metadata() {
        let doc: NewDocument =
            serde_json::from_str(r#"{"id": "cut-1", "text": "Apply pressure"}"#).unwrap();
        assert!(doc.metadata.is_none());
    }

    #[test]
    fn test_document_serialization_skips_embedding() {
        let doc = Document {
            id: "a".to_string(),
            text: "text".to_string(),
            metadata: Metadata::new(),
            embedding: vec![0.5; 4],
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("embedding").is_none());
        assert_eq!(value["id"], "a");
    }
}
