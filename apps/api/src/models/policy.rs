use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "General".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_source() -> String {
    "Internal".to_string()
}

/// A policy document as supplied by the caller. Source of truth for the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub name: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_source")]
    pub source: String,
}

#[cfg(test)]
impl PolicyDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            category: default_category(),
            version: default_version(),
            source: default_source(),
        }
    }
}

/// Metadata every chunk inherits from its parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub policy_name: String,
    pub category: String,
    pub version: String,
    pub source: String,
}

impl From<&PolicyDocument> for ChunkMetadata {
    fn from(doc: &PolicyDocument) -> Self {
        Self {
            policy_name: doc.name.clone(),
            category: doc.category.clone(),
            version: doc.version.clone(),
            source: doc.source.clone(),
        }
    }
}
