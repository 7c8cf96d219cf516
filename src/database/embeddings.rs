// file: src/database/embeddings.rs
// description: embedding provider interface shared by ingestion and query
// reference: https://ai.google.dev/api/embeddings#tasktype

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Embedding intent. Both tasks must come from the same model so that
/// document and query vectors share one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingTask {
    Document,
    Query,
}

impl EmbeddingTask {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>>;

    /// Identifies the vector space; stored alongside the collection.
    fn model_name(&self) -> &str;
}

/// Rejects empty vectors and vectors whose length differs from `expected`.
pub fn check_dimension(embedding: &[f32], expected: Option<usize>) -> Result<()> {
    if embedding.is_empty() {
        return Err(PipelineError::Embedding(
            "Embedding service returned an empty vector".to_string(),
        ));
    }

    match expected {
        Some(dim) if dim != embedding.len() => Err(PipelineError::Embedding(format!(
            "Embedding has dimension {}, expected {}",
            embedding.len(),
            dim
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_api_names() {
        assert_eq!(EmbeddingTask::Document.as_api_str(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbeddingTask::Query.as_api_str(), "RETRIEVAL_QUERY");
    }

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(&[0.1, 0.2], Some(2)).is_ok());
        assert!(check_dimension(&[0.1, 0.2], None).is_ok());
        assert!(check_dimension(&[0.1], Some(2)).is_err());
        assert!(check_dimension(&[], None).is_err());
    }
}
