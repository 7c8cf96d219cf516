// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Literature service error: {0}")]
    Literature(String),

    #[error("PubMed XML parse error: {0}")]
    Xml(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Collection '{0}' does not exist; run ingestion first")]
    CollectionNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Report error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether repeating the call that produced this error can succeed.
    /// Bad input, bad configuration and a missing collection cannot.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            PipelineError::Config(_)
                | PipelineError::Validation(_)
                | PipelineError::CollectionNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_are_transient() {
        assert!(PipelineError::Embedding("429 Resource exhausted".to_string()).is_transient());
        assert!(PipelineError::Generation("model overloaded".to_string()).is_transient());
        assert!(PipelineError::Literature("503".to_string()).is_transient());
        assert!(PipelineError::Database("commit conflict".to_string()).is_transient());
    }

    #[test]
    fn test_input_and_setup_errors_are_permanent() {
        assert!(!PipelineError::Validation("dimension 3 != 2".to_string()).is_transient());
        assert!(!PipelineError::Config("model changed".to_string()).is_transient());
        assert!(!PipelineError::CollectionNotFound("abstracts".to_string()).is_transient());
    }
}
