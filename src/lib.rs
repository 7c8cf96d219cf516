// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod error;
pub mod exporter;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod sources;
pub mod utils;

pub use config::{
    Config, DistanceMetric, GeminiConfig, PipelineConfig, PubMedConfig, RetryConfig, StoreConfig,
};
pub use database::{
    Collection, CollectionSpec, Embedder, EmbeddingTask, LanceDbClient, SchemaManager, UpsertStats,
};
pub use error::{PipelineError, Result};
pub use exporter::CsvReportWriter;
pub use llm::{AnswerGenerator, GeminiClient};
pub use models::{
    Answer, AnswerRecord, Article, Document, RecordOutcome, RetrievedDocument, SkipReason,
};
pub use parser::PubMedXmlParser;
pub use pipeline::{
    FALLBACK_ANSWER, IngestionPipeline, PipelineStats, ProgressTracker, PromptBuilder,
    QueryPipeline, QueryRun,
};
pub use sources::{LiteratureSource, PubMedClient};
pub use utils::{RetryOutcome, RetryPolicy, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _policy = RetryPolicy::from_config(&config.retry);
        let _writer = CsvReportWriter::new(&config.pipeline.report_path);
    }
}
