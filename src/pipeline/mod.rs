// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: ingestion and query orchestration

mod ingest;
mod progress;
mod prompt;
mod query;

pub use ingest::{IngestionPipeline, TopicBatch};
pub use progress::{PipelineStats, ProgressTracker};
pub use prompt::{FALLBACK_ANSWER, PromptBuilder};
pub use query::{QueryPipeline, QueryRun};
