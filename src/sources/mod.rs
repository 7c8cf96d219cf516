// file: src/sources/mod.rs
// description: literature source clients and their common interface
// reference: internal module structure

pub mod pubmed;

pub use pubmed::PubMedClient;

use crate::error::Result;
use crate::models::RecordOutcome;
use async_trait::async_trait;

/// Search-then-fetch access to a bibliographic database.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Identifiers matching `topic`, in the service's relevance order.
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<String>>;

    /// Full records for exactly `ids`, one outcome per returned record.
    async fn fetch(&self, ids: &[String]) -> Result<Vec<RecordOutcome>>;
}
