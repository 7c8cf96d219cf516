// file: src/database/insert.rs
// description: LanceDB upsert operations with vector embeddings
// reference: https://docs.rs/lancedb

use crate::database::client::Collection;
use crate::database::embeddings::check_dimension;
use crate::error::{PipelineError, Result};
use crate::models::Document;
use arrow_array::{
    FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::SchemaRef;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub submitted: usize,
    pub inserted: usize,
    pub updated: usize,
}

impl Collection {
    /// Inserts or replaces `documents` keyed by id. Empty input is a no-op.
    pub async fn upsert(&self, documents: &[Document]) -> Result<UpsertStats> {
        if documents.is_empty() {
            info!("No documents to upsert into '{}', skipping", self.name());
            return Ok(UpsertStats::default());
        }

        let expected = self.spec().dimension;
        for document in documents {
            check_dimension(&document.embedding, Some(expected)).map_err(|e| {
                PipelineError::Validation(format!("Document {}: {}", document.id, e))
            })?;
        }

        let documents = dedup_last_wins(documents);
        let record_batch = create_record_batch(self.schema.clone(), &documents)?;

        let rows_before = self.count().await?;

        let mut builder = self.table.merge_insert(&["id"]);
        builder
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        builder
            .execute(Box::new(RecordBatchIterator::new(
                vec![Ok(record_batch)],
                self.schema.clone(),
            )))
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to upsert documents: {}", e)))?;

        let rows_after = self.count().await?;
        let inserted = rows_after.saturating_sub(rows_before);
        let stats = UpsertStats {
            submitted: documents.len(),
            inserted,
            updated: documents.len().saturating_sub(inserted),
        };

        debug!(
            "Upserted {} documents into '{}' ({} new, {} replaced)",
            stats.submitted,
            self.name(),
            stats.inserted,
            stats.updated
        );
        Ok(stats)
    }
}

/// Keeps the last occurrence of each id so one batch never carries two
/// rows for the same key.
fn dedup_last_wins(documents: &[Document]) -> Vec<&Document> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&Document> = documents
        .iter()
        .rev()
        .filter(|doc| seen.insert(doc.id.as_str()))
        .collect();
    unique.reverse();
    unique
}

/// Create an Arrow RecordBatch from documents and their embeddings
fn create_record_batch(schema: SchemaRef, documents: &[&Document]) -> Result<RecordBatch> {
    let ingested_at = Utc::now().to_rfc3339();

    let ids: StringArray = documents.iter().map(|doc| Some(doc.id.as_str())).collect();
    let titles: StringArray = documents.iter().map(|doc| Some(doc.title.as_str())).collect();
    let texts: StringArray = documents.iter().map(|doc| Some(doc.text.as_str())).collect();
    let topics: StringArray = documents.iter().map(|doc| Some(doc.topic.as_str())).collect();
    let ingested: StringArray = documents
        .iter()
        .map(|_| Some(ingested_at.as_str()))
        .collect();

    // Build embedding array (FixedSizeList of Float32)
    let dimension = documents[0].embedding.len();
    let embedding_values: Float32Array = documents
        .iter()
        .flat_map(|doc| doc.embedding.iter().copied())
        .collect();

    let embedding_list = FixedSizeListArray::try_new_from_values(embedding_values, dimension as i32)
        .map_err(|e| PipelineError::Database(format!("Failed to create embedding array: {}", e)))?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(titles),
            Arc::new(texts),
            Arc::new(topics),
            Arc::new(ingested),
            Arc::new(embedding_list),
        ],
    )
    .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
}
