// file: src/pipeline/ingest.rs
// description: topic ingestion from PubMed into the abstracts collection
// reference: sequential search, fetch, embed and upsert per topic

use crate::database::{Collection, CollectionSpec, Embedder, EmbeddingTask, LanceDbClient};
use crate::database::embeddings::check_dimension;
use crate::error::{PipelineError, Result};
use crate::models::{Document, RecordOutcome};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::sources::LiteratureSource;
use crate::utils::{RetryOutcome, RetryPolicy, Validator};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Documents prepared for one topic, ready to upsert.
#[derive(Debug, Default)]
pub struct TopicBatch {
    pub documents: Vec<Document>,
    pub records_skipped: usize,
    pub embeddings_failed: usize,
}

pub struct IngestionPipeline {
    store: LanceDbClient,
    source: Arc<dyn LiteratureSource>,
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    max_results: usize,
    show_progress: bool,
}

impl IngestionPipeline {
    pub fn new(
        store: LanceDbClient,
        source: Arc<dyn LiteratureSource>,
        embedder: Arc<dyn Embedder>,
        retry: RetryPolicy,
        max_results: usize,
    ) -> Self {
        Self {
            store,
            source,
            embedder,
            retry,
            max_results,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Ingests every topic in order. A topic that fails is counted and
    /// logged, the run moves on to the next one. Only permanent errors while
    /// opening the collection (an existing collection built with another
    /// model, metric or dimension) end the run early.
    pub async fn run(&self, topics: &[String]) -> Result<PipelineStats> {
        Validator::validate_positive("max_results", self.max_results)?;
        Validator::validate_all_not_empty("topic", topics)?;

        info!(
            "Starting ingestion of {} topics (max {} results each)",
            topics.len(),
            self.max_results
        );

        let progress = if self.show_progress {
            ProgressTracker::new(topics.len())
        } else {
            ProgressTracker::hidden(topics.len())
        };

        let mut collection: Option<Collection> = None;

        for topic in topics {
            progress.set_message(format!("Topic: {}", topic));
            info!("Processing topic: {}", topic);

            let batch = match self.prepare_topic(topic).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!("Failed to collect documents for topic '{}': {}", topic, e);
                    progress.inc_failed();
                    continue;
                }
            };

            progress.add_records_skipped(batch.records_skipped);
            for _ in 0..batch.embeddings_failed {
                progress.inc_embeddings_failed();
            }

            if batch.documents.is_empty() {
                info!("No documents found to add for topic '{}'", topic);
                progress.inc_processed();
                continue;
            }

            let target = match collection.as_ref().cloned() {
                Some(existing) => existing,
                None => {
                    let spec = CollectionSpec {
                        dimension: batch.documents[0].dimension(),
                        distance: self.store.distance(),
                        embedding_model: self.embedder.model_name().to_string(),
                    };
                    let store = &self.store;
                    let spec = &spec;
                    match self
                        .retry
                        .run_if("collection open", PipelineError::is_transient, move || {
                            store.get_or_create_collection(spec)
                        })
                        .await
                    {
                        RetryOutcome::Succeeded(created) => {
                            collection = Some(created.clone());
                            created
                        }
                        RetryOutcome::Exhausted { last_error, .. } if !last_error.is_transient() => {
                            progress.finish();
                            return Err(last_error);
                        }
                        RetryOutcome::Exhausted {
                            attempts,
                            last_error,
                        } => {
                            error!(
                                "Could not open collection for topic '{}' after {} attempts: {}",
                                topic, attempts, last_error
                            );
                            progress.inc_failed();
                            continue;
                        }
                    }
                }
            };

            info!(
                "Adding {} documents for topic '{}' to '{}'",
                batch.documents.len(),
                topic,
                target.name()
            );

            let target = &target;
            let documents = batch.documents.as_slice();
            match self
                .retry
                .run_if("collection upsert", PipelineError::is_transient, move || {
                    target.upsert(documents)
                })
                .await
            {
                RetryOutcome::Succeeded(stats) => {
                    debug!(
                        "Topic '{}': {} new, {} replaced",
                        topic, stats.inserted, stats.updated
                    );
                    progress.add_documents_upserted(stats.submitted);
                    progress.inc_processed();
                }
                RetryOutcome::Exhausted {
                    attempts,
                    last_error,
                } => {
                    error!(
                        "Giving up on upsert for topic '{}' after {} attempts: {}",
                        topic, attempts, last_error
                    );
                    progress.inc_failed();
                }
            }
        }

        let stats = progress.get_stats();
        progress.finish();
        stats.log_summary("Ingestion");

        Ok(stats)
    }

    /// Searches, fetches and embeds the articles for one topic.
    ///
    /// Search and fetch failures are returned as errors. Incomplete records
    /// and articles whose embedding could not be obtained are skipped and
    /// counted in the batch.
    pub async fn prepare_topic(&self, topic: &str) -> Result<TopicBatch> {
        let source = self.source.as_ref();
        let max_results = self.max_results;

        let ids = self
            .retry
            .run_if("PubMed search", PipelineError::is_transient, move || {
                source.search(topic, max_results)
            })
            .await
            .into_result()?;

        if ids.is_empty() {
            info!("PubMed returned no identifiers for '{}'", topic);
            return Ok(TopicBatch::default());
        }
        debug!("Found {} identifiers for '{}'", ids.len(), topic);

        let id_slice = ids.as_slice();
        let outcomes = self
            .retry
            .run_if("PubMed fetch", PipelineError::is_transient, move || {
                source.fetch(id_slice)
            })
            .await
            .into_result()?;

        let mut batch = TopicBatch::default();
        let mut dimension: Option<usize> = None;

        for outcome in outcomes {
            let article = match outcome {
                RecordOutcome::Parsed(article) => article,
                RecordOutcome::Skipped { pmid, reason } => {
                    warn!(
                        "Skipping record {}: {}",
                        pmid.as_deref().unwrap_or("<unknown>"),
                        reason
                    );
                    batch.records_skipped += 1;
                    continue;
                }
            };

            let embedder = self.embedder.as_ref();
            let text = article.document_text();
            let text_ref = text.as_str();
            let embedding = match self
                .retry
                .run_if("document embedding", PipelineError::is_transient, move || {
                    embedder.embed(text_ref, EmbeddingTask::Document)
                })
                .await
            {
                RetryOutcome::Succeeded(embedding) => embedding,
                RetryOutcome::Exhausted { last_error, .. } => {
                    warn!(
                        "No embedding for PMID {}, leaving it out: {}",
                        article.pmid, last_error
                    );
                    batch.embeddings_failed += 1;
                    continue;
                }
            };

            if let Err(e) = check_dimension(&embedding, dimension) {
                warn!("Discarding embedding for PMID {}: {}", article.pmid, e);
                batch.embeddings_failed += 1;
                continue;
            }
            dimension.get_or_insert(embedding.len());

            batch
                .documents
                .push(Document::from_article(&article, topic, embedding));
        }

        Ok(batch)
    }
}
