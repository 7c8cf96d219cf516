// file: src/pipeline/query.rs
// description: question answering over the abstracts collection
// reference: embed question, retrieve top-k, prompt the generator, collect report rows

use crate::database::{Collection, Embedder, EmbeddingTask, LanceDbClient};
use crate::error::{PipelineError, Result};
use crate::llm::AnswerGenerator;
use crate::models::{Answer, AnswerRecord, RetrievedDocument};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::pipeline::prompt::PromptBuilder;
use crate::utils::{RetryOutcome, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Ordered report rows plus counters for one query run.
#[derive(Debug)]
pub struct QueryRun {
    pub records: Vec<AnswerRecord>,
    pub stats: PipelineStats,
}

enum QuestionOutcome {
    Answered(AnswerRecord),
    /// No query embedding could be obtained.
    Skipped,
    /// Retrieval failed after retries.
    Failed,
}

pub struct QueryPipeline {
    store: LanceDbClient,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    retry: RetryPolicy,
    top_k: usize,
    question_delay: Duration,
    show_progress: bool,
}

impl QueryPipeline {
    pub fn new(
        store: LanceDbClient,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn AnswerGenerator>,
        retry: RetryPolicy,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            retry,
            top_k,
            question_delay: Duration::ZERO,
            show_progress: true,
        }
    }

    /// Pause between consecutive questions.
    pub fn with_question_delay(mut self, delay: Duration) -> Self {
        self.question_delay = delay;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Opens the collection for reading. Never creates it.
    pub async fn open_collection(&self) -> Result<Collection> {
        let store = &self.store;
        let model = self.embedder.model_name();
        self.retry
            .run_if("collection open", PipelineError::is_transient, move || {
                store.get_collection(model)
            })
            .await
            .into_result()
    }

    /// Answers `questions` in order.
    ///
    /// Fails up front when the collection does not exist. After that no
    /// single question can end the run: a question without a query
    /// embedding is left out of the report, and an answer that could not be
    /// generated is recorded as unavailable.
    pub async fn run(&self, questions: &[String]) -> Result<QueryRun> {
        let collection = self.open_collection().await?;
        info!(
            "Answering {} questions against '{}' (top {})",
            questions.len(),
            collection.name(),
            self.top_k
        );

        let progress = if self.show_progress {
            ProgressTracker::new(questions.len())
        } else {
            ProgressTracker::hidden(questions.len())
        };

        let mut records = Vec::with_capacity(questions.len());

        for (index, question) in questions.iter().enumerate() {
            progress.set_message(format!("Question {}/{}", index + 1, questions.len()));

            match self.answer_question(&collection, question).await {
                QuestionOutcome::Answered(record) => {
                    if !record.answer.is_available() {
                        progress.inc_answers_unavailable();
                    }
                    progress.inc_processed();
                    records.push(record);
                }
                QuestionOutcome::Skipped => progress.inc_skipped(),
                QuestionOutcome::Failed => progress.inc_failed(),
            }

            if index + 1 < questions.len() && !self.question_delay.is_zero() {
                debug!("Waiting {:?} before the next question", self.question_delay);
                tokio::time::sleep(self.question_delay).await;
            }
        }

        let stats = progress.get_stats();
        progress.finish();
        stats.log_summary("Query");

        Ok(QueryRun { records, stats })
    }

    /// Nearest documents for `text`, without generating an answer.
    pub async fn retrieve(
        &self,
        collection: &Collection,
        text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let embedding = self.embed_query(text).await.into_result()?;
        self.query_collection(collection, &embedding, k)
            .await
            .into_result()
    }

    async fn answer_question(&self, collection: &Collection, question: &str) -> QuestionOutcome {
        info!("Question: {}", question);

        let embedding = match self.embed_query(question).await {
            RetryOutcome::Succeeded(embedding) => embedding,
            RetryOutcome::Exhausted { attempts, last_error } => {
                warn!(
                    "Skipping due to error while embedding query ({} attempts): {}",
                    attempts, last_error
                );
                return QuestionOutcome::Skipped;
            }
        };

        let documents = match self.query_collection(collection, &embedding, self.top_k).await {
            RetryOutcome::Succeeded(documents) => documents,
            RetryOutcome::Exhausted { attempts, last_error } => {
                error!(
                    "Retrieval failed after {} attempts, leaving question out: {}",
                    attempts, last_error
                );
                return QuestionOutcome::Failed;
            }
        };
        debug!("Retrieved {} documents", documents.len());

        let prompt = PromptBuilder::build(question, &documents);
        let generator = self.generator.as_ref();
        let prompt_ref = prompt.as_str();

        let answer = match self
            .retry
            .run_if("answer generation", PipelineError::is_transient, move || {
                generator.generate(prompt_ref)
            })
            .await
        {
            RetryOutcome::Succeeded(text) => Answer::Generated(text),
            RetryOutcome::Exhausted { attempts, last_error } => {
                error!(
                    "Answer generation failed after {} attempts: {}",
                    attempts, last_error
                );
                Answer::Unavailable
            }
        };

        let sources = documents.into_iter().map(|doc| doc.title).collect();
        QuestionOutcome::Answered(AnswerRecord::new(question, answer, sources))
    }

    async fn embed_query(&self, text: &str) -> RetryOutcome<Vec<f32>, PipelineError> {
        let embedder = self.embedder.as_ref();
        self.retry
            .run_if("query embedding", PipelineError::is_transient, move || {
                embedder.embed(text, EmbeddingTask::Query)
            })
            .await
    }

    async fn query_collection(
        &self,
        collection: &Collection,
        embedding: &[f32],
        k: usize,
    ) -> RetryOutcome<Vec<RetrievedDocument>, PipelineError> {
        self.retry
            .run_if("vector query", PipelineError::is_transient, move || {
                collection.query(embedding, k)
            })
            .await
    }
}
