// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for pipeline execution
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Topics or questions that completed.
    pub items_processed: usize,
    /// Topics or questions abandoned after a failure.
    pub items_failed: usize,
    /// Questions left out of the report because no query embedding was available.
    pub items_skipped: usize,
    pub records_skipped: usize,
    pub embeddings_failed: usize,
    pub documents_upserted: usize,
    pub answers_unavailable: usize,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_total(&self) -> usize {
        self.items_processed + self.items_failed + self.items_skipped
    }

    pub fn items_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.items_processed as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.items_total();
        if total == 0 {
            return 0.0;
        }
        (self.items_processed as f64 / total as f64) * 100.0
    }

    pub fn log_summary(&self, title: &str) {
        info!("=== {} Summary ===", title);
        info!("Duration: {} seconds", self.duration_secs);
        info!("Processed: {}", self.items_processed);
        info!("Failed: {}", self.items_failed);
        info!("Skipped: {}", self.items_skipped);
        info!("Success rate: {:.2}%", self.success_rate());
        if self.documents_upserted > 0 || self.records_skipped > 0 || self.embeddings_failed > 0 {
            info!("Documents upserted: {}", self.documents_upserted);
            info!("Records skipped (incomplete): {}", self.records_skipped);
            info!("Records without embedding: {}", self.embeddings_failed);
        }
        if self.answers_unavailable > 0 {
            info!("Answers unavailable: {}", self.answers_unavailable);
        }
        info!("=================================");
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    items_processed: AtomicUsize,
    items_failed: AtomicUsize,
    items_skipped: AtomicUsize,
    records_skipped: AtomicUsize,
    embeddings_failed: AtomicUsize,
    documents_upserted: AtomicUsize,
    answers_unavailable: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_items: usize) -> Self {
        Self::with_visibility(total_items, true)
    }

    /// Counters only, nothing drawn.
    pub fn hidden(total_items: usize) -> Self {
        Self::with_visibility(total_items, false)
    }

    fn with_visibility(total_items: usize, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let multi_progress = MultiProgress::with_draw_target(target);

        let main_bar = create_progress_bar(&multi_progress, total_items as u64);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            items_processed: AtomicUsize::new(0),
            items_failed: AtomicUsize::new(0),
            items_skipped: AtomicUsize::new(0),
            records_skipped: AtomicUsize::new(0),
            embeddings_failed: AtomicUsize::new(0),
            documents_upserted: AtomicUsize::new(0),
            answers_unavailable: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_records_skipped(&self, count: usize) {
        self.records_skipped.fetch_add(count, Ordering::SeqCst);
    }

    pub fn inc_embeddings_failed(&self) {
        self.embeddings_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_documents_upserted(&self, count: usize) {
        self.documents_upserted.fetch_add(count, Ordering::SeqCst);
    }

    pub fn inc_answers_unavailable(&self) {
        self.answers_unavailable.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Processing complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            items_processed: self.items_processed.load(Ordering::SeqCst),
            items_failed: self.items_failed.load(Ordering::SeqCst),
            items_skipped: self.items_skipped.load(Ordering::SeqCst),
            records_skipped: self.records_skipped.load(Ordering::SeqCst),
            embeddings_failed: self.embeddings_failed.load(Ordering::SeqCst),
            documents_upserted: self.documents_upserted.load(Ordering::SeqCst),
            answers_unavailable: self.answers_unavailable.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let documents = self.documents_upserted.load(Ordering::SeqCst);
        let failed = self.items_failed.load(Ordering::SeqCst);
        let skipped = self.items_skipped.load(Ordering::SeqCst);

        let message = format!(
            "Documents: {} | Failed: {} | Skipped: {}",
            documents, failed, skipped
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        bar.set_style(style.progress_chars("█▓▒░"));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
