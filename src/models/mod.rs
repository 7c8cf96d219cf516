// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod answer;
pub mod article;
pub mod document;
pub mod search_result;

pub use answer::{Answer, AnswerRecord, ERROR_ANSWER};
pub use article::{Article, RecordOutcome, SkipReason};
pub use document::Document;
pub use search_result::RetrievedDocument;
