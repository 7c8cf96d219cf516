// file: src/models/document.rs
// description: embedded document model stored in the vector collection
// reference: internal data structures

use crate::models::Article;
use serde::{Deserialize, Serialize};

/// One row of the collection. `id` is the PubMed identifier, so storing
/// the same article twice replaces the earlier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
    pub topic: String,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn from_article(article: &Article, topic: &str, embedding: Vec<f32>) -> Self {
        Self {
            id: article.pmid.clone(),
            title: article.title.clone(),
            text: article.document_text(),
            topic: topic.to_string(),
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
