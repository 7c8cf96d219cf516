// file: src/models/article.rs
// description: parsed PubMed record and per-record parse outcome
// reference: PubmedArticle MedlineCitation structure

use serde::{Deserialize, Serialize};
use std::fmt;

/// A PubMed record that carried every required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    pub abstract_text: String,
}

impl Article {
    pub fn new(
        pmid: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            pmid: pmid.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
        }
    }

    /// Text stored and embedded for this article.
    pub fn document_text(&self) -> String {
        format!("Title: {}\nabstract: {}", self.title, self.abstract_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPmid,
    MissingTitle,
    MissingAbstract,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::MissingPmid => "missing PMID",
            SkipReason::MissingTitle => "missing article title",
            SkipReason::MissingAbstract => "missing abstract",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Parsed(Article),
    Skipped {
        pmid: Option<String>,
        reason: SkipReason,
    },
}

impl RecordOutcome {
    pub fn article(&self) -> Option<&Article> {
        match self {
            RecordOutcome::Parsed(article) => Some(article),
            RecordOutcome::Skipped { .. } => None,
        }
    }
}
