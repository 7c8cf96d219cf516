// file: src/models/answer.rs
// description: answer records produced by the query pipeline
// reference: internal data structures

use serde::Serialize;

/// Report text recorded when generation never succeeded.
pub const ERROR_ANSWER: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Answer {
    Generated(String),
    /// Every generation attempt failed.
    Unavailable,
}

impl Answer {
    pub fn as_report_text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::Unavailable => ERROR_ANSWER,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Answer::Generated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: Answer,
    /// Titles of the retrieved documents, in citation order.
    pub sources: Vec<String>,
}

impl AnswerRecord {
    pub fn new(question: impl Into<String>, answer: Answer, sources: Vec<String>) -> Self {
        Self {
            question: question.into(),
            answer,
            sources,
        }
    }

    /// `[Source i]: title` lines, 1-indexed, joined with newlines.
    pub fn sources_cell(&self) -> String {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, title)| format!("[Source {}]: {}", i + 1, title))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_answer_reports_error() {
        assert_eq!(Answer::Unavailable.as_report_text(), "Error");
        assert!(!Answer::Unavailable.is_available());
        assert_eq!(Answer::Generated("ok".into()).as_report_text(), "ok");
    }

    #[test]
    fn test_sources_cell_numbering() {
        let record = AnswerRecord::new(
            "q",
            Answer::Generated("a".into()),
            vec!["First".to_string(), "Second".to_string()],
        );
        assert_eq!(record.sources_cell(), "[Source 1]: First\n[Source 2]: Second");
    }

    #[test]
    fn test_sources_cell_empty() {
        let record = AnswerRecord::new("q", Answer::Unavailable, vec![]);
        assert_eq!(record.sources_cell(), "");
    }
}
