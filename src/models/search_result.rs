// file: src/models/search_result.rs
// description: Retrieved document model with similarity scores
// reference: Used for vector similarity search results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// PubMed identifier
    pub id: String,

    /// Article title, used as the citation label
    pub title: String,

    /// Stored document text (title + abstract)
    pub text: String,

    /// Distance to the query vector (lower is more similar)
    pub distance: Option<f32>,
}

impl RetrievedDocument {
    pub fn new(id: String, title: String, text: String, distance: Option<f32>) -> Self {
        Self {
            id,
            title,
            text,
            distance,
        }
    }

    /// Similarity derived from distance, 1.0 when the store reported none.
    pub fn score(&self) -> f32 {
        match self.distance {
            Some(dist) => 1.0 / (1.0 + dist),
            None => 1.0,
        }
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = if self.text.chars().count() > max_content_len {
            let truncated: String = self.text.chars().take(max_content_len).collect();
            format!("{}...", truncated)
        } else {
            self.text.clone()
        };

        format!(
            "Score: {:.4} | PMID {} | {}\n{}\n",
            self.score(),
            self.id,
            self.title,
            content_preview
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_from_distance() {
        let result = RetrievedDocument::new(
            "1".to_string(),
            "Title".to_string(),
            "Text".to_string(),
            Some(0.25),
        );
        assert!((result.score() - 0.8).abs() < 1e-6);

        let no_distance =
            RetrievedDocument::new("2".to_string(), "T".to_string(), "X".to_string(), None);
        assert_eq!(no_distance.score(), 1.0);
    }

    #[test]
    fn test_format_summary() {
        let result = RetrievedDocument::new(
            "12345".to_string(),
            "Caffeine and adenosine".to_string(),
            "This is a very long abstract that will be truncated".to_string(),
            Some(0.0),
        );

        let summary = result.format_summary(20);
        assert!(summary.contains("1.0000"));
        assert!(summary.contains("PMID 12345"));
        assert!(summary.contains("..."));
    }
}
