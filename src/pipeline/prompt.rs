// file: src/pipeline/prompt.rs
// description: grounding prompt rendering from a question and retrieved abstracts

use crate::models::RetrievedDocument;

/// Answer the model must give verbatim when the context is not enough.
pub const FALLBACK_ANSWER: &str = "The context does not provide information about the question.";

const INSTRUCTIONS: &str = "You are a distinguished and helpful medical assistant.

Your task is to answer the question using only the context provided.

Every time you make a factual statement, you must cite the source ID at the end of the sentence.
Example: \"Caffeine increases heart rate [Source 1].\"";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Labeled context blocks, numbered from 1 in retrieval order.
    pub fn context_text(documents: &[RetrievedDocument]) -> String {
        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("Source {} (Title: {}): \n{}\n\n", i + 1, doc.title, doc.text))
            .collect()
    }

    pub fn build(question: &str, documents: &[RetrievedDocument]) -> String {
        format!(
            "{}\n\nIf the answer is not part of the context, respond with \"{}\"\n\nquestion = {}\n\ncontext to use = {}",
            INSTRUCTIONS,
            FALLBACK_ANSWER,
            question,
            Self::context_text(documents)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn retrieved(title: &str, text: &str) -> RetrievedDocument {
        RetrievedDocument::new("id".to_string(), title.to_string(), text.to_string(), Some(0.1))
    }

    #[test]
    fn test_context_blocks_numbered_in_order() {
        let docs = vec![
            retrieved("Caffeine", "Title: Caffeine\nabstract: A"),
            retrieved("Sleep", "Title: Sleep\nabstract: B"),
        ];

        assert_eq!(
            PromptBuilder::context_text(&docs),
            "Source 1 (Title: Caffeine): \nTitle: Caffeine\nabstract: A\n\nSource 2 (Title: Sleep): \nTitle: Sleep\nabstract: B\n\n"
        );
    }

    #[test]
    fn test_prompt_contains_rules_and_question() {
        let docs = vec![retrieved("Caffeine", "text")];
        let prompt = PromptBuilder::build("Does caffeine block adenosine?", &docs);

        assert!(prompt.contains("using only the context provided"));
        assert!(prompt.contains("[Source 1]"));
        assert!(prompt.contains(&format!("\"{}\"", FALLBACK_ANSWER)));
        assert!(prompt.contains("question = Does caffeine block adenosine?"));
        assert!(prompt.contains("context to use = Source 1 (Title: Caffeine): \ntext\n\n"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let docs = vec![retrieved("A", "a"), retrieved("B", "b"), retrieved("C", "c")];
        assert_eq!(
            PromptBuilder::build("q", &docs),
            PromptBuilder::build("q", &docs)
        );
    }

    #[test]
    fn test_prompt_with_no_documents_has_empty_context() {
        let prompt = PromptBuilder::build("q", &[]);
        assert!(prompt.ends_with("context to use = "));
        assert!(!prompt.contains("Source 1 ("));
    }
}
