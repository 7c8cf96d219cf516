// file: src/llm/mod.rs
// description: generative model interface and Gemini client
// reference: internal module structure

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Sends `prompt` verbatim and returns the model's text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
