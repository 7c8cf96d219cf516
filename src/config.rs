// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub pubmed: PubMedConfig,
    pub gemini: GeminiConfig,
    pub retry: RetryConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub uri: String,
    pub collection: String,
    #[serde(default)]
    pub distance: DistanceMetric,
}

/// Vector distance used by the collection. Written into the collection
/// schema when it is created and checked on every open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    Dot,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
            DistanceMetric::Dot => "dot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cosine" => Some(DistanceMetric::Cosine),
            "l2" => Some(DistanceMetric::L2),
            "dot" => Some(DistanceMetric::Dot),
            _ => None,
        }
    }
}

impl From<DistanceMetric> for lancedb::DistanceType {
    fn from(metric: DistanceMetric) -> Self {
        match metric {
            DistanceMetric::Cosine => lancedb::DistanceType::Cosine,
            DistanceMetric::L2 => lancedb::DistanceType::L2,
            DistanceMetric::Dot => lancedb::DistanceType::Dot,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PubMedConfig {
    pub base_url: String,
    pub email: String,
    pub tool: String,
    pub api_key: Option<String>,
    pub max_results: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub request_timeout_secs: u64,
}

impl GeminiConfig {
    /// Fails when no credential was configured. Called before any command
    /// that talks to the AI provider does work.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(PipelineError::Config(format!(
                "{} is not set; export it or add gemini.api_key to the config file",
                API_KEY_ENV
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub topics: Vec<String>,
    pub questions: Vec<String>,
    pub top_k: usize,
    pub question_delay_secs: u64,
    pub report_path: PathBuf,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PUBMED_RAG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.apply_api_key_from(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fills `gemini.api_key` from the environment when the file left it unset.
    pub fn apply_api_key_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing = self
            .gemini
            .api_key
            .as_deref()
            .is_none_or(|key| key.trim().is_empty());

        if missing {
            self.gemini.api_key = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty());
        }
    }

    pub fn default_config() -> Self {
        Self {
            store: StoreConfig {
                uri: "./med_db".to_string(),
                collection: "medical_abstracts".to_string(),
                distance: DistanceMetric::Cosine,
            },
            pubmed: PubMedConfig {
                base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
                email: "placeholder@example.com".to_string(),
                tool: "pubmed_rag".to_string(),
                api_key: None,
                max_results: 3,
                request_timeout_secs: 30,
            },
            gemini: GeminiConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                embedding_model: "text-embedding-004".to_string(),
                generation_model: "gemini-2.0-flash".to_string(),
                request_timeout_secs: 60,
            },
            retry: RetryConfig {
                max_attempts: 3,
                delay_secs: 10,
            },
            pipeline: PipelineConfig {
                topics: default_topics(),
                questions: default_questions(),
                top_k: 3,
                question_delay_secs: 5,
                report_path: PathBuf::from("output_file.csv"),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let checks = || -> Result<()> {
            Validator::validate_not_empty("store.uri", &self.store.uri)?;
            Validator::validate_not_empty("store.collection", &self.store.collection)?;
            Validator::validate_url(&self.pubmed.base_url)?;
            Validator::validate_url(&self.gemini.base_url)?;
            Validator::validate_positive("pubmed.max_results", self.pubmed.max_results)?;
            Validator::validate_positive("pipeline.top_k", self.pipeline.top_k)?;
            Validator::validate_positive("retry.max_attempts", self.retry.max_attempts as usize)?;
            Validator::validate_not_empty("gemini.embedding_model", &self.gemini.embedding_model)?;
            Validator::validate_not_empty("gemini.generation_model", &self.gemini.generation_model)?;
            Validator::validate_all_not_empty("pipeline.topics", &self.pipeline.topics)?;
            Validator::validate_all_not_empty("pipeline.questions", &self.pipeline.questions)?;
            Ok(())
        };

        checks().map_err(|e| PipelineError::Config(e.to_string()))
    }
}

fn default_topics() -> Vec<String> {
    [
        "Caffeine Sleep",
        "Alzheimer's disease",
        "Brain Cancer",
        "pneumonia",
        "Obsessive Compulsive Disorder",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_questions() -> Vec<String> {
    [
        "How does caffeine consumption affect sleep latency?",
        "What is the impact of caffeine on REM sleep cycles?",
        "Does caffeine act as an adenosine receptor antagonist?",
        "How long before bed should caffeine be avoided to prevent insomnia?",
        "What is the role of amyloid plaques in Alzheimer's disease?",
        "Are there genetic risk factors associated with Alzheimer's?",
        "What are the current FDA-approved treatments for Alzheimer's?",
        "How does tau protein accumulation relate to cognitive decline?",
        "What are the standard treatment protocols for Glioblastoma?",
        "Does chemotherapy effectively cross the blood-brain barrier?",
        "What are the survival rates for varying grades of brain tumors?",
        "Are there immunotherapy options for brain cancer patients?",
        "What are the primary differences between viral and bacterial pneumonia symptoms?",
        "Which antibiotics are commonly prescribed for community-acquired pneumonia?",
        "Is the pneumococcal vaccine effective for elderly patients?",
        "What are the common complications of untreated pneumonia?",
        "What is the efficacy of Exposure and Response Prevention (ERP) therapy?",
        "Are SSRIs considered a first-line treatment for OCD?",
        "How does OCD presentation differ in children versus adults?",
        "Is Deep Brain Stimulation (DBS) used for treatment-resistant OCD?",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
