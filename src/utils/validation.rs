// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};

pub struct Validator;

impl Validator {
    pub fn validate_not_empty(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(PipelineError::Validation(format!("{} is empty", field)));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_positive(field: &str, value: usize) -> Result<()> {
        if value == 0 {
            return Err(PipelineError::Validation(format!(
                "{} must be greater than 0",
                field
            )));
        }
        Ok(())
    }

    pub fn validate_all_not_empty(field: &str, values: &[String]) -> Result<()> {
        for (idx, value) in values.iter().enumerate() {
            Self::validate_not_empty(&format!("{}[{}]", field, idx), value)?;
        }
        Ok(())
    }
}
