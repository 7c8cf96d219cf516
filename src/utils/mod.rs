// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod retry;
pub mod validation;

pub use retry::{RetryOutcome, RetryPolicy};
pub use validation::Validator;
