pub mod client;
pub mod error;
pub mod inference;
pub mod parser;
pub mod prompt;

pub use client::{GeminiClient, ModelClient};
pub use error::ModelError;
pub use parser::parse_verdicts;
pub use prompt::build_prompt;
