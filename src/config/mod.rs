pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, GeminiConfig, MarkPolicy};
pub use loader::load_config;
