pub mod batch;
pub mod category;
pub mod types;

pub use batch::{BatchRequest, BatchResponse, canonical_urls};
pub use category::normalize_categories;
pub use types::{PromptVariant, Verdict, VerdictMap};
