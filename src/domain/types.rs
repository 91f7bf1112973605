use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// Binary outcome the model assigns to one content URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "recommend")]
    Recommend,
    #[serde(rename = "not recommend")]
    NotRecommend,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Recommend => "recommend",
            Verdict::NotRecommend => "not recommend",
        }
    }

    /// Accepts only the exact wire phrases.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        match phrase {
            "recommend" => Some(Verdict::Recommend),
            "not recommend" => Some(Verdict::NotRecommend),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdicts for one batch, keyed by canonical content URL. A URL missing from
/// the map has no verdict.
pub type VerdictMap = HashMap<String, Verdict>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// Detailed rubric, sent with the first batch of a session.
    Full,
    /// Abbreviated rubric for follow-up batches.
    Short,
}

impl PromptVariant {
    pub fn for_request(is_initial: bool) -> Self {
        if is_initial {
            PromptVariant::Full
        } else {
            PromptVariant::Short
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptVariant::Full => "full",
            PromptVariant::Short => "short",
        }
    }
}
