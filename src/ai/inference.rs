use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::error::ModelError;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

static QUOTA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)quota|rate[ _-]?limit|exceeded").expect("valid quota regex"));

pub fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
    }
}

pub fn endpoint_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

/// Text of the first part of the first candidate.
pub fn extract_completion(body: &str) -> Result<String, ModelError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| ModelError::MalformedResponse(format!("invalid JSON body: {err}")))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            ModelError::MalformedResponse("missing candidates[0].content.parts[0].text".into())
        })
}

/// Maps a non-success response to a quota or API error. Quota detection is a
/// keyword heuristic over the provider message and may drift with provider
/// wording.
pub fn classify_failure(status: StatusCode, body: &str) -> ModelError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    };
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        message
    };

    if status == StatusCode::TOO_MANY_REQUESTS || QUOTA_REGEX.is_match(&message) {
        ModelError::Quota {
            status: status.as_u16(),
            message,
        }
    } else {
        ModelError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
