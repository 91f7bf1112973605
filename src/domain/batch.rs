use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use super::types::VerdictMap;

pub const DEFAULT_SESSION: &str = "default";

/// Body of `POST /recommend`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_initial_request: bool,
    #[serde(default)]
    pub reset_processed_urls: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl BatchRequest {
    pub fn session_key(&self) -> &str {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_SESSION)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    pub recommendations: VerdictMap,
}

/// Canonical form of a content URL: absolute http(s), fragment removed.
///
/// The result is the `url` crate's serialization, which may differ from the
/// submitted string (`http://V/1` becomes `http://v/1`, `https://host` becomes
/// `https://host/`). Verdict keys use this form, so clients must match on the
/// returned keys rather than on the strings they sent.
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

/// Canonicalizes and dedupes, keeping first-seen order.
pub fn canonical_urls<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for candidate in raw {
        match canonicalize_url(candidate.as_ref()) {
            Some(url) => {
                if seen.insert(url.clone()) {
                    out.push(url);
                }
            }
            None => {
                tracing::debug!(target: "relay", url = candidate.as_ref(), "dropping non-canonical url");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_drops_fragment_and_relative() {
        assert_eq!(
            canonicalize_url(" https://www.youtube.com/watch?v=abc#t=10 ").as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert_eq!(canonicalize_url("/watch?v=abc"), None);
        assert_eq!(canonicalize_url("ftp://host/file"), None);
        assert_eq!(canonicalize_url("http://v/1").as_deref(), Some("http://v/1"));
    }

    #[test]
    fn canonical_keys_may_differ_from_input() {
        assert_eq!(canonicalize_url("http://V/1").as_deref(), Some("http://v/1"));
        assert_eq!(canonicalize_url("https://host").as_deref(), Some("https://host/"));
    }

    #[test]
    fn canonical_urls_handles_large_batches() {
        let raw: Vec<String> = (0..20_000).map(|i| format!("http://v/{}", i % 5_000)).collect();
        let urls = canonical_urls(&raw);
        assert_eq!(urls.len(), 5_000);
        assert_eq!(urls[0], "http://v/0");
        assert_eq!(urls[4_999], "http://v/4999");
    }

    #[test]
    fn canonical_urls_dedupes_in_order() {
        let urls = canonical_urls(["http://v/2", "http://v/1", "http://v/2#x", "nope"]);
        assert_eq!(urls, vec!["http://v/2".to_string(), "http://v/1".to_string()]);
    }

    #[test]
    fn request_defaults_flags_and_session() {
        let req: BatchRequest =
            serde_json::from_str(r#"{"urls":["http://v/1"],"categories":["Chess"]}"#).unwrap();
        assert!(!req.is_initial_request);
        assert!(!req.reset_processed_urls);
        assert_eq!(req.session_key(), DEFAULT_SESSION);

        let req: BatchRequest = serde_json::from_str(
            r#"{"urls":[],"categories":[],"isInitialRequest":true,"resetProcessedUrls":true,"sessionId":"tab-7"}"#,
        )
        .unwrap();
        assert!(req.is_initial_request);
        assert!(req.reset_processed_urls);
        assert_eq!(req.session_key(), "tab-7");
    }
}
