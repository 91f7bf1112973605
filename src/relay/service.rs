use std::sync::Arc;

use thiserror::Error;

use crate::{
    ai::{ModelClient, ModelError, build_prompt, parse_verdicts},
    config::MarkPolicy,
    domain::{BatchRequest, PromptVariant, VerdictMap, canonical_urls, normalize_categories},
};

use super::sessions::{Reservation, SessionRegistry};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Runs one batch: validate, dedupe, prompt, classify, parse.
pub struct RelayService {
    model: Arc<dyn ModelClient>,
    sessions: Arc<SessionRegistry>,
    mark_policy: MarkPolicy,
}

impl RelayService {
    pub fn new(
        model: Arc<dyn ModelClient>,
        sessions: Arc<SessionRegistry>,
        mark_policy: MarkPolicy,
    ) -> Self {
        Self {
            model,
            sessions,
            mark_policy,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub async fn recommend(&self, request: BatchRequest) -> Result<VerdictMap, RelayError> {
        let session = request.session_key().to_string();

        let urls = canonical_urls(&request.urls);
        if urls.is_empty() {
            return Err(RelayError::Validation("No URLs provided."));
        }
        let categories = normalize_categories(&request.categories);
        if categories.is_empty() {
            return Err(RelayError::Validation("No categories provided."));
        }

        if request.reset_processed_urls {
            tracing::info!(target: "relay", session = %session, "resetting processed urls");
        }

        // Optimistic marking is at-most-once: URLs stay marked even if the
        // model call below fails.
        let (fresh, mut pending) = match self.mark_policy {
            MarkPolicy::Optimistic => (
                self.sessions
                    .filter_new(&session, &urls, request.reset_processed_urls),
                None,
            ),
            MarkPolicy::OnSuccess => {
                let reservation =
                    self.sessions
                        .reserve_new(&session, &urls, request.reset_processed_urls);
                (
                    reservation.urls.clone(),
                    Some(PendingBatch::new(&self.sessions, &session, reservation)),
                )
            }
        };

        if fresh.is_empty() {
            tracing::info!(
                target: "relay",
                session = %session,
                submitted = urls.len(),
                "all urls already processed or in flight; skipping model call"
            );
            return Ok(VerdictMap::new());
        }

        let variant = PromptVariant::for_request(request.is_initial_request);
        let prompt = build_prompt(&fresh, &categories, variant);
        tracing::info!(
            target: "relay",
            session = %session,
            new_urls = fresh.len(),
            skipped = urls.len() - fresh.len(),
            variant = variant.label(),
            "classifying batch"
        );

        let completion = self.model.classify(&prompt).await.map_err(|err| {
            tracing::error!(
                target: "relay",
                session = %session,
                kind = err.kind(),
                provider = err.provider_message(),
                error = %err,
                "batch classification failed"
            );
            err
        })?;

        let verdicts = parse_verdicts(&completion);
        if let Some(pending) = pending.take() {
            pending.commit();
        }

        let dropped = fresh.iter().filter(|url| !verdicts.contains_key(*url)).count();
        if dropped > 0 {
            tracing::warn!(
                target: "relay",
                session = %session,
                missing = dropped,
                "model returned no verdict for some urls"
            );
        }
        tracing::info!(
            target: "relay",
            session = %session,
            verdicts = verdicts.len(),
            "batch classified"
        );
        Ok(verdicts)
    }
}

/// Reserved URLs of an in-flight batch. Released back to the session unless
/// committed, including when the request future is dropped mid-call.
struct PendingBatch<'a> {
    sessions: &'a SessionRegistry,
    session: &'a str,
    reservation: Reservation,
    committed: bool,
}

impl<'a> PendingBatch<'a> {
    fn new(sessions: &'a SessionRegistry, session: &'a str, reservation: Reservation) -> Self {
        Self {
            sessions,
            session,
            reservation,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.sessions.commit(self.session, &self.reservation);
        self.committed = true;
    }
}

impl Drop for PendingBatch<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.reservation.urls.is_empty() {
            self.sessions.abort(self.session, &self.reservation);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use super::*;
    use crate::{ai::inference::classify_failure, domain::Verdict};

    /// Records prompts and replies with a canned completion or error.
    pub(crate) struct FakeModel {
        reply: Option<String>,
        delay: Option<Duration>,
        pub(crate) calls: AtomicUsize,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn build(reply: Option<&str>, delay: Option<Duration>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                delay,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn replying(completion: &str) -> Arc<Self> {
            Self::build(Some(completion), None)
        }

        pub(crate) fn slow(completion: &str, delay: Duration) -> Arc<Self> {
            Self::build(Some(completion), Some(delay))
        }

        pub(crate) fn failing() -> Arc<Self> {
            Self::build(None, None)
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelClient for FakeModel {
        async fn classify(&self, prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(classify_failure(
                    StatusCode::TOO_MANY_REQUESTS,
                    r#"{"error":{"message":"Quota exceeded"}}"#,
                )),
            }
        }
    }

    fn service(model: Arc<FakeModel>, policy: MarkPolicy) -> RelayService {
        RelayService::new(model, Arc::new(SessionRegistry::default()), policy)
    }

    fn request(urls: &[&str], categories: &[&str]) -> BatchRequest {
        BatchRequest {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn classifies_new_urls() {
        let model = FakeModel::replying("http://v/1 recommend\nhttp://v/2 not recommend");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let verdicts = relay
            .recommend(request(&["http://v/1", "http://v/2"], &["Basketball"]))
            .await
            .unwrap();
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts["http://v/1"], Verdict::Recommend);
        assert_eq!(verdicts["http://v/2"], Verdict::NotRecommend);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_categories_never_reach_model() {
        let model = FakeModel::replying("");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let err = relay
            .recommend(request(&["http://v/1"], &[" ", ""]))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(model.call_count(), 0);
        assert_eq!(relay.sessions().tracked_in("default"), 0);
    }

    #[tokio::test]
    async fn empty_urls_are_rejected() {
        let model = FakeModel::replying("");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let err = relay
            .recommend(request(&["/relative", ""], &["Chess"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No URLs provided.");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn seen_urls_short_circuit() {
        let model = FakeModel::replying("http://v/1 recommend");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .unwrap();
        let verdicts = relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .unwrap();
        assert!(verdicts.is_empty());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn reset_resubmits_and_variant_follows_flag() {
        let model = FakeModel::replying("http://v/1 recommend");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let mut first = request(&["http://v/1"], &["Chess"]);
        first.is_initial_request = true;
        relay.recommend(first).await.unwrap();

        let mut again = request(&["http://v/1", "http://v/2"], &["Chess"]);
        again.reset_processed_urls = true;
        relay.recommend(again).await.unwrap();

        assert_eq!(model.call_count(), 2);
        let prompts = model.prompts.lock();
        assert!(prompts[0].contains("in-depth analysis"));
        assert!(!prompts[1].contains("in-depth analysis"));
        assert!(prompts[1].ends_with("http://v/1\nhttp://v/2"));
    }

    #[tokio::test]
    async fn optimistic_marking_survives_model_failure() {
        let model = FakeModel::failing();
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let err = relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Model(ModelError::Quota { .. })));
        assert_eq!(relay.sessions().tracked_in("default"), 1);

        let verdicts = relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .unwrap();
        assert!(verdicts.is_empty());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn on_success_marking_allows_retry_after_failure() {
        let model = FakeModel::failing();
        let relay = service(model.clone(), MarkPolicy::OnSuccess);
        assert!(relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .is_err());
        assert_eq!(relay.sessions().tracked_in("default"), 0);
        assert!(relay
            .recommend(request(&["http://v/1"], &["Chess"]))
            .await
            .is_err());
        assert_eq!(model.call_count(), 2);
        assert_eq!(relay.sessions().tracked_in("default"), 0);
    }

    #[tokio::test]
    async fn on_success_concurrent_batches_submit_once() {
        let model = FakeModel::slow("http://v/1 recommend", Duration::from_millis(50));
        let relay = service(model.clone(), MarkPolicy::OnSuccess);

        let (a, b) = tokio::join!(
            relay.recommend(request(&["http://v/1"], &["Chess"])),
            relay.recommend(request(&["http://v/1"], &["Chess"])),
        );

        let mut sizes = vec![a.unwrap().len(), b.unwrap().len()];
        sizes.sort();
        assert_eq!(sizes, vec![0, 1]);
        assert_eq!(model.call_count(), 1);
        assert_eq!(relay.sessions().tracked_in("default"), 1);
    }

    #[tokio::test]
    async fn on_success_dropped_request_releases_urls() {
        let model = FakeModel::slow("http://v/1 recommend", Duration::from_secs(5));
        let relay = service(model.clone(), MarkPolicy::OnSuccess);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            relay.recommend(request(&["http://v/1"], &["Chess"])),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(relay.sessions().tracked_in("default"), 0);

        let fast = FakeModel::replying("http://v/1 recommend");
        let relay = RelayService::new(fast.clone(), relay.sessions.clone(), MarkPolicy::OnSuccess);
        assert_eq!(
            relay
                .recommend(request(&["http://v/1"], &["Chess"]))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(fast.call_count(), 1);
    }

    #[tokio::test]
    async fn sessions_do_not_share_dedup_state() {
        let model = FakeModel::replying("http://v/1 recommend");
        let relay = service(model.clone(), MarkPolicy::Optimistic);
        let mut a = request(&["http://v/1"], &["Chess"]);
        a.session_id = Some("tab-a".into());
        let mut b = request(&["http://v/1"], &["Chess"]);
        b.session_id = Some("tab-b".into());
        assert_eq!(relay.recommend(a).await.unwrap().len(), 1);
        assert_eq!(relay.recommend(b).await.unwrap().len(), 1);
        assert_eq!(model.call_count(), 2);
    }
}
