use std::collections::HashSet;

/// URLs submitted within one session.
///
/// `seen` holds URLs already classified (or optimistically marked); `in_flight`
/// holds URLs reserved by a batch whose model call has not finished yet.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
    in_flight: HashSet<String>,
    generation: u64,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the URLs not yet submitted and marks them as submitted.
    /// A reset clears the tracked set first.
    pub fn filter_new(&mut self, urls: &[String], reset: bool) -> Vec<String> {
        if reset {
            self.reset();
        }
        let fresh = self.unseen(urls);
        self.seen.extend(fresh.iter().cloned());
        fresh
    }

    /// Like `filter_new`, but the returned URLs are only reserved: they stay
    /// invisible to other batches until `commit` or `abort`.
    pub fn reserve_new(&mut self, urls: &[String], reset: bool) -> Vec<String> {
        if reset {
            self.reset();
        }
        let fresh = self.unseen(urls);
        self.in_flight.extend(fresh.iter().cloned());
        fresh
    }

    pub fn commit(&mut self, urls: &[String]) {
        for url in urls {
            if self.in_flight.remove(url) {
                self.seen.insert(url.clone());
            }
        }
    }

    pub fn abort(&mut self, urls: &[String]) {
        for url in urls {
            self.in_flight.remove(url);
        }
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.in_flight.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn unseen(&self, urls: &[String]) -> Vec<String> {
        let mut batch: HashSet<&str> = HashSet::with_capacity(urls.len());
        urls.iter()
            .filter(|url| {
                !self.seen.contains(url.as_str())
                    && !self.in_flight.contains(url.as_str())
                    && batch.insert(url.as_str())
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn only_unseen_urls_pass() {
        let mut tracker = DedupTracker::new();
        assert_eq!(tracker.filter_new(&urls(&["a"]), false), urls(&["a"]));
        assert_eq!(tracker.filter_new(&urls(&["a", "b"]), false), urls(&["b"]));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn reset_returns_everything_and_retracks() {
        let mut tracker = DedupTracker::new();
        tracker.filter_new(&urls(&["a", "c"]), false);
        assert_eq!(tracker.filter_new(&urls(&["a", "b"]), true), urls(&["a", "b"]));
        assert_eq!(tracker.generation(), 1);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.filter_new(&urls(&["c"]), false), urls(&["c"]));
        assert!(tracker.filter_new(&urls(&["a", "b"]), false).is_empty());
    }

    #[test]
    fn empty_input_has_no_effect() {
        let mut tracker = DedupTracker::new();
        tracker.filter_new(&urls(&["a"]), false);
        assert!(tracker.filter_new(&[], false).is_empty());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.generation(), 0);
    }

    #[test]
    fn duplicates_within_batch_collapse() {
        let mut tracker = DedupTracker::new();
        assert_eq!(
            tracker.filter_new(&urls(&["a", "a", "b", "a"]), false),
            urls(&["a", "b"])
        );
    }

    #[test]
    fn reserved_urls_are_hidden_until_commit() {
        let mut tracker = DedupTracker::new();
        let fresh = tracker.reserve_new(&urls(&["a", "b"]), false);
        assert_eq!(fresh, urls(&["a", "b"]));
        assert_eq!(tracker.len(), 0);
        assert_eq!(tracker.in_flight(), 2);
        assert_eq!(tracker.reserve_new(&urls(&["a", "c"]), false), urls(&["c"]));

        tracker.commit(&fresh);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.in_flight(), 1);
        assert!(tracker.reserve_new(&urls(&["a", "b"]), false).is_empty());
    }

    #[test]
    fn abort_releases_reservation() {
        let mut tracker = DedupTracker::new();
        let fresh = tracker.reserve_new(&urls(&["a"]), false);
        tracker.abort(&fresh);
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(tracker.len(), 0);
        assert_eq!(tracker.reserve_new(&urls(&["a"]), false), urls(&["a"]));
    }

    #[test]
    fn reset_drops_reservations() {
        let mut tracker = DedupTracker::new();
        let fresh = tracker.reserve_new(&urls(&["a"]), false);
        tracker.reset();
        assert_eq!(tracker.in_flight(), 0);
        tracker.commit(&fresh);
        assert_eq!(tracker.len(), 0);
    }
}
