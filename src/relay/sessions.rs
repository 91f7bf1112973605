use std::{collections::HashMap, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;

use super::dedup::DedupTracker;

/// Bounds on how many dedup sessions are kept and for how long.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_ttl: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug)]
struct SessionEntry {
    tracker: DedupTracker,
    last_touched: Instant,
}

/// Reservation handed out by `reserve_new`, settled by `commit` or `abort`.
#[derive(Debug)]
pub struct Reservation {
    pub urls: Vec<String>,
    generation: u64,
}

/// One `DedupTracker` per session id. Every operation holds the lock for the
/// full check-then-add so concurrent batches in one session cannot both see a
/// URL as new. Sessions idle past the TTL are dropped, and the least recently
/// used one is evicted when the registry is full.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    limits: SessionLimits,
}

impl SessionRegistry {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limits: SessionLimits {
                max_sessions: limits.max_sessions.max(1),
                ..limits
            },
        }
    }

    pub fn filter_new(&self, session: &str, urls: &[String], reset: bool) -> Vec<String> {
        self.with_tracker(session, |tracker| tracker.filter_new(urls, reset))
    }

    /// Reserves unseen URLs without marking them processed.
    pub fn reserve_new(&self, session: &str, urls: &[String], reset: bool) -> Reservation {
        self.with_tracker(session, |tracker| Reservation {
            urls: tracker.reserve_new(urls, reset),
            generation: tracker.generation(),
        })
    }

    pub fn commit(&self, session: &str, reservation: &Reservation) {
        self.settle(session, reservation, DedupTracker::commit);
    }

    pub fn abort(&self, session: &str, reservation: &Reservation) {
        self.settle(session, reservation, DedupTracker::abort);
    }

    /// Clears one session's tracked URLs. Returns false for unknown sessions.
    pub fn reset(&self, session: &str) -> bool {
        match self.sessions.lock().get_mut(session) {
            Some(entry) => {
                entry.tracker.reset();
                entry.last_touched = Instant::now();
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    #[cfg(test)]
    pub fn tracked_in(&self, session: &str) -> usize {
        self.sessions
            .lock()
            .get(session)
            .map(|entry| entry.tracker.len())
            .unwrap_or(0)
    }

    fn with_tracker<T>(&self, session: &str, f: impl FnOnce(&mut DedupTracker) -> T) -> T {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        if !sessions.contains_key(session) {
            self.make_room(&mut sessions, now);
        }
        let entry = sessions
            .entry(session.to_string())
            .or_insert_with(|| SessionEntry {
                tracker: DedupTracker::new(),
                last_touched: now,
            });
        entry.last_touched = now;
        f(&mut entry.tracker)
    }

    fn settle(&self, session: &str, reservation: &Reservation, f: fn(&mut DedupTracker, &[String])) {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(session) {
            Some(entry) if entry.tracker.generation() == reservation.generation => {
                f(&mut entry.tracker, &reservation.urls);
                entry.last_touched = Instant::now();
            }
            _ => {
                tracing::debug!(
                    target: "relay",
                    session,
                    "session reset or evicted during classification; dropping reservation"
                );
            }
        }
    }

    fn make_room(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let ttl = self.limits.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_touched) < ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::info!(target: "relay", expired, "evicted idle sessions");
        }

        while sessions.len() >= self.limits.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::info!(target: "relay", session = %oldest, "evicted least recently used session");
        }
    }
}
