// ============================================
// Interest Profile Store
// ============================================
//
// Best-effort persistence of a user's topic visit history.
//
// Every mutation is load -> mutate -> save under one lock, so a burst of
// record_visit calls on the same store never loses an increment.
// Storage or decoding failures degrade to an empty profile and a warning;
// nothing here returns an error to the caller.

use crate::clock::{Clock, SystemClock};
use crate::codec::{decode_profile, encode_profile};
use crate::metrics;
use crate::profile::{InterestSummary, TopicRef, UserInterestProfile};
use crate::storage::ProfileStorage;
use chrono::Duration;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Cookie name used by the web frontend
pub const DEFAULT_STORAGE_KEY: &str = "user_topic_interests";

/// Stored profiles live for a year after the last write
pub const DEFAULT_EXPIRY_DAYS: i64 = 365;

/// Stay below the ~4KB per-cookie limit browsers enforce
pub const DEFAULT_MAX_ENCODED_LEN: usize = 4000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub storage_key: String,
    pub expiry_days: i64,
    pub max_encoded_len: usize,
    /// Top-N topics by visit count in `summary()`
    pub summary_top: usize,
    /// Most recent M topics in `summary()`
    pub summary_recent: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
            max_encoded_len: DEFAULT_MAX_ENCODED_LEN,
            summary_top: 5,
            summary_recent: 3,
        }
    }
}

/// Handle over one user's persisted interest profile
pub struct InterestProfileStore {
    storage: Arc<dyn ProfileStorage>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    mutation_lock: Mutex<()>,
}

impl InterestProfileStore {
    pub fn new(storage: Arc<dyn ProfileStorage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            config: StoreConfig::default(),
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record one visit to a topic.
    ///
    /// Blank codenames are ignored. Any other codename is stored verbatim, so
    /// it matches item topics only when spelled identically.
    pub fn record_visit(&self, topic_name: &str, topic_codename: &str) {
        if topic_codename.trim().is_empty() {
            debug!(topic_name = %topic_name, "Ignoring visit without topic codename");
            return;
        }

        let _guard = self.lock();
        let mut profile = self.load();
        let visit_count = profile
            .record_visit(topic_name, topic_codename, self.clock.now())
            .visit_count;
        metrics::record_visit();

        debug!(
            topic_codename = %topic_codename,
            visit_count = visit_count,
            "Topic visit recorded"
        );

        self.save(&mut profile, topic_codename);
    }

    /// Record visits for every topic of a piece of content, one after another.
    pub fn record_visits(&self, topics: &[TopicRef]) {
        for topic in topics {
            self.record_visit(&topic.name, &topic.codename);
        }
    }

    /// Current profile; empty when nothing usable is stored
    pub fn profile(&self) -> UserInterestProfile {
        let _guard = self.lock();
        self.load()
    }

    /// Summary with the configured top/recent sizes
    pub fn summary(&self) -> InterestSummary {
        self.summary_with(self.config.summary_top, self.config.summary_recent)
    }

    pub fn summary_with(&self, top_n: usize, recent_m: usize) -> InterestSummary {
        self.profile().summary(top_n, recent_m)
    }

    /// Drop all stored interests.
    pub fn clear(&self) {
        let _guard = self.lock();
        match self.storage.remove(&self.config.storage_key) {
            Ok(()) => info!(key = %self.config.storage_key, "Interest profile cleared"),
            Err(e) => {
                metrics::record_storage_failure("remove");
                warn!(key = %self.config.storage_key, error = %e, "Failed to clear interest profile");
            }
        }
    }

    fn load(&self) -> UserInterestProfile {
        let key = &self.config.storage_key;

        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserInterestProfile::new(),
            Err(e) => {
                metrics::record_storage_failure("read");
                warn!(key = %key, error = %e, "Interest profile storage unreadable");
                return UserInterestProfile::new();
            }
        };

        match decode_profile(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                metrics::record_corrupt_payload();
                warn!(key = %key, error = %e, "Failed to parse stored interest profile");
                UserInterestProfile::new()
            }
        }
    }

    fn save(&self, profile: &mut UserInterestProfile, keep: &str) {
        let key = &self.config.storage_key;

        let encoded = match self.encode_within_limit(profile, keep) {
            Some(encoded) => encoded,
            None => return,
        };

        let expires_at = self.clock.now() + Duration::days(self.config.expiry_days);
        if let Err(e) = self.storage.write(key, &encoded, expires_at) {
            metrics::record_storage_failure("write");
            warn!(key = %key, error = %e, "Failed to save interest profile");
        }
    }

    /// Encode the profile, evicting least recently visited topics (never `keep`)
    /// until the value fits `max_encoded_len`.
    fn encode_within_limit(&self, profile: &mut UserInterestProfile, keep: &str) -> Option<String> {
        let mut evicted = 0usize;

        loop {
            let encoded = match encode_profile(profile) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, "Failed to encode interest profile");
                    return None;
                }
            };

            if encoded.len() <= self.config.max_encoded_len {
                if evicted > 0 {
                    metrics::record_evictions(evicted);
                    info!(
                        evicted = evicted,
                        remaining = profile.len(),
                        "Evicted stale topics to fit interest profile size limit"
                    );
                }
                return Some(encoded);
            }

            let oldest = profile
                .iter()
                .filter(|i| i.topic_codename != keep)
                .min_by(|a, b| a.last_visited.cmp(&b.last_visited))
                .map(|i| i.topic_codename.clone());

            match oldest {
                Some(codename) => {
                    debug!(topic_codename = %codename, "Evicting topic from interest profile");
                    profile.remove(&codename);
                    evicted += 1;
                }
                None => {
                    warn!(
                        encoded_len = encoded.len(),
                        limit = self.config.max_encoded_len,
                        "Interest profile exceeds size limit with a single topic"
                    );
                    if evicted > 0 {
                        metrics::record_evictions(evicted);
                    }
                    return Some(encoded);
                }
            }
        }
    }
}
