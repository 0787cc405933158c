//! Near-duplicate suppression over a sliding time window.
//!
//! Several source channels relay the same story within minutes of each
//! other, usually with small edits (emoji, punctuation, a trailing word).
//! Accepted messages are remembered in normalized form; a candidate whose
//! similarity to any remembered message reaches the threshold is rejected.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::text::{normalize, similarity_ratio};

/// Handle shared by every in-flight event of one running pipeline.
pub type SharedWindow = Arc<Mutex<DedupWindow>>;

/// A previously accepted message.
struct RecentMessage {
    normalized: String,
    accepted_at: Instant,
}

pub struct DedupWindow {
    records: Vec<RecentMessage>,
    window: Duration,
    threshold: f64,
}

impl DedupWindow {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(300);
    pub const DEFAULT_THRESHOLD: f64 = 0.92;

    pub fn new(window: Duration, threshold: f64) -> Self {
        Self {
            records: Vec::new(),
            window,
            threshold,
        }
    }

    /// | Env var             | Default | Purpose                              |
    /// |---------------------|---------|--------------------------------------|
    /// | `DEDUP_WINDOW_SECS` | `300`   | How long accepted messages are kept  |
    /// | `DEDUP_THRESHOLD`   | `0.92`  | Similarity ratio counted as repeat   |
    pub fn from_env() -> Self {
        let window = std::env::var("DEDUP_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_WINDOW);
        let threshold = std::env::var("DEDUP_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(Self::DEFAULT_THRESHOLD);
        Self::new(window, threshold)
    }

    pub fn shared(self) -> SharedWindow {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Drop records older than the window.  Only ever called from a check.
    fn evict(&mut self, now: Instant) {
        let window = self.window;
        self.records
            .retain(|r| now.saturating_duration_since(r.accepted_at) <= window);
    }

    /// `true` when `text` is a near-repeat of something accepted within the
    /// window ending at `now`.
    pub fn is_duplicate(&mut self, text: &str, now: Instant) -> bool {
        self.evict(now);
        let candidate = normalize(text);
        self.records.iter().any(|r| {
            let ratio = similarity_ratio(&candidate, &r.normalized);
            if ratio >= self.threshold {
                debug!("Dedup: ratio {ratio:.3} ≥ {:.2}", self.threshold);
                true
            } else {
                false
            }
        })
    }

    pub fn record_accepted(&mut self, text: &str, now: Instant) {
        self.records.push(RecentMessage {
            normalized: normalize(text),
            accepted_at: now,
        });
    }

    /// Check and record in one step.  Returns `false` for a duplicate.
    pub fn admit(&mut self, text: &str, now: Instant) -> bool {
        if self.is_duplicate(text, now) {
            return false;
        }
        self.record_accepted(text, now);
        true
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW, Self::DEFAULT_THRESHOLD)
    }
}

impl fmt::Display for DedupWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DedupWindow(window={}s, threshold={:.2}, size={})",
            self.window.as_secs(),
            self.threshold,
            self.len(),
        )
    }
}
