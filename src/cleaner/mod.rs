//! Message cleanup for re-broadcast Hebrew news channels: sponsor/ad
//! boilerplate removal, emphasis fix-up and civil-alert summarization.
pub mod ad_patterns;
pub mod alert_kind;
pub mod cleaner_tests;
pub mod summary;

use regex::Regex;
use std::sync::LazyLock;

use tracing::debug;

pub use crate::cleaner::alert_kind::AlertKind;
use crate::cleaner::ad_patterns::AD_BLOCK_PATTERNS;
use crate::cleaner::summary::summarize;

static TRIPLE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("TRIPLE_EMPHASIS regex"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("BLANK_RUNS regex"));

/// Result of cleaning one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedMessage {
    pub body: String,
    /// Set iff a summarizer rule fired.
    pub alert_kind: Option<AlertKind>,
}

impl CleanedMessage {
    pub fn is_alert(&self) -> bool {
        self.alert_kind.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// `***x***` → `**x**`.  Upstream channels over-emphasize inconsistently.
pub fn fix_triple_emphasis(text: &str) -> String {
    TRIPLE_EMPHASIS.replace_all(text, "**${1}**").into_owned()
}

/// Remove every known ad block, collapse blank-line runs and trim.
/// A message made only of ad boilerplate becomes `""`.
pub fn strip_ad_block(text: &str) -> String {
    let mut cleaned = text.to_owned();
    for re in AD_BLOCK_PATTERNS.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    BLANK_RUNS.replace_all(&cleaned, "\n\n").trim().to_owned()
}

/// Full cleaning entry point: emphasis fix-up, then the alert summarizer,
/// falling back to ad stripping for ordinary content.
pub fn clean_message(text: &str) -> CleanedMessage {
    let text = fix_triple_emphasis(text);

    if let Some(summary) = summarize(&text) {
        debug!("Summarized {} alert", summary.kind);
        return CleanedMessage {
            body: summary.text,
            alert_kind: Some(summary.kind),
        };
    }

    CleanedMessage {
        body: strip_ad_block(&text),
        alert_kind: None,
    }
}
