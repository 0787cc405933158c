//! Per-source admission policy.
//!
//! Exactly one source is trusted to emit alerts.  Alert-shaped content from
//! any other source is unverified and dropped; ordinary chatter from the
//! trusted source is noise and dropped too.

use anyhow::{Context, Result};
use std::fmt;

use crate::cleaner::CleanedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionReason {
    AcceptedAlert,
    AcceptedNews,
    /// Cleaning left nothing (e.g. an ad-only post).  Applies even when
    /// media is attached.
    EmptyAfterCleaning,
    NonAlertFromAuthoritative,
    AlertFromUnverifiedSource,
}

impl AdmissionReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::AcceptedAlert => "alert from authoritative source",
            Self::AcceptedNews => "news from regular source",
            Self::EmptyAfterCleaning => "empty after cleaning",
            Self::NonAlertFromAuthoritative => "non-alert from authoritative source",
            Self::AlertFromUnverifiedSource => "alert-shaped message from unverified source",
        }
    }
}

impl fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub accept: bool,
    pub reason: AdmissionReason,
}

impl AdmissionDecision {
    fn accept(reason: AdmissionReason) -> Self {
        Self {
            accept: true,
            reason,
        }
    }

    fn reject(reason: AdmissionReason) -> Self {
        Self {
            accept: false,
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub authoritative_source: i64,
}

impl AlertPolicy {
    /// `AUTHORITATIVE_SOURCE_ID` (required): bare channel id of the one
    /// source allowed to emit alerts.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("AUTHORITATIVE_SOURCE_ID")
            .context("Missing env var AUTHORITATIVE_SOURCE_ID")?;
        let authoritative_source = raw
            .trim()
            .parse()
            .context("AUTHORITATIVE_SOURCE_ID must be i64")?;
        Ok(Self {
            authoritative_source,
        })
    }

    pub fn is_authoritative(&self, source_id: i64) -> bool {
        source_id == self.authoritative_source
    }
}

/// Decide whether a cleaned message from `source_id` may proceed.
pub fn classify(cleaned: &CleanedMessage, source_id: i64, policy: &AlertPolicy) -> AdmissionDecision {
    use AdmissionReason::*;

    if cleaned.is_empty() {
        return AdmissionDecision::reject(EmptyAfterCleaning);
    }

    match (policy.is_authoritative(source_id), cleaned.is_alert()) {
        (true, true) => AdmissionDecision::accept(AcceptedAlert),
        (true, false) => AdmissionDecision::reject(NonAlertFromAuthoritative),
        (false, false) => AdmissionDecision::accept(AcceptedNews),
        (false, true) => AdmissionDecision::reject(AlertFromUnverifiedSource),
    }
}
