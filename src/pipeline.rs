//! End-to-end handling of one inbound message:
//! clean → admit (policy) → dedup → markup → deliver (+ translate → deliver).
//!
//! Transport, delivery and translation are collaborators behind the
//! [`Deliverer`] and [`Translator`] ports.  The dedup window is the only
//! state shared between events; its lock is never held across an `.await`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::PoisonError;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::admission::{AdmissionReason, AlertPolicy, classify};
use crate::cleaner::clean_message;
use crate::dedup::SharedWindow;
use crate::markup::{escape_html, to_telegram_html};

// ─────────────────────────── Data types ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// A media file already downloaded to local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: MediaKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: i32,
    pub source_id: i64,
    pub source_title: String,
    /// Raw markdown-ish text; may be empty for media-only posts.
    pub text: String,
    pub media: Option<Attachment>,
    pub received_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dropped(AdmissionReason),
    Duplicate,
    /// Flags report which deliveries succeeded.
    Forwarded {
        primary: bool,
        translated: bool,
    },
}

// ─────────────────────────── Ports ───────────────────────────────────────

pub trait Translator {
    async fn translate(&self, text: &str) -> Result<String>;
}

pub trait Deliverer {
    async fn deliver_text(&self, chat_id: i64, html: &str) -> Result<()>;

    async fn deliver_media(&self, chat_id: i64, media: &Attachment, html_caption: &str)
    -> Result<()>;
}

// ─────────────────────────── Destinations ────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destinations {
    pub primary: i64,
    /// Where translated copies go; `None` disables translation.
    pub translated: Option<i64>,
}

impl Destinations {
    /// `DEST_CHAT_ID` (required) and `TRANSLATED_CHAT_ID` (optional), both
    /// Bot API chat ids such as `-1001234567890`.
    pub fn from_env() -> Result<Self> {
        let primary = std::env::var("DEST_CHAT_ID")
            .context("Missing env var DEST_CHAT_ID")?
            .trim()
            .parse()
            .context("DEST_CHAT_ID must be i64")?;
        let translated = match std::env::var("TRANSLATED_CHAT_ID") {
            Ok(v) if !v.trim().is_empty() => {
                Some(v.trim().parse().context("TRANSLATED_CHAT_ID must be i64")?)
            }
            _ => None,
        };
        Ok(Self {
            primary,
            translated,
        })
    }
}

// ─────────────────────────── Pipeline ────────────────────────────────────

pub struct Pipeline<D, T> {
    policy: AlertPolicy,
    destinations: Destinations,
    window: SharedWindow,
    deliverer: D,
    translator: Option<T>,
}

impl<D: Deliverer, T: Translator> Pipeline<D, T> {
    pub fn new(
        policy: AlertPolicy,
        destinations: Destinations,
        window: SharedWindow,
        deliverer: D,
        translator: Option<T>,
    ) -> Self {
        Self {
            policy,
            destinations,
            window,
            deliverer,
            translator,
        }
    }

    pub fn deliverer(&self) -> &D {
        &self.deliverer
    }

    /// Process one not-yet-seen message.  Never fails: delivery and
    /// translation errors are logged and degrade the outcome.
    pub async fn on_message(&self, msg: &IncomingMessage) -> Outcome {
        let cleaned = clean_message(&msg.text);

        let decision = classify(&cleaned, msg.source_id, &self.policy);
        if !decision.accept {
            debug!(
                "Dropped message {} from {}: {}",
                msg.id, msg.source_title, decision.reason
            );
            return Outcome::Dropped(decision.reason);
        }

        if !self.admit(&cleaned.body, msg.received_at) {
            debug!(
                "Dropped message {} from {}: near-duplicate",
                msg.id, msg.source_title
            );
            return Outcome::Duplicate;
        }

        let post = render_post(&cleaned.body, &msg.source_title);
        let primary = self
            .deliver(self.destinations.primary, msg.media.as_ref(), &post)
            .await;

        let translated = match (&self.translator, self.destinations.translated) {
            (Some(translator), Some(chat_id)) => {
                self.deliver_translation(translator, chat_id, msg, &cleaned.body)
                    .await
            }
            _ => false,
        };

        info!(
            "Forwarded message {} from {} ({})",
            msg.id, msg.source_title, decision.reason
        );
        Outcome::Forwarded {
            primary,
            translated,
        }
    }

    /// Dedup check + record under one lock acquisition.
    fn admit(&self, body: &str, now: Instant) -> bool {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.admit(body, now)
    }

    async fn deliver(&self, chat_id: i64, media: Option<&Attachment>, post: &str) -> bool {
        let result = match media {
            Some(media) => self.deliverer.deliver_media(chat_id, media, post).await,
            None => self.deliverer.deliver_text(chat_id, post).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Delivery to chat_id={chat_id} failed: {e:#}");
                false
            }
        }
    }

    async fn deliver_translation(
        &self,
        translator: &T,
        chat_id: i64,
        msg: &IncomingMessage,
        body: &str,
    ) -> bool {
        let translated = match translator.translate(body).await {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => {
                warn!("Translation of message {} came back empty – skipping", msg.id);
                return false;
            }
            Err(e) => {
                warn!("Translation of message {} failed – skipping: {e:#}", msg.id);
                return false;
            }
        };
        let post = render_post(&translated, &msg.source_title);
        self.deliver(chat_id, msg.media.as_ref(), &post).await
    }
}

impl<D, T> fmt::Display for Pipeline<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(authoritative={}, dest={}, translated_dest={:?}, translator={})",
            self.policy.authoritative_source,
            self.destinations.primary,
            self.destinations.translated,
            self.translator.is_some(),
        )
    }
}

/// Telegram HTML body followed by the source footer.
pub fn render_post(body: &str, source_title: &str) -> String {
    let html = to_telegram_html(body);
    if source_title.trim().is_empty() {
        html
    } else {
        format!("{html}\n\n(<i>{}</i>)", escape_html(source_title))
    }
}
