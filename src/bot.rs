//! Outbound delivery through the Telegram Bot API: `sendMessage`,
//! `sendPhoto`, `sendVideo`, all with `parse_mode=HTML`.

use anyhow::{Context, Result, anyhow};
use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::pipeline::{Attachment, Deliverer, MediaKind};

/// Telegram rejects longer media captions.
const CAPTION_LIMIT: usize = 1024;

// ---------------------------------------------------------------------------
// Sending helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API client bound to one bot token.
pub struct BotDeliverer {
    http: HttpClient,
    bot_token: String,
}

impl BotDeliverer {
    pub fn new(bot_token: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Bot API HTTP client")?;
        info!(
            "Bot API delivery ready (timeout={}ms)",
            timeout.as_millis()
        );
        Ok(Self { http, bot_token })
    }

    fn url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send a single HTML message to one chat.
    pub async fn send_message(&self, chat_id: i64, html: &str) -> Result<()> {
        let body = SendMessagePayload {
            chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let resp = self
            .http
            .post(self.url("sendMessage"))
            .json(&body)
            .send()
            .await?;
        check_response("sendMessage", resp).await
    }

    /// Upload a local photo/video with an HTML caption.
    pub async fn send_media(&self, chat_id: i64, media: &Attachment, caption: &str) -> Result<()> {
        let (method, field) = match media.kind {
            MediaKind::Photo => ("sendPhoto", "photo"),
            MediaKind::Video => ("sendVideo", "video"),
        };
        let bytes = tokio::fs::read(&media.path)
            .await
            .with_context(|| format!("failed to read media file {}", media.path.display()))?;
        let file_name = media
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_owned());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field, Part::bytes(bytes).file_name(file_name));
        if !caption.is_empty() {
            form = form
                .text("caption", caption.to_owned())
                .text("parse_mode", "HTML");
        }

        let resp = self
            .http
            .post(self.url(method))
            .multipart(form)
            .send()
            .await?;
        check_response(method, resp).await
    }
}

async fn check_response(method: &str, resp: reqwest::Response) -> Result<()> {
    if !resp.status().is_success() {
        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{method} failed: {status} body={raw}"));
    }
    Ok(())
}

impl Deliverer for BotDeliverer {
    async fn deliver_text(&self, chat_id: i64, html: &str) -> Result<()> {
        self.send_message(chat_id, html).await
    }

    async fn deliver_media(&self, chat_id: i64, media: &Attachment, html_caption: &str)
    -> Result<()> {
        if html_caption.chars().count() <= CAPTION_LIMIT {
            return self.send_media(chat_id, media, html_caption).await;
        }
        // Over-long caption: bare media first, then the text as its own post.
        debug!("Caption exceeds {CAPTION_LIMIT} chars – sending separately");
        self.send_media(chat_id, media, "").await?;
        self.send_message(chat_id, html_caption).await
    }
}
