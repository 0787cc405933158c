use anyhow::{Context, Result, anyhow};
use grammers_client::types::{Media, Message};
use grammers_client::{Client, SignInError};
use grammers_mtsender::SenderPool;
use grammers_session::storages::SqliteSession;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{self, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::pipeline::{Attachment, IncomingMessage, MediaKind};

#[derive(Clone)]
pub struct TgCfg {
    pub api_id: i32,
    pub api_hash: String,
    pub phone: String,
    pub two_fa_password: Option<String>,
    pub session_path: String,
    pub channels: Vec<String>,
    /// Where photos/videos are staged before re-upload.
    pub downloads_dir: PathBuf,
}

pub fn load_tg_cfg() -> Result<TgCfg> {
    let channels = parse_channels(&must_env("TG_CHANNELS")?);
    if channels.is_empty() {
        return Err(anyhow!("TG_CHANNELS is empty"));
    }

    Ok(TgCfg {
        api_id: must_env("TG_API_ID")?
            .parse()
            .context("TG_API_ID must be i32")?,
        api_hash: must_env("TG_API_HASH")?,
        phone: must_env("TG_PHONE")?,
        two_fa_password: std::env::var("TG_2FA_PASSWORD").ok(),
        session_path: std::env::var("TG_SESSION_PATH")
            .unwrap_or_else(|_| "./telegram.session.sqlite".into()),
        channels,
        downloads_dir: std::env::var("DOWNLOADS_DIR")
            .unwrap_or_else(|_| "./downloads".into())
            .into(),
    })
}

pub fn connect(cfg: &TgCfg) -> Result<(Client, SenderPool)> {
    let session = Arc::new(SqliteSession::open(&cfg.session_path)?);
    let pool = SenderPool::new(Arc::clone(&session), cfg.api_id);
    let client = Client::new(&pool);
    Ok((client, pool))
}

pub async fn ensure_user_login(client: &Client, cfg: &TgCfg) -> Result<()> {
    if client.is_authorized().await? {
        return Ok(());
    }

    info!("Not authorized. Requesting login code...");
    let token = client
        .request_login_code(&cfg.phone, &cfg.api_hash)
        .await
        .context("request_login_code failed")?;

    let code = read_line("Enter the login code you received: ").await?;

    match client.sign_in(&token, &code).await {
        Ok(user) => {
            info!(
                "Signed in as {:?}",
                user.first_name().unwrap_or("<unknown>")
            );
            Ok(())
        }
        Err(SignInError::PasswordRequired(password_token)) => {
            let pw = if let Some(pw) = &cfg.two_fa_password {
                pw.clone()
            } else {
                let hint = password_token.hint().unwrap_or("");
                read_line(&format!(
                    "2FA password required (hint: {hint}). Enter password: "
                ))
                .await?
            };

            client
                .check_password(password_token, pw.as_bytes())
                .await
                .context("check_password failed")?;

            info!("Signed in with 2FA.");
            Ok(())
        }
        Err(e) => Err(anyhow!("sign_in failed: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// Photo or video (a document with a `video/*` mime type); anything else
/// is ignored and the message is handled as text only.
pub fn media_kind(msg: &Message) -> Option<MediaKind> {
    match msg.media()? {
        Media::Photo(_) => Some(MediaKind::Photo),
        Media::Document(doc) if doc.mime_type().is_some_and(|m| m.starts_with("video/")) => {
            Some(MediaKind::Video)
        }
        _ => None,
    }
}

/// Post text with its entities rendered back as markdown (`**bold**`,
/// `_italic_`, `[label](url)`).  The ad patterns and the HTML converter
/// both work on this form; `msg.text()` would drop every link.
pub fn message_markdown(msg: &Message) -> String {
    msg.markdown_text().trim().to_string()
}

/// Download the message's photo/video into `dir`.  A failed download is
/// logged and the message continues without media.
async fn download_attachment(msg: &Message, source_id: i64, dir: &Path) -> Option<Attachment> {
    let kind = media_kind(msg)?;
    let ext = match kind {
        MediaKind::Photo => "jpg",
        MediaKind::Video => "mp4",
    };
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Cannot create downloads dir {}: {e}", dir.display());
        return None;
    }
    let path = dir.join(format!("{source_id}_{}.{ext}", msg.id()));
    match msg.download_media(&path).await {
        Ok(_) => {
            debug!("Downloaded {:?} to {}", kind, path.display());
            Some(Attachment { kind, path })
        }
        Err(e) => {
            warn!("Media download for message {} failed: {e}", msg.id());
            None
        }
    }
}

/// Convert a channel post into the pipeline's input.  `None` when there is
/// neither text nor usable media.
pub async fn to_incoming(
    msg: &Message,
    source_id: i64,
    source_title: &str,
    downloads_dir: &Path,
) -> Option<IncomingMessage> {
    let text = message_markdown(msg);
    let media = download_attachment(msg, source_id, downloads_dir).await;
    if text.is_empty() && media.is_none() {
        return None;
    }
    Some(IncomingMessage {
        id: msg.id(),
        source_id,
        source_title: source_title.to_string(),
        text,
        media,
        received_at: Instant::now(),
    })
}

/// Remove a staged media file once every delivery attempt is over.
pub async fn discard_attachment(media: &Attachment) {
    if let Err(e) = tokio::fs::remove_file(&media.path).await {
        warn!("Failed to remove {}: {e}", media.path.display());
    }
}

fn must_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("Missing env var {key}"))
}

fn parse_channels(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().trim_start_matches('@'))
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string())
        .collect()
}

async fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    let mut stdin = io::BufReader::new(io::stdin());
    stdin.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}
