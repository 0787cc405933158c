//! `RUN_MODE=dump_today`: snapshot today's posts from every watched channel
//! into JSONL, in the same markdown form live mode hands to the cleaner, so
//! `replay` exercises ad stripping, alert summaries and media handling on
//! real traffic.

use crate::telegram;
use anyhow::{Context, Result};
use chrono::Utc;
use grammers_client::types::Message;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use super::shared::{DumpEvent, start_of_today_utc_from_offset};

struct DumpCfg {
    output_path: String,
    tz_offset_minutes: i32,
}

fn load_dump_cfg() -> DumpCfg {
    DumpCfg {
        output_path: std::env::var("DUMP_OUTPUT_PATH")
            .unwrap_or_else(|_| "./dump_today.jsonl".into()),
        tz_offset_minutes: std::env::var("DUMP_TZ_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0),
    }
}

pub(super) async fn run() -> Result<()> {
    let tg = telegram::load_tg_cfg()?;
    let cfg = load_dump_cfg();
    let until_ts = Utc::now().timestamp();
    let since_ts = start_of_today_utc_from_offset(cfg.tz_offset_minutes)?;

    let (client, pool) = telegram::connect(&tg)?;

    let runner = pool.runner;
    tokio::spawn(async move {
        runner.run().await;
    });

    telegram::ensure_user_login(&client, &tg).await?;

    info!(
        "Dumping {} channels since {since_ts} (tz offset {} min)",
        tg.channels.len(),
        cfg.tz_offset_minutes
    );

    let mut events: Vec<DumpEvent> = Vec::new();
    for uname in &tg.channels {
        let Some(peer) = client
            .resolve_username(uname)
            .await
            .with_context(|| format!("resolve_username failed for @{uname}"))?
        else {
            warn!("Username @{uname} was not resolved; skipping");
            continue;
        };

        let channel_id = peer.id().bare_id();
        let title = peer.name().unwrap_or("<unknown>").to_string();

        let (mut posts, mut with_media) = (0usize, 0usize);
        let mut iter = client.iter_messages(peer).max_date(until_ts as i32);
        while let Some(msg) = iter.next().await.context("iter_messages failed")? {
            if msg.date().timestamp() < since_ts {
                break;
            }
            if let Some(event) = dump_event(&msg, channel_id, &title) {
                posts += 1;
                with_media += usize::from(event.media.is_some());
                events.push(event);
            }
        }
        info!("@{uname} ({title}, id={channel_id}): {posts} posts, {with_media} with media");
    }

    events.sort_by_key(|e| (e.timestamp, e.channel_id, e.message_id));
    write_dump(Path::new(&cfg.output_path), &events)?;

    info!("Dump complete: {} events written to {}", events.len(), cfg.output_path);
    Ok(())
}

/// `None` for service messages and posts with neither text nor photo/video.
fn dump_event(msg: &Message, channel_id: i64, title: &str) -> Option<DumpEvent> {
    let text = telegram::message_markdown(msg);
    let media = telegram::media_kind(msg);
    if text.is_empty() && media.is_none() {
        return None;
    }
    Some(DumpEvent {
        timestamp: msg.date().timestamp(),
        channel_id,
        channel_title: title.to_string(),
        message_id: msg.id(),
        text,
        media,
    })
}

fn write_dump(path: &Path, events: &[DumpEvent]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dump directory {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create dump file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::shared::load_dump_events;
    use crate::pipeline::MediaKind;

    #[test]
    fn dump_file_is_read_back_by_replay() {
        let dir = std::env::temp_dir().join(format!("tg_relay_dump_{}", std::process::id()));
        let path = dir.join("nested").join("today.jsonl");
        let events = vec![
            DumpEvent {
                timestamp: 100,
                channel_id: 7,
                channel_title: "ערוץ".into(),
                message_id: 3,
                text: "**עדכון:** [פרטים](https://example.com/a_b_c)".into(),
                media: None,
            },
            DumpEvent {
                timestamp: 90,
                channel_id: 7,
                channel_title: "ערוץ".into(),
                message_id: 2,
                text: String::new(),
                media: Some(MediaKind::Photo),
            },
        ];

        write_dump(&path, &events).unwrap();
        let back = load_dump_events(path.to_str().unwrap()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].message_id, 2);
        assert_eq!(back[0].media, Some(MediaKind::Photo));
        assert_eq!(back[1].text, events[0].text);
        assert_eq!(back[1].media, None);
    }
}
