use crate::bot::BotDeliverer;
use crate::pipeline::{Attachment, Deliverer, IncomingMessage, Outcome, Pipeline, Translator};
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use super::shared::{
    DumpEvent, ReplayCfg, build_pipeline, load_bot_cfg, load_dump_events, load_replay_cfg,
};

/// Prints posts to stdout instead of sending them.
#[derive(Default)]
struct PrintDeliverer {
    printed: AtomicUsize,
}

impl PrintDeliverer {
    fn printed(&self) -> usize {
        self.printed.load(Ordering::Relaxed)
    }
}

impl Deliverer for PrintDeliverer {
    async fn deliver_text(&self, chat_id: i64, html: &str) -> Result<()> {
        let n = self.printed.fetch_add(1, Ordering::Relaxed) + 1;
        println!("\n[REPLAY {n} → {chat_id}]\n{html}\n");
        Ok(())
    }

    async fn deliver_media(&self, chat_id: i64, media: &Attachment, html_caption: &str)
    -> Result<()> {
        let n = self.printed.fetch_add(1, Ordering::Relaxed) + 1;
        println!(
            "\n[REPLAY {n} → {chat_id}, {:?} {}]\n{html_caption}\n",
            media.kind,
            media.path.display()
        );
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplayStats {
    forwarded: usize,
    duplicates: usize,
    dropped: usize,
}

pub(super) async fn run() -> Result<()> {
    let replay = load_replay_cfg()?;
    let events = load_dump_events(&replay.input_path)?;
    if events.is_empty() {
        return Err(anyhow!("Replay input is empty: {}", replay.input_path));
    }
    info!(
        "Replay started: {} events from {}",
        events.len(),
        replay.input_path
    );

    let stats = if replay.broadcast {
        let bot_cfg = load_bot_cfg()?;
        let pipeline = build_pipeline(BotDeliverer::new(bot_cfg.token, bot_cfg.timeout)?)?;
        info!("Replay broadcast enabled; posts will be sent to the destination chats");
        replay_events(&pipeline, &events, &replay).await
    } else {
        let pipeline = build_pipeline(PrintDeliverer::default())?;
        let stats = replay_events(&pipeline, &events, &replay).await;
        info!("Printed {} posts", pipeline.deliverer().printed());
        stats
    };

    info!(
        "Replay complete: total={}, forwarded={}, duplicates={}, dropped={}",
        events.len(),
        stats.forwarded,
        stats.duplicates,
        stats.dropped
    );

    Ok(())
}

/// Feed dumped events through `pipeline`, pacing them per `cfg`.  Each
/// event's `received_at` is derived from its original timestamp, so the
/// dedup window sees the real spacing whatever the playback speed.
async fn replay_events<D: Deliverer, T: Translator>(
    pipeline: &Pipeline<D, T>,
    events: &[DumpEvent],
    cfg: &ReplayCfg,
) -> ReplayStats {
    let mut stats = ReplayStats::default();
    let Some(first) = events.first() else {
        return stats;
    };
    let base = Instant::now();

    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            let prev = &events[idx - 1];
            let delay_ms = if let Some(step_ms) = cfg.fixed_step_ms {
                step_ms
            } else {
                let delta_s = (event.timestamp - prev.timestamp).max(0) as f64;
                let scaled = (delta_s * 1000.0 / cfg.speed).round() as u64;
                scaled.clamp(cfg.min_delay_ms, cfg.max_delay_ms)
            };
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        let offset = (event.timestamp - first.timestamp).max(0) as u64;
        let msg = IncomingMessage {
            id: event.message_id,
            source_id: event.channel_id,
            source_title: event.channel_title.clone(),
            text: event.text.clone(),
            media: replay_attachment(event, cfg.broadcast),
            received_at: base + Duration::from_secs(offset),
        };

        match pipeline.on_message(&msg).await {
            Outcome::Forwarded { .. } => stats.forwarded += 1,
            Outcome::Duplicate => stats.duplicates += 1,
            Outcome::Dropped(_) => stats.dropped += 1,
        }
    }

    stats
}

/// Dumps keep only the media kind.  Printing shows where the file would
/// be; a broadcast has nothing to upload, so the post goes out as text.
fn replay_attachment(event: &DumpEvent, broadcast: bool) -> Option<Attachment> {
    let kind = event.media.filter(|_| !broadcast)?;
    Some(Attachment {
        kind,
        path: PathBuf::from(format!("{}_{}", event.channel_id, event.message_id)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AlertPolicy;
    use crate::dedup::DedupWindow;
    use crate::pipeline::{Destinations, MediaKind};
    use crate::translate::LlmTranslator;

    const AUTHORITATIVE: i64 = 1_745_841_781;
    const NEWS_CHANNEL: i64 = 1_309_313_432;

    fn event(timestamp: i64, channel_id: i64, text: &str) -> DumpEvent {
        DumpEvent {
            timestamp,
            channel_id,
            channel_title: "ערוץ".into(),
            message_id: timestamp as i32,
            text: text.into(),
            media: None,
        }
    }

    fn print_pipeline() -> Pipeline<PrintDeliverer, LlmTranslator> {
        Pipeline::new(
            AlertPolicy {
                authoritative_source: AUTHORITATIVE,
            },
            Destinations {
                primary: -100,
                translated: None,
            },
            DedupWindow::default().shared(),
            PrintDeliverer::default(),
            None,
        )
    }

    fn instant_cfg() -> ReplayCfg {
        ReplayCfg {
            input_path: String::new(),
            speed: 1.0,
            fixed_step_ms: None,
            min_delay_ms: 0,
            max_delay_ms: 0,
            broadcast: false,
        }
    }

    #[tokio::test]
    async fn replay_uses_original_spacing_for_dedup() {
        let pipeline = print_pipeline();
        let story = "פיצוץ נשמע באזור חיפה, פרטים בהמשך";
        let events = vec![
            event(1_000, NEWS_CHANNEL, story),
            event(1_060, NEWS_CHANNEL + 1, story),
            event(1_400, NEWS_CHANNEL, story),
            event(1_500, AUTHORITATIVE, story),
            event(1_600, NEWS_CHANNEL, "צבע אדום (18/06/2025) 14:35\nאזור דן"),
        ];

        let stats = replay_events(&pipeline, &events, &instant_cfg()).await;
        assert_eq!(
            stats,
            ReplayStats {
                forwarded: 2,
                duplicates: 1,
                dropped: 2,
            }
        );
        assert_eq!(pipeline.deliverer().printed(), 2);
    }

    #[tokio::test]
    async fn media_posts_replay_through_the_same_admission_rules() {
        let pipeline = print_pipeline();
        let flag = "\u{1F3F4}\u{200D}\u{2620}\u{FE0F}";
        let mut photo_only = event(2_000, NEWS_CHANNEL, "");
        photo_only.media = Some(MediaKind::Photo);
        let mut ad_with_video = event(
            2_010,
            NEWS_CHANNEL,
            &format!("{flag} אם אתה לא כאן אתה לא מעודכן\nחפשו אותנו בטלגרם"),
        );
        ad_with_video.media = Some(MediaKind::Video);
        let mut captioned = event(2_020, NEWS_CHANNEL, "_תיעוד_ מזירת הנפילה");
        captioned.media = Some(MediaKind::Video);

        let stats = replay_events(
            &pipeline,
            &[photo_only, ad_with_video, captioned],
            &instant_cfg(),
        )
        .await;
        assert_eq!(
            stats,
            ReplayStats {
                forwarded: 1,
                duplicates: 0,
                dropped: 2,
            }
        );
        assert_eq!(pipeline.deliverer().printed(), 1);
    }

    #[test]
    fn broadcast_replay_sends_media_posts_as_text() {
        let mut ev = event(1, NEWS_CHANNEL, "x");
        ev.media = Some(MediaKind::Photo);
        assert_eq!(
            replay_attachment(&ev, false).map(|a| a.kind),
            Some(MediaKind::Photo)
        );
        assert_eq!(replay_attachment(&ev, true), None);
    }
}
