use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::info;

use crate::admission::AlertPolicy;
use crate::dedup::DedupWindow;
use crate::pipeline::{Deliverer, Destinations, MediaKind, Pipeline};
use crate::translate::LlmTranslator;

#[derive(Clone)]
pub(super) struct BotCfg {
    pub token: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub(super) struct StateCfg {
    pub db_path: String,
}

#[derive(Clone)]
pub(super) struct ReplayCfg {
    pub input_path: String,
    pub speed: f64,
    pub fixed_step_ms: Option<u64>,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub broadcast: bool,
}

/// One line of a `dump_today` JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct DumpEvent {
    pub timestamp: i64,
    pub channel_id: i64,
    pub channel_title: String,
    #[serde(default)]
    pub message_id: i32,
    /// Markdown rendering of the post, entities included.
    pub text: String,
    /// Photo/video attached to the post; the file itself is not dumped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaKind>,
}

pub(super) fn must_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("Missing env var {key}"))
}

pub(super) fn parse_bool_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(default)
}

pub(super) fn load_bot_cfg() -> Result<BotCfg> {
    let timeout_ms = std::env::var("BOT_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30_000);
    Ok(BotCfg {
        token: must_env("BOT_TOKEN")?,
        timeout: Duration::from_millis(timeout_ms),
    })
}

pub(super) fn load_state_cfg() -> StateCfg {
    StateCfg {
        db_path: std::env::var("STATE_DB_PATH").unwrap_or_else(|_| "./relay_state.sqlite".into()),
    }
}

pub(super) fn load_replay_cfg() -> Result<ReplayCfg> {
    let input_path = must_env("REPLAY_INPUT_PATH")?;
    let speed = std::env::var("REPLAY_SPEED")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| *v > 0.0)
        .unwrap_or(1.0);
    let fixed_step_ms = std::env::var("REPLAY_STEP_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0);
    let min_delay_ms = std::env::var("REPLAY_MIN_DELAY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let max_delay_ms = std::env::var("REPLAY_MAX_DELAY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10_000);

    Ok(ReplayCfg {
        input_path,
        speed,
        fixed_step_ms,
        min_delay_ms,
        max_delay_ms,
        broadcast: parse_bool_env("REPLAY_BROADCAST", false),
    })
}

/// Policy, destinations, dedup window and optional translator, all from
/// the environment, wired around `deliverer`.
pub(super) fn build_pipeline<D: Deliverer>(deliverer: D) -> Result<Pipeline<D, LlmTranslator>> {
    let policy = AlertPolicy::from_env()?;
    let destinations = Destinations::from_env()?;
    let window = DedupWindow::from_env();
    info!("Dedup config: {window}");

    let translator = LlmTranslator::from_env();
    match &translator {
        Some(t) => info!("Translator: {t}"),
        None => info!("Translator: disabled"),
    }

    let pipeline = Pipeline::new(policy, destinations, window.shared(), deliverer, translator);
    info!("{pipeline}");
    Ok(pipeline)
}

pub(super) fn start_of_today_utc_from_offset(offset_minutes: i32) -> Result<i64> {
    let offset_secs = offset_minutes
        .checked_mul(60)
        .ok_or_else(|| anyhow!("DUMP_TZ_OFFSET_MINUTES is too large"))?;
    let offset =
        FixedOffset::east_opt(offset_secs).ok_or_else(|| anyhow!("Invalid timezone offset"))?;

    let now_local = Utc::now().with_timezone(&offset);
    let midnight = now_local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Failed to build local midnight"))?;
    let local_start = offset
        .from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| anyhow!("Failed to build local midnight timestamp"))?;
    Ok(local_start.with_timezone(&Utc).timestamp())
}

pub(super) fn load_dump_events(path: &str) -> Result<Vec<DumpEvent>> {
    let file = File::open(path).with_context(|| format!("failed to open replay file {path}"))?;
    parse_dump_events(BufReader::new(file))
}

fn parse_dump_events(reader: impl BufRead) -> Result<Vec<DumpEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: DumpEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid JSON at line {}", idx + 1))?;
        events.push(event);
    }

    events.sort_by_key(|e| (e.timestamp, e.channel_id, e.message_id));
    Ok(events)
}
