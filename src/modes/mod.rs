mod dump_today;
mod live;
mod replay;
mod shared;

use anyhow::Result;
use tracing::info;

/// Selected by `RUN_MODE`: `live` (default), `dump_today` / `dump`, `replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Live,
    DumpToday,
    Replay,
}

impl RunMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "dump_today" | "dump" => Self::DumpToday,
            "replay" => Self::Replay,
            _ => Self::Live,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("RUN_MODE").unwrap_or_else(|_| "live".into()))
    }
}

pub async fn run_from_env() -> Result<()> {
    let mode = RunMode::from_env();
    info!("Run mode: {mode:?}");
    match mode {
        RunMode::Live => live::run().await,
        RunMode::DumpToday => dump_today::run().await,
        RunMode::Replay => replay::run().await,
    }
}
