use crate::bot::BotDeliverer;
use crate::pipeline::Outcome;
use crate::{store, telegram};
use anyhow::{Context, Result};
use grammers_client::Update;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::shared::{build_pipeline, load_bot_cfg, load_state_cfg};

pub(super) async fn run() -> Result<()> {
    let tg = telegram::load_tg_cfg()?;
    let bot_cfg = load_bot_cfg()?;
    let state_cfg = load_state_cfg();

    let state = store::open_store(&state_cfg.db_path)
        .with_context(|| format!("failed to open state db {}", state_cfg.db_path))?;
    let deliverer = BotDeliverer::new(bot_cfg.token, bot_cfg.timeout)?;
    let pipeline = build_pipeline(deliverer)?;

    let (client, pool) = telegram::connect(&tg)?;

    let runner = pool.runner;
    tokio::spawn(async move {
        runner.run().await;
    });

    let updates_rx = pool.updates;

    telegram::ensure_user_login(&client, &tg).await?;

    let mut allowed_peer_ids: HashSet<i64> = HashSet::new();
    for uname in &tg.channels {
        let peer = client
            .resolve_username(uname)
            .await
            .with_context(|| format!("resolve_username failed for @{uname}"))?;
        if let Some(peer) = peer {
            allowed_peer_ids.insert(peer.id().bare_id());
            info!("Watching @{uname} (peer_id={})", peer.id().bare_id());
        } else {
            warn!("Username @{uname} was not resolved; skipping");
        }
    }

    let mut stream = client.stream_updates(
        updates_rx,
        grammers_client::UpdatesConfiguration {
            catch_up: true,
            update_queue_limit: Some(2048),
        },
    );

    info!("Running in live mode. Waiting for new messages...");
    loop {
        let Ok(update) = stream.next().await else {
            warn!("Update stream ended.");
            break;
        };

        let Update::NewMessage(msg) = update else {
            continue;
        };
        let Ok(peer) = msg.peer() else {
            continue;
        };
        let source_id = peer.id().bare_id();
        if !allowed_peer_ids.contains(&source_id) {
            continue;
        }

        let message_id = i64::from(msg.id());
        match store::already_seen(&state, source_id, message_id) {
            Ok(true) => {
                debug!("Skipping already handled message {message_id} from {source_id}");
                continue;
            }
            Ok(false) => {}
            Err(e) => warn!("State lookup failed, handling message anyway: {e:#}"),
        }

        let title = peer.name().unwrap_or("<unknown>").to_string();
        if let Some(incoming) =
            telegram::to_incoming(&msg, source_id, &title, &tg.downloads_dir).await
        {
            let outcome = pipeline.on_message(&incoming).await;
            if let Outcome::Forwarded { primary: false, .. } = outcome {
                warn!("Message {message_id} from {title} was admitted but not delivered");
            }
            if let Some(media) = &incoming.media {
                telegram::discard_attachment(media).await;
            }
        }

        // Marked even when suppressed, so a restart never replays it.
        if let Err(e) = store::mark_seen(&state, source_id, message_id) {
            warn!("Failed to persist last seen id for {source_id}: {e:#}");
        }
    }

    Ok(())
}
