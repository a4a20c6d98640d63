//! Background refresh: re-reads the authoritative fast, reports zone changes
//! and replays offline writes.

use crate::app_store::ToastKind;
use crate::fasting::{FastError, SyncOutcome};
use crate::state::AppState;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

pub async fn sync_once(state: &AppState) -> Result<SyncOutcome, FastError> {
    let now = Utc::now();
    let outcome = state.fasting.sync(&state.api, now).await?;

    if outcome == SyncOutcome::StaleEnded {
        state
            .app
            .push_toast(
                ToastKind::Info,
                "Your previous fast was more than 7 days old and has been ended.",
            )
            .await;
    }

    if let Some(zone) = state.fasting.zone_change(now).await {
        info!("entered zone {zone}");
        state
            .app
            .push_toast(ToastKind::Success, format!("You've entered {zone}"))
            .await;
    }

    if !state.queue.is_empty().await {
        match state.queue.replay(&state.api).await {
            Ok(report) if report.replayed > 0 => {
                state
                    .app
                    .push_toast(
                        ToastKind::Success,
                        format!("Synced {} offline entries", report.replayed),
                    )
                    .await;
            }
            Ok(_) => {}
            Err(err) => warn!("offline replay failed: {}", err.message),
        }
    }

    Ok(outcome)
}

pub fn spawn_background_sync(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.config.sync_interval;
        info!("background sync every {}s", period.as_secs());
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = sync_once(&state).await {
                warn!("background sync failed: {err}");
            }
        }
    })
}
