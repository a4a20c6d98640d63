//! Reaction-time test taken during a fast.

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::timer::MS_PER_HOUR;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

pub const MIN_REACTION_MS: u32 = 100;
pub const MAX_REACTION_MS: u32 = 5_000;
pub const MAX_TRIALS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum CognitiveError {
    #[error("No cognitive test is running")]
    NoSession,
    #[error("Reaction time must be between 100 and 5000 ms")]
    InvalidReaction,
    #[error("This test already has 10 trials")]
    TooManyTrials,
    #[error("Record at least one trial before finishing")]
    NoTrials,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CognitiveSummary {
    pub trials: usize,
    pub mean_ms: f64,
    pub best_ms: u32,
    pub worst_ms: u32,
    pub fasted_hours: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub started_at: DateTime<Utc>,
    pub trials: usize,
    pub remaining: usize,
}

#[derive(Debug)]
struct Session {
    started_at: DateTime<Utc>,
    trials: Vec<u32>,
}

#[derive(Debug, Default)]
pub struct CognitiveStore {
    session: Mutex<Option<Session>>,
}

pub fn summarize(
    trials: &[u32],
    fasted_ms: i64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> Option<CognitiveSummary> {
    let best_ms = *trials.iter().min()?;
    let worst_ms = *trials.iter().max()?;
    let total: u64 = trials.iter().map(|ms| u64::from(*ms)).sum();
    Some(CognitiveSummary {
        trials: trials.len(),
        mean_ms: total as f64 / trials.len() as f64,
        best_ms,
        worst_ms,
        fasted_hours: fasted_ms.max(0) as f64 / MS_PER_HOUR,
        started_at,
        finished_at,
    })
}

impl CognitiveStore {
    /// Starts a fresh session, discarding any unfinished one.
    pub async fn start(&self, now: DateTime<Utc>) -> SessionStatus {
        let mut session = self.session.lock().await;
        *session = Some(Session {
            started_at: now,
            trials: Vec::new(),
        });
        SessionStatus {
            started_at: now,
            trials: 0,
            remaining: MAX_TRIALS,
        }
    }

    pub async fn record(&self, reaction_ms: u32) -> Result<SessionStatus, CognitiveError> {
        if !(MIN_REACTION_MS..=MAX_REACTION_MS).contains(&reaction_ms) {
            return Err(CognitiveError::InvalidReaction);
        }
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(CognitiveError::NoSession)?;
        if session.trials.len() >= MAX_TRIALS {
            return Err(CognitiveError::TooManyTrials);
        }
        session.trials.push(reaction_ms);
        Ok(SessionStatus {
            started_at: session.started_at,
            trials: session.trials.len(),
            remaining: MAX_TRIALS - session.trials.len(),
        })
    }

    /// Summarizes and submits the session. It is kept when submission fails.
    pub async fn finish(
        &self,
        api: &ApiClient,
        fasted_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<CognitiveSummary, CognitiveError> {
        let summary = {
            let guard = self.session.lock().await;
            let session = guard.as_ref().ok_or(CognitiveError::NoSession)?;
            summarize(&session.trials, fasted_ms, session.started_at, now)
                .ok_or(CognitiveError::NoTrials)?
        };

        let body = serde_json::to_value(&summary).map_err(|err| ApiError::Decode(err.to_string()))?;
        api.submit_cognitive(&body).await?;
        info!(
            "cognitive test finished: {} trials, mean {:.0}ms at {:.1}h fasted",
            summary.trials, summary.mean_ms, summary.fasted_hours
        );
        *self.session.lock().await = None;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn summary_statistics() {
        let summary = summarize(&[300, 250, 350], 9 * 3_600_000, at(8), at(9)).unwrap();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.best_ms, 250);
        assert_eq!(summary.worst_ms, 350);
        assert!((summary.mean_ms - 300.0).abs() < 1e-9);
        assert!((summary.fasted_hours - 9.0).abs() < 1e-9);
        assert!(summarize(&[], 0, at(8), at(9)).is_none());
    }

    #[tokio::test]
    async fn trials_require_a_session_and_valid_range() {
        let store = CognitiveStore::default();
        assert!(matches!(store.record(300).await, Err(CognitiveError::NoSession)));

        store.start(at(8)).await;
        assert!(matches!(store.record(50).await, Err(CognitiveError::InvalidReaction)));
        assert!(matches!(store.record(6_000).await, Err(CognitiveError::InvalidReaction)));

        for _ in 0..MAX_TRIALS {
            store.record(320).await.unwrap();
        }
        assert!(matches!(store.record(320).await, Err(CognitiveError::TooManyTrials)));
    }

    #[tokio::test]
    async fn restarting_clears_trials() {
        let store = CognitiveStore::default();
        store.start(at(8)).await;
        store.record(400).await.unwrap();
        let status = store.start(at(9)).await;
        assert_eq!(status.trials, 0);
        assert_eq!(store.record(400).await.unwrap().trials, 1);
    }
}
