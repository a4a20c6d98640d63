//! Fasting store: a local mirror of the backend's active fast.
//!
//! Every mutation is one round-trip and the server's answer replaces the
//! mirror. Periodic syncs are dropped when a newer mutation landed while they
//! were in flight.

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::models::{Fast, FastSnapshot, FastStatus, Protocol};
use crate::timer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const MAX_TARGET_HOURS: f64 = 168.0;

pub trait FastApi {
    fn active_fast(&self) -> impl Future<Output = Result<Option<Fast>, ApiError>> + Send;
    fn start_fast(
        &self,
        target_hours: f64,
        protocol: Option<&str>,
    ) -> impl Future<Output = Result<Fast, ApiError>> + Send;
    fn pause_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send;
    fn resume_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send;
    fn end_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send;
}

impl FastApi for ApiClient {
    fn active_fast(&self) -> impl Future<Output = Result<Option<Fast>, ApiError>> + Send {
        ApiClient::active_fast(self)
    }

    fn start_fast(
        &self,
        target_hours: f64,
        protocol: Option<&str>,
    ) -> impl Future<Output = Result<Fast, ApiError>> + Send {
        ApiClient::start_fast(self, target_hours, protocol)
    }

    fn pause_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
        ApiClient::pause_fast(self, id)
    }

    fn resume_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
        ApiClient::resume_fast(self, id)
    }

    fn end_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
        ApiClient::end_fast(self, id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FastError {
    #[error("No fast is currently active")]
    NoActiveFast,
    #[error("The fast is already paused")]
    AlreadyPaused,
    #[error("The fast is not paused")]
    NotPaused,
    #[error("Target hours must be greater than 0 and at most 168")]
    InvalidTarget,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced,
    Superseded,
    StaleEnded,
}

#[derive(Debug, Default)]
struct Inner {
    fast: Option<Fast>,
    revision: u64,
    last_synced: Option<DateTime<Utc>>,
    last_zone: Option<usize>,
}

impl Inner {
    fn apply(&mut self, fast: Option<Fast>) {
        let fast = fast.filter(Fast::is_running);
        let previous_id = self.fast.as_ref().and_then(|fast| fast.id.as_deref());
        let same_fast = matches!(
            (previous_id, fast.as_ref().and_then(|fast| fast.id.as_deref())),
            (Some(old), Some(new)) if old == new
        );
        if !same_fast {
            self.last_zone = None;
        }
        self.fast = fast;
        self.revision += 1;
    }
}

#[derive(Debug, Default)]
pub struct FastingStore {
    inner: Mutex<Inner>,
}

pub fn resolve_target(
    protocol: Option<Protocol>,
    target_hours: Option<f64>,
) -> Result<f64, FastError> {
    let hours = match (target_hours, protocol) {
        (Some(hours), _) => hours,
        (None, Some(protocol)) => protocol.target_hours(),
        (None, None) => Protocol::SixteenEight.target_hours(),
    };
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_TARGET_HOURS {
        return Err(FastError::InvalidTarget);
    }
    Ok(hours)
}

impl FastingStore {
    pub async fn current(&self) -> Option<Fast> {
        self.inner.lock().await.fast.clone()
    }

    pub async fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.last_synced
    }

    pub async fn snapshot(&self, now: DateTime<Utc>) -> FastSnapshot {
        let inner = self.inner.lock().await;
        timer::snapshot(inner.fast.as_ref(), now)
    }

    pub async fn start<B: FastApi>(
        &self,
        api: &B,
        protocol: Option<Protocol>,
        target_hours: Option<f64>,
    ) -> Result<Fast, FastError> {
        let hours = resolve_target(protocol, target_hours)?;
        let label = match (target_hours, protocol) {
            (Some(_), _) => "custom",
            (None, Some(protocol)) => protocol.label(),
            (None, None) => Protocol::SixteenEight.label(),
        };

        let fast = api.start_fast(hours, Some(label)).await?;
        info!("started fast {:?} targeting {hours}h", fast.id);
        self.inner.lock().await.apply(Some(fast.clone()));
        Ok(fast)
    }

    pub async fn pause<B: FastApi>(&self, api: &B) -> Result<Fast, FastError> {
        let id = {
            let inner = self.inner.lock().await;
            let fast = inner.fast.as_ref().ok_or(FastError::NoActiveFast)?;
            if fast.is_paused() {
                return Err(FastError::AlreadyPaused);
            }
            fast.id.clone().ok_or(FastError::NoActiveFast)?
        };

        let fast = api.pause_fast(&id).await?;
        info!("paused fast {id}");
        self.inner.lock().await.apply(Some(fast.clone()));
        Ok(fast)
    }

    pub async fn resume<B: FastApi>(&self, api: &B) -> Result<Fast, FastError> {
        let id = {
            let inner = self.inner.lock().await;
            let fast = inner.fast.as_ref().ok_or(FastError::NoActiveFast)?;
            if !fast.is_paused() {
                return Err(FastError::NotPaused);
            }
            fast.id.clone().ok_or(FastError::NoActiveFast)?
        };

        let fast = api.resume_fast(&id).await?;
        info!("resumed fast {id} (paused {}ms total)", fast.paused_duration);
        self.inner.lock().await.apply(Some(fast.clone()));
        Ok(fast)
    }

    pub async fn end<B: FastApi>(&self, api: &B) -> Result<Fast, FastError> {
        let id = {
            let inner = self.inner.lock().await;
            inner
                .fast
                .as_ref()
                .and_then(|fast| fast.id.clone())
                .ok_or(FastError::NoActiveFast)?
        };

        let mut fast = api.end_fast(&id).await?;
        fast.status = FastStatus::Ended;
        info!("ended fast {id}");
        self.inner.lock().await.apply(None);
        Ok(fast)
    }

    /// Records the revision a sync starts from.
    pub(crate) async fn begin_sync(&self) -> u64 {
        self.inner.lock().await.revision
    }

    /// Applies a fetched fast unless a mutation landed since `revision`.
    pub(crate) async fn finish_sync(
        &self,
        revision: u64,
        fetched: Option<Fast>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.revision != revision {
            debug!("discarding superseded sync (rev {revision}, now {})", inner.revision);
            return false;
        }
        inner.apply(fetched);
        inner.last_synced = Some(now);
        true
    }

    /// Pulls the authoritative active fast and overwrites the mirror. A fast
    /// older than the stale limit is ended on the server.
    pub async fn sync<B: FastApi>(
        &self,
        api: &B,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, FastError> {
        let revision = self.begin_sync().await;
        let fetched = api.active_fast().await?;

        if let Some(fast) = fetched.as_ref().filter(|fast| timer::is_stale(fast, now)) {
            if let Some(id) = fast.id.as_deref() {
                warn!("auto-ending stale fast {id} started at {:?}", fast.start_time);
                api.end_fast(id).await?;
                self.inner.lock().await.apply(None);
                return Ok(SyncOutcome::StaleEnded);
            }
        }

        if self.finish_sync(revision, fetched, now).await {
            Ok(SyncOutcome::Synced)
        } else {
            Ok(SyncOutcome::Superseded)
        }
    }

    /// Name of the zone just entered, if it changed since the last call.
    pub async fn zone_change(&self, now: DateTime<Utc>) -> Option<&'static str> {
        let mut inner = self.inner.lock().await;
        let fast = inner.fast.as_ref()?;
        let index = timer::zone_index(timer::elapsed_ms(Some(fast), now));
        let previous = inner.last_zone.replace(index);
        match previous {
            Some(previous) if previous != index => Some(timer::ZONES[index].name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex as StdMutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct FakeBackend {
        active: StdMutex<Option<Fast>>,
        ended: StdMutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with(fast: Fast) -> Self {
            let backend = Self::default();
            *backend.active.lock().unwrap() = Some(fast);
            backend
        }

        fn update(&self, change: impl FnOnce(&mut Fast)) -> Result<Fast, ApiError> {
            let mut active = self.active.lock().unwrap();
            let fast = active.as_mut().ok_or(ApiError::Status {
                status: 404,
                message: "No active fast".into(),
            })?;
            change(fast);
            Ok(fast.clone())
        }
    }

    impl FastApi for FakeBackend {
        fn active_fast(&self) -> impl Future<Output = Result<Option<Fast>, ApiError>> + Send {
            let fast = self.active.lock().unwrap().clone();
            async move { Ok(fast) }
        }

        fn start_fast(
            &self,
            target_hours: f64,
            protocol: Option<&str>,
        ) -> impl Future<Output = Result<Fast, ApiError>> + Send {
            let fast = Fast {
                id: Some("1".into()),
                start_time: Some(now()),
                target_hours,
                status: FastStatus::Active,
                protocol: protocol.map(str::to_string),
                ..Fast::default()
            };
            *self.active.lock().unwrap() = Some(fast.clone());
            async move { Ok(fast) }
        }

        fn pause_fast(&self, _id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
            let result = self.update(|fast| {
                fast.status = FastStatus::Paused;
                fast.paused_at = Some(now() + Duration::hours(2));
            });
            async move { result }
        }

        fn resume_fast(&self, _id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
            let result = self.update(|fast| {
                fast.paused_duration += Duration::minutes(30).num_milliseconds();
                fast.status = FastStatus::Active;
                fast.paused_at = None;
            });
            async move { result }
        }

        fn end_fast(&self, id: &str) -> impl Future<Output = Result<Fast, ApiError>> + Send {
            self.ended.lock().unwrap().push(id.to_string());
            let result = self.update(|fast| fast.status = FastStatus::Ended);
            *self.active.lock().unwrap() = None;
            async move { result }
        }
    }

    #[test]
    fn target_resolution() {
        assert_eq!(resolve_target(Some(Protocol::EighteenSix), None).unwrap(), 18.0);
        assert_eq!(resolve_target(Some(Protocol::EighteenSix), Some(20.5)).unwrap(), 20.5);
        assert_eq!(resolve_target(None, None).unwrap(), 16.0);
        assert!(matches!(resolve_target(None, Some(-1.0)), Err(FastError::InvalidTarget)));
        assert!(matches!(resolve_target(None, Some(200.0)), Err(FastError::InvalidTarget)));
        assert!(matches!(resolve_target(None, Some(f64::NAN)), Err(FastError::InvalidTarget)));
    }

    #[tokio::test]
    async fn lifecycle_mirrors_server() {
        let backend = FakeBackend::default();
        let store = FastingStore::default();

        let started = store.start(&backend, Some(Protocol::SixteenEight), None).await.unwrap();
        assert_eq!(started.protocol.as_deref(), Some("16:8"));
        assert_eq!(store.current().await.unwrap().target_hours, 16.0);

        assert!(matches!(store.resume(&backend).await, Err(FastError::NotPaused)));
        let paused = store.pause(&backend).await.unwrap();
        assert!(paused.paused_at.is_some());
        assert!(matches!(store.pause(&backend).await, Err(FastError::AlreadyPaused)));

        let resumed = store.resume(&backend).await.unwrap();
        assert!(resumed.paused_at.is_none());
        assert_eq!(resumed.paused_duration, 30 * 60_000);

        store.end(&backend).await.unwrap();
        assert!(store.current().await.is_none());
        assert!(matches!(store.end(&backend).await, Err(FastError::NoActiveFast)));
    }

    #[tokio::test]
    async fn sync_overwrites_local_state() {
        let remote = Fast {
            id: Some("9".into()),
            start_time: Some(now() - Duration::hours(3)),
            target_hours: 14.0,
            status: FastStatus::Paused,
            paused_at: Some(now() - Duration::hours(1)),
            ..Fast::default()
        };
        let backend = FakeBackend::with(remote.clone());
        let store = FastingStore::default();

        assert_eq!(store.sync(&backend, now()).await.unwrap(), SyncOutcome::Synced);
        assert_eq!(store.current().await, Some(remote));
        assert_eq!(store.last_synced().await, Some(now()));

        *backend.active.lock().unwrap() = None;
        store.sync(&backend, now()).await.unwrap();
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn superseded_sync_is_discarded() {
        let backend = FakeBackend::default();
        let store = FastingStore::default();

        let revision = store.begin_sync().await;
        store.start(&backend, None, Some(12.0)).await.unwrap();
        assert!(!store.finish_sync(revision, None, now()).await);
        assert!(store.current().await.is_some());
    }

    #[tokio::test]
    async fn stale_fast_is_ended() {
        let stale = Fast {
            id: Some("old".into()),
            start_time: Some(now() - Duration::days(8)),
            target_hours: 16.0,
            status: FastStatus::Active,
            ..Fast::default()
        };
        let backend = FakeBackend::with(stale);
        let store = FastingStore::default();

        assert_eq!(store.sync(&backend, now()).await.unwrap(), SyncOutcome::StaleEnded);
        assert_eq!(*backend.ended.lock().unwrap(), vec!["old".to_string()]);
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn zone_change_reports_transitions_once() {
        let backend = FakeBackend::default();
        let store = FastingStore::default();
        store.start(&backend, None, Some(16.0)).await.unwrap();

        assert_eq!(store.zone_change(now()).await, None);
        assert_eq!(store.zone_change(now() + Duration::hours(3)).await, None);
        assert_eq!(store.zone_change(now() + Duration::hours(5)).await, Some("Early Fasting"));
        assert_eq!(store.zone_change(now() + Duration::hours(6)).await, None);
    }

    #[tokio::test]
    async fn replaced_fast_starts_zone_tracking_over() {
        let first = Fast {
            id: Some("a".into()),
            start_time: Some(now() - Duration::hours(13)),
            target_hours: 16.0,
            status: FastStatus::Active,
            ..Fast::default()
        };
        let backend = FakeBackend::with(first);
        let store = FastingStore::default();
        store.sync(&backend, now()).await.unwrap();
        assert_eq!(store.zone_change(now()).await, None);

        // Another device ended it and started a new fast.
        *backend.active.lock().unwrap() = Some(Fast {
            id: Some("b".into()),
            start_time: Some(now()),
            target_hours: 16.0,
            status: FastStatus::Active,
            ..Fast::default()
        });
        store.sync(&backend, now()).await.unwrap();
        assert_eq!(store.zone_change(now()).await, None);
        assert_eq!(store.zone_change(now() + Duration::hours(4)).await, Some("Early Fasting"));
    }
}
