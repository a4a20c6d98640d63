//! App-wide UI state: toast queue and current tab.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub const MAX_TOASTS: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Dashboard,
    Timer,
    Tracking,
    Analytics,
    Social,
    Recipes,
    Settings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    toasts: VecDeque<Toast>,
    tab: Tab,
}

#[derive(Debug, Default)]
pub struct AppStore {
    inner: Mutex<Inner>,
}

impl AppStore {
    pub async fn push_toast(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let toast = Toast {
            id: inner.next_id,
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };
        inner.toasts.push_back(toast);
        while inner.toasts.len() > MAX_TOASTS {
            inner.toasts.pop_front();
        }
        inner.next_id
    }

    pub async fn drain_toasts(&self) -> Vec<Toast> {
        self.inner.lock().await.toasts.drain(..).collect()
    }

    pub async fn tab(&self) -> Tab {
        self.inner.lock().await.tab
    }

    pub async fn navigate(&self, tab: Tab) {
        self.inner.lock().await.tab = tab;
    }
}
