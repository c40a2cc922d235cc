use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::NOTICE_BUFFER_SIZE;

/// A user-facing toast. Distinct from tracing output: notices are what the
/// presentation layer shows, non-blocking and dismissable.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub source: NoticeSource,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSource {
    Refresh,
    Clients,
    Agents,
    TestCall,
    CallPoller,
    Health,
}

pub struct NoticeState {
    buffer: Arc<RwLock<VecDeque<Notice>>>,
    sender: broadcast::Sender<Notice>,
}

impl NoticeState {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(NOTICE_BUFFER_SIZE))),
            sender,
        }
    }

    pub async fn push(&self, notice: Notice) {
        let mut buf = self.buffer.write().await;
        if buf.len() >= NOTICE_BUFFER_SIZE {
            buf.pop_front();
        }
        buf.push_back(notice.clone());
        drop(buf);

        let _ = self.sender.send(notice);
    }

    pub async fn history(&self) -> Vec<Notice> {
        self.buffer.read().await.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub async fn emit(&self, source: NoticeSource, severity: Severity, message: impl Into<String>) {
        let notice = Notice {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            severity,
            source,
            message: message.into(),
        };
        self.push(notice).await;
    }
}

impl Default for NoticeState {
    fn default() -> Self {
        Self::new()
    }
}
