//! Fire-and-forget notification sink.
//!
//! Upload and ingest operations report outcomes here instead of returning
//! errors, so callers never need to unwrap a failure themselves.

use std::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);

    /// Neutral notices (durations, cancellations). Rendered as success by default.
    fn info(&self, message: &str) {
        self.success(message);
    }
}

/// Writes every notice to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!("✅ {}", message);
    }

    fn error(&self, message: &str) {
        error!("❌ {}", message);
    }

    fn info(&self, message: &str) {
        info!("ℹ️ {}", message);
    }
}

/// Keeps notices in memory so a UI (or a test) can drain them later.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        // A poisoned lock only means another thread panicked mid-push; the Vec is still valid.
        let mut notices = self.notices.lock().unwrap_or_else(|e| e.into_inner());
        notices.push((level, message.to_string()));
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn take(&self) -> Vec<(NoticeLevel, String)> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }

    fn info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }
}
