//! Load status observable
//!
//! Each viewer owns one channel. Subscribers get a `watch::Receiver` and
//! unsubscribe by dropping it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Idle => write!(f, "idle"),
            LoadStatus::Loading => write!(f, "loading"),
            LoadStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadStatusChannel {
    tx: watch::Sender<LoadStatus>,
}

impl Default for LoadStatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadStatusChannel {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LoadStatus::Idle);
        Self { tx }
    }

    pub fn get(&self) -> LoadStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        self.tx.subscribe()
    }

    /// Publish a new status; subscribers are woken even with no change
    pub fn publish(&self, status: LoadStatus) {
        debug!(status = %status, "Load status");
        self.tx.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_updates() {
        let channel = LoadStatusChannel::new();
        let mut rx = channel.subscribe();
        assert_eq!(*rx.borrow(), LoadStatus::Idle);

        channel.publish(LoadStatus::Loading);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LoadStatus::Loading);
        assert_eq!(channel.get(), LoadStatus::Loading);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = LoadStatusChannel::new();
        channel.publish(LoadStatus::Error);
        assert_eq!(channel.get(), LoadStatus::Error);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&LoadStatus::Loading).unwrap(), "\"loading\"");
    }
}
