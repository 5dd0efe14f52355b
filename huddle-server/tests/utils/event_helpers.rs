use anyhow::{Result, anyhow};
use huddle_core::ServerEvent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected server event (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

/// Window used to assert that nothing else arrives (ms).
pub const QUIET_PERIOD_MS: u64 = 100;

/// Wait for the next event on a transport queue.
pub async fn recv_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Result<ServerEvent> {
    tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), rx.recv())
        .await
        .map_err(|_| anyhow!("Timeout waiting for server event"))?
        .ok_or_else(|| anyhow!("Transport queue closed"))
}

/// Collect everything currently queued without waiting.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert that no event shows up within the quiet period.
pub async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) {
    let res = tokio::time::timeout(Duration::from_millis(QUIET_PERIOD_MS), rx.recv()).await;
    if let Ok(Some(event)) = res {
        panic!("Unexpected event: {:?}", event);
    }
}
