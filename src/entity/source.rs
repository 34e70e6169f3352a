//! File-backed state source
//!
//! Polls a JSON snapshot file and pushes every changed snapshot to the UI
//! loop. Each change is sent as its own message; the receiver decides what
//! to do with bursts.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

use super::StateSnapshot;

pub struct StateSource {
    path: PathBuf,
    refresh: Duration,
}

impl StateSource {
    pub fn new(path: PathBuf, refresh: Duration) -> Self {
        Self { path, refresh }
    }

    /// Spawn the polling task. It ends when the receiver is dropped.
    pub fn spawn(self) -> (mpsc::UnboundedReceiver<StateSnapshot>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    async fn run(self, tx: mpsc::UnboundedSender<StateSnapshot>) {
        let mut ticker = interval(self.refresh);
        let mut last_content: Option<String> = None;

        tracing::info!("Watching state file {}", self.path.display());

        loop {
            ticker.tick().await;

            let content = match tokio::fs::read_to_string(&self.path).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("State file not readable: {}", e);
                    continue;
                }
            };

            if last_content.as_deref() == Some(content.as_str()) {
                continue;
            }

            match StateSnapshot::from_json(&content) {
                Ok(snapshot) => {
                    tracing::debug!("Pushing snapshot with {} entities", snapshot.len());
                    if tx.send(snapshot).is_err() {
                        tracing::info!("State receiver gone, stopping source");
                        return;
                    }
                    last_content = Some(content);
                }
                Err(e) => tracing::warn!("Ignoring invalid state file: {}", e),
            }
        }
    }
}
