//! Continuous polling
//!
//! A poll runs as an independent tokio task performing one lookup per
//! tick and delivering every snapshot, including empty ones, through a
//! channel. Each tick is independent: a failed tick is logged and the
//! next interval tries again, so discoverability survives backend
//! outages and total peer loss without restarting the discovery layer.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::BitBootError;
use crate::record::KnownHost;
use crate::session::BitBoot;

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Handle to a running continuous poll
///
/// Dropping the handle cancels the poll; [`PollHandle::cancel`] stops it
/// explicitly, taking effect within one poll interval.
pub struct PollHandle {
    receiver: mpsc::Receiver<Vec<KnownHost>>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Receive the next peer-set snapshot.
    ///
    /// Returns `None` once the poll has been cancelled or the session
    /// stopped.
    pub async fn next(&mut self) -> Option<Vec<KnownHost>> {
        self.receiver.recv().await
    }

    /// Stop the poll; effective within one poll interval
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Whether the polling task has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
        self.task.abort();
    }
}

/// Spawn the polling task for `network_name` on `session`
pub(crate) fn spawn(session: BitBoot, network_name: String, interval: Duration) -> PollHandle {
    let (sender, receiver) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        debug!(
            "Continuous poll of '{}' started (interval {:?})",
            network_name, interval
        );
        loop {
            if *cancel_rx.borrow() {
                break;
            }

            match session.lookup(&network_name).await {
                Ok(snapshot) => {
                    if sender.send(snapshot).await.is_err() {
                        // Receiver dropped; nobody is listening anymore.
                        break;
                    }
                }
                Err(BitBootError::SessionClosed) => {
                    debug!("Continuous poll of '{}' ended: session closed", network_name);
                    break;
                }
                Err(e) => {
                    warn!(
                        "Poll tick for '{}' failed, retrying next interval: {}",
                        network_name, e
                    );
                }
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = cancel_rx.changed() => break,
            }
        }
        debug!("Continuous poll of '{}' stopped", network_name);
    });

    PollHandle {
        receiver,
        cancel: cancel_tx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KnownHost;
    use crate::registry::{BackendRegistry, NetworkRegistry};
    use crate::session::{BitBootConfig, RetryPolicy};
    use tokio::time::timeout;

    async fn local_session() -> BitBoot {
        let networks = NetworkRegistry::with_builtins();
        let backends = BackendRegistry::with_builtins();
        let config = BitBootConfig::new("local")
            .with_poll_interval(Duration::from_millis(10))
            .with_backend_timeout(Duration::from_millis(200))
            .with_retry(RetryPolicy::fixed(2, Duration::from_millis(5)));
        BitBoot::create(config, &networks, &backends).await.unwrap()
    }

    #[tokio::test]
    async fn test_poll_yields_empty_then_announced() {
        let session = local_session().await;
        let mut handle = session.continuous_poll("local", None);

        // Fresh network: the first snapshot is empty, not an error.
        let first = handle.next().await.unwrap();
        assert!(first.is_empty());

        session
            .announce_peer("local", KnownHost::new("127.0.0.1", 6881))
            .await
            .unwrap();

        // The announce becomes visible without restarting the poll.
        let deadline = Duration::from_secs(2);
        let snapshot = timeout(deadline, async {
            loop {
                let snapshot = handle.next().await.unwrap();
                if !snapshot.is_empty() {
                    return snapshot;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(snapshot, vec![KnownHost::new("127.0.0.1", 6881)]);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream() {
        let session = local_session().await;
        let mut handle = session.continuous_poll("local", Some(Duration::from_millis(10)));
        handle.next().await.unwrap();
        handle.cancel();
        // Drain until the channel closes; must settle well within the test.
        let ended = timeout(Duration::from_secs(2), async {
            while handle.next().await.is_some() {}
        })
        .await;
        assert!(ended.is_ok());
    }

    #[tokio::test]
    async fn test_session_stop_ends_stream() {
        let session = local_session().await;
        let mut handle = session.continuous_poll("local", Some(Duration::from_millis(10)));
        handle.next().await.unwrap();
        session.stop().await.unwrap();
        let ended = timeout(Duration::from_secs(2), async {
            while handle.next().await.is_some() {}
        })
        .await;
        assert!(ended.is_ok());
    }
}
