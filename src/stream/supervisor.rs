//! Connect/stream/backoff loop.
//!
//! Owns the lifecycle of one streaming session on the worker task:
//! open both sources, pump merge passes into the event channel, and on
//! failure either reconnect (with exponential backoff for transient
//! errors, a fixed delay for uncategorized ones) or end the session for
//! fatal errors. Cancellation is cooperative: the running flag is polled
//! once per merge pass and around every backoff sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::app::{FailureKind, WatchError};
use crate::session::{TerminationReason, WorkerEvent};
use crate::source::Connector;
use crate::stream::backoff::Backoff;
use crate::stream::merge::{drain_pass, IDLE_INTERVAL};

/// Reconnect delay after an uncategorized error; does not touch backoff.
const UNKNOWN_RETRY_DELAY: Duration = Duration::from_secs(15);

enum Flow {
    Reconnect,
    Stop(TerminationReason),
}

pub struct Supervisor {
    connector: Arc<dyn Connector>,
    channels: Vec<String>,
    events: UnboundedSender<WorkerEvent>,
    running: Arc<AtomicBool>,
    backoff: Backoff,
}

impl Supervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        channels: Vec<String>,
        events: UnboundedSender<WorkerEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            connector,
            channels,
            events,
            running,
            backoff: Backoff::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Drives the session until it is stopped or fails fatally. The
    /// caller emits the single termination notice from the returned
    /// reason; this function never sends one itself.
    pub async fn run(mut self) -> TerminationReason {
        let mut first_connect = true;

        loop {
            if !self.running() {
                return TerminationReason::Stopped;
            }

            info!(channels = %self.channels.join("+"), "Connecting");
            let (mut submissions, mut comments) = match self.connector.open(&self.channels).await
            {
                Ok(pair) => pair,
                Err(err) => match self.handle_failure(err).await {
                    Flow::Reconnect => continue,
                    Flow::Stop(reason) => return reason,
                },
            };

            self.backoff.reset();
            if first_connect {
                first_connect = false;
                let _ = self.events.send(WorkerEvent::Started {
                    channels: self.channels.clone(),
                });
            }

            // Streaming: pump merge passes until cancellation or an error.
            // Items drained before a failure are sent first; a reconnect
            // skips history and would never surface them again.
            let err = loop {
                if !self.running() {
                    return TerminationReason::Stopped;
                }
                let pass = drain_pass(submissions.as_mut(), comments.as_mut()).await;
                let idle = pass.items.is_empty();
                for item in pass.items {
                    if self.events.send(WorkerEvent::Item(item)).is_err() {
                        // Consumer dropped the channel.
                        return TerminationReason::Stopped;
                    }
                }
                if let Some(err) = pass.error {
                    break err;
                }
                if idle {
                    sleep(IDLE_INTERVAL).await;
                }
            };

            // Sources are dropped here on the way out of streaming.
            drop(submissions);
            drop(comments);

            match self.handle_failure(err).await {
                Flow::Reconnect => continue,
                Flow::Stop(reason) => return reason,
            }
        }
    }

    async fn handle_failure(&mut self, err: WatchError) -> Flow {
        let kind = FailureKind::of(&err);
        if kind.is_fatal() {
            error!(error = %err, ?kind, "Fatal error, stopping stream");
            return Flow::Stop(TerminationReason::Fatal(err.to_string()));
        }

        match kind {
            FailureKind::Transient => {
                let delay = self.backoff.delay();
                warn!(error = %err, "Transient error while streaming");
                info!(delay_secs = delay.as_secs(), "Reconnecting after backoff");
                let _ = self.events.send(WorkerEvent::Reconnecting { delay });
                if !self.running() {
                    return Flow::Stop(TerminationReason::Stopped);
                }
                sleep(delay).await;
                self.backoff.advance();
            }
            _ => {
                warn!(error = %err, "Unexpected error while streaming");
                info!(
                    delay_secs = UNKNOWN_RETRY_DELAY.as_secs(),
                    "Reconnecting after fixed delay"
                );
                if !self.running() {
                    return Flow::Stop(TerminationReason::Stopped);
                }
                sleep(UNKNOWN_RETRY_DELAY).await;
            }
        }

        if !self.running() {
            return Flow::Stop(TerminationReason::Stopped);
        }
        Flow::Reconnect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::source::testing::{comment, post, OpenStep, ScriptedConnector, ScriptedSource};

    fn spawn_supervisor(
        connector: ScriptedConnector,
        running: Arc<AtomicBool>,
    ) -> (
        mpsc::UnboundedReceiver<WorkerEvent>,
        tokio::task::JoinHandle<TerminationReason>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor::new(
            Arc::new(connector),
            vec!["testing".into()],
            tx,
            running,
        );
        (rx, tokio::spawn(supervisor.run()))
    }

    fn transient() -> WatchError {
        WatchError::Malformed("truncated listing".into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_error_on_first_connect_is_fatal() {
        let connector =
            ScriptedConnector::new(vec![OpenStep::Fail(WatchError::Access("r/nope".into()))]);
        let calls = connector.open_calls.clone();
        let (mut rx, handle) = spawn_supervisor(connector, Arc::new(AtomicBool::new(true)));

        let reason = handle.await.unwrap();
        assert!(matches!(reason, TerminationReason::Fatal(msg) if msg.contains("r/nope")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // No items, no reconnect notices.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success_sleeps_five_then_seven() {
        let connector = ScriptedConnector::new(vec![
            OpenStep::Fail(transient()),
            OpenStep::Fail(transient()),
            OpenStep::Sources(
                ScriptedSource::new(vec![Ok(Some(post(1))), Ok(None), Err(transient())]),
                ScriptedSource::empty(),
            ),
            // Backoff must have reset after the successful connect.
            OpenStep::Fail(transient()),
        ]);
        let (mut rx, handle) = spawn_supervisor(connector, Arc::new(AtomicBool::new(true)));

        // Script exhaustion terminates the run with an access failure.
        let reason = handle.await.unwrap();
        assert!(matches!(reason, TerminationReason::Fatal(_)));

        let mut delays = Vec::new();
        let mut items = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                WorkerEvent::Reconnecting { delay } => delays.push(delay.as_secs()),
                WorkerEvent::Item(item) => items.push(item),
                WorkerEvent::Started { .. } | WorkerEvent::Terminated(_) => {}
            }
        }
        assert_eq!(delays, vec![5, 7, 5, 7]);
        assert_eq!(items, vec![post(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_event_emitted_once_before_items() {
        let connector = ScriptedConnector::new(vec![
            OpenStep::Sources(
                ScriptedSource::items(vec![post(1)]),
                ScriptedSource::new(vec![Ok(Some(comment(1))), Err(transient())]),
            ),
            OpenStep::Sources(
                ScriptedSource::new(vec![Ok(Some(post(2))), Err(transient())]),
                ScriptedSource::empty(),
            ),
        ]);
        let (mut rx, handle) = spawn_supervisor(connector, Arc::new(AtomicBool::new(true)));
        handle.await.unwrap();

        let mut started = 0;
        let mut seen_item = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                WorkerEvent::Started { channels } => {
                    started += 1;
                    assert!(!seen_item, "start confirmation must precede items");
                    assert_eq!(channels, vec!["testing".to_string()]);
                }
                WorkerEvent::Item(_) => seen_item = true,
                _ => {}
            }
        }
        assert_eq!(started, 1);
        assert!(seen_item);
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_drained_before_a_source_error_are_delivered() {
        // The submissions source yields an item in the same pass where the
        // comments source fails; that item must reach the channel before
        // the reconnect.
        let connector = ScriptedConnector::new(vec![OpenStep::Sources(
            ScriptedSource::items(vec![post(1)]),
            ScriptedSource::new(vec![Err(transient())]),
        )]);
        let (mut rx, handle) = spawn_supervisor(connector, Arc::new(AtomicBool::new(true)));
        handle.await.unwrap();

        let mut items = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WorkerEvent::Item(item) = event {
                items.push(item);
            }
        }
        assert_eq!(items, vec![post(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_without_error() {
        let running = Arc::new(AtomicBool::new(true));
        let connector = ScriptedConnector::new(vec![OpenStep::Sources(
            ScriptedSource::empty(),
            ScriptedSource::empty(),
        )]);
        let (mut rx, handle) = spawn_supervisor(connector, running.clone());

        // Let the worker reach the idle streaming loop, then stop it.
        tokio::time::sleep(Duration::from_secs(2)).await;
        running.store(false, Ordering::SeqCst);

        let reason = handle.await.unwrap();
        assert!(matches!(reason, TerminationReason::Stopped));

        // Only the start confirmation; no items after the flag cleared.
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WorkerEvent::Started { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_error_does_not_touch_backoff() {
        let connector = ScriptedConnector::new(vec![
            OpenStep::Fail(WatchError::Other("weird".into())),
            OpenStep::Fail(transient()),
        ]);
        let (mut rx, handle) = spawn_supervisor(connector, Arc::new(AtomicBool::new(true)));
        handle.await.unwrap();

        let mut delays = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WorkerEvent::Reconnecting { delay } = event {
                delays.push(delay.as_secs());
            }
        }
        // The unknown failure emitted no reconnect notice and left the
        // transient delay at the floor.
        assert_eq!(delays, vec![5]);
    }
}
