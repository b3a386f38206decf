//! Session lifecycle and the worker-to-consumer hand-off.
//!
//! A session is one background worker driving the supervisor. The only
//! state shared with the foreground is the unbounded event channel and
//! the running flag; pushes never block the worker, and `drain_all` never
//! blocks the consumer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::Result;
use crate::domain::StreamItem;
use crate::source::Connector;
use crate::stream::Supervisor;

/// Why the worker ended. Every session produces exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Cooperative stop, no error.
    Stopped,
    /// Non-retryable error; the message names it.
    Fatal(String),
    /// The worker ended without reporting either (e.g. a panic).
    Unexpected,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Stopped => write!(f, "Monitor stopped."),
            TerminationReason::Fatal(msg) => write!(f, "Monitor failed: {msg}"),
            TerminationReason::Unexpected => write!(f, "Monitor terminated unexpectedly."),
        }
    }
}

/// What the worker pushes onto the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// First successful connection of the session.
    Started { channels: Vec<String> },
    Item(StreamItem),
    /// A transient failure; reconnecting after this backoff delay.
    Reconnecting { delay: Duration },
    /// Always the last event of a session.
    Terminated(TerminationReason),
}

pub struct SessionController {
    connector: Arc<dyn Connector>,
    running: Arc<AtomicBool>,
    events: Option<UnboundedReceiver<WorkerEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl SessionController {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            running: Arc::new(AtomicBool::new(false)),
            events: None,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validates credentials and spawns the background worker. A no-op if
    /// a session is already running; never spawns a second worker.
    /// Validation failures surface here, before any network activity.
    pub fn start(&mut self, channels: Vec<String>) -> Result<()> {
        if self.is_running() {
            info!("Session already running, ignoring start");
            return Ok(());
        }
        self.connector.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Carry over anything the consumer has not drained yet, notably
        // the previous session's termination notice.
        if let Some(mut old) = self.events.take() {
            while let Ok(event) = old.try_recv() {
                let _ = tx.send(event);
            }
        }
        self.events = Some(rx);
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let supervisor = Supervisor::new(
            self.connector.clone(),
            channels,
            tx.clone(),
            running.clone(),
        );

        self.worker = Some(tokio::spawn(async move {
            // The inner spawn fences off panics so the session still gets
            // its termination notice.
            let reason = match tokio::spawn(supervisor.run()).await {
                Ok(reason) => reason,
                Err(err) => {
                    error!(error = %err, "Worker task died");
                    TerminationReason::Unexpected
                }
            };
            running.store(false, Ordering::SeqCst);
            let _ = tx.send(WorkerEvent::Terminated(reason));
        }));

        info!("Session started");
        Ok(())
    }

    /// Requests a cooperative stop. The worker observes the flag at its
    /// next checkpoint; an in-flight network call is never interrupted.
    /// A no-op when already stopped.
    pub fn stop(&self) {
        if !self.is_running() {
            return;
        }
        info!("Stop requested");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns all currently queued events without blocking, in push
    /// order.
    pub fn drain_all(&mut self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }
}
