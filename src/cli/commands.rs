//! Headless streaming to stdout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::app::{Result, WatchError};
use crate::config::Config;
use crate::domain::StreamItem;
use crate::session::{SessionController, TerminationReason, WorkerEvent};
use crate::source::reddit::RedditConnector;

pub async fn stream(config: Config) -> Result<()> {
    if config.channels.is_empty() {
        return Err(WatchError::Config(
            "no channels configured; set `channels` in the config or pass --channels".into(),
        ));
    }

    let connector = Arc::new(RedditConnector::new(config.reddit.clone()));
    let mut controller = SessionController::new(connector);
    controller.start(config.channels.clone())?;

    let mut ticker = interval(Duration::from_millis(config.tick_rate_ms));
    let reason = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
            }
            _ = ticker.tick() => {
                let mut terminated = None;
                for event in controller.drain_all() {
                    print_event(&event);
                    if let WorkerEvent::Terminated(reason) = event {
                        terminated = Some(reason);
                    }
                }
                if let Some(reason) = terminated {
                    break reason;
                }
            }
        }
    };

    match reason {
        TerminationReason::Stopped => Ok(()),
        TerminationReason::Fatal(msg) => Err(WatchError::Other(msg)),
        TerminationReason::Unexpected => {
            Err(WatchError::Other("worker terminated unexpectedly".into()))
        }
    }
}

fn print_event(event: &WorkerEvent) {
    match event {
        WorkerEvent::Started { channels } => {
            println!("Monitoring r/{}.", channels.join(", r/"));
        }
        WorkerEvent::Item(item) => {
            println!("{}", "-".repeat(40));
            match item {
                StreamItem::Post { channel, title, .. } => {
                    println!("New Post in r/{channel}:");
                    println!("  Title: {title}");
                }
                StreamItem::Comment { channel, .. } => {
                    println!("New Comment in r/{channel}:");
                    println!("  Comment: {}", item.summary());
                }
            }
            println!("  URL: {}", item.url());
        }
        WorkerEvent::Reconnecting { delay } => {
            println!("Connection lost. Reconnecting in {} seconds...", delay.as_secs());
        }
        WorkerEvent::Terminated(reason) => {
            println!("{reason}");
        }
    }
}
