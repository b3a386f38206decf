pub mod reddit;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::StreamItem;

/// A pull-based source of new items. `poll` returns the next available
/// item, or `None` when the source currently has nothing, without ever
/// blocking indefinitely.
#[async_trait]
pub trait ItemSource: Send {
    async fn poll(&mut self) -> Result<Option<StreamItem>>;
}

/// The submissions and comments sources for one session, in that order.
pub type SourcePair = (Box<dyn ItemSource>, Box<dyn ItemSource>);

/// Opens the two item sources for a channel set, authenticating first if
/// the platform requires it.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Cheap credential check, run before any network activity.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn open(&self, channels: &[String]) -> Result<SourcePair>;
}
