//! Merges the two item sources into one ordered sequence.
//!
//! A pass drains the submissions source until it reports empty, then the
//! comments source until empty. Within one source arrival order is
//! preserved; across sources the only guarantee is the pass structure, so
//! a busy source can starve the other inside a single pass but never
//! across passes.

use std::time::Duration;

use crate::app::WatchError;
use crate::domain::StreamItem;
use crate::source::ItemSource;

/// Sleep between passes that yielded nothing, to avoid a busy loop.
pub const IDLE_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of one merge pass. Items polled before a failure ride along
/// with the error: a reconnect opens fresh skip-existing sources, so
/// anything not delivered now would never surface again.
pub struct MergePass {
    pub items: Vec<StreamItem>,
    pub error: Option<WatchError>,
}

/// Runs one merge pass over both sources.
pub async fn drain_pass<'a>(
    submissions: &'a mut dyn ItemSource,
    comments: &'a mut dyn ItemSource,
) -> MergePass {
    let mut items = Vec::new();
    for source in [submissions, comments] {
        loop {
            match source.poll().await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => break,
                Err(error) => {
                    return MergePass {
                        items,
                        error: Some(error),
                    };
                }
            }
        }
    }
    MergePass { items, error: None }
}
