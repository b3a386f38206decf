pub mod error;

pub use error::{FailureKind, Result, WatchError};
