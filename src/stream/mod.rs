pub mod backoff;
pub mod merge;
pub mod supervisor;

pub use supervisor::Supervisor;
