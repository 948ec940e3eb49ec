// Errors raised by a snapshot source. All of them are transient from the worker's point of view.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("listing containers failed: {0}")]
    List(String),

    #[error("fetching stats for {id} failed: {reason}")]
    Fetch { id: String, reason: String },

    #[error("decoding stats for {id} failed: {reason}")]
    Decode { id: String, reason: String },

    #[error("fetching stats for {id} timed out after {after:?}")]
    Timeout { id: String, after: Duration },
}
