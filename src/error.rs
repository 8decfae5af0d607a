use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content too large: {size} bytes (max: {max})")]
    ContentTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ResolverError>;

/// Append-only error collection shared by every task in one batch.
///
/// Tasks push messages concurrently; the orchestrator drains the sink once
/// after all tasks have finished.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        self.messages.lock().unwrap().push(message.into());
    }

    /// Drains all accumulated messages, returning `None` when nothing was
    /// recorded so the serialized result omits the field entirely.
    pub fn take(&self) -> Option<Vec<String>> {
        let mut messages = self.messages.lock().unwrap();
        if messages.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *messages))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}
