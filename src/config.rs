use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on simultaneous outbound fetches across the whole batch.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub timeout: Duration,
    pub max_redirects: u32,
    pub max_content_size: usize,
    pub concurrent_requests: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            max_content_size: 10 * 1024 * 1024, // 10MB
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }
}

impl ResolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_max_content_size(mut self, max_content_size: usize) -> Self {
        self.max_content_size = max_content_size;
        self
    }

    pub fn with_concurrent_requests(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests;
        self
    }
}
