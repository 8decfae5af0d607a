pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod orchestrator;

pub use client::*;
pub use config::*;
pub use error::*;
pub use extractor::*;
pub use orchestrator::*;

use std::sync::Arc;

/// Entry point: resolves batches of page URLs into per-page deep-link lists.
///
/// The fetcher (HTTP client plus concurrency limiter) is built once here and
/// shared by every `resolve` call, so the in-flight fetch bound holds
/// process-wide across concurrent batches.
pub struct DeeplinkResolver {
    fetcher: Arc<PageFetcher>,
}

impl DeeplinkResolver {
    pub fn new() -> Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Result<Self> {
        let fetcher = Arc::new(PageFetcher::new(Arc::new(config))?);
        Ok(Self { fetcher })
    }

    /// Resolves one batch. `forwarded` carries the caller's inbound header
    /// pairs, applied to each outbound fetch through the forwarding table.
    /// Each call gets a fresh error sink, so batches never observe each
    /// other's failures.
    pub async fn resolve(
        &self,
        urls: &[String],
        forwarded: &[(String, String)],
    ) -> DeeplinkResult {
        let orchestrator = BatchOrchestrator::new(self.fetcher.clone());
        orchestrator.run(urls, forwarded).await
    }

    pub async fn resolve_request(
        &self,
        request: &DeeplinkRequest,
        forwarded: &[(String, String)],
    ) -> DeeplinkResult {
        self.resolve(&request.urls, forwarded).await
    }
}
