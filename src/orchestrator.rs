use futures::future;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{ErrorSink, LinkExtractor, PageFetcher};

/// Inbound batch: an ordered list of page URLs. Duplicates are allowed and
/// fetched independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeeplinkRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Outbound batch result. `links` is parallel to the input URL list; the
/// `errors` field is omitted from serialized output when no task recorded
/// anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeeplinkResult {
    pub links: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Fans the per-URL pipeline (fetch, then extract) out over one batch and
/// reassembles the results in input order.
///
/// One orchestrator per batch: the fetcher (and its limiter) is shared
/// process-wide, the error sink is not.
pub struct BatchOrchestrator {
    fetcher: Arc<PageFetcher>,
    extractor: LinkExtractor,
    errors: ErrorSink,
}

impl BatchOrchestrator {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self {
            fetcher,
            extractor: LinkExtractor::new(),
            errors: ErrorSink::new(),
        }
    }

    /// Resolves the whole batch. Every task runs to completion before this
    /// returns; one URL failing never disturbs the others or the output
    /// shape.
    pub async fn run(&self, urls: &[String], forwarded: &[(String, String)]) -> DeeplinkResult {
        if urls.is_empty() {
            return DeeplinkResult::default();
        }

        let tasks = urls.iter().map(|url| self.resolve_one(url, forwarded));
        let links = future::join_all(tasks).await;

        info!("Resolved deep links for {} URLs", links.len());

        DeeplinkResult {
            links,
            errors: self.errors.take(),
        }
    }

    async fn resolve_one(&self, url: &str, forwarded: &[(String, String)]) -> Vec<String> {
        match self.fetcher.fetch(url, forwarded, &self.errors).await {
            Some(page) => self.extractor.extract(&page),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolverConfig;

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let fetcher = Arc::new(PageFetcher::new(Arc::new(ResolverConfig::default())).unwrap());
        let orchestrator = BatchOrchestrator::new(fetcher);
        let result = orchestrator.run(&[], &[]).await;

        assert_eq!(result, DeeplinkResult::default());
    }

    #[test]
    fn errors_field_is_omitted_when_absent() {
        let result = DeeplinkResult::default();
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"links":[]}"#);

        let result = DeeplinkResult {
            links: vec![vec![]],
            errors: Some(vec!["boom".to_string()]),
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"links":[[]],"errors":["boom"]}"#
        );
    }

    #[test]
    fn request_urls_default_to_empty() {
        let request: DeeplinkRequest = serde_json::from_str("{}").unwrap();
        assert!(request.urls.is_empty());
    }
}
