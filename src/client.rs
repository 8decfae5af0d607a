use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::{ErrorSink, ResolverConfig, ResolverError, Result};

/// How one inbound header name maps onto the outbound request.
///
/// Closed table: hop-by-hop headers are dropped, `user-agent` and `accept`
/// go through their dedicated header slots, everything else is forwarded
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    Skip,
    UserAgent,
    Accept,
    Forward,
}

impl HeaderAction {
    pub fn for_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "connection" | "host" => HeaderAction::Skip,
            "user-agent" => HeaderAction::UserAgent,
            "accept" => HeaderAction::Accept,
            _ => HeaderAction::Forward,
        }
    }
}

/// HTTP fetcher gated by the concurrency limiter.
///
/// Built once per resolver and shared by every batch, so the semaphore
/// bounds in-flight fetches across concurrent `resolve` calls, not just
/// within one.
#[derive(Debug)]
pub struct PageFetcher {
    client: ReqwestClient,
    config: Arc<ResolverConfig>,
    semaphore: Arc<Semaphore>,
}

impl PageFetcher {
    pub fn new(config: Arc<ResolverConfig>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()?;

        let semaphore = Arc::new(Semaphore::new(config.concurrent_requests));

        Ok(Self {
            client,
            config,
            semaphore,
        })
    }

    /// Fetches one page, returning its decoded body or `None` when no
    /// readable response was obtained. Network failures never propagate;
    /// they are recorded in the batch's error sink.
    pub async fn fetch(
        &self,
        url: &str,
        forwarded: &[(String, String)],
        errors: &ErrorSink,
    ) -> Option<String> {
        // Permit is held for the whole exchange, including the body read,
        // and released on every exit path when it drops.
        let _permit = self.semaphore.acquire().await.unwrap();

        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                warn!("Invalid URL {}: {}", url, e);
                errors.push(format!("{}: {}", url, e));
                return None;
            }
        };

        debug!("Fetching URL: {}", target);

        let request = self.apply_forwarded_headers(self.client.get(target), forwarded, errors);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed for {}: {}", url, e);
                errors.push(format!("{}: {}", url, e));
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            // Error statuses still carry a readable body; deep links on
            // custom 404 pages count.
            debug!("Reading body despite status {} for {}", status, url);
        }

        match self.read_limited(response).await {
            Ok(bytes) => {
                info!("Fetched {} bytes from {}", bytes.len(), url);
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(e) => {
                warn!("Body read failed for {}: {}", url, e);
                errors.push(format!("{}: {}", url, e));
                None
            }
        }
    }

    /// Applies caller-supplied headers through the forwarding table. A bad
    /// name or value is recorded and skipped; it never aborts the fetch.
    fn apply_forwarded_headers(
        &self,
        mut request: RequestBuilder,
        forwarded: &[(String, String)],
        errors: &ErrorSink,
    ) -> RequestBuilder {
        for (name, value) in forwarded {
            match HeaderAction::for_name(name) {
                HeaderAction::Skip => {
                    debug!("Dropping hop-by-hop header: {}", name);
                }
                HeaderAction::UserAgent => match HeaderValue::from_str(value) {
                    Ok(value) => request = request.header(USER_AGENT, value),
                    Err(e) => errors.push(format!("header {}: {}", name, e)),
                },
                HeaderAction::Accept => match HeaderValue::from_str(value) {
                    Ok(value) => request = request.header(ACCEPT, value),
                    Err(e) => errors.push(format!("header {}: {}", name, e)),
                },
                HeaderAction::Forward => {
                    match (
                        HeaderName::from_bytes(name.as_bytes()),
                        HeaderValue::from_str(value),
                    ) {
                        (Ok(name), Ok(value)) => request = request.header(name, value),
                        (Err(e), _) => errors.push(format!("header {}: {}", name, e)),
                        (_, Err(e)) => errors.push(format!("header {}: {}", name, e)),
                    }
                }
            }
        }

        request
    }

    async fn read_limited(&self, response: Response) -> Result<Bytes> {
        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        let max_size = self.config.max_content_size;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;

            if bytes.len() + chunk.len() > max_size {
                return Err(ResolverError::ContentTooLarge {
                    size: bytes.len() + chunk.len(),
                    max: max_size,
                });
            }

            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes.freeze())
    }
}
