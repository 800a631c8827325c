//! HTTP transport for listing and detail pages.

use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::harvest_debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Media types accepted from the server; a response without a
    /// `Content-Type` header is accepted as well.
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: ["text/html", "application/xhtml+xml"]
                .map(String::from)
                .to_vec(),
            user_agent: concat!("harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("GET {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FailureKind,
}

impl FetchError {
    pub fn new(url: &str, kind: FailureKind) -> Self {
        Self {
            url: url.to_string(),
            kind,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

/// Transport failure classes. All of them make the caller skip the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    #[error("invalid url ({0})")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timed out")]
    Timeout,
    #[error("too many redirects")]
    RedirectLimitExceeded,
    #[error("body larger than {max_bytes} bytes")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("unsupported content type {0:?}")]
    UnsupportedContentType(String),
    #[error("cancelled")]
    Cancelled,
    #[error("network error ({0})")]
    Network(String),
}

impl From<reqwest::Error> for FailureKind {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_redirect() {
            FailureKind::RedirectLimitExceeded
        } else {
            FailureKind::Network(err.to_string())
        }
    }
}

/// `fetch(url, cancel) -> document or classified failure`.
///
/// Implementations must give up with [`FailureKind::Cancelled`] as soon as
/// `cancel` fires, also while a request is in flight.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, cancel: &CancellationToken)
        -> Result<FetchOutput, FetchError>;
}

/// Fetches with a `reqwest::Client` that lives for one call only.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn client(&self) -> Result<Client, FailureKind> {
        Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .user_agent(&self.settings.user_agent)
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .build()
            .map_err(FailureKind::from)
    }

    async fn get(&self, url: &str) -> Result<FetchOutput, FailureKind> {
        let target =
            reqwest::Url::parse(url).map_err(|err| FailureKind::InvalidUrl(err.to_string()))?;
        let response = self.client()?.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureKind::HttpStatus(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(content_type) = &content_type {
            if !media_type_allowed(&self.settings.allowed_content_types, content_type) {
                return Err(FailureKind::UnsupportedContentType(content_type.clone()));
            }
        }

        let final_url = response.url().to_string();
        let bytes = read_limited(response, self.settings.max_bytes).await?;
        harvest_debug!("GET {} -> {} ({} bytes)", url, status, bytes.len());

        Ok(FetchOutput {
            metadata: FetchMetadata {
                final_url,
                status: status.as_u16(),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchOutput, FetchError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FailureKind::Cancelled),
            result = self.get(url) => result,
        };
        result.map_err(|kind| FetchError::new(url, kind))
    }
}

/// Collects the body, refusing anything over `max_bytes` whether the size is
/// announced up front or only discovered while streaming.
async fn read_limited(response: Response, max_bytes: u64) -> Result<Vec<u8>, FailureKind> {
    let too_large = |actual| FailureKind::TooLarge {
        max_bytes,
        actual: Some(actual),
    };
    if let Some(announced) = response.content_length() {
        if announced > max_bytes {
            return Err(too_large(announced));
        }
    }

    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        let len = (body.len() + chunk.len()) as u64;
        if len > max_bytes {
            return Err(too_large(len));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn media_type_allowed(allowed: &[String], content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    allowed
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(media_type))
}
