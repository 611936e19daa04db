//! Bounded HTTP fetch of the page behind a URL.

use crate::config::FetchConfig;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("page fetch disabled")]
    Disabled,
    #[error("not a fetchable url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported scheme {0:?}")]
    Scheme(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    Status(reqwest::StatusCode),
    #[error("request failed: {0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status)
        } else {
            FetchError::Request(e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Reuses one connection pool across every URL it fetches.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone());
        if !config.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { config, client })
    }

    /// Scheme-less input (`example.com/login`) is fetched over plain http.
    pub fn target(raw: &str) -> Result<Url, FetchError> {
        let raw = raw.trim();
        let url = match Url::parse(raw) {
            Ok(u) => u,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{}", raw))?,
            Err(e) => return Err(e.into()),
        };
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::Scheme(other.to_string())),
        }
    }

    pub async fn fetch(&self, raw: &str) -> Result<FetchedPage, FetchError> {
        if !self.config.enabled {
            return Err(FetchError::Disabled);
        }
        let target = Self::target(raw)?;
        let mut res = self.client.get(target).send().await?.error_for_status()?;
        let url = res.url().clone();
        let status = res.status().as_u16();

        let mut buf = Vec::new();
        while let Some(chunk) = res.chunk().await? {
            let room = self.config.max_body_bytes.saturating_sub(buf.len());
            buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if buf.len() >= self.config.max_body_bytes {
                tracing::debug!(%url, limit = self.config.max_body_bytes, "body truncated");
                break;
            }
        }
        Ok(FetchedPage {
            url,
            status,
            body: String::from_utf8_lossy(&buf).into_owned(),
        })
    }
}
