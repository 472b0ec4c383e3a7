use std::collections::HashMap;

use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use url::Url;

use super::models::ClientConfig;
use crate::domain::DownloadError;

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Chunks of a successful response body.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Thin wrapper over a shared `reqwest::Client`; cloning is cheap.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Issue a GET and return `(content_length, body)`.
    /// A non-2xx status is reported as `DownloadError::Status` with the status line.
    pub async fn fetch_stream(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<(Option<u64>, BodyStream)> {
        let url = Url::parse(url)
            .map_err(|e| DownloadError::Setup(format!("invalid URL {url}: {e}")))?;

        let response = self
            .inner
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.to_string()));
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(map_reqwest_error).boxed();

        Ok((total_size, stream))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> DownloadError {
    if e.is_builder() {
        DownloadError::Setup(e.to_string())
    } else {
        DownloadError::Transport(e.to_string())
    }
}

/// Convert caller headers into a `HeaderMap`, verbatim. Invalid names or values are setup errors.
pub fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DownloadError::Setup(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DownloadError::Setup(format!("invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}
