//! HTTP client for supplier-hosted price lists.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ImportError;
use crate::parse::parse_price_list;
use crate::types::PriceList;

/// Fetches price-list documents from supplier URLs.
///
/// One attempt per call with a bounded timeout; a failed fetch is reported to
/// the caller, who may simply submit the import again.
pub struct PriceListClient {
    client: Client,
    max_bytes: usize,
}

impl PriceListClient {
    /// Creates a client with the given request timeout, `User-Agent`, and
    /// maximum accepted document size.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str, max_bytes: usize) -> Result<Self, ImportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, max_bytes })
    }

    /// Downloads the document at `url` as text.
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidUrl`] if `url` is not an absolute http(s) URL.
    /// - [`ImportError::UnexpectedStatus`] for any non-2xx response.
    /// - [`ImportError::TooLarge`] if the body exceeds the configured limit.
    /// - [`ImportError::Http`] on network or TLS failure.
    pub async fn fetch(&self, url: &str) -> Result<String, ImportError> {
        let url = validate_url(url)?;

        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "application/x-yaml,text/yaml,text/plain;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ImportError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(ImportError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let body = response.bytes().await?;
        if body.len() > self.max_bytes {
            return Err(ImportError::TooLarge {
                limit: self.max_bytes,
            });
        }

        tracing::debug!(url = %url, bytes = body.len(), "fetched price list");
        String::from_utf8(body.to_vec()).map_err(|_| ImportError::Encoding)
    }

    /// Fetches and validates the price list at `url`.
    ///
    /// # Errors
    ///
    /// Anything [`PriceListClient::fetch`] or [`parse_price_list`] returns.
    pub async fn fetch_price_list(&self, url: &str) -> Result<PriceList, ImportError> {
        let text = self.fetch(url).await?;
        parse_price_list(&text)
    }
}

/// Checks that `raw` is an absolute `http`/`https` URL with a host.
///
/// # Errors
///
/// Returns [`ImportError::InvalidUrl`] describing the problem.
pub fn validate_url(raw: &str) -> Result<Url, ImportError> {
    let invalid = |reason: String| ImportError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
