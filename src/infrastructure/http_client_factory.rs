use crate::domain::errors::ProviderError;
use reqwest::{Client, Response};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates the shared HTTP client used by every provider.
    ///
    /// No retry layer: a failed request is retried by the next polling cycle.
    pub fn create_client(timeout: Duration) -> Client {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sentitick/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

/// Maps transport failures and non-2xx statuses to [`ProviderError`].
pub fn check_response(
    provider: &str,
    symbol: &str,
    result: reqwest::Result<Response>,
) -> Result<Response, ProviderError> {
    let response = result.map_err(|e| request_error(provider, symbol, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            symbol: symbol.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

pub fn request_error(provider: &str, symbol: &str, e: reqwest::Error) -> ProviderError {
    ProviderError::Request {
        provider: provider.to_string(),
        symbol: symbol.to_string(),
        reason: e.to_string(),
    }
}

pub fn malformed(provider: &str, symbol: &str, reason: impl Into<String>) -> ProviderError {
    ProviderError::Malformed {
        provider: provider.to_string(),
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

/// `"{headline}. {summary}"`, or whichever half is present
pub fn combine_headline(headline: Option<&str>, summary: Option<&str>) -> Option<String> {
    let headline = headline.map(str::trim).unwrap_or_default();
    let summary = summary.map(str::trim).unwrap_or_default();
    let combined = match (headline.is_empty(), summary.is_empty()) {
        (true, true) => return None,
        (false, true) => headline.to_string(),
        (true, false) => summary.to_string(),
        (false, false) => format!("{}. {}", headline, summary),
    };
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_headline() {
        assert_eq!(
            combine_headline(Some("Apple beats"), Some("EPS up 10%")).as_deref(),
            Some("Apple beats. EPS up 10%")
        );
        assert_eq!(combine_headline(Some(" Only title "), None).as_deref(), Some("Only title"));
        assert_eq!(combine_headline(None, Some("summary")).as_deref(), Some("summary"));
        assert_eq!(combine_headline(Some(""), Some("  ")), None);
    }
}
