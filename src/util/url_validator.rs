use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a backend-supplied link before handing it to the system browser.
///
/// Only `http` and `https` URLs with a host pass; `file://`, `javascript:`
/// and friends are rejected since the link text comes from remote content.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http_url(url_str)?;
    tracing::debug!(url = %url, "Link validated for opening");
    Ok(url)
}

/// Validates the configured backend base URL.
///
/// Unlike links from content, the API is expected to live on localhost
/// during development, so no host restrictions apply.
pub fn validate_api_url(url_str: &str) -> Result<Url, UrlValidationError> {
    parse_http_url(url_str)
}

fn parse_http_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
