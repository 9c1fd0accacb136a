//! Captcha-token service client.
//!
//! The generation backend requires a fresh captcha token with every
//! request. This client fetches one from the token service via a GET
//! with the API key as a query parameter.

use serde::Deserialize;

/// Default token service endpoint.
const DEFAULT_BASE_URL: &str = "https://captcha-v3.shop";

/// Errors from the captcha-token service.
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token service returned a non-2xx status code.
    #[error("Token service returned HTTP {0}")]
    HttpStatus(u16),

    /// The response parsed but carried no token.
    #[error("Token service response did not contain a token")]
    MissingToken,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Client for the captcha-token service.
pub struct CaptchaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CaptchaClient {
    /// Create a client for the default token service endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client against a specific endpoint.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch one opaque captcha token.
    pub async fn fetch_token(&self) -> Result<String, CaptchaError> {
        let response = self
            .client
            .get(format!("{}/get-token", self.base_url))
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptchaError::HttpStatus(status.as_u16()));
        }

        let body: TokenResponse = response.json().await?;
        body.token.ok_or(CaptchaError::MissingToken)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
