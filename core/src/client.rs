//! Stateless request URL builder for the flaky endpoint.
//!
//! # Design
//! `FlakyClient` holds only a `base_url` and carries no mutable state between
//! calls. Building is a pure function of the base address and a
//! `Configuration`, so it is cheap enough to run on every configuration
//! change. Executing the request is the job of `RequestExecutor`.

use crate::http::HttpRequest;
use crate::payload;
use crate::types::{Configuration, GeneratedEndpoint};

/// Path of the flaky endpoint under the base address.
pub const FLAKY_PATH: &str = "/flaky";

/// Synchronous, stateless builder for flaky endpoint URLs.
#[derive(Debug, Clone)]
pub struct FlakyClient {
    base_url: String,
}

impl FlakyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Assemble the request URL for `config`.
    ///
    /// `delay`, `fail_rate` and `error_code` are always present, in that
    /// order, exactly as stored in `config`. `response` is present only when
    /// the payload has non-whitespace content; it carries the untrimmed text.
    pub fn build_endpoint(&self, config: &Configuration) -> GeneratedEndpoint {
        let mut url = format!(
            "{}{FLAKY_PATH}?delay={}&fail_rate={}&error_code={}",
            self.base_url, config.delay_ms, config.fail_rate_percent, config.error_code
        );

        if let Some(text) = payload_to_send(config) {
            let encoded = payload::encode(text);
            url.push_str("&response=");
            url.push_str(&urlencoding::encode(&encoded));
        }

        GeneratedEndpoint::new(url)
    }

    pub fn build_request(&self, config: &Configuration) -> HttpRequest {
        HttpRequest::get(self.build_endpoint(config))
    }
}

/// Build the flaky endpoint URL for `base` and `config`.
pub fn build(base: &str, config: &Configuration) -> GeneratedEndpoint {
    FlakyClient::new(base).build_endpoint(config)
}

/// The payload text to transmit, if any. Trimming only decides inclusion.
fn payload_to_send(config: &Configuration) -> Option<&str> {
    config
        .custom_payload_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
}
