//! HTTP transport types shared by the builder, the executor and transports.
//!
//! # Design
//! Requests and responses are plain data. `FlakyClient` produces an
//! `HttpRequest` without touching the network; a `Transport` turns it into an
//! `HttpResponse`; the executor classifies that response. Keeping the
//! transport behind plain data lets tests substitute canned responses for the
//! network.

use crate::types::GeneratedEndpoint;

/// A GET request described as plain data.
///
/// The flaky endpoint is only ever called with GET, so the method is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: GeneratedEndpoint,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// GET `url`, asking for JSON.
    pub fn get(url: GeneratedEndpoint) -> Self {
        Self {
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by a `Transport` after the full body has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
