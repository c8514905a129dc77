//! Domain values for the flaky endpoint client.
//!
//! # Design
//! `Configuration` is a plain value the caller mutates freely between
//! invocations. Range clamping belongs to the input mechanism (the setters
//! and `clamped`); the endpoint builder never re-validates, so a value that
//! slipped past the input mechanism is still sent verbatim rather than being
//! silently rewritten.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigError, EncodingError};

/// Upper bound of `Configuration::delay_ms`.
pub const MAX_DELAY_MS: u32 = 5000;

/// Upper bound of `Configuration::fail_rate_percent`.
pub const MAX_FAIL_RATE_PERCENT: u32 = 100;

const DEFAULT_PAYLOAD: &str = "{\n  \"message\": \"Hello custom world!\",\n  \"userId\": 123\n}";

/// HTTP status the server answers with when it decides to fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    TooManyRequests,
    #[default]
    InternalServerError,
    ServiceUnavailable,
    GatewayTimeout,
}

impl ErrorCode {
    /// Every supported code, in ascending order.
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::BadRequest,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::NotFound,
        ErrorCode::RequestTimeout,
        ErrorCode::TooManyRequests,
        ErrorCode::InternalServerError,
        ErrorCode::ServiceUnavailable,
        ErrorCode::GatewayTimeout,
    ];

    pub fn as_u16(self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::RequestTimeout => 408,
            ErrorCode::TooManyRequests => 429,
            ErrorCode::InternalServerError => 500,
            ErrorCode::ServiceUnavailable => 503,
            ErrorCode::GatewayTimeout => 504,
        }
    }

    /// Canonical reason phrase for the status.
    pub fn reason(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "Bad Request",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::Forbidden => "Forbidden",
            ErrorCode::NotFound => "Not Found",
            ErrorCode::RequestTimeout => "Request Timeout",
            ErrorCode::TooManyRequests => "Too Many Requests",
            ErrorCode::InternalServerError => "Internal Server Error",
            ErrorCode::ServiceUnavailable => "Service Unavailable",
            ErrorCode::GatewayTimeout => "Gateway Timeout",
        }
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = ConfigError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.as_u16() == code)
            .ok_or(ConfigError::UnsupportedErrorCode(code))
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.as_u16()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// The parameters a developer picks for the flaky endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub delay_ms: u32,
    pub fail_rate_percent: u32,
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_payload_text: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            fail_rate_percent: 0,
            error_code: ErrorCode::default(),
            custom_payload_text: Some(DEFAULT_PAYLOAD.to_string()),
        }
    }
}

impl Configuration {
    pub fn set_delay_ms(&mut self, delay_ms: u32) {
        self.delay_ms = delay_ms.min(MAX_DELAY_MS);
    }

    pub fn set_fail_rate_percent(&mut self, percent: u32) {
        self.fail_rate_percent = percent.min(MAX_FAIL_RATE_PERCENT);
    }

    /// Set the payload from raw bytes. On invalid UTF-8 the payload is
    /// cleared, so no corrupt parameter can be sent, and the error is
    /// returned for the caller to report.
    pub fn set_payload_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodingError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                self.custom_payload_text = Some(text.to_string());
                Ok(())
            }
            Err(e) => {
                self.custom_payload_text = None;
                Err(e.into())
            }
        }
    }

    /// Same configuration with delay and fail rate clamped to their domains.
    pub fn clamped(mut self) -> Self {
        self.set_delay_ms(self.delay_ms);
        self.set_fail_rate_percent(self.fail_rate_percent);
        self
    }

    /// Report the first value outside its domain, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::DelayOutOfRange(self.delay_ms));
        }
        if self.fail_rate_percent > MAX_FAIL_RATE_PERCENT {
            return Err(ConfigError::FailRateOutOfRange(self.fail_rate_percent));
        }
        Ok(())
    }
}

/// A fully assembled absolute request URL. Recomputed on every
/// configuration change, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedEndpoint(String);

impl GeneratedEndpoint {
    pub(crate) fn new(url: String) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a single invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// 2xx with a JSON body.
    Success,
    /// Non-2xx response, whether or not its body was JSON.
    HttpFailure,
    /// No complete response was received.
    NetworkFailure,
    /// 2xx whose body is not JSON.
    MalformedBody,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Success => "success",
            Outcome::HttpFailure => "http failure",
            Outcome::NetworkFailure => "network failure",
            Outcome::MalformedBody => "malformed body",
        };
        f.write_str(name)
    }
}

/// The result of one invocation of the flaky endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub id: Uuid,
    pub url: GeneratedEndpoint,
    pub outcome: Outcome,
    /// Present whenever a response was received.
    pub http_status: Option<u16>,
    /// Parsed response JSON, or a diagnostic object.
    pub body: serde_json::Value,
    /// Present whenever a response was received.
    pub latency_ms: Option<u64>,
}
