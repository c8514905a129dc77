//! Error types for the flaky endpoint client.
//!
//! # Design
//! Each concern gets its own enum so callers can tell a local, recoverable
//! problem (a payload that cannot be encoded, an out-of-range setting) apart
//! from a failed network call or a rejected invocation. Outcomes of an HTTP
//! round-trip are *not* errors: they are reported as `InvocationResult`
//! values, see `executor`.

use thiserror::Error;

/// The payload text cannot be transported safely. The caller omits the
/// `response` query parameter and proceeds without it.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Raw bytes were not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// UTF-16 input contained an unpaired surrogate.
    #[error("payload contains an unpaired surrogate: {0}")]
    UnpairedSurrogate(#[from] std::char::DecodeUtf16Error),

    /// The encoded text is not valid radix-64.
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// The transport failed before a complete response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, connect, TLS, timeout or body read failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The blocking worker running the request did not finish.
    #[error("transport worker failed: {0}")]
    Worker(String),
}

/// A `ResultState` transition was not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// An invocation is already in flight; the new one is rejected.
    #[error("an invocation is already in flight")]
    AlreadyInFlight,

    /// A result arrived while no invocation was in flight.
    #[error("no invocation is in flight")]
    NotInFlight,
}

/// A configuration value outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("delay {0} ms is outside 0..=5000")]
    DelayOutOfRange(u32),

    #[error("fail rate {0}% is outside 0..=100")]
    FailRateOutOfRange(u32),

    #[error("unsupported error code {0}")]
    UnsupportedErrorCode(u16),
}
