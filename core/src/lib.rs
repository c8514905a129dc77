//! Client core for a configurable flaky HTTP endpoint.
//!
//! # Overview
//! Turns user-chosen parameters (delay, fail rate, error status, echo
//! payload) into a request URL for a remote flaky server, calls it exactly
//! once, and classifies what happened while measuring latency. It exists to
//! exercise a *caller's* resilience, so it never retries.
//!
//! # Design
//! - `Configuration` is a plain value; `FlakyClient` turns it into a
//!   `GeneratedEndpoint` without I/O.
//! - `payload` encodes the echo payload through its UTF-8 bytes.
//! - `RequestExecutor` performs the one network call through a `Transport`
//!   and always yields an `InvocationResult`.
//! - `ResultState` is a pure state machine; `Session` applies it around each
//!   call and rejects overlapping invocations.

pub mod client;
pub mod error;
pub mod executor;
pub mod http;
pub mod payload;
pub mod state;
pub mod transport;
pub mod types;

pub use client::{build, FlakyClient};
pub use error::{ConfigError, EncodingError, StateError, TransportError};
pub use executor::RequestExecutor;
pub use http::{HttpRequest, HttpResponse};
pub use state::{ResultState, Session};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Configuration, ErrorCode, GeneratedEndpoint, InvocationResult, Outcome, MAX_DELAY_MS,
    MAX_FAIL_RATE_PERCENT,
};
