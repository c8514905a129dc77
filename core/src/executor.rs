//! One-shot execution and outcome classification.
//!
//! # Design
//! `RequestExecutor` sends exactly one request per call and never retries:
//! the caller is the thing under test, so every failure must reach it.
//! Classification is total. Whatever the transport does, `execute` returns an
//! `InvocationResult`; transport and parse problems become diagnostic bodies
//! instead of errors.

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{GeneratedEndpoint, InvocationResult, Outcome};

/// Longest slice of an unparsable body echoed back in the diagnostic.
const RAW_BODY_PREVIEW: usize = 512;

pub(crate) const NETWORK_FAILURE_MESSAGE: &str = "Network Error or Server Crash";

#[derive(Debug, Clone)]
pub struct RequestExecutor<T> {
    transport: T,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` once and classify the outcome.
    pub async fn execute(&self, url: &GeneratedEndpoint) -> InvocationResult {
        self.send(HttpRequest::get(url.clone())).await
    }

    /// Send `request` once and classify the outcome.
    pub async fn send(&self, request: HttpRequest) -> InvocationResult {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("invocation", %id);
        let url = request.url.clone();

        async move {
            tracing::debug!(url = %url, "sending request");
            let start = Instant::now();
            let result = match self.transport.send(request).await {
                Ok(response) => {
                    let latency_ms = elapsed_ms(start);
                    classify_response(id, url, response, latency_ms)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "no response received");
                    network_failure(id, url, &e)
                }
            };
            tracing::info!(
                outcome = %result.outcome,
                status = ?result.http_status,
                latency_ms = ?result.latency_ms,
                "invocation finished"
            );
            result
        }
        .instrument(span)
        .await
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Classify a received response. Latency is always kept from here on.
fn classify_response(
    id: Uuid,
    url: GeneratedEndpoint,
    response: HttpResponse,
    latency_ms: u64,
) -> InvocationResult {
    let success = response.is_success();
    let (outcome, body) = match serde_json::from_str::<Value>(&response.body) {
        Ok(body) if success => (Outcome::Success, body),
        Ok(body) => (Outcome::HttpFailure, body),
        Err(e) => {
            tracing::warn!(status = response.status, error = %e, "response body is not JSON");
            let outcome = if success {
                Outcome::MalformedBody
            } else {
                Outcome::HttpFailure
            };
            (outcome, unparsable_body(&response, &e))
        }
    };

    InvocationResult {
        id,
        url,
        outcome,
        http_status: Some(response.status),
        body,
        latency_ms: Some(latency_ms),
    }
}

fn unparsable_body(response: &HttpResponse, error: &serde_json::Error) -> Value {
    let raw: String = response.body.chars().take(RAW_BODY_PREVIEW).collect();
    json!({
        "error": "Response body is not valid JSON",
        "status": response.status,
        "detail": error.to_string(),
        "raw": raw,
    })
}

fn network_failure(id: Uuid, url: GeneratedEndpoint, error: &TransportError) -> InvocationResult {
    InvocationResult {
        id,
        url,
        outcome: Outcome::NetworkFailure,
        http_status: None,
        body: json!({
            "error": NETWORK_FAILURE_MESSAGE,
            "detail": error.to_string(),
        }),
        latency_ms: None,
    }
}
