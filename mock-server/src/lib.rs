//! Local stand-in for the remote flaky server.
//!
//! Serves `GET /flaky` with the same contract the client consumes: an
//! optional failure drawn against `fail_rate`, then a `delay`, then either the
//! decoded `response` payload or a default success body. Query values are
//! parsed leniently; anything non-numeric counts as zero.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

pub const CHAOS_MESSAGE: &str = "💥 Chaos triggered.";
pub const SUCCESS_MESSAGE: &str = "🎉 Success! You survived the chaos.";

/// Body sent when the server decides to fail.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChaosBody {
    pub error: String,
    pub code: u16,
    pub message: String,
}

/// Body sent on success when no usable payload was supplied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SuccessBody {
    pub message: String,
    pub delayed_ms: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/flaky", get(flaky))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn root() -> &'static str {
    "Hello, Flaky API!"
}

async fn flaky(Query(params): Query<HashMap<String, String>>) -> Response {
    let delay_ms = int_param(&params, "delay");
    let fail_rate = int_param(&params, "fail_rate");
    let status = error_status(int_param(&params, "error_code"));

    if fail_rate > 0 && rand::random_range(0..100) < fail_rate {
        tracing::info!(status = status.as_u16(), fail_rate, "chaos triggered");
        let body = ChaosBody {
            error: CHAOS_MESSAGE.to_string(),
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
        };
        return (status, Json(body)).into_response();
    }

    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms.unsigned_abs())).await;
    }

    if let Some(payload) = params.get("response").filter(|p| !p.is_empty()) {
        match decode_payload(payload) {
            Ok(custom) => return (StatusCode::OK, Json(custom)).into_response(),
            Err(e) => tracing::warn!(error = %e, payload = %payload, "ignoring response payload"),
        }
    }

    let body = SuccessBody {
        message: SUCCESS_MESSAGE.to_string(),
        delayed_ms: delay_ms.to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn int_param(params: &HashMap<String, String>, name: &str) -> i64 {
    params
        .get(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Missing, zero or invalid codes fall back to 500.
fn error_status(code: i64) -> StatusCode {
    u16::try_from(code)
        .ok()
        .filter(|c| *c != 0)
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A form decoder may have turned `+` into a space; undo that first.
fn decode_payload(payload: &str) -> Result<Value, String> {
    let restored = payload.replace(' ', "+");
    let bytes = STANDARD
        .decode(restored.as_bytes())
        .map_err(|e| format!("base64: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("json: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn int_param_is_lenient() {
        let p = params(&[("delay", "250"), ("fail_rate", "abc")]);
        assert_eq!(int_param(&p, "delay"), 250);
        assert_eq!(int_param(&p, "fail_rate"), 0);
        assert_eq!(int_param(&p, "missing"), 0);
    }

    #[test]
    fn error_status_falls_back_to_500() {
        assert_eq!(error_status(0), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_status(-4), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_status(70_000), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_status(42), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_status(429), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn decode_payload_restores_plus() {
        // {"a":"~~~>"} encodes with a '+' in it.
        let encoded = STANDARD.encode(br#"{"a":"~~~>"}"#);
        assert!(encoded.contains('+'));
        let value = decode_payload(&encoded.replace('+', " ")).unwrap();
        assert_eq!(value["a"], "~~~>");
    }

    #[test]
    fn decode_payload_rejects_non_json() {
        let encoded = STANDARD.encode(b"not json");
        assert!(decode_payload(&encoded).unwrap_err().starts_with("json"));
        assert!(decode_payload("***").unwrap_err().starts_with("base64"));
    }

    #[test]
    fn chaos_body_serializes() {
        let body = ChaosBody {
            error: CHAOS_MESSAGE.to_string(),
            code: 503,
            message: "Service Unavailable".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 503);
        assert_eq!(json["message"], "Service Unavailable");
    }
}
