//! Verify endpoint building and outcome classification against the JSON
//! vectors stored in `test-vectors/`.
//!
//! Endpoint vectors compare the full URL string, since parameter order and
//! escaping are part of the contract. Classification vectors compare parsed
//! JSON bodies to avoid false negatives from field ordering.

use std::future::Future;

use flaky_core::{
    payload, Configuration, FlakyClient, HttpRequest, HttpResponse, Outcome, RequestExecutor,
    Transport, TransportError,
};

/// Replays one simulated response, or fails when there is none.
struct Simulated(Option<HttpResponse>);

impl Transport for Simulated {
    fn send(
        &self,
        _request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let response = self
            .0
            .clone()
            .ok_or_else(|| TransportError::Request("connection refused".to_string()));
        async move { response }
    }
}

fn parse_outcome(s: &str) -> Outcome {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .unwrap_or_else(|_| panic!("unknown outcome: {s}"))
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[test]
fn endpoint_test_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = FlakyClient::new(vectors["base_url"].as_str().unwrap());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: Configuration = serde_json::from_value(case["input"].clone()).unwrap();

        let url = c.build_endpoint(&input);
        assert_eq!(url.as_str(), case["expected_url"].as_str().unwrap(), "{name}: url");

        // The transmitted payload decodes back to the untrimmed input.
        if let Some((_, value)) = url.as_str().split_once("&response=") {
            let unescaped = urlencoding::decode(value).unwrap();
            let decoded = payload::decode(&unescaped).unwrap();
            assert_eq!(
                Some(decoded.as_str()),
                input.custom_payload_text.as_deref(),
                "{name}: payload"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn classification_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let url = FlakyClient::new("http://localhost:8080").build_endpoint(&Configuration::default());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = (!sim.is_null()).then(|| HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        });
        let received = response.is_some();

        let result = RequestExecutor::new(Simulated(response)).execute(&url).await;

        let expected = &case["expected"];
        assert_eq!(
            result.outcome,
            parse_outcome(expected["outcome"].as_str().unwrap()),
            "{name}: outcome"
        );
        assert_eq!(
            result.http_status.map(u64::from),
            expected["http_status"].as_u64(),
            "{name}: status"
        );
        assert_eq!(result.latency_ms.is_some(), received, "{name}: latency");
        if let Some(body) = expected.get("body") {
            assert_eq!(&result.body, body, "{name}: body");
        } else {
            assert!(result.body.get("error").is_some(), "{name}: diagnostic body");
        }
    }
}
