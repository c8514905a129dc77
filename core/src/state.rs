//! Lifecycle of the latest invocation.
//!
//! # Design
//! `ResultState` transitions are pure: each returns the next state and
//! leaves the current one untouched. `Session` owns the current state for a
//! single-threaded caller and applies the transitions around the network
//! call. The `Loading` state is the single-flight guard: a second `invoke`
//! while one is in flight is rejected before any request is built or sent.
//! No lock is involved; `Session` is `!Sync` and meant for a current-thread
//! runtime.

use std::cell::RefCell;

use serde_json::json;
use uuid::Uuid;

use crate::client::FlakyClient;
use crate::error::StateError;
use crate::executor::RequestExecutor;
use crate::transport::Transport;
use crate::types::{Configuration, GeneratedEndpoint, InvocationResult, Outcome};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultState {
    #[default]
    Idle,
    Loading,
    Succeeded(InvocationResult),
    Failed(InvocationResult),
}

impl ResultState {
    /// Start an invocation. Rejected while one is already in flight.
    pub fn begin(&self) -> Result<ResultState, StateError> {
        match self {
            ResultState::Loading => Err(StateError::AlreadyInFlight),
            ResultState::Idle | ResultState::Succeeded(_) | ResultState::Failed(_) => {
                Ok(ResultState::Loading)
            }
        }
    }

    /// Finish the in-flight invocation with `result`.
    pub fn complete(&self, result: InvocationResult) -> Result<ResultState, StateError> {
        match self {
            ResultState::Loading if result.outcome.is_success() => {
                Ok(ResultState::Succeeded(result))
            }
            ResultState::Loading => Ok(ResultState::Failed(result)),
            _ => Err(StateError::NotInFlight),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    /// The latest finished result, if any.
    pub fn result(&self) -> Option<&InvocationResult> {
        match self {
            ResultState::Succeeded(result) | ResultState::Failed(result) => Some(result),
            ResultState::Idle | ResultState::Loading => None,
        }
    }
}

/// Builds, invokes and tracks the flaky endpoint for one caller.
pub struct Session<T> {
    client: FlakyClient,
    executor: RequestExecutor<T>,
    state: RefCell<ResultState>,
}

impl<T: Transport> Session<T> {
    pub fn new(client: FlakyClient, transport: T) -> Self {
        Self {
            client,
            executor: RequestExecutor::new(transport),
            state: RefCell::new(ResultState::Idle),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResultState {
        self.state.borrow().clone()
    }

    /// Preview the URL `invoke` would call for `config`.
    pub fn endpoint(&self, config: &Configuration) -> GeneratedEndpoint {
        self.client.build_endpoint(config)
    }

    /// Invoke the endpoint built from `config` exactly once.
    ///
    /// Returns `StateError::AlreadyInFlight` without sending anything when
    /// another invocation on this session has not finished yet.
    pub async fn invoke(&self, config: &Configuration) -> Result<InvocationResult, StateError> {
        let loading = self.state.borrow().begin();
        let loading = loading.inspect_err(|_| {
            tracing::warn!("invocation rejected, another one is in flight");
        })?;
        self.state.replace(loading);

        let request = self.client.build_request(config);
        let in_flight = InFlight::new(&self.state, request.url.clone());
        let result = self.executor.send(request).await;
        in_flight.finish(result)
    }
}

/// Moves the state out of `Loading` even if the invocation future is dropped
/// before the response arrives.
struct InFlight<'a> {
    state: &'a RefCell<ResultState>,
    url: GeneratedEndpoint,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a RefCell<ResultState>, url: GeneratedEndpoint) -> Self {
        Self {
            state,
            url,
            finished: false,
        }
    }

    fn finish(mut self, result: InvocationResult) -> Result<InvocationResult, StateError> {
        self.finished = true;
        let next = self.state.borrow().complete(result.clone())?;
        self.state.replace(next);
        Ok(result)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!(url = %self.url, "invocation abandoned before a response arrived");
        let abandoned = InvocationResult {
            id: Uuid::new_v4(),
            url: self.url.clone(),
            outcome: Outcome::NetworkFailure,
            http_status: None,
            body: json!({ "error": "Invocation abandoned before completion" }),
            latency_ms: None,
        };
        let next = self.state.borrow().complete(abandoned);
        if let Ok(next) = next {
            self.state.replace(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};

    /// Replays queued responses, each after `delay`.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<HttpResponse, TransportError>>, delay: Duration) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                delay,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(
            &self,
            _request: HttpRequest,
        ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left");
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                next
            }
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn session(responses: Vec<Result<HttpResponse, TransportError>>) -> Session<ScriptedTransport> {
        Session::new(
            FlakyClient::new("http://flaky.test"),
            ScriptedTransport::new(responses, Duration::from_millis(300)),
        )
    }

    fn result(outcome: Outcome) -> InvocationResult {
        InvocationResult {
            id: Uuid::nil(),
            url: FlakyClient::new("http://flaky.test").build_endpoint(&Configuration::default()),
            outcome,
            http_status: None,
            body: serde_json::Value::Null,
            latency_ms: None,
        }
    }

    #[test]
    fn begin_is_allowed_from_settled_states() {
        assert_eq!(ResultState::Idle.begin(), Ok(ResultState::Loading));
        let succeeded = ResultState::Succeeded(result(Outcome::Success));
        assert_eq!(succeeded.begin(), Ok(ResultState::Loading));
        let failed = ResultState::Failed(result(Outcome::HttpFailure));
        assert_eq!(failed.begin(), Ok(ResultState::Loading));
    }

    #[test]
    fn begin_is_rejected_while_loading() {
        assert_eq!(ResultState::Loading.begin(), Err(StateError::AlreadyInFlight));
    }

    #[test]
    fn complete_routes_outcomes() {
        let done = ResultState::Loading.complete(result(Outcome::Success)).unwrap();
        assert!(matches!(done, ResultState::Succeeded(_)));

        for outcome in [
            Outcome::HttpFailure,
            Outcome::NetworkFailure,
            Outcome::MalformedBody,
        ] {
            let done = ResultState::Loading.complete(result(outcome)).unwrap();
            assert!(matches!(done, ResultState::Failed(_)), "{outcome}");
        }
    }

    #[test]
    fn complete_requires_loading() {
        assert_eq!(
            ResultState::Idle.complete(result(Outcome::Success)),
            Err(StateError::NotInFlight)
        );
        let settled = ResultState::Failed(result(Outcome::HttpFailure));
        assert_eq!(
            settled.complete(result(Outcome::Success)),
            Err(StateError::NotInFlight)
        );
    }

    #[test]
    fn transitions_leave_current_state_untouched() {
        let state = ResultState::Idle;
        let _ = state.begin();
        assert_eq!(state, ResultState::Idle);
        assert!(state.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn session_walks_through_states() {
        let session = session(vec![ok(200, r#"{"message":"ok"}"#), ok(500, r#"{"error":"boom"}"#)]);
        let config = Configuration::default();
        assert_eq!(session.state(), ResultState::Idle);

        let result = session.invoke(&config).await.unwrap();
        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(session.state(), ResultState::Succeeded(result));

        let result = session.invoke(&config).await.unwrap();
        assert_eq!(result.outcome, Outcome::HttpFailure);
        assert_eq!(session.state().result(), Some(&result));
        assert!(matches!(session.state(), ResultState::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_loading_during_flight() {
        let session = session(vec![ok(200, "{}")]);
        let config = Configuration::default();

        let (result, observed) = tokio::join!(session.invoke(&config), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.state()
        });

        assert_eq!(observed, ResultState::Loading);
        assert!(result.is_ok());
        assert!(!session.state().is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn second_invocation_while_loading_is_rejected() {
        let session = session(vec![ok(200, "{}"), ok(200, "{}")]);
        let config = Configuration::default();

        let (first, second) = tokio::join!(session.invoke(&config), async {
            tokio::task::yield_now().await;
            session.invoke(&config).await
        });

        assert!(first.is_ok());
        assert_eq!(second, Err(StateError::AlreadyInFlight));
        assert_eq!(session.executor.transport().calls.load(Ordering::SeqCst), 1);
        assert!(matches!(session.state(), ResultState::Succeeded(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_ends_in_failed() {
        let session = session(vec![Err(TransportError::Request("dns error".to_string()))]);
        let result = session.invoke(&Configuration::default()).await.unwrap();

        assert_eq!(result.outcome, Outcome::NetworkFailure);
        assert!(matches!(session.state(), ResultState::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_invocation_does_not_stay_loading() {
        let session = session(vec![ok(200, "{}"), ok(200, "{}")]);
        let config = Configuration::default();

        let timed_out = tokio::time::timeout(Duration::from_millis(10), session.invoke(&config)).await;
        assert!(timed_out.is_err());

        let state = session.state();
        let result = state.result().expect("abandoned invocation leaves a result");
        assert_eq!(result.outcome, Outcome::NetworkFailure);
        assert!(matches!(state, ResultState::Failed(_)));

        // The session accepts new work afterwards.
        assert!(session.invoke(&config).await.is_ok());
    }
}
