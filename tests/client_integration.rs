use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use reqwest::{Method, Request, Url};
use resume_parsing_client::{
    ClientOptions, DumpLogger, HttpClient, HttpError, RetryDecision, RetryPredicate,
};
use serde::Deserialize;

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: &'static [u8],
    delay: Duration,
}

impl MockResponse {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self::raw(status, body.as_bytes())
    }

    fn raw(status: StatusCode, body: &'static [u8]) -> Self {
        Self {
            status,
            body,
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
}

async fn handler(
    State(state): State<MockState>,
    _headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .bodies
        .lock()
        .expect("body log mutex must not be poisoned")
        .push(body);

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "no mock response available")
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (response.status, response.body)
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(AtomicUsize::new(0)),
        bodies: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/*path", any(handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        bodies: state.bodies,
        task,
    }
}

fn request(method: Method, url: &str) -> Request {
    Request::new(method, Url::parse(url).expect("valid url"))
}

fn post(url: &str, body: &'static str) -> Request {
    let mut request = request(Method::POST, url);
    *request.body_mut() = Some(body.into());
    request
}

fn fast_retries(max_retries: usize) -> ClientOptions {
    ClientOptions::default()
        .with_max_retries(max_retries)
        .with_retry_wait_min(Duration::from_millis(1))
        .with_retry_wait_max(Duration::from_millis(5))
}

#[derive(Debug, Deserialize, PartialEq)]
struct Dummy {
    key: String,
}

#[tokio::test]
async fn default_policy_surfaces_bad_gateway_without_retry() {
    let server = spawn_server(vec![
        MockResponse::new(StatusCode::BAD_GATEWAY, ""),
        MockResponse::new(StatusCode::OK, "never reached"),
    ])
    .await;
    let url = server.url("/status");
    let client = HttpClient::new(ClientOptions::default().with_max_retries(3)).expect("client");

    let err = client
        .send(request(Method::GET, &url))
        .await
        .expect_err("502 must fail");

    assert_eq!(
        err.to_string(),
        format!(
            "request to {url} failed. httpStatus: [ 502 ] responseBody: [  ] error: [ <nil> ]"
        )
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn decodes_json_into_target() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::OK, r#"{"key":"value"}"#)]).await;
    let client = HttpClient::new(ClientOptions::default()).expect("client");

    let decoded = client
        .send_and_decode_json::<Dummy>(request(Method::GET, &server.url("/json")))
        .await
        .expect("decode must succeed");

    assert_eq!(decoded.status, reqwest::StatusCode::OK);
    assert_eq!(
        decoded.value,
        Dummy {
            key: "value".to_owned()
        }
    );
}

#[tokio::test]
async fn malformed_json_reports_decode_error_with_status() {
    let server = spawn_server(vec![MockResponse::new(StatusCode::OK, "{\"key\":")]).await;
    let client = HttpClient::new(ClientOptions::default()).expect("client");

    let err = client
        .send_and_decode_json::<Dummy>(request(Method::GET, &server.url("/json")))
        .await
        .expect_err("decode must fail");

    assert!(matches!(err, HttpError::Decode { status: 200, .. }));
}

#[tokio::test]
async fn error_body_is_captured_verbatim() {
    let body = r#"{"error":"some random error"}"#;
    let server = spawn_server(vec![MockResponse::new(StatusCode::UNPROCESSABLE_ENTITY, body)]).await;
    let client = HttpClient::new(ClientOptions::default()).expect("client");

    let err = client
        .send(post(&server.url("/api/parse"), "{}"))
        .await
        .expect_err("422 must fail");

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.body(), body);
    assert!(err.cause().is_none());
}

#[tokio::test]
async fn error_body_bytes_survive_non_utf8_content() {
    let raw: &'static [u8] = &[0xff, 0xfe, b'a', b'b', 0xc3];
    let server = spawn_server(vec![MockResponse::raw(StatusCode::INTERNAL_SERVER_ERROR, raw)]).await;
    let client = HttpClient::new(ClientOptions::default()).expect("client");

    let err = client
        .send(request(Method::GET, &server.url("/binary")))
        .await
        .expect_err("500 must fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.body_bytes(), raw);
    assert!(err.to_string().contains("responseBody: [ \u{fffd}\u{fffd}ab\u{fffd} ]"));
}

#[tokio::test]
async fn custom_predicate_retries_until_success_and_replays_body() {
    let server = spawn_server(vec![
        MockResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        MockResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        MockResponse::new(StatusCode::OK, r#"{"key":"third time"}"#),
    ])
    .await;
    let options = fast_retries(4).with_retry_predicate(RetryPredicate::on_status([
        reqwest::StatusCode::INTERNAL_SERVER_ERROR,
    ]));
    let client = HttpClient::new(options).expect("client");

    let decoded = client
        .send_and_decode_json::<Dummy>(post(&server.url("/api/parse"), "payload"))
        .await
        .expect("must succeed after retries");

    assert_eq!(decoded.value.key, "third time");
    assert_eq!(server.hits.load(Ordering::SeqCst), 3);
    let bodies = server.bodies.lock().expect("mutex");
    assert!(bodies.iter().all(|body| body == "payload"));
}

#[tokio::test]
async fn connection_failures_give_up_after_configured_attempts() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);
    let url = format!("http://{address}/closed");

    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = attempts.clone();
    let options = fast_retries(1).with_retry_predicate(RetryPredicate::new(move |_, _, error| {
        counted.fetch_add(1, Ordering::SeqCst);
        RetryDecision::from(error.is_some())
    }));
    let client = HttpClient::new(options).expect("client");

    let err = client
        .send(request(Method::GET, &url))
        .await
        .expect_err("connection must fail");

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(err.status(), None);
    let expected_prefix = format!(
        "request to {url} failed. httpStatus: [ no status ] responseBody: [  ] error: [ GET {url} giving up after 2 attempt(s): "
    );
    assert!(
        err.to_string().starts_with(&expected_prefix),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn default_policy_does_not_retry_connection_failures() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);
    let url = format!("http://{address}/closed");
    let client = HttpClient::new(fast_retries(5)).expect("client");

    let err = client
        .send(request(Method::GET, &url))
        .await
        .expect_err("connection must fail");

    assert!(matches!(err, HttpError::Transport { .. }));
    assert!(err
        .to_string()
        .contains(&format!("GET {url} giving up after 1 attempt(s)")));
}

#[tokio::test]
async fn request_timeout_surfaces_transport_error() {
    let server = spawn_server(vec![
        MockResponse::new(StatusCode::OK, "{}").with_delay(Duration::from_millis(150))
    ])
    .await;
    let options = ClientOptions::default().with_timeout(Duration::from_millis(20));
    let client = HttpClient::new(options).expect("client");

    let err = client
        .send(request(Method::GET, &server.url("/slow")))
        .await
        .expect_err("request must time out");

    match err {
        HttpError::Transport { cause, .. } => {
            let timed_out = std::error::Error::source(&*cause)
                .and_then(|source| source.downcast_ref::<reqwest::Error>())
                .is_some_and(reqwest::Error::is_timeout);
            assert!(timed_out, "expected timeout, got {cause}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn dump_logger_sees_body_only_when_enabled() {
    for dump_body in [false, true] {
        let server = spawn_server(vec![MockResponse::new(StatusCode::OK, "")]).await;
        let dumps = Arc::new(Mutex::new(Vec::new()));
        let sink = dumps.clone();
        let options = ClientOptions::default().with_dump_logger(
            DumpLogger::new(move |dump| {
                sink.lock()
                    .expect("mutex must not be poisoned")
                    .push(String::from_utf8_lossy(dump).into_owned())
            }),
            dump_body,
        );
        let client = HttpClient::new(options).expect("client");

        client
            .send(post(&server.url("/dump"), "top-secret-body"))
            .await
            .expect("request must succeed");

        let dumps = dumps.lock().expect("mutex");
        assert_eq!(dumps.len(), 1);
        assert!(dumps[0].starts_with("POST /dump HTTP/1.1\r\n"));
        assert_eq!(dumps[0].contains("top-secret-body"), dump_body);
    }
}
