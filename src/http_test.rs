use super::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Scripted transport: fails the first `failures` attempts, then answers
/// with `response`. Records every attempt.
struct FlakyTransport {
    failures: u32,
    response: String,
    attempts: AtomicU32,
    urls: Mutex<Vec<String>>,
}

impl FlakyTransport {
    fn new(failures: u32, response: &str) -> Self {
        Self {
            failures,
            response: response.to_owned(),
            attempts: AtomicU32::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for FlakyTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<String, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.urls.lock().expect("lock").push(request.url.clone());
        if attempt <= self.failures {
            return Err(TransportError::Request("connection refused".to_owned()));
        }
        Ok(self.response.clone())
    }
}

fn request(url: &str) -> HttpRequest {
    HttpRequest {
        url: url.to_owned(),
        body: None,
        cookies: None,
        mode: ResponseMode::Body,
    }
}

#[tokio::test(start_paused = true)]
async fn first_attempt_success_needs_no_retry() {
    let transport = Arc::new(FlakyTransport::new(0, "ok"));
    let client = RetryingClient::new(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    let response = client.send(request("http://svc/x")).await;
    assert_eq!(response.as_deref(), Some("ok"));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn two_failures_then_success_yields_the_response() {
    let transport = Arc::new(FlakyTransport::new(2, "recovered"));
    let client = RetryingClient::new(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    let response = client.send(request("http://svc/x")).await;
    assert_eq!(response.as_deref(), Some("recovered"));
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn three_failures_exhaust_the_budget_with_no_fourth_attempt() {
    let transport = Arc::new(FlakyTransport::new(3, "never seen"));
    let client = RetryingClient::new(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    let response = client.send(request("http://svc/x")).await;
    assert_eq!(response, None);
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn every_attempt_reissues_the_same_request() {
    let transport = Arc::new(FlakyTransport::new(2, "ok"));
    let client = RetryingClient::new(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    client.send(request("http://svc/retry-me")).await;
    let urls = transport.urls.lock().expect("lock");
    assert_eq!(urls.len(), 3);
    assert!(urls.iter().all(|url| url == "http://svc/retry-me"));
}

#[test]
fn production_transport_builds() {
    assert!(ReqwestTransport::new().is_ok());
}

#[test]
fn cookie_jar_keeps_only_name_value_pairs() {
    let header = "sessionid=abc123; Path=/; HttpOnly\ncsrftoken=xyz; Secure; Path=/";
    assert_eq!(
        cookie_jar_from_set_cookie(header).as_deref(),
        Some("sessionid=abc123; csrftoken=xyz")
    );
}

#[test]
fn cookie_jar_from_single_value() {
    assert_eq!(
        cookie_jar_from_set_cookie("sessionid=abc").as_deref(),
        Some("sessionid=abc")
    );
}

#[test]
fn cookie_jar_rejects_headers_without_pairs() {
    assert_eq!(cookie_jar_from_set_cookie(""), None);
    assert_eq!(cookie_jar_from_set_cookie("garbage"), None);
}
