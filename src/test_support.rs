//! Loopback HTTP server and listener doubles shared by unit tests.

use crate::auth::CopyFactoryAuth;
use crate::domain::FixedDomainResolver;
use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::http::{HttpClient, RetryConfig};
use crate::streaming::{StreamListener, StreamingConfig};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};
use url::Url;

/// Client against `origin` with engine retries disabled.
pub(crate) fn api_client(origin: Url, token: &str) -> ApiClient {
    let http = HttpClient::builder()
        .with_retry_config(RetryConfig {
            retries: 0,
            ..RetryConfig::default()
        })
        .build()
        .expect("build client");
    ApiClient::new(
        http,
        CopyFactoryAuth::new(token),
        Arc::new(FixedDomainResolver::new(origin)),
        Duration::from_secs(5),
    )
}

/// Streaming config with millisecond-scale backoff.
pub(crate) fn fast_streaming() -> StreamingConfig {
    StreamingConfig {
        error_backoff: Duration::from_millis(10),
        max_error_backoff: Duration::from_millis(40),
        ..StreamingConfig::default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TestHttpResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: String,
    delay: Duration,
}

impl TestHttpResponse {
    pub(crate) fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn ok_json(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub(crate) fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) target: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    fn url(&self) -> Url {
        Url::parse(&format!("http://localhost{}", self.target)).expect("request target")
    }

    pub(crate) fn path(&self) -> String {
        self.url().path().to_string()
    }

    pub(crate) fn query(&self, name: &str) -> Option<String> {
        self.query_all(name).into_iter().next()
    }

    pub(crate) fn query_all(&self, name: &str) -> Vec<String> {
        self.url()
            .query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn body_json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// Answers requests in arrival order from a scripted queue.
///
/// Once the queue is drained, requests get `fallback`; without one the
/// connection is held open with no reply, like an idle long poll.
pub(crate) struct TestServer {
    origin: Url,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn spawn(
        responses: Vec<TestHttpResponse>,
        fallback: Option<TestHttpResponse>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

        let hits_ref = Arc::clone(&hits);
        let requests_ref = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let hits = Arc::clone(&hits_ref);
                let requests = Arc::clone(&requests_ref);
                let queue = Arc::clone(&queue);
                let fallback = fallback.clone();
                tokio::spawn(async move {
                    handle_connection(stream, hits, requests, queue, fallback).await;
                });
            }
        });

        Self {
            origin: Url::parse(&format!("http://{addr}")).expect("url"),
            hits,
            requests,
            task,
        }
    }

    pub(crate) fn origin(&self) -> Url {
        self.origin.clone()
    }

    pub(crate) fn url(&self, path: &str) -> Url {
        self.origin.join(path).expect("join url")
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Wait until at least `count` requests have arrived.
    pub(crate) async fn wait_for_hits(&self, count: usize, limit: Duration) {
        let deadline = Instant::now() + limit;
        while self.hits() < count {
            assert!(
                Instant::now() < deadline,
                "expected {count} requests, got {}",
                self.hits()
            );
            sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    queue: Arc<Mutex<VecDeque<TestHttpResponse>>>,
    fallback: Option<TestHttpResponse>,
) {
    let Some(request) = read_http_request(&mut stream).await else {
        return;
    };
    let response = {
        let mut requests = requests.lock();
        requests.push(request);
        hits.fetch_add(1, Ordering::SeqCst);
        queue.lock().pop_front().or(fallback)
    };

    let Some(response) = response else {
        // Hold the connection until the client gives up.
        let mut sink = [0u8; 64];
        while let Ok(n) = stream.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
        return;
    };

    if !response.delay.is_zero() {
        sleep(response.delay).await;
    }

    let reason = response.status.canonical_reason().unwrap_or("Unknown");
    let mut reply = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status.as_u16(),
        reason,
        response.body.len()
    );
    for (key, value) in response.headers {
        reply.push_str(&format!("{key}: {value}\r\n"));
    }
    reply.push_str("\r\n");
    reply.push_str(&response.body);

    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.flush().await;
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

async fn read_http_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 2048];
    let mut head: Option<(usize, usize)> = None;

    loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if head.is_none()
            && let Some(end) = header_end(&buffer)
        {
            let text = String::from_utf8_lossy(&buffer[..end]).to_ascii_lowercase();
            let content_length = text
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            head = Some((end, content_length));
        }

        if let Some((header_len, body_len)) = head
            && buffer.len() >= header_len + body_len
        {
            return Some(parse_request(&buffer[..header_len], &buffer[header_len..header_len + body_len]));
        }
    }
}

fn parse_request(head: &[u8], body: &[u8]) -> RecordedRequest {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    RecordedRequest {
        method,
        target,
        headers,
        body: body.to_vec(),
    }
}

/// Event observed by a [`RecordingListener`].
#[derive(Debug)]
pub(crate) enum Observed<T> {
    Batch(Vec<T>),
    Error(String),
}

/// Next callback observed by a [`RecordingListener`], failing after two seconds.
pub(crate) async fn next_observed<T>(rx: &mut mpsc::UnboundedReceiver<Observed<T>>) -> Observed<T> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("listener callback within timeout")
        .expect("listener channel open")
}

/// Forwards every callback into a channel.
pub(crate) struct RecordingListener<T> {
    tx: mpsc::UnboundedSender<Observed<T>>,
}

impl<T> RecordingListener<T> {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Observed<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> StreamListener<T> for RecordingListener<T> {
    async fn on_event(&self, batch: Vec<T>) {
        let _ = self.tx.send(Observed::Batch(batch));
    }

    async fn on_error(&self, error: &CopyFactoryError) {
        let _ = self.tx.send(Observed::Error(error.to_string()));
    }
}
