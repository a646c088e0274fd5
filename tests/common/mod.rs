//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use articles_service::lifecycle::build_server;
use articles_service::observability::{InMemoryTracer, Telemetry, W3cPropagator};
use articles_service::{ServiceConfig, Shutdown};

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
}

/// Raw-TCP suggestions backend answering every request through a closure.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable backend on an ephemeral port.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    start_delayed_backend(Duration::ZERO, f).await
}

/// Like `start_programmable_backend`, holding every response for `delay`.
pub async fn start_delayed_backend<F>(delay: Duration, f: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let Some(request) = read_request_head(&mut socket).await else {
                    return;
                };
                let (status, body) = f(&request.path);
                recorded.lock().unwrap().push(request);
                tokio::time::sleep(delay).await;

                let response = format!(
                    "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { addr, requests }
}

/// Backend serving a fixed suggestions mapping, 404 with an error body otherwise.
pub async fn start_suggestions_backend(mapping: &[(&str, &[&str])]) -> MockBackend {
    let mapping: HashMap<String, Vec<String>> = mapping
        .iter()
        .map(|(id, ids)| (id.to_string(), ids.iter().map(|s| s.to_string()).collect()))
        .collect();

    start_programmable_backend(move |path| {
        let id = path.trim_start_matches("/suggestions/v1/");
        match mapping.get(id) {
            Some(ids) if !ids.is_empty() => (200, serde_json::to_string(ids).unwrap()),
            _ => (
                404,
                format!(r#"{{"errors":["there are no suggestions for `{}` article"]}}"#, id),
            ),
        }
    })
    .await
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    Some(RecordedRequest { path, headers })
}

/// The articles service running on an ephemeral port.
pub struct TestService {
    pub base_url: String,
    pub tracer: InMemoryTracer,
    shutdown: Shutdown,
    _snapshot: tempfile::NamedTempFile,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the service over `snapshot` (JSON object keyed by id), pointing at `suggestions_host`.
pub async fn start_service(snapshot: &str, suggestions_host: &str) -> TestService {
    start_service_with(snapshot, suggestions_host, |_| {}).await
}

/// Like `start_service`, with a final say on the configuration.
pub async fn start_service_with(
    snapshot: &str,
    suggestions_host: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> TestService {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(snapshot.as_bytes()).unwrap();

    let mut config = ServiceConfig::default();
    config.data_source.articles_path = file.path().to_path_buf();
    config.suggestions.host = suggestions_host.to_string();
    config.suggestions.timeout_secs = 2;
    configure(&mut config);

    let tracer = InMemoryTracer::new();
    let telemetry = Telemetry::new(Arc::new(tracer.clone()), Arc::new(W3cPropagator));
    let server = build_server(config, telemetry).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestService {
        base_url: format!("http://{}", addr),
        tracer,
        shutdown,
        _snapshot: file,
    }
}
