#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use formrelay::config::{Config, RelayConfig};
use formrelay::error::{RoleError, StoreError};
use formrelay::frontend::FrontEnd;
use formrelay::ingest::{IngestLimits, IngestionListener};
use formrelay::models::FormSubmission;
use formrelay::store::MessageStore;
use formrelay::supervisor::Supervisor;

pub const INDEX_HTML: &str = "<html><body><form method=\"post\" action=\"/\"></form></body></html>";
pub const MESSAGE_HTML: &str = "<html><body>Thanks for your message</body></html>";
pub const ERROR_HTML: &str = "<html><body>Nothing here</body></html>";
pub const STYLE_CSS: &str = "body { color: black; }";
pub const SECRET: &str = "outside the document root";

/// Keeps every saved submission in memory, in save order.
#[derive(Default)]
pub struct RecordingStore {
    messages: Mutex<Vec<FormSubmission>>,
}

impl RecordingStore {
    pub fn messages(&self) -> Vec<FormSubmission> {
        self.messages.lock().unwrap().clone()
    }

    /// Poll until at least `count` messages are stored, or give up after 5s.
    pub async fn wait_for(&self, count: usize) -> Vec<FormSubmission> {
        for _ in 0..100 {
            let messages = self.messages();
            if messages.len() >= count {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!(
            "expected {count} stored messages, found {}",
            self.messages().len()
        );
    }
}

#[async_trait]
impl MessageStore for RecordingStore {
    async fn save(&self, submission: &FormSubmission) -> Result<(), StoreError> {
        self.messages.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// A store whose server never answers.
pub struct UnreachableStore;

#[async_trait]
impl MessageStore for UnreachableStore {
    async fn save(&self, _: &FormSubmission) -> Result<(), StoreError> {
        Err(StoreError::Unreachable(
            "pool timed out while waiting for an open connection".to_string(),
        ))
    }
}

/// A store that accepts a save and never completes it.
pub struct HangingStore;

#[async_trait]
impl MessageStore for HangingStore {
    async fn save(&self, _: &FormSubmission) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

/// Both roles running under a supervisor, on random local ports.
pub struct TestApp {
    pub addr: SocketAddr,
    pub relay_addr: SocketAddr,
    pub doc_root: PathBuf,
    pub client: Client,
    _dir: TempDir,
    stop: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<Result<(), RoleError>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed")
    }

    /// POST a raw url-encoded body to the submission endpoint.
    pub async fn submit(&self, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("submit request failed")
    }

    /// Signal shutdown and wait for the supervisor to finish.
    pub async fn shutdown(mut self) -> Result<(), RoleError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.wait().await
    }

    /// Wait for the supervisor to finish on its own.
    pub async fn wait(self) -> Result<(), RoleError> {
        tokio::time::timeout(Duration::from_secs(5), self.supervisor)
            .await
            .expect("supervisor did not stop in time")
            .expect("supervisor task panicked")
    }
}

/// A document root at `<tmp>/httpdoc` with `secret.txt` placed beside it.
pub fn doc_root() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path().join("httpdoc");
    std::fs::create_dir_all(root.join("css")).unwrap();
    std::fs::write(root.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(root.join("message.html"), MESSAGE_HTML).unwrap();
    std::fs::write(root.join("error.html"), ERROR_HTML).unwrap();
    std::fs::write(root.join("css").join("style.css"), STYLE_CSS).unwrap();
    std::fs::write(dir.path().join("secret.txt"), SECRET).unwrap();
    (dir, root)
}

pub fn test_config(doc_root: PathBuf, relay_addr: SocketAddr) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        doc_root,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        relay: RelayConfig {
            host: relay_addr.ip(),
            port: relay_addr.port(),
            read_timeout: Duration::from_secs(2),
            retries: 0,
            retry_delay: Duration::from_millis(10),
        },
        max_body_size: 64 * 1024,
        store_timeout: Duration::from_secs(5),
        log_level: "warn".to_string(),
    }
}

/// An address on which nothing is listening.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub async fn spawn_app(store: Arc<dyn MessageStore>) -> TestApp {
    spawn_app_with_relay(store, None).await
}

/// Like `spawn_app`, but the front-end relays to `relay_override` instead
/// of the ingestion listener when given.
pub async fn spawn_app_with_relay(
    store: Arc<dyn MessageStore>,
    relay_override: Option<SocketAddr>,
) -> TestApp {
    let (dir, root) = doc_root();

    let ingestion = IngestionListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        store,
        IngestLimits {
            max_payload: 64 * 1024,
            read_timeout: Duration::from_secs(2),
            store_timeout: Duration::from_secs(1),
        },
    )
    .await
    .expect("Failed to bind relay listener");
    let relay_addr = ingestion.local_addr().unwrap();

    let config = test_config(root.clone(), relay_override.unwrap_or(relay_addr));
    let front_end = FrontEnd::bind("127.0.0.1:0".parse().unwrap(), formrelay::build_app(&config))
        .await
        .expect("Failed to bind HTTP listener");
    let addr = front_end.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let supervisor = Supervisor::start(front_end, ingestion);
    let supervisor = tokio::spawn(supervisor.run_until(async move {
        let _ = stopped.await;
    }));

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        relay_addr,
        doc_root: root,
        client,
        _dir: dir,
        stop: Some(stop),
        supervisor,
    }
}
