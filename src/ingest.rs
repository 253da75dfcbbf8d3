use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::error::{DrainError, StoreError};
use crate::models::FormSubmission;
use crate::store::MessageStore;
use crate::submission::parser;

/// Relay connections are read in chunks of this many bytes.
pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct IngestLimits {
    pub max_payload: usize,
    pub read_timeout: Duration,
    /// Upper bound on a single `save`; exceeding it counts as an unreachable store.
    pub store_timeout: Duration,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_payload: 1_048_576,
            read_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// The ingestion role: owns the relay endpoint and persists what arrives on it,
/// one connection at a time.
pub struct IngestionListener {
    listener: TcpListener,
    store: Arc<dyn MessageStore>,
    limits: IngestLimits,
}

impl IngestionListener {
    pub async fn bind(
        addr: SocketAddr,
        store: Arc<dyn MessageStore>,
        limits: IngestLimits,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store,
            limits,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept, drain, decode and persist until shutdown is signaled.
    ///
    /// Shutdown is only observed while waiting for a connection, so a
    /// submission already accepted is always carried through to the store.
    /// A store failure ends the loop and is returned to the caller.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), StoreError> {
        match self.local_addr() {
            Ok(addr) => tracing::info!("Ingestion listener on {addr}"),
            Err(e) => tracing::warn!("Ingestion listener started, address unknown: {e}"),
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            tracing::debug!("Waiting for relay connection");
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("Relay accept failed: {e}");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                _ = shutdown.changed() => break,
            };

            self.handle(stream, peer).await?;
        }

        tracing::info!("Ingestion listener stopped");
        Ok(())
    }

    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) -> Result<(), StoreError> {
        tracing::debug!("Draining relay connection from {peer}");
        let payload = match drain(&mut stream, self.limits).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Dropped submission from {peer}: {e}");
                return Ok(());
            }
        };
        drop(stream);

        tracing::debug!("Decoding {} bytes", payload.len());
        let fields = match parser::decode(&payload) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("Dropped malformed submission ({} bytes): {e}", payload.len());
                return Ok(());
            }
        };
        let submission = FormSubmission::new(fields, Local::now());

        tracing::debug!("Persisting submission with {} fields", submission.fields.len());
        if let Err(e) = self.persist(&submission).await {
            tracing::error!("Failed to persist submission: {e}");
            return Err(e);
        }

        tracing::info!("Stored submission received at {}", submission.received_at);
        Ok(())
    }

    async fn persist(&self, submission: &FormSubmission) -> Result<(), StoreError> {
        let timeout = self.limits.store_timeout;
        tokio::time::timeout(timeout, self.store.save(submission))
            .await
            .map_err(|_| StoreError::Unreachable(format!("no answer within {timeout:?}")))?
    }
}

/// Read `reader` until it reports end-of-stream and return everything read.
pub async fn drain<R>(reader: &mut R, limits: IngestLimits) -> Result<Vec<u8>, DrainError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(limits.read_timeout, read_bounded(reader, limits.max_payload))
        .await
        .map_err(|_| DrainError::TimedOut)?
}

async fn read_bounded<R>(reader: &mut R, limit: usize) -> Result<Vec<u8>, DrainError>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(payload);
        }
        if payload.len() + n > limit {
            return Err(DrainError::TooLarge { limit });
        }
        payload.extend_from_slice(&chunk[..n]);
    }
}
