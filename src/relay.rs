use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::RelayConfig;
use crate::error::RelayError;

/// Front-end side of the relay: one fresh connection per submission,
/// the body written verbatim, then the write half closed.
#[derive(Debug, Clone)]
pub struct RelayClient {
    addr: SocketAddr,
    retries: u32,
    retry_delay: Duration,
}

impl RelayClient {
    /// A client that never retries a refused connection.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.addr()).with_retries(config.retries, config.retry_delay)
    }

    /// Retry a refused connection up to `retries` extra times, `delay` apart.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn forward(&self, body: &[u8]) -> Result<(), RelayError> {
        let mut attempt = 0;
        loop {
            match self.send_once(body).await {
                Err(RelayError::Refused(err)) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Relay refused ({err}), retrying {attempt}/{} in {:?}",
                        self.retries,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, body: &[u8]) -> Result<(), RelayError> {
        let mut stream = TcpStream::connect(self.addr).await?;
        stream.write_all(body).await?;
        stream.shutdown().await?;
        Ok(())
    }
}
