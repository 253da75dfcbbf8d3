use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub doc_root: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub relay: RelayConfig,
    pub max_body_size: usize,
    pub store_timeout: Duration,
    pub log_level: String,
}

/// Loopback transport between the HTTP role and the ingestion role.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: IpAddr,
    pub port: u16,
    pub read_timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl RelayConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let doc_root = PathBuf::from(env_or("FORMRELAY_DOC_ROOT", "./httpdoc"));

        let host: IpAddr = env_or("FORMRELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_HOST: {e}"))?;

        let port: u16 = env_or("FORMRELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_PORT: {e}"))?;

        let relay_host: IpAddr = env_or("FORMRELAY_RELAY_HOST", "127.0.0.1")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_HOST: {e}"))?;

        if !relay_host.is_loopback() {
            return Err(format!(
                "FORMRELAY_RELAY_HOST must be a loopback address, got {relay_host}"
            ));
        }

        let relay_port: u16 = env_or("FORMRELAY_RELAY_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_PORT: {e}"))?;

        let read_timeout_secs: u64 = env_or("FORMRELAY_RELAY_READ_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_READ_TIMEOUT_SECS: {e}"))?;

        let retries: u32 = env_or("FORMRELAY_RELAY_RETRIES", "0")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_RETRIES: {e}"))?;

        let retry_delay_ms: u64 = env_or("FORMRELAY_RELAY_RETRY_DELAY_MS", "200")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_RELAY_RETRY_DELAY_MS: {e}"))?;

        let max_body_size: usize = env_or("FORMRELAY_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_MAX_BODY_SIZE: {e}"))?;

        let store_timeout_secs: u64 = env_or("FORMRELAY_STORE_TIMEOUT_SECS", "5")
            .parse()
            .map_err(|e| format!("Invalid FORMRELAY_STORE_TIMEOUT_SECS: {e}"))?;

        let log_level = env_or("FORMRELAY_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            doc_root,
            host,
            port,
            relay: RelayConfig {
                host: relay_host,
                port: relay_port,
                read_timeout: Duration::from_secs(read_timeout_secs),
                retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
            },
            max_body_size,
            store_timeout: Duration::from_secs(store_timeout_secs),
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
