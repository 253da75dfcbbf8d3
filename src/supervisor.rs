use std::future::Future;

use tokio::signal;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

use crate::error::RoleError;
use crate::frontend::FrontEnd;
use crate::ingest::IngestionListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerRole {
    FrontEnd,
    Ingestion,
}

impl std::fmt::Display for ServerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerRole::FrontEnd => write!(f, "front-end"),
            ServerRole::Ingestion => write!(f, "ingestion"),
        }
    }
}

type RoleExit = (ServerRole, Result<(), RoleError>);

/// Runs the front-end and ingestion roles as separate tasks and stops them
/// together. Each role owns its listener and state; they only talk over the
/// relay socket.
///
/// Dropping the supervisor drops the shutdown sender, which also stops both
/// roles.
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    roles: JoinSet<RoleExit>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// A supervisor with no roles yet.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            roles: JoinSet::new(),
        }
    }

    /// Spawn both roles. Must be called from within a Tokio runtime.
    pub fn start(front_end: FrontEnd, ingestion: IngestionListener) -> Self {
        let mut supervisor = Self::new();

        let rx = supervisor.subscribe();
        supervisor.spawn_role(ServerRole::Ingestion, async move {
            ingestion.run(rx).await.map_err(RoleError::from)
        });

        let rx = supervisor.subscribe();
        supervisor.spawn_role(ServerRole::FrontEnd, async move {
            front_end
                .run(rx)
                .await
                .map_err(|e| RoleError::Serve(ServerRole::FrontEnd, e))
        });

        tracing::info!("Started front-end and ingestion roles");
        supervisor
    }

    /// A receiver that flips to `true` when the supervisor stops its roles.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Run `run` as `role`. It should return once the value from
    /// [`Supervisor::subscribe`] turns `true`.
    pub fn spawn_role<F>(&mut self, role: ServerRole, run: F)
    where
        F: Future<Output = Result<(), RoleError>> + Send + 'static,
    {
        // The inner task isolates a panic so it is reported against its role.
        let task = tokio::spawn(run);
        self.roles.spawn(async move {
            match task.await {
                Ok(result) => (role, result),
                Err(e) => {
                    tracing::error!("{role} role panicked: {e}");
                    (role, Err(RoleError::Panicked(role)))
                }
            }
        });
    }

    /// Wait for `signal` or for either role to stop on its own, then stop
    /// every role and wait for all of them. Returns the first role failure.
    pub async fn run_until<S>(mut self, signal: S) -> Result<(), RoleError>
    where
        S: Future<Output = ()>,
    {
        let early_exit = tokio::select! {
            _ = signal => None,
            Some(joined) = self.roles.join_next() => Some(joined),
        };

        let mut failure = None;
        match early_exit {
            None => tracing::info!("Shutdown requested, stopping all roles"),
            Some(joined) => {
                if let Some((role, result)) = settle(joined) {
                    let err = result.err().unwrap_or(RoleError::Exited(role));
                    tracing::error!("{err}; stopping all roles");
                    failure = Some(err);
                }
            }
        }

        let _ = self.shutdown.send(true);

        while let Some(joined) = self.roles.join_next().await {
            if let Some((role, result)) = settle(joined) {
                match result {
                    Ok(()) => tracing::info!("{role} role stopped"),
                    Err(e) => {
                        tracing::error!("{e}");
                        failure.get_or_insert(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn settle(joined: Result<RoleExit, JoinError>) -> Option<RoleExit> {
    match joined {
        Ok(exit) => Some(exit),
        Err(e) => {
            tracing::error!("Role watcher failed: {e}");
            None
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
