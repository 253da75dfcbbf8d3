use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// The HTTP role: a bound listener plus the router it serves.
pub struct FrontEnd {
    listener: TcpListener,
    app: Router,
}

impl FrontEnd {
    pub async fn bind(addr: SocketAddr, app: Router) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, app })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until shutdown is signaled (or its sender is dropped), letting
    /// in-flight requests finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!("HTTP server listening on {addr}");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
