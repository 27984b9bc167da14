//! Graceful shutdown coordination.
//!
//! On SIGINT or SIGTERM the coordinator cancels its token, which stops the
//! HTTP server from accepting connections and ends background tasks. In-flight
//! requests get until the configured timeout; the post store is flushed last.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::AppState;

pub struct ShutdownCoordinator {
    token: CancellationToken,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            timeout,
        }
    }

    /// Token cancelled when shutdown starts.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Starts shutdown without waiting for a signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Waits for SIGINT or SIGTERM, then cancels the token.
    ///
    /// Also returns if the token is cancelled by someone else.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(error) => {
                    warn!(%error, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating graceful shutdown"),
            _ = terminate => info!("received SIGTERM, initiating graceful shutdown"),
            _ = self.token.cancelled() => {}
        }
        self.token.cancel();
    }

    /// Waits for `server` to drain within the timeout, then flushes state.
    ///
    /// Requests still running `timeout` after cancellation are abandoned.
    pub async fn drain<F>(&self, server: F, state: &Arc<AppState>) -> Result<()>
    where
        F: std::future::Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(server);
        let deadline = async {
            self.token.cancelled().await;
            tokio::time::sleep(self.timeout).await;
        };

        tokio::select! {
            result = &mut server => {
                self.token.cancel();
                result.context("HTTP server failed")?;
            }
            _ = deadline => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "in-flight requests did not finish before the shutdown timeout"
                );
            }
        }

        match timeout(self.timeout, state.posts().flush()).await {
            Ok(Ok(())) => info!("post store flushed"),
            Ok(Err(error)) => warn!(%error, "failed to flush post store during shutdown"),
            Err(_) => warn!(
                timeout_secs = self.timeout.as_secs(),
                "post store flush timed out"
            ),
        }
        info!("graceful shutdown completed");
        Ok(())
    }
}
