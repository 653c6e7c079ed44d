//! Graceful Shutdown Module
//!
//! SIGINT/SIGTERM or a programmatic trigger flips a watch flag that the
//! WebSocket accept loop and the HTTP server both observe. The drain waits
//! for both listeners to stop, bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Shutdown configuration
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for the listeners to stop
    pub timeout: Duration,
    /// Enable signal handlers
    pub enable_signals: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            enable_signals: true,
        }
    }
}

impl ShutdownConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn without_signals(mut self) -> Self {
        self.enable_signals = false;
        self
    }
}

/// Graceful shutdown coordinator
#[derive(Debug, Clone)]
pub struct GracefulShutdown {
    /// Flag observed by listeners; `true` means stop accepting
    stop_tx: Arc<watch::Sender<bool>>,
    state_tx: Arc<watch::Sender<ShutdownState>>,
    config: Arc<ShutdownConfig>,
}

impl GracefulShutdown {
    pub fn new(config: ShutdownConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (state_tx, _) = watch::channel(ShutdownState::Running);

        Self {
            stop_tx: Arc::new(stop_tx),
            state_tx: Arc::new(state_tx),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    /// Stop flag for a listener
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Trigger shutdown programmatically. Only the first reason is kept.
    pub fn shutdown(&self, reason: ShutdownReason) {
        let first = self.state_tx.send_if_modified(|state| {
            if *state == ShutdownState::Running {
                *state = ShutdownState::ShuttingDown(reason.clone());
                true
            } else {
                false
            }
        });
        if first {
            info!(%reason, at = %chrono::Utc::now(), "Triggering shutdown");
            self.stop_tx.send_replace(true);
        }
    }

    /// Wait until shutdown has been triggered and return why
    pub async fn wait_for_signal(&self) -> ShutdownReason {
        let mut rx = self.state_tx.subscribe();
        match rx
            .wait_for(|state| !matches!(state, ShutdownState::Running))
            .await
        {
            Ok(state) => match &*state {
                ShutdownState::ShuttingDown(reason) => reason.clone(),
                _ => ShutdownReason::Unknown,
            },
            Err(_) => ShutdownReason::Unknown,
        }
    }

    /// Mark the drain finished
    pub fn complete(&self) {
        self.state_tx.send_replace(ShutdownState::Completed);
    }

    /// Get current state
    pub fn state(&self) -> ShutdownState {
        self.state_tx.borrow().clone()
    }
}

/// Reason for shutdown
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    /// SIGTERM signal received
    SigTerm,
    /// SIGINT signal received (Ctrl+C)
    SigInt,
    /// programmatic shutdown
    Programmatic(String),
    /// Unknown reason
    Unknown,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::SigTerm => write!(f, "SIGTERM"),
            ShutdownReason::SigInt => write!(f, "SIGINT (Ctrl+C)"),
            ShutdownReason::Programmatic(reason) => write!(f, "Programmatic: {}", reason),
            ShutdownReason::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Shutdown state
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownState {
    /// Normal running state
    Running,
    /// Shutdown initiated
    ShuttingDown(ShutdownReason),
    /// Listeners drained
    Completed,
}

/// Start signal handler that triggers graceful shutdown
pub fn start_signal_handler(coordinator: &GracefulShutdown) {
    if !coordinator.config.enable_signals {
        return;
    }

    let coordinator = coordinator.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => ShutdownReason::SigInt,
                Err(e) => {
                    error!("Failed to register ctrl-c handler: {}", e);
                    std::future::pending().await
                }
            }
        };

        let term = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    ShutdownReason::SigTerm
                }
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    std::future::pending().await
                }
            }
        };

        tokio::select! {
            reason = ctrl_c => coordinator.shutdown(reason),
            reason = term => coordinator.shutdown(reason),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_graceful_shutdown_trigger() {
        let shutdown = GracefulShutdown::new(ShutdownConfig::default().without_signals());

        let handle = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { shutdown.wait_for_signal().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.shutdown(ShutdownReason::Programmatic("Test".to_string()));

        let reason = handle.await.unwrap();
        assert_eq!(reason, ShutdownReason::Programmatic("Test".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_state() {
        let shutdown = GracefulShutdown::new(ShutdownConfig::default());

        assert_eq!(shutdown.state(), ShutdownState::Running);

        shutdown.shutdown(ShutdownReason::SigInt);
        assert_eq!(
            shutdown.state(),
            ShutdownState::ShuttingDown(ShutdownReason::SigInt)
        );

        shutdown.complete();
        assert_eq!(shutdown.state(), ShutdownState::Completed);
    }

    #[tokio::test]
    async fn test_first_reason_wins() {
        let shutdown = GracefulShutdown::new(ShutdownConfig::default());

        shutdown.shutdown(ShutdownReason::SigTerm);
        shutdown.shutdown(ShutdownReason::SigInt);

        assert_eq!(shutdown.wait_for_signal().await, ShutdownReason::SigTerm);
    }

    #[tokio::test]
    async fn test_listener_flag_flips() {
        let shutdown = GracefulShutdown::new(ShutdownConfig::default());
        let mut stop = shutdown.subscribe();
        assert!(!*stop.borrow());

        shutdown.shutdown(ShutdownReason::Unknown);

        stop.changed().await.unwrap();
        assert!(*stop.borrow());
    }
}
