//! The `drivers` module contains implementations of the [Driver] trait.

use crate::{handlers, Driver, DriverConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use vgame_game::Party;

/// Defines a new [Driver] implementation.
#[macro_export]
macro_rules! define_driver {
    ($name:ident, $inner:expr) => {
        #[doc = concat!("Variant of the [Driver] trait: [", stringify!($name), "]")]
        pub struct $name {
            /// The configuration for all of the drivers.
            pub config: Arc<DriverConfig>,
        }

        #[async_trait]
        impl Driver for $name {
            async fn start_loop(self) -> Result<()> {
                #[allow(clippy::redundant_closure_call)]
                $inner(self).await
            }
        }

        impl $name {
            #[doc = concat!("Creates a new instance of the [", stringify!($name), "] driver.")]
            pub fn new(config: Arc<DriverConfig>) -> Self {
                Self { config }
            }
        }
    };
}

define_driver!(
    SolverDriver,
    (|driver: SolverDriver| {
        async move {
            tracing::info!(target: "solver-driver", "Starting solver driver for game {:?}...", driver.config.game_id);
            let mut events = driver.config.solver_events.lock().await;
            tracing::info!(target: "solver-driver", "Locked event channel mutex successfully. Beginning solver loop.");

            loop {
                if let Some(status) = handlers::take_turn(&driver.config, Party::Solver).await? {
                    tracing::info!(target: "solver-driver", "Game {:?} resolved: {:?}", driver.config.game_id, status);
                    return Ok(());
                }

                match tokio::time::timeout(driver.config.poll_interval, events.recv()).await {
                    Ok(Ok(event)) => {
                        tracing::debug!(target: "solver-driver", "Event received: {:?}", event);
                    }
                    Ok(Err(RecvError::Lagged(skipped))) => {
                        tracing::warn!(target: "solver-driver", "Fell behind the event channel, skipped {} events", skipped);
                    }
                    Ok(Err(RecvError::Closed)) => {
                        anyhow::bail!("Critical failure: the event channel closed before the game resolved");
                    }
                    Err(_) => {
                        tracing::trace!(target: "solver-driver", "No events within the poll interval, re-checking the game");
                    }
                }
            }
        }
    })
);

define_driver!(
    VerifierDriver,
    (|driver: VerifierDriver| {
        async move {
            tracing::info!(target: "verifier-driver", "Starting verifier driver for game {:?}...", driver.config.game_id);
            let mut events = driver.config.verifier_events.lock().await;
            tracing::info!(target: "verifier-driver", "Locked event channel mutex successfully. Beginning verifier loop.");

            loop {
                if let Some(status) = handlers::take_turn(&driver.config, Party::Verifier).await? {
                    tracing::info!(target: "verifier-driver", "Game {:?} resolved: {:?}", driver.config.game_id, status);
                    return Ok(());
                }

                match tokio::time::timeout(driver.config.poll_interval, events.recv()).await {
                    Ok(Ok(event)) => {
                        tracing::debug!(target: "verifier-driver", "Event received: {:?}", event);
                    }
                    Ok(Err(RecvError::Lagged(skipped))) => {
                        tracing::warn!(target: "verifier-driver", "Fell behind the event channel, skipped {} events", skipped);
                    }
                    Ok(Err(RecvError::Closed)) => {
                        anyhow::bail!("Critical failure: the event channel closed before the game resolved");
                    }
                    Err(_) => {
                        tracing::trace!(target: "verifier-driver", "No events within the poll interval, re-checking the game");
                    }
                }
            }
        }
    })
);
