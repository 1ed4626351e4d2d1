//! Event loops that connect the two participants of a dispute to one shared game arena.
//!
//! Each participant runs as its own [Driver]. The drivers wake on the events the arena emits
//! and on a poll interval, so a silent counterparty is claimed once its deadline lapses.

use anyhow::Result;
use async_trait::async_trait;

mod config;
pub use config::{DisputeConfig, DriverConfig};

mod drivers;
pub use drivers::{SolverDriver, VerifierDriver};

mod handlers;

mod session;
pub use session::{DisputeSession, Outcome};

mod state;
pub use state::GlobalState;

/// The [Driver] trait defines the interface for all driver loops that are ran by the
/// `verification-game` binary.
#[async_trait]
pub trait Driver {
    /// Starts the [Driver] loop. The loop returns once the game it drives is resolved.
    async fn start_loop(self) -> Result<()>;
}
