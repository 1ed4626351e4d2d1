//! Notifications emitted by the arena on every state change.

use crate::{GameId, Party};
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

/// Why a game was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The solver's single step witness checked out.
    Verified,
    /// The solver's single step witness did not check out.
    VerificationFailed,
    /// The turn holder missed its deadline.
    Timeout,
}

/// The [GameEvent] enum is what off-chain participants watch to know when to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    ChallengeCreated {
        game_id: GameId,
        solver: Address,
        verifier: Address,
    },
    GameInitialized {
        game_id: GameId,
        total_steps: u64,
        deadline: u64,
    },
    QueryIssued {
        game_id: GameId,
        step: u64,
    },
    ResponseSubmitted {
        game_id: GameId,
        step: u64,
        hash: H256,
    },
    StepVerificationPending {
        game_id: GameId,
        low: u64,
        high: u64,
    },
    GameResolved {
        game_id: GameId,
        winner: Party,
        reason: Resolution,
    },
}

impl GameEvent {
    /// Returns the game the event belongs to.
    pub fn game_id(&self) -> GameId {
        match self {
            Self::ChallengeCreated { game_id, .. }
            | Self::GameInitialized { game_id, .. }
            | Self::QueryIssued { game_id, .. }
            | Self::ResponseSubmitted { game_id, .. }
            | Self::StepVerificationPending { game_id, .. }
            | Self::GameResolved { game_id, .. } => *game_id,
        }
    }
}
