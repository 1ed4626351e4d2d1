//! The types module contains the game record and the small types describing who may act.

use crate::{Bisection, GameError, GameEvent, Resolution};
use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};
use vgame_vm::VmId;

/// The [GameId] type identifies a game within an arena.
pub type GameId = H256;

/// The two sides of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    /// Asserts that the claimed result is correct.
    Solver,
    /// Disputes the claimed result and drives the bisection.
    Verifier,
}

impl Party {
    /// Returns the other party.
    pub fn opponent(self) -> Self {
        match self {
            Self::Solver => Self::Verifier,
            Self::Verifier => Self::Solver,
        }
    }
}

/// The lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Created,
    Initialized,
    InProgress,
    StepVerificationPending,
    ResolvedSolverWins,
    ResolvedVerifierWins,
}

impl Status {
    /// Returns the resolved status in favour of `winner`.
    pub fn won_by(winner: Party) -> Self {
        match winner {
            Party::Solver => Self::ResolvedSolverWins,
            Party::Verifier => Self::ResolvedVerifierWins,
        }
    }

    /// Returns whether the game has reached a final status.
    pub fn is_resolved(&self) -> bool {
        self.winner().is_some()
    }

    /// Returns the winner of a resolved game.
    pub fn winner(&self) -> Option<Party> {
        match self {
            Self::ResolvedSolverWins => Some(Party::Solver),
            Self::ResolvedVerifierWins => Some(Party::Verifier),
            _ => None,
        }
    }
}

/// Everything bound to a game when it is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session<I> {
    /// The VM that adjudicates the final step.
    pub vm: VmId,
    /// What the disputed inputs are committed to: a Merkle root, or the program itself.
    pub inputs: I,
    /// The bisection interval and turn bookkeeping.
    pub bisection: Bisection,
}

/// A single adjudication instance. `I` is the commitment to the disputed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game<I = H256> {
    pub id: GameId,
    pub solver: Address,
    pub verifier: Address,
    /// Opaque metadata describing the dispute.
    pub dispute: H256,
    pub status: Status,
    /// Absent until the game is initialized.
    pub session: Option<Session<I>>,
}

impl<I> Game<I> {
    /// Returns the role `address` plays in this game.
    pub fn party_of(&self, address: Address) -> Option<Party> {
        if address == self.solver {
            Some(Party::Solver)
        } else if address == self.verifier {
            Some(Party::Verifier)
        } else {
            None
        }
    }

    /// Returns the address playing `party`.
    pub fn address_of(&self, party: Party) -> Address {
        match party {
            Party::Solver => self.solver,
            Party::Verifier => self.verifier,
        }
    }

    /// Returns the party expected to act next, if the game is live.
    pub fn turn(&self) -> Option<Party> {
        if self.status.is_resolved() {
            return None;
        }
        self.session.as_ref().map(|s| s.bisection.turn)
    }

    /// Returns the bisection state of an initialized game.
    pub fn bisection(&self) -> Option<&Bisection> {
        self.session.as_ref().map(|s| &s.bisection)
    }

    pub(crate) fn session(&self) -> Result<&Session<I>, GameError> {
        self.session.as_ref().ok_or(GameError::WrongStatus {
            expected: Status::InProgress,
            actual: self.status,
        })
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut Session<I>, GameError> {
        let status = self.status;
        self.session.as_mut().ok_or(GameError::WrongStatus {
            expected: Status::InProgress,
            actual: status,
        })
    }

    /// Resolves the game and returns the event announcing it.
    pub(crate) fn resolve(&mut self, winner: Party, reason: Resolution) -> GameEvent {
        self.status = Status::won_by(winner);
        GameEvent::GameResolved {
            game_id: self.id,
            winner,
            reason,
        }
    }
}

/// The solver's evidence for the single disputed step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepWitness {
    /// The full encoded state at `low`.
    pub low_state: Bytes,
    /// The digest the solver claims for the state at `high`.
    pub high_state_hash: H256,
    /// The encoded action that produces step `high`.
    pub action: Bytes,
    /// The encoded [vgame_merkle::OrderedProof] placing `action` at leaf `high - 1`.
    pub proof: Bytes,
}
