//! The error type returned by rejected transitions. A rejected transition never changes the
//! game it was aimed at.

use crate::{GameId, Party, Status};
use ethers::types::Address;
use thiserror::Error;
use vgame_merkle::MerkleError;
use vgame_vm::VmError;

/// The broad class of a [GameError].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The call was made by the wrong party, out of turn, in the wrong status or with an index
    /// outside the interval.
    ProtocolViolation,
    /// The call carried bytes that could not be decoded, or parameters that describe no game.
    MalformedInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no game with id {0:?}")]
    UnknownGame(GameId),
    #[error("solver and verifier must be distinct parties, both are {0:?}")]
    SameParty(Address),
    #[error("{0:?} is not a party to this game")]
    NotParticipant(Address),
    #[error("only the {expected:?} may make this call")]
    WrongParty { expected: Party },
    #[error("it is the {0:?}'s turn")]
    OutOfTurn(Party),
    #[error("game is {actual:?}, expected {expected:?}")]
    WrongStatus { expected: Status, actual: Status },
    #[error("game is already resolved: {0:?}")]
    AlreadyResolved(Status),
    #[error("step {step} is outside the bisection interval [{low}, {high}]")]
    StepOutOfRange { step: u64, low: u64, high: u64 },
    #[error("step {got} does not answer the outstanding query {expected:?}")]
    WrongStep { expected: Option<u64>, got: u64 },
    #[error("deadline {deadline} has not passed yet, it is {now}")]
    DeadlineNotReached { deadline: u64, now: u64 },
    #[error("a game must dispute at least one step")]
    NoSteps,
    #[error("cannot dispute {steps} steps of a {len} instruction program")]
    ProgramTooShort { steps: u64, len: usize },
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

impl GameError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSteps | Self::ProgramTooShort { .. } | Self::Vm(_) | Self::Merkle(_) => {
                ErrorKind::MalformedInput
            }
            _ => ErrorKind::ProtocolViolation,
        }
    }
}
