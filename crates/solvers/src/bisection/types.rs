//! The types module contains the moves a participant can make.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use vgame_game::{BisectionGame, Clock, GameError, GameId, Status, StepWitness};
use vgame_vm::Digest;

/// A [Response] is an action taken by a participant in the verification game in response to
/// the current state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Do nothing.
    DoNothing,
    /// Query the solver's digest at a step. The step also carries the verdict on the previous
    /// answer.
    Query(u64),
    /// Answer the outstanding query with the digest at a step.
    Respond(u64, Digest),
    /// Settle the single disputed step.
    Step(StepWitness),
    /// Claim the game from a counterparty that missed its deadline.
    ClaimTimeout,
}

impl Response {
    /// Submits the response to `game` on behalf of `caller`.
    ///
    /// ### Returns
    /// - `Ok(Some(Status))`: The status of the game after the call.
    /// - `Ok(None)`: The response was [Response::DoNothing].
    /// - `Err(GameError)`: The arena rejected the call.
    pub fn dispatch<C: Clock>(
        &self,
        game: &mut BisectionGame<C>,
        id: GameId,
        caller: Address,
    ) -> Result<Option<Status>, GameError> {
        match self {
            Self::DoNothing => Ok(None),
            Self::Query(step) => game.query(id, caller, *step).map(Some),
            Self::Respond(step, hash) => game.respond(id, caller, *step, *hash).map(Some),
            Self::Step(witness) => game
                .perform_step_verification(id, caller, witness)
                .map(Some),
            Self::ClaimTimeout => game.claim_timeout(id, caller).map(Some),
        }
    }
}
