//! The participant module holds the [Participant] trait.

use super::{Response, Trace};
use anyhow::Result;
use vgame_game::{Bisection, Game, Party};

/// The [Participant] trait defines the interface for an off-chain agent playing one side of a
/// verification game.
pub trait Participant: Send + Sync {
    /// Returns the side this participant plays.
    fn party(&self) -> Party;

    /// Returns the participant's local replay of the disputed computation. The participant's
    /// moves are always correct in its own view of this trace.
    fn trace(&self) -> &Trace;

    /// Decide the next move in a game.
    ///
    /// ### Takes
    /// - `game`: The current record of the game.
    /// - `now`: The current time, in the arena's clock.
    ///
    /// ### Returns
    /// - `Ok(Response)`: The move to make, possibly [Response::DoNothing].
    /// - `Err(anyhow::Error)`: The game references steps outside of the participant's trace.
    fn respond(&self, game: &Game, now: u64) -> Result<Response>;

    /// Waits for the counterparty, claiming the game once its deadline has lapsed.
    fn wait_or_claim(&self, bisection: &Bisection, now: u64) -> Response {
        if bisection.turn != self.party() && bisection.has_lapsed(now) {
            Response::ClaimTimeout
        } else {
            Response::DoNothing
        }
    }
}
