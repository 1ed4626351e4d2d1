//! The verifier module holds the [VerifierAgent].

use super::{Participant, Response, Trace};
use anyhow::Result;
use vgame_game::{Bisection, Game, Party, PendingQuery, Status};
use vgame_vm::Digest;

/// The [VerifierAgent] disputes a claim that differs from its own trace. It keeps the interval
/// bounded by a step it agrees with and a step it does not, halving it with every query.
#[derive(Debug, Clone)]
pub struct VerifierAgent {
    trace: Trace,
}

impl VerifierAgent {
    pub fn new(trace: Trace) -> Self {
        Self { trace }
    }

    /// Returns whether `claimed` differs from the final digest of the verifier's own trace.
    pub fn should_challenge(&self, claimed: Digest) -> bool {
        self.trace.final_digest() != claimed
    }

    /// Picks the next step to query. Once an answer is in, the step is chosen on the side of
    /// the answered midpoint that carries the verdict: above it to accept, below it to reject.
    /// When a single step remains the query carries the verdict only.
    fn next_query(&self, bisection: &Bisection) -> Result<u64> {
        let Some(PendingQuery {
            step: mid,
            response: Some(hash),
        }) = bisection.pending
        else {
            return Ok(bisection.low + (bisection.high - bisection.low) / 2);
        };

        let agrees = self.trace.digest_at(mid)? == hash;
        tracing::debug!(target: "verifier-driver", "Solver's digest at step {} {}", mid, if agrees { "matches" } else { "differs" });
        let (low, high) = if agrees {
            (mid, bisection.high)
        } else {
            (bisection.low, mid)
        };
        Ok(match (high - low, agrees) {
            (1, true) => bisection.high,
            (1, false) => bisection.low,
            (width, _) => low + width / 2,
        })
    }
}

impl Participant for VerifierAgent {
    fn party(&self) -> Party {
        Party::Verifier
    }

    fn trace(&self) -> &Trace {
        &self.trace
    }

    fn respond(&self, game: &Game, now: u64) -> Result<Response> {
        let Some(bisection) = game.bisection() else {
            return Ok(Response::DoNothing);
        };
        if game.status.is_resolved() {
            return Ok(Response::DoNothing);
        }
        if bisection.turn != Party::Verifier {
            return Ok(self.wait_or_claim(bisection, now));
        }

        match game.status {
            Status::InProgress => Ok(Response::Query(self.next_query(bisection)?)),
            _ => Ok(Response::DoNothing),
        }
    }
}
