//! The solver module holds the [SolverAgent].

use super::{Participant, Response, Trace};
use anyhow::{anyhow, Result};
use vgame_game::{Game, Party, Status};
use vgame_vm::Digest;

/// The [SolverAgent] defends the result of its trace: it answers every query from the trace and
/// proves the final disputed step.
#[derive(Debug, Clone)]
pub struct SolverAgent {
    trace: Trace,
}

impl SolverAgent {
    pub fn new(trace: Trace) -> Self {
        Self { trace }
    }

    /// Returns the final digest the solver claims.
    pub fn claim(&self) -> Digest {
        self.trace.final_digest()
    }
}

impl Participant for SolverAgent {
    fn party(&self) -> Party {
        Party::Solver
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
        if bisection.turn != Party::Solver {
            return Ok(self.wait_or_claim(bisection, now));
        }

        match game.status {
            Status::InProgress => {
                let step = bisection.open_query().ok_or(anyhow!(
                    "Critical failure: solver holds the turn in game {:?} without an open query",
                    game.id
                ))?;
                let digest = self.trace.digest_at(step)?;
                tracing::debug!(target: "solver-driver", "Answering query for step {} with {:?}", step, digest);
                Ok(Response::Respond(step, digest))
            }
            Status::StepVerificationPending => {
                tracing::debug!(target: "solver-driver", "Proving step {} of game {:?}", bisection.high, game.id);
                Ok(Response::Step(self.trace.witness(bisection.high)?))
            }
            _ => Ok(Response::DoNothing),
        }
    }
}
