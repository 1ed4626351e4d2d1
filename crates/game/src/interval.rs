//! The interval module holds the [Bisection] bookkeeping shared by every game variant.

use crate::{GameError, Party};
use serde::{Deserialize, Serialize};
use vgame_vm::Digest;

/// A query issued by the verifier, and the solver's answer once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuery {
    pub step: u64,
    pub response: Option<Digest>,
}

/// What a successful query did to the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new midpoint now awaits the solver's response.
    Queried(u64),
    /// The interval is down to a single step.
    Narrowed,
}

/// The [Bisection] struct tracks the disputed interval `(low, high]` and whose turn it is.
///
/// The verifier's query carries its verdict on the previous answer: querying above the answered
/// midpoint accepts it as the new `low`, querying below rejects it as the new `high`. Every
/// operation validates before it mutates, so a rejected call leaves the interval untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bisection {
    pub total_steps: u64,
    pub claimed_final_state_hash: Digest,
    pub low: u64,
    pub high: u64,
    pub low_state_hash: Digest,
    pub high_state_hash: Digest,
    pub pending: Option<PendingQuery>,
    pub turn: Party,
    pub timeout_window: u64,
    pub deadline: u64,
    /// The number of queries the verifier has made.
    pub rounds: u32,
}

impl Bisection {
    /// Opens the interval over the whole trace. A single step trace goes straight to step
    /// verification, which is the solver's move.
    pub fn new(
        total_steps: u64,
        initial_state_hash: Digest,
        claimed_final_state_hash: Digest,
        timeout_window: u64,
        now: u64,
    ) -> Self {
        Self {
            total_steps,
            claimed_final_state_hash,
            low: 0,
            high: total_steps,
            low_state_hash: initial_state_hash,
            high_state_hash: claimed_final_state_hash,
            pending: None,
            turn: if total_steps == 1 {
                Party::Solver
            } else {
                Party::Verifier
            },
            timeout_window,
            deadline: now.saturating_add(timeout_window),
            rounds: 0,
        }
    }

    /// Returns whether the dispute is down to one step.
    pub fn is_single_step(&self) -> bool {
        self.high - self.low == 1
    }

    /// Returns whether the turn holder has missed its deadline.
    pub fn has_lapsed(&self, now: u64) -> bool {
        now > self.deadline
    }

    /// Returns the outstanding query that still needs the solver's answer.
    pub fn open_query(&self) -> Option<u64> {
        self.pending
            .filter(|pending| pending.response.is_none())
            .map(|pending| pending.step)
    }

    pub(crate) fn query(&mut self, step: u64, now: u64) -> Result<Advance, GameError> {
        if self.turn != Party::Verifier {
            return Err(GameError::OutOfTurn(self.turn));
        }

        let (low, low_hash, high, high_hash) = match self.pending {
            Some(PendingQuery {
                step: mid,
                response: Some(mid_hash),
            }) => {
                if step < self.low || step > self.high || step == mid {
                    return Err(GameError::StepOutOfRange {
                        step,
                        low: self.low,
                        high: self.high,
                    });
                }
                if step > mid {
                    (mid, mid_hash, self.high, self.high_state_hash)
                } else {
                    (self.low, self.low_state_hash, mid, mid_hash)
                }
            }
            _ => (self.low, self.low_state_hash, self.high, self.high_state_hash),
        };

        let advance = if high - low == 1 {
            Advance::Narrowed
        } else if low < step && step < high {
            Advance::Queried(step)
        } else {
            return Err(GameError::StepOutOfRange { step, low, high });
        };

        self.low = low;
        self.low_state_hash = low_hash;
        self.high = high;
        self.high_state_hash = high_hash;
        self.pending = match advance {
            Advance::Queried(step) => Some(PendingQuery {
                step,
                response: None,
            }),
            Advance::Narrowed => None,
        };
        self.rounds += 1;
        self.pass_turn(Party::Solver, now);
        Ok(advance)
    }

    pub(crate) fn respond(&mut self, step: u64, hash: Digest, now: u64) -> Result<(), GameError> {
        if self.turn != Party::Solver {
            return Err(GameError::OutOfTurn(self.turn));
        }
        let expected = self.open_query();
        if expected != Some(step) {
            return Err(GameError::WrongStep {
                expected,
                got: step,
            });
        }

        self.pending = Some(PendingQuery {
            step,
            response: Some(hash),
        });
        self.pass_turn(Party::Verifier, now);
        Ok(())
    }

    /// Checks the final step against the bound interval. `low_hash` and `computed_high_hash`
    /// are recomputed from the witness; `claimed_high_hash` is what the solver asserts.
    pub(crate) fn accepts_step(
        &self,
        low_hash: Digest,
        claimed_high_hash: Digest,
        computed_high_hash: Digest,
    ) -> bool {
        low_hash == self.low_state_hash
            && claimed_high_hash == self.high_state_hash
            && computed_high_hash == claimed_high_hash
            && (self.high != self.total_steps || claimed_high_hash == self.claimed_final_state_hash)
    }

    fn pass_turn(&mut self, to: Party, now: u64) {
        self.turn = to;
        self.deadline = now.saturating_add(self.timeout_window);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn digest(n: u8) -> Digest {
        Digest::repeat_byte(n)
    }

    fn fresh(total_steps: u64) -> Bisection {
        Bisection::new(total_steps, digest(0), digest(0xff), 10, 100)
    }

    #[test]
    fn single_step_trace_starts_narrowed() {
        let b = fresh(1);
        assert!(b.is_single_step());
        assert_eq!(b.turn, Party::Solver);
        assert_eq!(b.deadline, 110);
    }

    #[test]
    fn verdicts_move_the_bounds() {
        let mut b = fresh(8);
        assert_eq!(b.query(4, 100), Ok(Advance::Queried(4)));
        b.respond(4, digest(4), 101).unwrap();

        // Querying above 4 accepts the answer.
        assert_eq!(b.query(6, 102), Ok(Advance::Queried(6)));
        assert_eq!((b.low, b.low_state_hash), (4, digest(4)));
        assert_eq!((b.high, b.high_state_hash), (8, digest(0xff)));
        b.respond(6, digest(6), 103).unwrap();

        // Querying below 6 rejects it.
        assert_eq!(b.query(5, 104), Ok(Advance::Queried(5)));
        assert_eq!((b.high, b.high_state_hash), (6, digest(6)));
        b.respond(5, digest(5), 105).unwrap();

        // Only the verdict matters once a single step remains.
        assert_eq!(b.query(6, 106), Ok(Advance::Narrowed));
        assert_eq!((b.low, b.high), (5, 6));
        assert_eq!(b.pending, None);
        assert_eq!(b.turn, Party::Solver);
        assert_eq!(b.deadline, 116);
        assert_eq!(b.rounds, 4);
    }

    #[test]
    fn rejected_queries_leave_no_trace() {
        let mut b = fresh(8);
        assert_eq!(
            b.query(0, 100),
            Err(GameError::StepOutOfRange {
                step: 0,
                low: 0,
                high: 8
            })
        );
        assert_eq!(b, fresh(8));

        b.query(4, 100).unwrap();
        b.respond(4, digest(4), 100).unwrap();
        let before = b.clone();
        // Accepting 4 makes 8 the upper bound, which is not strictly inside (4, 8).
        assert_eq!(
            b.query(8, 101),
            Err(GameError::StepOutOfRange {
                step: 8,
                low: 4,
                high: 8
            })
        );
        // The answered midpoint itself carries no verdict.
        assert!(b.query(4, 101).is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn turns_alternate() {
        let mut b = fresh(8);
        assert_eq!(
            b.respond(4, digest(4), 100),
            Err(GameError::OutOfTurn(Party::Verifier))
        );
        b.query(4, 100).unwrap();
        assert_eq!(b.query(2, 100), Err(GameError::OutOfTurn(Party::Solver)));
        assert_eq!(
            b.respond(3, digest(3), 100),
            Err(GameError::WrongStep {
                expected: Some(4),
                got: 3
            })
        );
        b.respond(4, digest(4), 100).unwrap();
        assert_eq!(
            b.respond(4, digest(4), 100),
            Err(GameError::OutOfTurn(Party::Verifier))
        );
    }

    /// Plays a full bisection where the verifier always queries the midpoint and `agree`
    /// decides its verdict on each answered step.
    fn play(total: u64, agree: impl Fn(u64) -> bool) -> Bisection {
        let mut b = fresh(total);
        if !b.is_single_step() {
            b.query(total / 2, 0).unwrap();
        }
        while let Some(step) = b.open_query() {
            let width = b.high - b.low;
            b.respond(step, digest(1), 0).unwrap();
            let accepted = agree(step);
            let (low, high) = if accepted { (step, b.high) } else { (b.low, step) };
            let next = match (high - low, accepted) {
                (1, true) => b.high,
                (1, false) => b.low,
                _ => low + (high - low) / 2,
            };
            b.query(next, 0).unwrap();
            assert!(b.high - b.low < width);
        }
        b
    }

    #[test]
    fn halves_to_a_single_step_in_logarithmic_rounds() {
        for total in [2u64, 3, 7, 16, 100, 1 << 20, u64::MAX / 3] {
            let ceil_log2 = 64 - (total - 1).leading_zeros();
            for b in [
                play(total, |_| true),
                play(total, |_| false),
                play(total, |step| step % 2 == 0),
            ] {
                assert!(b.is_single_step());
                assert_eq!(b.turn, Party::Solver);
                assert!(b.rounds <= ceil_log2 + 1, "total = {total}, rounds = {}", b.rounds);
            }
        }
    }
}
