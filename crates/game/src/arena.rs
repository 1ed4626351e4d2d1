//! The arena module holds the game records and the transitions every game variant shares.
//!
//! Games are addressed by id and only ever mutated through the transitions below. Each
//! transition validates before it mutates: a rejected call returns an error and leaves the
//! arena exactly as it found it.

use crate::{
    Advance, Bisection, Clock, Game, GameError, GameEvent, GameId, Party, Resolution, Session,
    Status,
};
use ethers::{
    abi::{self, Token},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use std::collections::HashMap;
use vgame_vm::{Digest, DynStepVm, VmId, VmRegistry};

/// The [Arena] owns every game of one variant. `I` is what the variant commits the disputed
/// inputs to.
#[derive(Debug)]
pub struct Arena<I, C> {
    registry: VmRegistry,
    clock: C,
    games: HashMap<GameId, Game<I>>,
    nonce: u64,
    events: Vec<GameEvent>,
}

/// The outcome of looking up a game on behalf of a participant.
enum Gate<'a, I> {
    /// The game is live and `Party` is the caller's role in it.
    Open(&'a mut Game<I>, Party),
    /// The turn holder's deadline had lapsed; the game was resolved against it instead.
    Forfeited(Status),
}

/// Looks up a live game for `caller`. Before anything else, a lapsed deadline resolves the game
/// against the party holding the turn.
fn enter<'a, I>(
    games: &'a mut HashMap<GameId, Game<I>>,
    events: &mut Vec<GameEvent>,
    id: GameId,
    caller: Address,
    now: u64,
) -> Result<Gate<'a, I>, GameError> {
    let game = games.get_mut(&id).ok_or(GameError::UnknownGame(id))?;
    let party = game
        .party_of(caller)
        .ok_or(GameError::NotParticipant(caller))?;
    if game.status.is_resolved() {
        return Err(GameError::AlreadyResolved(game.status));
    }

    let bisection = &game.session()?.bisection;
    if bisection.has_lapsed(now) {
        let silent = bisection.turn;
        let deadline = bisection.deadline;
        events.push(game.resolve(silent.opponent(), Resolution::Timeout));
        tracing::info!(target: "vgame-arena", "Game {:?} forfeited by the {:?}: deadline {} lapsed at {}", id, silent, deadline, now);
        return Ok(Gate::Forfeited(game.status));
    }
    Ok(Gate::Open(game, party))
}

impl<I, C: Clock> Arena<I, C> {
    /// Creates an empty arena adjudicating with the VMs in `registry`.
    pub fn new(registry: VmRegistry, clock: C) -> Self {
        Self {
            registry,
            clock,
            games: HashMap::new(),
            nonce: 0,
            events: Vec::new(),
        }
    }

    /// Returns the VMs this arena adjudicates with.
    pub fn registry(&self) -> &VmRegistry {
        &self.registry
    }

    /// Returns the clock deadlines are checked against.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the status of a game.
    pub fn status(&self, id: GameId) -> Result<Status, GameError> {
        self.game(id)
            .map(|game| game.status)
            .ok_or(GameError::UnknownGame(id))
    }

    /// Returns a game record.
    pub fn game(&self, id: GameId) -> Option<&Game<I>> {
        self.games.get(&id)
    }

    /// Returns a copy of every game record, ordered by id.
    pub fn snapshot(&self) -> Vec<Game<I>>
    where
        I: Clone,
    {
        let mut games = self.games.values().cloned().collect::<Vec<_>>();
        games.sort_by_key(|game| game.id);
        games
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Commits to `state` with the VM registered under `vm`.
    pub fn merklize_state(&self, vm: &VmId, state: &[u8]) -> Result<Digest, GameError> {
        Ok(self.registry.get(vm)?.merklize_state(state)?)
    }

    /// Runs a single step with the VM registered under `vm`.
    pub fn run_step(&self, vm: &VmId, state: &[u8], action: &[u8]) -> Result<Bytes, GameError> {
        Ok(self.registry.get(vm)?.run_step(state, action)?)
    }

    /// Runs the first `count` actions with the VM registered under `vm`.
    pub fn run_steps(
        &self,
        vm: &VmId,
        actions: &[Bytes],
        count: usize,
    ) -> Result<(Bytes, Digest), GameError> {
        Ok(self.registry.get(vm)?.run_steps(actions, count)?)
    }

    /// Creates a game in the [Status::Created] state.
    pub(crate) fn create(
        &mut self,
        solver: Address,
        verifier: Address,
        dispute: H256,
    ) -> Result<GameId, GameError> {
        if solver == verifier {
            return Err(GameError::SameParty(solver));
        }

        let id = GameId::from(keccak256(abi::encode(&[
            Token::Address(solver),
            Token::Address(verifier),
            Token::FixedBytes(dispute.as_bytes().to_vec()),
            Token::Uint(U256::from(self.nonce)),
        ])));
        self.nonce += 1;

        self.games.insert(
            id,
            Game {
                id,
                solver,
                verifier,
                dispute,
                status: Status::Created,
                session: None,
            },
        );
        self.events.push(GameEvent::ChallengeCreated {
            game_id: id,
            solver,
            verifier,
        });
        tracing::info!(target: "vgame-arena", "Challenge {:?} created: solver {:?}, verifier {:?}", id, solver, verifier);
        Ok(id)
    }

    /// Binds the VM, the input commitment and the claim to a created game and opens the
    /// bisection over `(0, total_steps]`.
    pub(crate) fn start(
        &mut self,
        id: GameId,
        vm: VmId,
        inputs: I,
        timeout_window: u64,
        claimed_final_state_hash: Digest,
        total_steps: u64,
    ) -> Result<Status, GameError> {
        let now = self.clock.now();
        let game = self.games.get_mut(&id).ok_or(GameError::UnknownGame(id))?;
        if game.status.is_resolved() {
            return Err(GameError::AlreadyResolved(game.status));
        }
        if game.status != Status::Created {
            return Err(GameError::WrongStatus {
                expected: Status::Created,
                actual: game.status,
            });
        }
        if total_steps == 0 {
            return Err(GameError::NoSteps);
        }
        let handle = self.registry.get(&vm)?;

        let bisection = Bisection::new(
            total_steps,
            handle.initial_commitment(),
            claimed_final_state_hash,
            timeout_window,
            now,
        );
        let deadline = bisection.deadline;
        let single_step = bisection.is_single_step();

        // Initialized is transient: the game opens for play within the same call.
        game.status = Status::Initialized;
        game.session = Some(Session {
            vm,
            inputs,
            bisection,
        });
        game.status = if single_step {
            Status::StepVerificationPending
        } else {
            Status::InProgress
        };

        self.events.push(GameEvent::GameInitialized {
            game_id: id,
            total_steps,
            deadline,
        });
        if single_step {
            self.events.push(GameEvent::StepVerificationPending {
                game_id: id,
                low: 0,
                high: 1,
            });
        }
        tracing::info!(target: "vgame-arena", "Game {:?} initialized over {} steps, deadline {}", id, total_steps, deadline);
        Ok(game.status)
    }

    /// The verifier asks for the state digest at `step`, delivering its verdict on the previous
    /// answer in the same call.
    pub(crate) fn query(
        &mut self,
        id: GameId,
        caller: Address,
        step: u64,
    ) -> Result<Status, GameError> {
        let now = self.clock.now();
        let game = match enter(&mut self.games, &mut self.events, id, caller, now)? {
            Gate::Open(game, Party::Verifier) => game,
            Gate::Open(_, Party::Solver) => {
                return Err(GameError::WrongParty {
                    expected: Party::Verifier,
                })
            }
            Gate::Forfeited(status) => return Ok(status),
        };
        if game.status != Status::InProgress {
            return Err(GameError::WrongStatus {
                expected: Status::InProgress,
                actual: game.status,
            });
        }

        let bisection = &mut game.session_mut()?.bisection;
        let advance = bisection.query(step, now)?;
        let (low, high) = (bisection.low, bisection.high);

        self.events.push(GameEvent::QueryIssued { game_id: id, step });
        tracing::debug!(target: "vgame-arena", "Game {:?}: verifier queried step {}, interval ({}, {}]", id, step, low, high);
        if advance == Advance::Narrowed {
            game.status = Status::StepVerificationPending;
            self.events.push(GameEvent::StepVerificationPending {
                game_id: id,
                low,
                high,
            });
            tracing::info!(target: "vgame-arena", "Game {:?} narrowed to step {}; awaiting step verification", id, high);
        }
        Ok(game.status)
    }

    /// The solver answers the outstanding query with its state digest at `step`.
    pub(crate) fn respond(
        &mut self,
        id: GameId,
        caller: Address,
        step: u64,
        hash: Digest,
    ) -> Result<Status, GameError> {
        let now = self.clock.now();
        let game = match enter(&mut self.games, &mut self.events, id, caller, now)? {
            Gate::Open(game, Party::Solver) => game,
            Gate::Open(_, Party::Verifier) => {
                return Err(GameError::WrongParty {
                    expected: Party::Solver,
                })
            }
            Gate::Forfeited(status) => return Ok(status),
        };
        if game.status != Status::InProgress {
            return Err(GameError::WrongStatus {
                expected: Status::InProgress,
                actual: game.status,
            });
        }

        game.session_mut()?.bisection.respond(step, hash, now)?;
        self.events.push(GameEvent::ResponseSubmitted {
            game_id: id,
            step,
            hash,
        });
        tracing::debug!(target: "vgame-arena", "Game {:?}: solver answered step {} with {:?}", id, step, hash);
        Ok(game.status)
    }

    /// Resolves a game against a turn holder whose deadline has lapsed.
    pub(crate) fn claim_timeout(&mut self, id: GameId, caller: Address) -> Result<Status, GameError> {
        let now = self.clock.now();
        match enter(&mut self.games, &mut self.events, id, caller, now)? {
            Gate::Forfeited(status) => Ok(status),
            Gate::Open(game, party) => {
                let bisection = &game.session()?.bisection;
                if party == bisection.turn {
                    Err(GameError::WrongParty {
                        expected: party.opponent(),
                    })
                } else {
                    Err(GameError::DeadlineNotReached {
                        deadline: bisection.deadline,
                        now,
                    })
                }
            }
        }
    }

    /// Settles a game awaiting step verification. `check` recomputes the disputed step from the
    /// solver's witness and returns whether it holds; an error from `check` means the witness
    /// could not be decoded and leaves the game untouched.
    pub(crate) fn adjudicate<F>(
        &mut self,
        id: GameId,
        caller: Address,
        check: F,
    ) -> Result<Status, GameError>
    where
        F: FnOnce(&Session<I>, &dyn DynStepVm) -> Result<bool, GameError>,
    {
        let now = self.clock.now();
        let game = match enter(&mut self.games, &mut self.events, id, caller, now)? {
            Gate::Open(game, Party::Solver) => game,
            Gate::Open(_, Party::Verifier) => {
                return Err(GameError::WrongParty {
                    expected: Party::Solver,
                })
            }
            Gate::Forfeited(status) => return Ok(status),
        };
        if game.status != Status::StepVerificationPending {
            return Err(GameError::WrongStatus {
                expected: Status::StepVerificationPending,
                actual: game.status,
            });
        }

        let session = game.session()?;
        let vm = self.registry.get(&session.vm)?;
        let (winner, reason) = if check(session, vm.as_ref())? {
            (Party::Solver, Resolution::Verified)
        } else {
            (Party::Verifier, Resolution::VerificationFailed)
        };
        let high = session.bisection.high;

        self.events.push(game.resolve(winner, reason));
        tracing::info!(target: "vgame-arena", "Game {:?} resolved for the {:?}: step {} {:?}", id, winner, high, reason);
        Ok(game.status)
    }
}
