//! The game module holds the [BisectionGame], the Merkle committed variant of the verification
//! game.

use crate::{Arena, Clock, Game, GameError, GameEvent, GameId, Status, StepWitness, SystemClock};
use ethers::types::{Address, Bytes, H256};
use vgame_merkle::{hash_leaf, verify_ordered, OrderedProof};
use vgame_vm::{Digest, VmId, VmRegistry};

/// The [BisectionGame] adjudicates disputes over a sequence of inputs committed to by an ordered
/// Merkle root. The inputs themselves never reach the arena: the solver proves the single
/// disputed action against the root when the bisection ends.
#[derive(Debug)]
pub struct BisectionGame<C = SystemClock> {
    arena: Arena<H256, C>,
}

impl<C: Clock> BisectionGame<C> {
    /// Creates an empty game arena.
    pub fn new(registry: VmRegistry, clock: C) -> Self {
        Self {
            arena: Arena::new(registry, clock),
        }
    }

    /// Returns the underlying arena.
    pub fn arena(&self) -> &Arena<H256, C> {
        &self.arena
    }

    /// The verifier opens a challenge against the solver's result.
    ///
    /// ### Takes
    /// - `caller`: The address making the call. Must be `verifier`.
    /// - `solver`: The party asserting the result.
    /// - `verifier`: The party disputing it.
    /// - `dispute`: Opaque metadata describing what is disputed.
    ///
    /// ### Returns
    /// - `Ok(GameId)`: The id of the new game, in [Status::Created].
    /// - `Err(GameError)`: The caller is not the verifier, or both parties are the same.
    pub fn commit_challenge(
        &mut self,
        caller: Address,
        solver: Address,
        verifier: Address,
        dispute: H256,
    ) -> Result<GameId, GameError> {
        if caller != verifier {
            return Err(GameError::WrongParty {
                expected: crate::Party::Verifier,
            });
        }
        self.arena.create(solver, verifier, dispute)
    }

    /// Binds the VM, the input commitment and the claimed result to a created game.
    ///
    /// ### Takes
    /// - `id`: A game in [Status::Created].
    /// - `vm`: The reference of a registered VM.
    /// - `commitment_root`: The ordered Merkle root over the hashed inputs.
    /// - `timeout_window`: Seconds each party has to make its move.
    /// - `claimed_final_state_hash`: The solver's claimed digest after `total_steps` steps.
    /// - `total_steps`: The length of the disputed trace.
    ///
    /// ### Returns
    /// - `Ok(Status)`: [Status::InProgress], or [Status::StepVerificationPending] for a single
    ///   step trace.
    /// - `Err(GameError)`: The game is not in [Status::Created], the VM is unknown or the trace
    ///   is empty.
    pub fn init_game(
        &mut self,
        id: GameId,
        vm: impl Into<VmId>,
        commitment_root: H256,
        timeout_window: u64,
        claimed_final_state_hash: Digest,
        total_steps: u64,
    ) -> Result<Status, GameError> {
        self.arena.start(
            id,
            vm.into(),
            commitment_root,
            timeout_window,
            claimed_final_state_hash,
            total_steps,
        )
    }

    /// The verifier asks for the solver's digest at `step`. See [crate::Bisection] for how the
    /// step carries the verdict on the previous answer.
    pub fn query(&mut self, id: GameId, caller: Address, step: u64) -> Result<Status, GameError> {
        self.arena.query(id, caller, step)
    }

    /// The solver answers the outstanding query.
    pub fn respond(
        &mut self,
        id: GameId,
        caller: Address,
        step: u64,
        hash: Digest,
    ) -> Result<Status, GameError> {
        self.arena.respond(id, caller, step, hash)
    }

    /// Resolves the game against a turn holder that missed its deadline.
    pub fn claim_timeout(&mut self, id: GameId, caller: Address) -> Result<Status, GameError> {
        self.arena.claim_timeout(id, caller)
    }

    /// The solver settles the single disputed step.
    ///
    /// The solver wins iff the witness' low state commits to the agreed low digest, its high
    /// digest is the one under dispute (and the claimed final digest on the last step), the
    /// action is proven at leaf `high - 1` of the committed inputs, and replaying the action
    /// on the low state reproduces the high digest.
    ///
    /// ### Returns
    /// - `Ok(Status)`: The resolved status.
    /// - `Err(GameError)`: The call was out of place, or the witness could not be decoded. The
    ///   game is left untouched.
    pub fn perform_step_verification(
        &mut self,
        id: GameId,
        caller: Address,
        witness: &StepWitness,
    ) -> Result<Status, GameError> {
        self.arena.adjudicate(id, caller, |session, vm| {
            let proof = OrderedProof::from_bytes(&witness.proof)?;
            let low_hash = vm.merklize_state(&witness.low_state)?;
            let high_state = vm.run_step(&witness.low_state, &witness.action)?;
            let computed_high_hash = vm.merklize_state(&high_state)?;

            let bisection = &session.bisection;
            let included = verify_ordered(
                &proof,
                session.inputs,
                hash_leaf(&witness.action),
                bisection.high - 1,
            );
            if !included {
                tracing::debug!(target: "vgame-arena", "Action for step {} is not included under {:?}", bisection.high, session.inputs);
            }
            Ok(included
                && bisection.accepts_step(low_hash, witness.high_state_hash, computed_high_hash))
        })
    }

    /// Returns the status of a game.
    pub fn status(&self, id: GameId) -> Result<Status, GameError> {
        self.arena.status(id)
    }

    /// Returns a game record.
    pub fn game(&self, id: GameId) -> Option<&Game> {
        self.arena.game(id)
    }

    /// Returns every game record, ordered by id.
    pub fn snapshot(&self) -> Vec<Game> {
        self.arena.snapshot()
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.arena.drain_events()
    }

    /// Commits to an encoded state with the VM registered under `vm`.
    pub fn merklize_state(&self, vm: &VmId, state: &[u8]) -> Result<Digest, GameError> {
        self.arena.merklize_state(vm, state)
    }

    /// Runs one step with the VM registered under `vm`.
    pub fn run_step(&self, vm: &VmId, state: &[u8], action: &[u8]) -> Result<Bytes, GameError> {
        self.arena.run_step(vm, state, action)
    }

    /// Runs the first `count` actions with the VM registered under `vm`.
    pub fn run_steps(
        &self,
        vm: &VmId,
        actions: &[Bytes],
        count: usize,
    ) -> Result<(Bytes, Digest), GameError> {
        self.arena.run_steps(vm, actions, count)
    }

    /// Checks an encoded [OrderedProof] for `leaf` at `index` against `root`.
    pub fn check_proof_ordered(
        proof: &[u8],
        root: H256,
        leaf: H256,
        index: u64,
    ) -> Result<bool, GameError> {
        let proof = OrderedProof::from_bytes(proof)?;
        Ok(verify_ordered(&proof, root, leaf, index))
    }
}
