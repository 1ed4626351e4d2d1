//! The simple module holds the [SimpleQueryGame], where the disputed program is stored with the
//! game and no Merkle commitment is needed.

use crate::{Arena, Clock, Game, GameError, GameEvent, GameId, Status};
use ethers::{
    types::{Address, Bytes, H256},
    utils::keccak256,
};
use vgame_vm::{Digest, VmId, VmRegistry};

/// The [SimpleQueryGame] keeps the whole program on record. Both parties agree on it by
/// construction, so the final step reads its action straight from the stored program.
#[derive(Debug)]
pub struct SimpleQueryGame<C> {
    arena: Arena<Vec<Bytes>, C>,
    timeout_window: u64,
}

impl<C: Clock> SimpleQueryGame<C> {
    /// Creates an empty arena where every game gives each party `timeout_window` seconds per
    /// move.
    pub fn new(registry: VmRegistry, clock: C, timeout_window: u64) -> Self {
        Self {
            arena: Arena::new(registry, clock),
            timeout_window,
        }
    }

    /// Returns the underlying arena.
    pub fn arena(&self) -> &Arena<Vec<Bytes>, C> {
        &self.arena
    }

    /// Creates a game over the first `steps` instructions of `program` and opens the bisection.
    ///
    /// ### Takes
    /// - `solver`, `verifier`: The two distinct parties.
    /// - `vm`: The reference of a registered VM.
    /// - `program`: One encoded action per step.
    /// - `output_hash`: The solver's claimed digest after `steps` steps.
    /// - `steps`: The number of disputed steps, at most `program.len()`.
    ///
    /// ### Returns
    /// - `Ok(GameId)`: The new game, already in play.
    /// - `Err(GameError)`: The parameters describe no valid game.
    pub fn new_game(
        &mut self,
        solver: Address,
        verifier: Address,
        vm: impl Into<VmId>,
        program: Vec<Bytes>,
        output_hash: Digest,
        steps: u64,
    ) -> Result<GameId, GameError> {
        let vm = vm.into();
        if steps == 0 {
            return Err(GameError::NoSteps);
        }
        if steps > program.len() as u64 {
            return Err(GameError::ProgramTooShort {
                steps,
                len: program.len(),
            });
        }
        if solver == verifier {
            return Err(GameError::SameParty(solver));
        }
        // Every disputed instruction must decode.
        self.arena.run_steps(&vm, &program, steps as usize)?;

        let dispute = H256::from(keccak256(
            program.iter().flat_map(|op| op.iter().copied()).collect::<Vec<u8>>(),
        ));
        let id = self.arena.create(solver, verifier, dispute)?;
        let status = self
            .arena
            .start(id, vm, program, self.timeout_window, output_hash, steps)?;
        tracing::info!(target: "simple-game", "Game {:?} started over {} program steps: {:?}", id, steps, status);
        Ok(id)
    }

    pub fn query(&mut self, id: GameId, caller: Address, step: u64) -> Result<Status, GameError> {
        self.arena.query(id, caller, step)
    }

    pub fn respond(
        &mut self,
        id: GameId,
        caller: Address,
        step: u64,
        hash: Digest,
    ) -> Result<Status, GameError> {
        self.arena.respond(id, caller, step, hash)
    }

    pub fn claim_timeout(&mut self, id: GameId, caller: Address) -> Result<Status, GameError> {
        self.arena.claim_timeout(id, caller)
    }

    /// The solver settles the single disputed step with the full state at `low`. The action is
    /// the stored instruction for step `high`.
    pub fn perform_step_verification(
        &mut self,
        id: GameId,
        caller: Address,
        low_state: &[u8],
        high_state_hash: Digest,
    ) -> Result<Status, GameError> {
        self.arena.adjudicate(id, caller, |session, vm| {
            let bisection = &session.bisection;
            let action = session
                .inputs
                .get(bisection.high as usize - 1)
                .ok_or(GameError::ProgramTooShort {
                    steps: bisection.high,
                    len: session.inputs.len(),
                })?;
            let low_hash = vm.merklize_state(low_state)?;
            let high_state = vm.run_step(low_state, action)?;
            let computed_high_hash = vm.merklize_state(&high_state)?;
            tracing::debug!(target: "simple-game", "Replayed step {}: {:?}", bisection.high, computed_high_hash);
            Ok(bisection.accepts_step(low_hash, high_state_hash, computed_high_hash))
        })
    }

    pub fn status(&self, id: GameId) -> Result<Status, GameError> {
        self.arena.status(id)
    }

    pub fn game(&self, id: GameId) -> Option<&Game<Vec<Bytes>>> {
        self.arena.game(id)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.arena.drain_events()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ErrorKind, ManualClock, Party};
    use vgame_vm::{AdderVm, DynStepVm, VmError};

    const PROGRAM: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

    fn program() -> Vec<Bytes> {
        PROGRAM.iter().map(|b| Bytes::from(vec![*b])).collect()
    }

    fn state(step: u64) -> Bytes {
        DynStepVm::run_steps(&AdderVm, &program()[..], step as usize)
            .unwrap()
            .0
    }

    fn digest(step: u64) -> Digest {
        DynStepVm::run_steps(&AdderVm, &program()[..], step as usize)
            .unwrap()
            .1
    }

    fn arena() -> SimpleQueryGame<ManualClock> {
        SimpleQueryGame::new(VmRegistry::builtin(), ManualClock::new(0), 30)
    }

    fn solver() -> Address {
        Address::repeat_byte(1)
    }

    fn verifier() -> Address {
        Address::repeat_byte(2)
    }

    #[test]
    fn rejects_programs_shorter_than_the_claim() {
        let mut game = arena();
        assert_eq!(
            game.new_game(solver(), verifier(), VmRegistry::ADDER, program(), digest(9), 10),
            Err(GameError::ProgramTooShort { steps: 10, len: 9 })
        );
        assert_eq!(
            game.new_game(solver(), solver(), VmRegistry::ADDER, program(), digest(9), 9),
            Err(GameError::SameParty(solver()))
        );
        assert!(game
            .new_game(solver(), verifier(), "unknown", program(), digest(9), 9)
            .is_err());
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn undecodable_instructions_are_rejected_up_front() {
        let mut game = arena();
        let mut program = program();
        program[0] = Bytes::from(vec![0x01, 0x02]);

        let err = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program.clone(), digest(1), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(matches!(
            err,
            GameError::Vm(VmError::InvalidLength {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert!(game.drain_events().is_empty());

        // Instructions past the disputed prefix are never replayed.
        program[0] = Bytes::from(vec![1]);
        program[8] = Bytes::from(vec![0x01, 0x02]);
        let id = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program, digest(8), 8)
            .unwrap();
        assert_eq!(game.status(id), Ok(Status::InProgress));
    }

    #[test]
    fn honest_sum_is_verified() {
        let mut game = arena();
        let id = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program(), digest(9), 9)
            .unwrap();
        assert_eq!(game.status(id), Ok(Status::InProgress));

        // The verifier accepts every answer and walks up to the last step.
        for step in [4, 6, 8] {
            game.query(id, verifier(), step).unwrap();
            game.respond(id, solver(), step, digest(step)).unwrap();
        }
        assert_eq!(game.query(id, verifier(), 9), Ok(Status::StepVerificationPending));
        let bisection = game.game(id).and_then(Game::bisection).cloned().unwrap();
        assert_eq!((bisection.low, bisection.high), (8, 9));

        assert_eq!(
            game.perform_step_verification(id, solver(), &state(8), digest(9)),
            Ok(Status::ResolvedSolverWins)
        );
    }

    #[test]
    fn inflated_sum_is_caught() {
        let mut game = arena();
        let wrong = AdderVm.merklize_state(&[0xffu8; 32]).unwrap();
        let id = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program(), wrong, 9)
            .unwrap();

        // Every intermediate answer is honest, so the lie surfaces on the final step.
        game.query(id, verifier(), 4).unwrap();
        game.respond(id, solver(), 4, digest(4)).unwrap();
        game.query(id, verifier(), 6).unwrap();
        game.respond(id, solver(), 6, digest(6)).unwrap();
        game.query(id, verifier(), 8).unwrap();
        game.respond(id, solver(), 8, digest(8)).unwrap();
        game.query(id, verifier(), 9).unwrap();

        assert_eq!(
            game.perform_step_verification(id, solver(), &state(8), wrong),
            Ok(Status::ResolvedVerifierWins)
        );
        assert_eq!(game.status(id).map(|s| s.winner()), Ok(Some(Party::Verifier)));
    }

    #[test]
    fn low_state_must_match_the_agreed_digest() {
        let mut game = arena();
        let id = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program(), digest(3), 3)
            .unwrap();
        game.query(id, verifier(), 1).unwrap();
        game.respond(id, solver(), 1, digest(1)).unwrap();
        game.query(id, verifier(), 2).unwrap();
        game.respond(id, solver(), 2, digest(2)).unwrap();
        assert_eq!(game.query(id, verifier(), 1), Ok(Status::StepVerificationPending));

        // The interval is (1, 2]; claiming to start from step 0 does not match.
        assert_eq!(
            game.perform_step_verification(id, solver(), &state(0), digest(2)),
            Ok(Status::ResolvedVerifierWins)
        );
    }

    #[test]
    fn verifier_silence_forfeits() {
        let mut game = arena();
        let id = game
            .new_game(solver(), verifier(), VmRegistry::ADDER, program(), digest(9), 9)
            .unwrap();
        game.arena().clock().advance(31);
        assert_eq!(game.claim_timeout(id, solver()), Ok(Status::ResolvedSolverWins));
        assert!(game.query(id, verifier(), 4).is_err());
    }
}
