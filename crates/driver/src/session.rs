//! The session module plays a single dispute from configuration to resolution.

use crate::{Driver, DisputeConfig, DriverConfig, GlobalState, SolverDriver, VerifierDriver};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Duration};
use vgame_game::{BisectionGame, GameId, Party, Status, SystemClock};
use vgame_merkle::OrderedMerkleTree;
use vgame_solvers::bisection::{SolverAgent, Trace, VerifierAgent};
use vgame_vm::{Digest, VmRegistry};

/// How a [DisputeSession] ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// The verifier agreed with the solver's claim, so no game was played.
    Agreed { claim: Digest },
    /// A game was played to resolution.
    Resolved {
        game_id: GameId,
        status: Status,
        export: Option<PathBuf>,
    },
}

/// The [DisputeSession] sets up a game between a solver and a verifier and runs both drivers
/// until it resolves.
pub struct DisputeSession {
    dispute: DisputeConfig,
    claim: Digest,
    /// Absent when the verifier has nothing to dispute.
    config: Option<Arc<DriverConfig>>,
}

impl DisputeSession {
    /// Replays the dispute for both parties and, if the verifier disagrees with the solver's
    /// claim, opens the game.
    pub fn try_new(dispute: DisputeConfig) -> Result<Self> {
        let registry = VmRegistry::builtin();
        let vm = registry.get(&dispute.vm)?;
        let actions = dispute.encode_actions()?;
        if actions.is_empty() {
            bail!("a dispute needs at least one action");
        }

        let solver = SolverAgent::new(Trace::build(
            Arc::clone(&vm),
            DisputeConfig::tampered(&actions, dispute.tamper_solver)?,
        )?);
        let verifier = VerifierAgent::new(Trace::build(
            vm,
            DisputeConfig::tampered(&actions, dispute.tamper_verifier)?,
        )?);
        let claim = solver.claim();
        tracing::info!(target: "dispute-session", "Solver claims {:?} after {} steps of {}", claim, actions.len(), dispute.vm);

        if !verifier.should_challenge(claim) {
            tracing::info!(target: "dispute-session", "Verifier agrees with the claim, nothing to dispute.");
            return Ok(Self {
                dispute,
                claim,
                config: None,
            });
        }

        let root = OrderedMerkleTree::from_data(&actions).root();
        let mut game = BisectionGame::new(registry, SystemClock);
        let game_id = game.commit_challenge(dispute.verifier, dispute.solver, dispute.verifier, claim)?;
        game.init_game(
            game_id,
            dispute.vm.clone(),
            root,
            dispute.timeout_window,
            claim,
            actions.len() as u64,
        )?;
        for event in game.drain_events() {
            tracing::info!(target: "dispute-session", "{:?}", event);
        }

        let (solver, verifier) = match dispute.silent {
            Some(Party::Solver) => (None, Some(verifier)),
            Some(Party::Verifier) => (Some(solver), None),
            None => (Some(solver), Some(verifier)),
        };
        let config = DriverConfig::new(
            game,
            game_id,
            solver,
            verifier,
            Duration::from_millis(dispute.poll_interval_ms),
        );
        Ok(Self {
            dispute,
            claim,
            config: Some(Arc::new(config)),
        })
    }

    /// Returns the id of the disputed game, if one was opened.
    pub fn game_id(&self) -> Option<GameId> {
        self.config.as_ref().map(|config| config.game_id)
    }

    /// Runs both drivers until the game resolves, then exports the arena if configured to.
    pub async fn run(self) -> Result<Outcome> {
        let Some(config) = self.config else {
            return Ok(Outcome::Agreed { claim: self.claim });
        };

        tracing::info!(target: "dispute-session", "Starting drivers for game {:?}", config.game_id);
        let solver = SolverDriver::new(Arc::clone(&config));
        let verifier = VerifierDriver::new(Arc::clone(&config));
        tokio::try_join!(solver.start_loop(), verifier.start_loop())?;

        let game = config.game.lock().await;
        let status = game.status(config.game_id)?;
        let export = match &self.dispute.export_dir {
            Some(dir) => Some(GlobalState::new(self.dispute.network.clone(), game.snapshot()).export(dir)?),
            None => None,
        };
        tracing::info!(target: "dispute-session", "Game {:?} finished: {:?}", config.game_id, status);

        Ok(Outcome::Resolved {
            game_id: config.game_id,
            status,
            export,
        })
    }
}
