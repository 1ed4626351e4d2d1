//! The `config` module contains the [DisputeConfig] and the [DriverConfig].

use anyhow::{anyhow, Context, Result};
use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tokio::sync::{broadcast, Mutex};
use vgame_game::{BisectionGame, GameEvent, GameId, Party};
use vgame_solvers::bisection::{Participant, SolverAgent, VerifierAgent};
use vgame_vm::{AdderVm, RpsAction, RpsVm, StepVm, VmId, VmRegistry};

/// The capacity of the event channel shared by the drivers.
const EVENT_CAPACITY: usize = 128;

/// The [DisputeConfig] describes a single dispute to be played out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisputeConfig {
    /// The reference of the VM both parties run.
    pub vm: VmId,
    /// The committed actions. Rock-paper-scissors rounds are written as two letters (`RS`),
    /// adder instructions as decimal bytes and anything else as hex.
    pub actions: Vec<String>,
    pub solver: Address,
    pub verifier: Address,
    /// The step whose action is corrupted in the solver's local copy.
    pub tamper_solver: Option<u64>,
    /// The step whose action is corrupted in the verifier's local copy.
    pub tamper_verifier: Option<u64>,
    /// Seconds each party has to make its move.
    pub timeout_window: u64,
    /// How often the drivers re-check the game when no events arrive.
    pub poll_interval_ms: u64,
    /// A party that never moves.
    pub silent: Option<Party>,
    /// Where to export the game records once the dispute resolves.
    pub export_dir: Option<PathBuf>,
    /// The network name the export is filed under.
    pub network: String,
}

impl Default for DisputeConfig {
    fn default() -> Self {
        Self {
            vm: VmId::from(VmRegistry::RPS),
            actions: ["RS", "RP", "PR", "PS", "SP", "SR", "RS"]
                .map(String::from)
                .to_vec(),
            solver: Address::repeat_byte(0x50),
            verifier: Address::repeat_byte(0x7e),
            tamper_solver: None,
            tamper_verifier: None,
            timeout_window: 60,
            poll_interval_ms: 250,
            silent: None,
            export_dir: None,
            network: String::from("local"),
        }
    }
}

impl DisputeConfig {
    /// Loads a [DisputeConfig] from a JSON file. Missing fields take their default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dispute config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse dispute config {}", path.display()))
    }

    /// Encodes the configured actions for the configured VM.
    pub fn encode_actions(&self) -> Result<Vec<Bytes>> {
        self.actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                self.encode_action(action)
                    .with_context(|| format!("invalid action #{}: {:?}", index + 1, action))
            })
            .collect()
    }

    fn encode_action(&self, action: &str) -> Result<Bytes> {
        match self.vm.as_str() {
            VmRegistry::RPS => Ok(RpsVm.encode_action(&RpsAction::from_str(action)?)),
            VmRegistry::ADDER => Ok(AdderVm.encode_action(&u8::from_str(action)?)),
            _ => Bytes::from_str(action).map_err(|e| anyhow!("{}", e)),
        }
    }

    /// Returns `actions` with the action producing `step` corrupted by flipping the lowest bit
    /// of its last byte.
    pub fn tampered(actions: &[Bytes], step: Option<u64>) -> Result<Vec<Bytes>> {
        let mut actions = actions.to_vec();
        let len = actions.len();
        if let Some(step) = step {
            let action = step
                .checked_sub(1)
                .and_then(|index| actions.get_mut(index as usize))
                .ok_or(anyhow!("cannot tamper with step {}, there are {} steps", step, len))?;
            let mut bytes = action.to_vec();
            let last = bytes
                .last_mut()
                .ok_or(anyhow!("cannot tamper with the empty action at step {}", step))?;
            *last ^= 0x01;
            *action = Bytes::from(bytes);
        }
        Ok(actions)
    }
}

/// The [DriverConfig] struct contains the shared state for the [Driver](crate::Driver)
/// implementations of one dispute.
pub struct DriverConfig {
    /// The arena holding the disputed game.
    pub game: Mutex<BisectionGame>,
    /// The id of the disputed game.
    pub game_id: GameId,
    /// The solver's agent, or `None` if the solver is silent.
    pub solver: Option<SolverAgent>,
    /// The verifier's agent, or `None` if the verifier is silent.
    pub verifier: Option<VerifierAgent>,
    /// How long a driver waits for an event before re-checking the game.
    pub poll_interval: Duration,
    /// The sending handle of the broadcast channel carrying the arena's events.
    pub event_sender: broadcast::Sender<GameEvent>,
    /// The solver driver's receiving handle of the event channel.
    pub solver_events: Mutex<broadcast::Receiver<GameEvent>>,
    /// The verifier driver's receiving handle of the event channel.
    pub verifier_events: Mutex<broadcast::Receiver<GameEvent>>,
}

impl DriverConfig {
    /// Creates a new [DriverConfig] with the given configuration.
    pub fn new(
        game: BisectionGame,
        game_id: GameId,
        solver: Option<SolverAgent>,
        verifier: Option<VerifierAgent>,
        poll_interval: Duration,
    ) -> Self {
        // Create a broadcast channel with one receiver per driver.
        let (event_sender, solver_events) = broadcast::channel(EVENT_CAPACITY);
        let verifier_events = event_sender.subscribe();

        Self {
            game: Mutex::new(game),
            game_id,
            solver,
            verifier,
            poll_interval,
            event_sender,
            solver_events: Mutex::new(solver_events),
            verifier_events: Mutex::new(verifier_events),
        }
    }

    /// Returns the agent playing `party`, if it is not silent.
    pub fn participant(&self, party: Party) -> Option<&dyn Participant> {
        match party {
            Party::Solver => self.solver.as_ref().map(|agent| agent as &dyn Participant),
            Party::Verifier => self.verifier.as_ref().map(|agent| agent as &dyn Participant),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_actions_per_vm() {
        let config = DisputeConfig::default();
        let actions = config.encode_actions().unwrap();
        assert_eq!(actions.len(), 7);
        assert_eq!(actions[0][31], 0x08);

        let adder = DisputeConfig {
            vm: VmId::from(VmRegistry::ADDER),
            actions: vec!["1".into(), "255".into()],
            ..Default::default()
        };
        assert_eq!(
            adder.encode_actions().unwrap(),
            vec![Bytes::from(vec![1]), Bytes::from(vec![255])]
        );

        let broken = DisputeConfig {
            actions: vec!["RS".into(), "RQ".into()],
            ..Default::default()
        };
        let err = broken.encode_actions().unwrap_err();
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn tampering_flips_one_action() {
        let actions = DisputeConfig::default().encode_actions().unwrap();
        let tampered = DisputeConfig::tampered(&actions, Some(2)).unwrap();
        assert_eq!(tampered[1][31], 0x05);
        assert_eq!(tampered[0], actions[0]);
        assert_eq!(DisputeConfig::tampered(&actions, None).unwrap(), actions);
        assert!(DisputeConfig::tampered(&actions, Some(0)).is_err());
        assert!(DisputeConfig::tampered(&actions, Some(8)).is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: DisputeConfig =
            serde_json::from_str(r#"{ "vm": "adder", "actions": ["3"], "silent": "Solver" }"#)
                .unwrap();
        assert_eq!(config.vm, VmId::from(VmRegistry::ADDER));
        assert_eq!(config.silent, Some(Party::Solver));
        assert_eq!(config.timeout_window, 60);
    }
}
