//! End to end disputes run through the async drivers.

use vgame_driver::{DisputeConfig, DisputeSession, GlobalState, Outcome};
use vgame_game::{Party, Status};
use vgame_vm::{VmId, VmRegistry};

fn config() -> DisputeConfig {
    DisputeConfig {
        poll_interval_ms: 20,
        ..Default::default()
    }
}

async fn play(config: DisputeConfig) -> Outcome {
    DisputeSession::try_new(config).unwrap().run().await.unwrap()
}

fn status(outcome: &Outcome) -> Status {
    match outcome {
        Outcome::Resolved { status, .. } => *status,
        Outcome::Agreed { .. } => panic!("no game was played"),
    }
}

#[tokio::test]
async fn agreement_opens_no_game() {
    let session = DisputeSession::try_new(config()).unwrap();
    assert_eq!(session.game_id(), None);
    assert!(matches!(session.run().await.unwrap(), Outcome::Agreed { .. }));
}

#[tokio::test]
async fn dishonest_solver_loses() {
    let outcome = play(DisputeConfig {
        tamper_solver: Some(4),
        ..config()
    })
    .await;
    assert_eq!(status(&outcome), Status::ResolvedVerifierWins);
}

#[tokio::test]
async fn honest_solver_wins_and_state_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = play(DisputeConfig {
        tamper_verifier: Some(2),
        export_dir: Some(dir.path().to_path_buf()),
        network: String::from("devnet"),
        ..config()
    })
    .await;

    let Outcome::Resolved {
        game_id,
        status,
        export,
    } = outcome
    else {
        panic!("no game was played");
    };
    assert_eq!(status, Status::ResolvedSolverWins);
    assert_eq!(export, Some(dir.path().join("devnet_games.json")));

    let state = GlobalState::load(dir.path(), "devnet").unwrap();
    assert_eq!(state.network, "devnet");
    assert_eq!(state.games.len(), 1);
    assert_eq!(state.games[0].id, game_id);
    assert_eq!(state.games[0].status, Status::ResolvedSolverWins);
}

#[tokio::test]
async fn adder_disputes_run_the_same_way() {
    let outcome = play(DisputeConfig {
        vm: VmId::from(VmRegistry::ADDER),
        actions: (1..=9).map(|n: u8| n.to_string()).collect(),
        tamper_solver: Some(9),
        ..config()
    })
    .await;
    assert_eq!(status(&outcome), Status::ResolvedVerifierWins);
}

#[tokio::test]
async fn silent_solver_forfeits() {
    let outcome = play(DisputeConfig {
        tamper_solver: Some(1),
        silent: Some(Party::Solver),
        timeout_window: 1,
        ..config()
    })
    .await;
    assert_eq!(status(&outcome), Status::ResolvedVerifierWins);
}

#[test]
fn unknown_vms_are_rejected_up_front() {
    let err = DisputeSession::try_new(DisputeConfig {
        vm: VmId::from("wasm"),
        ..config()
    });
    assert!(err.is_err());
}
