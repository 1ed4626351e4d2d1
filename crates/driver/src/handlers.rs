use crate::DriverConfig;
use anyhow::{anyhow, Result};
use vgame_game::{Clock, Party, Status};

/// Logs under the target of the driver that runs `party`.
macro_rules! party_log {
    ($level:ident, $party:expr, $($arg:tt)+) => {
        match $party {
            Party::Solver => tracing::$level!(target: "solver-driver", $($arg)+),
            Party::Verifier => tracing::$level!(target: "verifier-driver", $($arg)+),
        }
    };
}

/// Lets `party` make its move in the disputed game, then broadcasts every event the arena
/// emitted. A move the arena rejects is a soft failure: it is logged and the driver carries on.
///
/// ### Returns
/// - `Ok(Some(Status))`: The game is resolved.
/// - `Ok(None)`: The game is still live.
/// - `Err(anyhow::Error)`: The game is missing, or the participant could not decide on a move.
pub(crate) async fn take_turn(config: &DriverConfig, party: Party) -> Result<Option<Status>> {
    let mut game = config.game.lock().await;
    let record = game.game(config.game_id).cloned().ok_or(anyhow!(
        "Critical failure: game {:?} is not in the arena",
        config.game_id
    ))?;
    if record.status.is_resolved() {
        return Ok(Some(record.status));
    }

    let Some(participant) = config.participant(party) else {
        party_log!(trace, party, "The {:?} stays silent in game {:?}", party, config.game_id);
        return Ok(None);
    };

    let now = game.arena().clock().now();
    let response = participant.respond(&record, now)?;
    let status = match response.dispatch(&mut *game, config.game_id, record.address_of(party)) {
        Ok(status) => status,
        Err(e) => {
            // Soft failure, log the error and continue.
            party_log!(error, party, "The {:?}'s move {:?} was rejected: {}", party, response, e);
            None
        }
    };

    for event in game.drain_events() {
        party_log!(info, party, "{:?}", event);
        if config.event_sender.send(event).is_err() {
            party_log!(warn, party, "No driver is listening for game events");
        }
    }

    Ok(status.filter(Status::is_resolved))
}
