use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, ValueEnum};
use ethers::types::Address;
use std::path::PathBuf;
use tracing::Level;
use vgame_driver::{DisputeConfig, DisputeSession};
use vgame_game::Party;

/// Arguments for the `verification-game` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count, env = "VERBOSITY")]
    v: u8,

    /// A JSON dispute config. Flags given on the command line override its fields.
    #[arg(long, short, help = "A JSON dispute config file.", env = "VGAME_CONFIG")]
    config: Option<PathBuf>,

    /// The VM both parties run.
    #[arg(long, help = "The VM both parties run (rps, adder).", env = "VGAME_VM")]
    vm: Option<String>,

    /// The committed actions.
    #[arg(
        long,
        help = "The committed actions, comma separated.",
        env = "VGAME_ACTIONS",
        value_delimiter = ','
    )]
    actions: Option<Vec<String>>,

    /// The solver's address.
    #[arg(long, help = "The solver's address.", env = "VGAME_SOLVER")]
    solver: Option<Address>,

    /// The verifier's address.
    #[arg(long, help = "The verifier's address.", env = "VGAME_VERIFIER")]
    verifier: Option<Address>,

    /// Corrupt the action producing this step in the solver's copy.
    #[arg(
        long,
        help = "Corrupt the action producing this step in the solver's copy.",
        env = "VGAME_TAMPER_SOLVER"
    )]
    tamper_solver: Option<u64>,

    /// Corrupt the action producing this step in the verifier's copy.
    #[arg(
        long,
        help = "Corrupt the action producing this step in the verifier's copy.",
        env = "VGAME_TAMPER_VERIFIER"
    )]
    tamper_verifier: Option<u64>,

    /// Seconds each party has to make its move.
    #[arg(
        long,
        short,
        help = "Seconds each party has to make its move.",
        env = "VGAME_WINDOW"
    )]
    window: Option<u64>,

    /// A party that never moves.
    #[arg(long, short, help = "A party that never moves.", env = "VGAME_SILENT")]
    silent: Option<SilentParty>,

    /// Where to export the game records once the dispute resolves.
    #[arg(
        long,
        short,
        help = "Directory to export the game records to.",
        env = "VGAME_EXPORT"
    )]
    export: Option<PathBuf>,

    /// The network name the export is filed under.
    #[arg(
        long,
        short,
        help = "The network name the export is filed under.",
        env = "VGAME_NETWORK"
    )]
    network: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SilentParty {
    Solver,
    Verifier,
}

impl From<SilentParty> for Party {
    fn from(party: SilentParty) -> Self {
        match party {
            SilentParty::Solver => Party::Solver,
            SilentParty::Verifier => Party::Verifier,
        }
    }
}

impl Args {
    /// Builds the [DisputeConfig], starting from the config file if one was given.
    fn into_dispute_config(self) -> Result<DisputeConfig> {
        let mut config = match &self.config {
            Some(path) => DisputeConfig::from_file(path)?,
            None => DisputeConfig::default(),
        };

        if let Some(vm) = self.vm {
            config.vm = vm.into();
        }
        if let Some(actions) = self.actions {
            config.actions = actions;
        }
        if let Some(solver) = self.solver {
            config.solver = solver;
        }
        if let Some(verifier) = self.verifier {
            config.verifier = verifier;
        }
        config.tamper_solver = self.tamper_solver.or(config.tamper_solver);
        config.tamper_verifier = self.tamper_verifier.or(config.tamper_verifier);
        if let Some(window) = self.window {
            config.timeout_window = window;
        }
        config.silent = self.silent.map(Party::from).or(config.silent);
        config.export_dir = self.export.or(config.export_dir);
        if let Some(network) = self.network {
            config.network = network;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the command arguments
    let args = Args::parse();

    // Initialize the tracing subscriber
    init_tracing_subscriber(args.v)?;

    // Create the dispute config.
    let config = args.into_dispute_config()?;
    tracing::info!(target: "vgame-cli", "Dispute config created successfully: {} steps of {}", config.actions.len(), config.vm);

    // Replay both sides and open the game if they disagree.
    tracing::debug!(target: "vgame-cli", "Replaying the dispute for both parties...");
    let session = DisputeSession::try_new(config)?;
    if let Some(game_id) = session.game_id() {
        tracing::info!(target: "vgame-cli", "Game {:?} opened, starting drivers", game_id);
    }

    // Run the drivers until the game resolves.
    let outcome = session.run().await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
