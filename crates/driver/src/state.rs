//! The state module holds the [GlobalState] struct, which is exported once a dispute resolves.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};
use vgame_game::Game;

/// The [GlobalState] struct holds every game record of an arena, filed under a network name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GlobalState {
    /// The network the games were played on.
    pub network: String,
    /// The game records, ordered by id.
    pub games: Vec<Game>,
}

impl GlobalState {
    pub fn new(network: String, games: Vec<Game>) -> Self {
        Self { network, games }
    }

    /// Returns the path the state of `network` is exported to within `dir`.
    pub fn path(dir: &Path, network: &str) -> PathBuf {
        dir.join(format!("{}_games.json", network))
    }

    /// Writes the state to `<dir>/<network>_games.json`, creating `dir` if needed.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        let path = Self::path(dir, &self.network);
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        tracing::info!(target: "dispute-session", "Exported {} games to {}", self.games.len(), path.display());
        Ok(path)
    }

    /// Reads back the state of `network` exported within `dir`.
    pub fn load(dir: &Path, network: &str) -> Result<Self> {
        let path = Self::path(dir, network);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
