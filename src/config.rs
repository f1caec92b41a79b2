//! Launch configuration module.
//!
//! This module contains the command-line interface and the validated [`Config`] built from it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{error::ConfigError, logging::LOG_FILE, maze::MazeSize};

/// Maze size presets offered by the size menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Difficulty {
    /// 15x15 cells.
    Small,
    /// 21x21 cells.
    Medium,
    /// 31x31 cells.
    Large,
}

impl Difficulty {
    /// Dimensions of the preset.
    #[must_use]
    pub const fn size(self) -> MazeSize {
        match self {
            Self::Small => MazeSize::SMALL,
            Self::Medium => MazeSize::MEDIUM,
            Self::Large => MazeSize::LARGE,
        }
    }

    /// Position of the preset in [`MazeSize::PRESETS`].
    const fn index(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }
}

/// A terminal maze game with procedural generation, hints and power-ups.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory holding the save slot, leaderboard, key bindings and log.
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,
    /// Seed for maze generation, making every maze of the run reproducible.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Size preset selected in the size menu.
    #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
    pub size: Difficulty,
    /// Width of an extra custom size. Must be odd and at least 5.
    #[arg(long, requires = "height")]
    pub width: Option<usize>,
    /// Height of an extra custom size. Must be odd and at least 5.
    #[arg(long, requires = "width")]
    pub height: Option<usize>,
    /// Skip the animated generation screen.
    #[arg(long)]
    pub no_animation: bool,
}

/// Validated launch configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding every file the game reads or writes.
    pub data_dir: PathBuf,
    /// Seed for the session random source, if fixed.
    pub seed: Option<u64>,
    /// Sizes offered by the size menu.
    pub sizes: Vec<MazeSize>,
    /// Index into [`Self::sizes`] selected initially.
    pub selected_size: usize,
    /// Whether generation is animated.
    pub animate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            seed: None,
            sizes: MazeSize::PRESETS.to_vec(),
            selected_size: Difficulty::Medium.index(),
            animate: true,
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    /// Validates the command line.
    ///
    /// A custom size that matches a preset selects that preset; any other valid custom size is
    /// appended to the presets and selected.
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let mut sizes = MazeSize::PRESETS.to_vec();
        let mut selected_size = cli.size.index();

        if let (Some(width), Some(height)) = (cli.width, cli.height) {
            let custom = MazeSize::new(width, height)?;
            selected_size = match sizes.iter().position(|size| *size == custom) {
                Some(idx) => idx,
                None => {
                    sizes.push(custom);
                    sizes.len() - 1
                }
            };
        }

        Ok(Self {
            data_dir: cli.data_dir,
            seed: cli.seed,
            sizes,
            selected_size,
            animate: !cli.no_animation,
        })
    }
}

impl Config {
    /// Path of the log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// The initially selected size.
    #[must_use]
    pub fn initial_size(&self) -> MazeSize {
        self.sizes
            .get(self.selected_size)
            .copied()
            .unwrap_or(MazeSize::MEDIUM)
    }
}
