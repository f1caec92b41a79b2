//! Persistence module for the save slot, the leaderboard and the key binding file.
//!
//! All records are JSON files inside the data directory. Writes go to a temporary file first and
//! are renamed into place, so a failed save never leaves a half-written record behind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::PersistenceError,
    game::PowerUp,
    keys::KeyBindings,
    maze::{Cell, Maze, MazeSize, Position},
};

/// Version written into new snapshots. Snapshots with a higher version are rejected.
pub const SNAPSHOT_VERSION: u32 = 1;
/// Number of entries kept on the leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 10;
/// File name of the save slot.
pub const SAVE_FILE: &str = "maze_save.json";
/// File name of the leaderboard.
pub const LEADERBOARD_FILE: &str = "leaderboard.json";
/// File name of the key binding table.
pub const KEY_BINDINGS_FILE: &str = "key_bindings.json";

/// Serialized session, one per save slot.
///
/// Fields that older or hand-edited files may lack fall back to their defaults; the fields that
/// define the maze and the player's progress are required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Record format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Grid cells in row-major order.
    pub maze: Vec<Cell>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Player cell.
    pub player: Position,
    /// Exit cell.
    pub exit: Position,
    /// Previously occupied cells, oldest first.
    pub trail: Vec<Position>,
    /// Accepted moves so far.
    pub steps: u64,
    /// Play time in milliseconds, excluding pauses.
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Theme name. Not interpreted by the game logic.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Whether hint routes are drawn.
    #[serde(default = "default_show_hint_path")]
    pub show_hint_path: bool,
    /// Zoom factor.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Horizontal pan offset.
    #[serde(default)]
    pub pan_x: f64,
    /// Vertical pan offset.
    #[serde(default)]
    pub pan_y: f64,
    /// Power-ups of the session, collected or not.
    #[serde(default)]
    pub power_ups: Vec<PowerUp>,
}

/// Default for [`Snapshot::version`].
const fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Default for [`Snapshot::theme`].
fn default_theme() -> String {
    "Classic".to_owned()
}

/// Default for [`Snapshot::show_hint_path`].
const fn default_show_hint_path() -> bool {
    true
}

/// Default for [`Snapshot::zoom`].
const fn default_zoom() -> f64 {
    1.0
}

impl Snapshot {
    /// Parses a snapshot and checks its version.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Json`] if required fields are missing or malformed.
    /// - [`PersistenceError::UnsupportedVersion`] if the record is newer than this build.
    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        let snapshot: Self = serde_json::from_str(text)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(snapshot.version));
        }

        Ok(snapshot)
    }

    /// Serializes the snapshot.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds the stored maze.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Corrupted`] if the dimensions are invalid or do not match the grid.
    pub fn maze(&self) -> Result<Maze, PersistenceError> {
        let size = MazeSize::new(self.width, self.height)
            .map_err(|err| PersistenceError::Corrupted(err.to_string()))?;

        Maze::from_cells(size, self.maze.clone()).ok_or_else(|| {
            PersistenceError::Corrupted(format!(
                "grid has {} cells, expected {}",
                self.maze.len(),
                size.area()
            ))
        })
    }
}

/// A single finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Whole seconds it took to reach the exit.
    pub time: u64,
    /// Moves it took to reach the exit.
    pub steps: u64,
}

/// Best runs, fastest first.
///
/// At most [`LEADERBOARD_CAPACITY`] entries are kept. Entries with the same time keep their
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LeaderboardEntry>", into = "Vec<LeaderboardEntry>")]
pub struct Leaderboard {
    /// Sorted entries.
    entries: Vec<LeaderboardEntry>,
}

impl From<Vec<LeaderboardEntry>> for Leaderboard {
    fn from(entries: Vec<LeaderboardEntry>) -> Self {
        let mut board = Self { entries };
        board.normalize();
        board
    }
}

impl From<Leaderboard> for Vec<LeaderboardEntry> {
    fn from(board: Leaderboard) -> Self {
        board.entries
    }
}

impl Leaderboard {
    /// Adds a run, re-sorts, and drops whatever falls beyond the capacity.
    pub fn insert(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
        self.normalize();
    }

    /// Entries, fastest first.
    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Restores the ordering and capacity invariants.
    fn normalize(&mut self) {
        self.entries.sort_by_key(|entry| entry.time);
        self.entries.truncate(LEADERBOARD_CAPACITY);
    }
}

/// Storage for the save slot and the leaderboard.
pub trait Store {
    /// Writes the save slot.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError`] if serialization or the write fails.
    fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Reads the save slot.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError`] if the slot is empty, unreadable, or not a valid snapshot.
    fn load_snapshot(&self) -> Result<Snapshot, PersistenceError>;

    /// Reads the leaderboard.
    ///
    /// A missing record is an empty leaderboard. An unreadable one is logged and treated the same,
    /// so a damaged record never blocks play.
    fn load_leaderboard(&self) -> Leaderboard;

    /// Adds a finished run to the leaderboard and returns the updated board.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError`] if the updated board cannot be written.
    fn record_win(&self, entry: LeaderboardEntry) -> Result<Leaderboard, PersistenceError>;
}

/// JSON file storage rooted at the data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    /// Directory holding every record.
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Io`] if the directory cannot be created.
    pub fn new(dir: &Path) -> Result<Self, PersistenceError> {
        let dir = dir.to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    /// Directory holding every record.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the key binding table, falling back to the defaults.
    ///
    /// When no file exists yet the defaults are written out so players have something to edit.
    /// A malformed file is logged and replaced by the defaults in memory only.
    #[must_use]
    pub fn load_key_bindings(&self) -> KeyBindings {
        let path = self.dir.join(KEY_BINDINGS_FILE);
        match read_optional(&path) {
            Ok(Some(text)) => KeyBindings::from_json(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "malformed key bindings, using defaults");
                KeyBindings::default()
            }),
            Ok(None) => {
                let defaults = KeyBindings::default();
                if let Err(err) = self.save_key_bindings(&defaults) {
                    warn!(path = %path.display(), %err, "failed to write default key bindings");
                }
                defaults
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read key bindings, using defaults");
                KeyBindings::default()
            }
        }
    }

    /// Writes the key binding table.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError`] if serialization or the write fails.
    pub fn save_key_bindings(&self, bindings: &KeyBindings) -> Result<(), PersistenceError> {
        write_atomic(&self.dir.join(KEY_BINDINGS_FILE), &bindings.to_json()?)
    }
}

impl Store for FileStore {
    fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let path = self.dir.join(SAVE_FILE);
        write_atomic(&path, &snapshot.to_json()?)?;
        info!(path = %path.display(), steps = snapshot.steps, "saved game");

        Ok(())
    }

    fn load_snapshot(&self) -> Result<Snapshot, PersistenceError> {
        let path = self.dir.join(SAVE_FILE);
        let snapshot = Snapshot::from_json(&fs::read_to_string(&path)?)?;
        info!(path = %path.display(), steps = snapshot.steps, "loaded game");

        Ok(snapshot)
    }

    fn load_leaderboard(&self) -> Leaderboard {
        let path = self.dir.join(LEADERBOARD_FILE);
        match read_optional(&path) {
            Ok(None) => Leaderboard::default(),
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "ignoring malformed leaderboard");
                Leaderboard::default()
            }),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read leaderboard");
                Leaderboard::default()
            }
        }
    }

    fn record_win(&self, entry: LeaderboardEntry) -> Result<Leaderboard, PersistenceError> {
        let mut board = self.load_leaderboard();
        board.insert(entry);
        write_atomic(
            &self.dir.join(LEADERBOARD_FILE),
            &serde_json::to_string(&board)?,
        )?;
        info!(time = entry.time, steps = entry.steps, "recorded win");

        Ok(board)
    }
}

/// Reads a file, mapping "not found" to [`None`].
fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Writes `contents` next to `path` and renames it into place.
fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote record");

    Ok(())
}
