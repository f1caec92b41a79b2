//! Error types for every failure category the game distinguishes.
//!
//! Configuration errors are raised before any maze is generated, persistence errors are
//! recoverable and shown to the player as a short notice, and path errors signal either a
//! programming error or a maze that broke its own invariants.

use std::io;

use thiserror::Error;

use crate::maze::Position;

/// Invalid maze dimensions.
///
/// Raised by [`MazeSize::new`](crate::maze::MazeSize::new), which is the only place dimensions
/// get validated. Sizes are never coerced into a valid shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A dimension is even, which leaves no room for the wall lattice on one of the borders.
    #[error("maze dimension {0} must be odd")]
    EvenDimension(usize),
    /// A dimension is below the smallest maze that still holds two rooms per axis.
    #[error("maze dimension {value} is below the minimum of {min}")]
    TooSmall {
        /// The rejected dimension.
        value: usize,
        /// The smallest accepted dimension.
        min: usize,
    },
    /// A dimension is above the largest grid the game agrees to allocate.
    #[error("maze dimension {value} is above the maximum of {max}")]
    TooLarge {
        /// The rejected dimension.
        value: usize,
        /// The largest accepted dimension.
        max: usize,
    },
}

/// Failures while reading or writing the save slot, the leaderboard, or the key bindings.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The file exists but its contents are not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The record was written by a newer version of the game.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    /// The record parsed but violates a maze or session invariant.
    #[error("corrupted data: {0}")]
    Corrupted(String),
}

/// Failures of the shortest-path search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// One of the endpoints is a wall or lies outside the grid.
    #[error("cell ({}, {}) is not an open cell", .0.x, .0.y)]
    NotOpen(Position),
    /// Both endpoints are open but no route joins them, so the maze is not a spanning tree.
    #[error("no route from ({}, {}) to ({}, {}); the maze is not fully connected", .start.x, .start.y, .goal.x, .goal.y)]
    Unreachable {
        /// Cell the search started from.
        start: Position,
        /// Cell the search was looking for.
        goal: Position,
    },
}

/// Failures while building or advancing a play session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// The maze does not contain two distinct open cells to use as start and exit.
    #[error("maze has no distinct start and exit cells")]
    NoEndpoints,
    /// A hint could not be computed.
    #[error(transparent)]
    Path(#[from] PathError),
}
