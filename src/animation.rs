//! Generation animation module.
//!
//! This module contains the frame-timed observer that drives a [`Carver`] while the generation
//! screen is shown. It only decides *when* the next carve step runs; the carver alone decides
//! what gets carved, so an animated maze is identical to one generated in a single call.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::maze::{CarveStep, Carver, Maze, MazeSize, Position};

/// Delay between two carve steps.
///
/// This constant matches one frame of the 60 Hz game loop, so the carver advances one step per
/// rendered frame when the terminal keeps up.
pub const GENERATION_FRAME_DELAY: Duration = Duration::from_millis(16);

/// Upper bound on the carve steps caught up in a single update after a stalled frame.
const MAX_STEPS_PER_UPDATE: u32 = 8;

/// Animated maze generation in progress.
#[derive(Debug)]
pub struct GenerationAnimation<R> {
    /// Carver being observed.
    carver: Carver<R>,
    /// Rooms opened so far, including the starting room.
    carved: usize,
    /// Total number of rooms of the maze.
    rooms: usize,
    /// Time of the last carve step.
    last_update: Instant,
}

impl<R: Rng> GenerationAnimation<R> {
    /// Starts animating the generation of a `size` maze from `rng`.
    pub fn new(size: MazeSize, rng: R, now: Instant) -> Self {
        Self {
            carver: Carver::new(size, rng),
            carved: 1,
            rooms: (size.width() / 2) * (size.height() / 2),
            last_update: now,
        }
    }

    /// Runs the carve steps that are due at `now`.
    ///
    /// This function advances the carver by one step per elapsed [`GENERATION_FRAME_DELAY`],
    /// catching up at most a handful of steps when frames were late. Returns whether any step
    /// ran.
    pub fn update(&mut self, now: Instant) -> bool {
        let mut advanced = false;

        for _ in 0..MAX_STEPS_PER_UPDATE {
            if now.saturating_duration_since(self.last_update) < GENERATION_FRAME_DELAY {
                break;
            }
            let Some(step) = self.carver.next() else {
                break;
            };

            if matches!(step, CarveStep::Carve { .. }) {
                self.carved += 1;
            }
            self.last_update += GENERATION_FRAME_DELAY;
            advanced = true;
        }

        if now.saturating_duration_since(self.last_update) >= GENERATION_FRAME_DELAY {
            self.last_update = now;
        }

        advanced
    }

    /// The partially carved grid.
    pub const fn maze(&self) -> &Maze {
        self.carver.maze()
    }

    /// The room the carver is working from, for highlighting.
    pub fn current(&self) -> Option<Position> {
        self.carver.current()
    }

    /// Whether the carver has visited every room.
    pub fn is_complete(&self) -> bool {
        self.carver.is_complete()
    }

    /// Rooms opened so far and total rooms.
    pub const fn progress(&self) -> (usize, usize) {
        (self.carved, self.rooms)
    }

    /// Skips the rest of the animation, returning the finished maze and the random source.
    pub fn finish(self) -> (Maze, R) {
        self.carver.finish()
    }
}
