//! A terminal maze game.
//!
//! Mazes are carved as perfect mazes by a randomized depth-first search, optionally animated
//! while they are generated. The player walks from the start cell to the exit against the clock,
//! can ask for a temporary hint route, picks up power-ups that show the route for free, and can
//! save and load a single session. Finished runs go to a leaderboard.
//!
//! The game logic ([`game`], [`maze`], [`pathfinding`], [`view`]) is independent of the terminal
//! and driven by explicit timestamps, while [`App`] ties it to Ratatui and Crossterm.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]

pub mod animation;
mod app;
pub mod config;
pub mod error;
mod events;
pub mod game;
pub mod keys;
pub mod logging;
pub mod maze;
pub mod pathfinding;
pub mod persistence;
mod types;
mod ui;
pub mod view;

pub use app::App;
