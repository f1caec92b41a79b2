//! Key binding module.
//!
//! This module contains the fixed set of in-game [`Action`]s and the [`KeyBindings`] table that
//! maps each of them to a list of input codes. Input codes are lower-case key names such as `w`,
//! `up`, `f5` or `esc`; translating terminal events into those names is the event loop's job.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{error::PersistenceError, maze::Direction};

/// In-game action that can be bound to keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Move one cell up.
    Up,
    /// Move one cell down.
    Down,
    /// Move one cell left.
    Left,
    /// Move one cell right.
    Right,
    /// Show the route to the exit for a few seconds.
    Hint,
    /// Pause or resume the session.
    Pause,
    /// Restart the current maze from its start cell.
    Restart,
    /// Generate a new maze of the same size.
    NewMaze,
    /// Return to the main menu.
    Menu,
    /// Leave the game.
    Quit,
    /// Show or hide hint routes.
    ToggleHint,
    /// Write the session to the save slot.
    Save,
    /// Replace the session with the one in the save slot.
    Load,
}

impl Action {
    /// Every action, in lookup priority order.
    pub const ALL: [Self; 13] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Hint,
        Self::Pause,
        Self::Restart,
        Self::NewMaze,
        Self::Menu,
        Self::Quit,
        Self::ToggleHint,
        Self::Save,
        Self::Load,
    ];

    /// Name of the action in the key binding file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Hint => "HINT",
            Self::Pause => "PAUSE",
            Self::Restart => "RESTART",
            Self::NewMaze => "NEWMAZE",
            Self::Menu => "MENU",
            Self::Quit => "QUIT",
            Self::ToggleHint => "TOGGLE_HINT",
            Self::Save => "SAVE",
            Self::Load => "LOAD",
        }
    }

    /// Looks an action up by its file name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// The movement direction of a directional action.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }

    /// Input codes bound to the action when no binding file says otherwise.
    const fn default_codes(self) -> &'static [&'static str] {
        match self {
            Self::Up => &["w", "up"],
            Self::Down => &["s", "down"],
            Self::Left => &["a", "left"],
            Self::Right => &["d", "right"],
            Self::Hint => &["h"],
            Self::Pause => &["p"],
            Self::Restart => &["r"],
            Self::NewMaze => &["n"],
            Self::Menu => &["m"],
            Self::Quit => &["esc"],
            Self::ToggleHint => &["t"],
            Self::Save => &["f5"],
            Self::Load => &["f9"],
        }
    }
}

/// Mapping from every [`Action`] to the input codes that trigger it.
///
/// Every action always has at least one code: anything missing from a binding file is filled in
/// from the defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    /// Codes per action.
    bindings: BTreeMap<Action, Vec<String>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            bindings: Action::ALL
                .into_iter()
                .map(|action| {
                    let codes = action
                        .default_codes()
                        .iter()
                        .map(|code| (*code).to_owned())
                        .collect();
                    (action, codes)
                })
                .collect(),
        }
    }
}

impl KeyBindings {
    /// Parses a binding file.
    ///
    /// The file is a JSON object from action names to arrays of input codes. Unknown action names
    /// are skipped, and actions that are missing or bound to an empty list keep their defaults.
    /// Codes are compared case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Json`] if the text is not an object of string arrays.
    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(text)?;
        let mut bindings = Self::default();

        for (name, codes) in raw {
            let Some(action) = Action::from_name(&name) else {
                warn!(%name, "ignoring unknown action in key bindings");
                continue;
            };
            if codes.is_empty() {
                warn!(%name, "action has no keys, keeping the defaults");
                continue;
            }

            let codes = codes.iter().map(|code| code.to_lowercase()).collect();
            let _ = bindings.bindings.insert(action, codes);
        }

        Ok(bindings)
    }

    /// Serializes the table in the binding file format.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let raw: BTreeMap<&str, &[String]> = self
            .bindings
            .iter()
            .map(|(action, codes)| (action.name(), codes.as_slice()))
            .collect();

        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// Codes bound to `action`.
    #[must_use]
    pub fn codes(&self, action: Action) -> &[String] {
        self.bindings
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The action bound to `code`, if any.
    ///
    /// When several actions share a code, the first one in [`Action::ALL`] wins.
    #[must_use]
    pub fn action_for(&self, code: &str) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|action| self.codes(*action).iter().any(|bound| bound == code))
    }
}
