//! Type definitions and enums for the application state and navigation.

/// Enumeration of available application screens.
///
/// This enumeration holds information about the current screen of the game. This is used to
/// determine which screen to render and what actions to take based on user input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Screen {
    /// Main menu screen of the game.
    MainMenu(MainMenuItem),
    /// Maze size selection screen.
    ///
    /// This variant holds the index of the highlighted size in the configured size list.
    SizeMenu(usize),
    /// Settings screen.
    Settings(SettingsItem),
    /// Best runs.
    Leaderboard,
    /// Animated maze generation.
    Generating,
    /// In-game maze screen.
    ///
    /// The pause menu and the win message are overlays of this screen, driven by the session's
    /// mode rather than by a screen of their own.
    InGame,
}

/// Shared behaviour of the fixed menus.
///
/// Menus wrap around at both ends.
pub(crate) trait MenuItem: Copy + PartialEq + 'static {
    /// Every item, top to bottom.
    const ALL: &'static [Self];

    /// Text shown for the item.
    fn label(self) -> &'static str;

    /// The item below, wrapping to the top.
    fn next(self) -> Self {
        let len = Self::ALL.len();
        let idx = Self::ALL.iter().position(|item| *item == self).unwrap_or(0);

        Self::ALL.get((idx + 1) % len).copied().unwrap_or(self)
    }

    /// The item above, wrapping to the bottom.
    fn previous(self) -> Self {
        let len = Self::ALL.len();
        let idx = Self::ALL.iter().position(|item| *item == self).unwrap_or(0);

        Self::ALL.get((idx + len - 1) % len).copied().unwrap_or(self)
    }
}

/// Main menu navigation options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MainMenuItem {
    /// "Start Game" menu option.
    StartGame,
    /// "Leaderboard" menu option.
    Leaderboard,
    /// "Settings" menu option.
    Settings,
    /// "Quit" menu option.
    Quit,
}

impl MenuItem for MainMenuItem {
    const ALL: &'static [Self] = &[Self::StartGame, Self::Leaderboard, Self::Settings, Self::Quit];

    fn label(self) -> &'static str {
        match self {
            Self::StartGame => "Start Game",
            Self::Leaderboard => "Leaderboard",
            Self::Settings => "Settings",
            Self::Quit => "Quit",
        }
    }
}

/// Settings menu choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SettingsItem {
    /// Cycles through the colour themes.
    Theme,
    /// Turns the drawing of hint routes on or off.
    HintPath,
    /// Returns to the main menu.
    Back,
}

impl MenuItem for SettingsItem {
    const ALL: &'static [Self] = &[Self::Theme, Self::HintPath, Self::Back];

    fn label(self) -> &'static str {
        match self {
            Self::Theme => "Theme",
            Self::HintPath => "Hint Path",
            Self::Back => "Back",
        }
    }
}

/// Pause menu choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PauseMenuItem {
    /// Continues the session.
    Resume,
    /// Starts the same maze over.
    Restart,
    /// Generates a fresh maze of the same size.
    NewMaze,
    /// Writes the session to the save slot.
    SaveGame,
    /// Replaces the session with the save slot.
    LoadGame,
    /// Opens the settings screen over the paused session.
    Settings,
    /// Leaves to the main menu.
    MainMenu,
    /// Leaves the game.
    Quit,
}

impl MenuItem for PauseMenuItem {
    const ALL: &'static [Self] = &[
        Self::Resume,
        Self::Restart,
        Self::NewMaze,
        Self::SaveGame,
        Self::LoadGame,
        Self::Settings,
        Self::MainMenu,
        Self::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Resume => "Resume",
            Self::Restart => "Restart",
            Self::NewMaze => "New Maze",
            Self::SaveGame => "Save Game",
            Self::LoadGame => "Load Game",
            Self::Settings => "Settings",
            Self::MainMenu => "Main Menu",
            Self::Quit => "Quit",
        }
    }
}

/// Colour themes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Theme {
    /// Black walls on a sky-blue background.
    #[default]
    Classic,
    /// Dim walls with neon accents.
    Dark,
    /// Greens and browns.
    Forest,
    /// Oranges and reds.
    Sunset,
}

impl Theme {
    /// Every theme, in menu order.
    pub(crate) const ALL: [Self; 4] = [Self::Classic, Self::Dark, Self::Forest, Self::Sunset];

    /// Name of the theme, as stored in the save slot.
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Dark => "Dark",
            Self::Forest => "Forest",
            Self::Sunset => "Sunset",
        }
    }

    /// Looks a theme up by its name.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.name() == name)
    }

    /// The theme after this one, wrapping around.
    pub(crate) const fn next(self) -> Self {
        match self {
            Self::Classic => Self::Dark,
            Self::Dark => Self::Forest,
            Self::Forest => Self::Sunset,
            Self::Sunset => Self::Classic,
        }
    }
}

/// Generic menu type configuration.
///
/// This enumeration holds the different specifics particular to each generic menu type in the
/// application's interface. Generic here means they share enough features to be considered worth
/// joining together part of their functionality. Each variant carries its number of items.
pub(crate) enum MenuType {
    /// Main menu configuration.
    MainMenu(u16),
    /// Size menu configuration.
    SizeMenu(u16),
    /// Settings menu configuration.
    Settings(u16),
    /// Pause menu configuration.
    PauseMenu(u16),
}

impl MenuType {
    /// Returns the string representation of the menu type.
    ///
    /// This function provides the display name for each menu variant, used as the title in the
    /// menu's border when rendering the interface.
    pub(crate) const fn repr(&self) -> &str {
        match self {
            Self::MainMenu(_) => "Maze Runner",
            Self::SizeMenu(_) => "Choose Difficulty",
            Self::Settings(_) => "Settings",
            Self::PauseMenu(_) => "Paused",
        }
    }

    /// Returns the number of items of the menu.
    ///
    /// This function provides access to the number of menu items for layout calculations, allowing
    /// the UI to properly size the menu containers.
    pub(crate) const fn value(&self) -> u16 {
        match self {
            Self::MainMenu(value)
            | Self::SizeMenu(value)
            | Self::Settings(value)
            | Self::PauseMenu(value) => *value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_wraps_around() {
        assert_eq!(MainMenuItem::StartGame.next(), MainMenuItem::Leaderboard);
        assert_eq!(MainMenuItem::Quit.next(), MainMenuItem::StartGame);
        assert_eq!(MainMenuItem::StartGame.previous(), MainMenuItem::Quit);
        assert_eq!(MainMenuItem::Settings.previous(), MainMenuItem::Leaderboard);
    }

    #[test]
    fn test_next_and_previous_are_inverse() {
        for item in PauseMenuItem::ALL {
            assert_eq!(item.next().previous(), *item);
        }
        for item in SettingsItem::ALL {
            assert_eq!(item.previous().next(), *item);
        }
    }

    #[test]
    fn test_menu_labels() {
        assert_eq!(MainMenuItem::StartGame.label(), "Start Game");
        assert_eq!(PauseMenuItem::NewMaze.label(), "New Maze");
        assert_eq!(SettingsItem::HintPath.label(), "Hint Path");
    }

    #[test]
    fn test_theme_cycle_visits_every_theme() {
        let mut theme = Theme::default();
        let mut seen = Vec::new();
        for _ in 0..Theme::ALL.len() {
            seen.push(theme);
            theme = theme.next();
        }

        assert_eq!(theme, Theme::Classic);
        assert_eq!(seen, Theme::ALL.to_vec());
    }

    #[test]
    fn test_theme_names() {
        for theme in Theme::ALL {
            assert_eq!(Theme::from_name(theme.name()), Some(theme));
        }
        assert_eq!(Theme::from_name("Neon"), None);
    }

    #[test]
    fn test_menu_type_repr() {
        assert_eq!(MenuType::MainMenu(4).repr(), "Maze Runner");
        assert_eq!(MenuType::PauseMenu(7).repr(), "Paused");
    }

    #[test]
    fn test_menu_type_value() {
        assert_eq!(MenuType::SizeMenu(3).value(), 3);
        assert_eq!(MenuType::Settings(3).value(), 3);
    }
}
