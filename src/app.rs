//! Core application state and logic for the maze game.

use std::{
    io::{self, stdout},
    mem,
    rc::Rc,
    time::{Duration, Instant},
};

use color_eyre::eyre::{OptionExt as _, Result};
use rand::{rngs::StdRng, Rng as _, SeedableRng as _};
use ratatui::{
    crossterm::{
        event::{
            DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
            PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
        },
        execute,
        terminal::supports_keyboard_enhancement,
    },
    DefaultTerminal,
};
use tracing::{debug, error, info, warn};

use crate::{
    animation::GenerationAnimation,
    config::Config,
    events::{self, HeldKeys},
    game::{GameState, SessionRequest, TickInput},
    keys::{Action, KeyBindings},
    maze::{Carver, Maze, MazeSize},
    persistence::{Leaderboard, Store},
    types::{MainMenuItem, PauseMenuItem, Screen, SettingsItem, Theme},
    ui,
    view::ViewState,
};

/// Frame period while a maze is on screen.
pub(crate) const GAME_FRAME: Duration = Duration::from_micros(16_667);
/// Frame period on the menus.
pub(crate) const MENU_FRAME: Duration = Duration::from_micros(33_333);
/// How long a save or load notice stays in the info bar.
pub(crate) const NOTICE_DURATION: Duration = Duration::from_millis(1500);

/// Preferences applied to new sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    /// Colour theme.
    pub(crate) theme: Theme,
    /// Whether hint routes are drawn in new sessions.
    pub(crate) show_hint_path: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            show_hint_path: true,
        }
    }
}

/// Short-lived message about a save or load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Notice {
    /// Message text.
    pub(crate) text: &'static str,
    /// Whether the operation succeeded, which picks the colour.
    pub(crate) success: bool,
    /// When the notice appeared.
    pub(crate) shown_at: Instant,
}

impl Notice {
    /// Whether the notice outlived [`NOTICE_DURATION`] at `now`.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= NOTICE_DURATION
    }
}

/// Application state container for the maze game.
///
/// This structure holds the state of the application, which is to say the structure from which
/// Ratatui will render the game and Crossterm events will help writing to.
pub struct App {
    /// Application exit flag.
    ///
    /// This field indicates whether the application should exit. It is set to `true` when the user
    /// wants to quit the game but it starts off `false`.
    pub(crate) exit: bool,
    /// Current screen being displayed to the user.
    pub(crate) screen: Screen,
    /// Launch configuration.
    pub(crate) config: Config,
    /// Save slot and leaderboard storage.
    pub(crate) store: Box<dyn Store>,
    /// Key binding table, loaded once at start-up.
    pub(crate) bindings: KeyBindings,
    /// Source of the per-maze generation seeds and of restart power-up placement.
    pub(crate) rng: StdRng,
    /// Preferences for new sessions.
    pub(crate) settings: Settings,
    /// Index of the selected size in [`Config::sizes`].
    pub(crate) size_index: usize,
    /// Leaderboard as last read or written.
    pub(crate) leaderboard: Leaderboard,
    /// Generation being animated, if any.
    pub(crate) generation: Option<GenerationAnimation<StdRng>>,
    /// Zoom and pan of the generation screen, handed over to the session it produces.
    pub(crate) generation_view: ViewState,
    /// Current session, if any.
    pub(crate) game: Option<GameState>,
    /// Highlighted pause menu item.
    pub(crate) pause_item: PauseMenuItem,
    /// Direction keys held down.
    pub(crate) input: HeldKeys,
    /// Bound actions triggered since the last tick.
    pub(crate) pending_actions: Vec<Action>,
    /// Save or load notice being shown.
    pub(crate) notice: Option<Notice>,
}

impl App {
    /// Creates the application on the main menu.
    ///
    /// The session random source is seeded from [`Config::seed`] when set, and from the operating
    /// system otherwise.
    pub fn new(config: Config, store: Box<dyn Store>, bindings: KeyBindings) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let leaderboard = store.load_leaderboard();

        Self {
            exit: false,
            screen: Screen::MainMenu(MainMenuItem::StartGame),
            size_index: config.selected_size,
            config,
            store,
            bindings,
            rng,
            settings: Settings::default(),
            leaderboard,
            generation: None,
            generation_view: ViewState::new(),
            game: None,
            pause_item: PauseMenuItem::Resume,
            input: HeldKeys::default(),
            pending_actions: Vec::new(),
            notice: None,
        }
    }

    /// Runs the main loop of the application.
    ///
    /// This function turns on mouse capture and, when the terminal supports it, key release
    /// reporting, then loops over input, update and drawing until the exit flag is set. Both
    /// terminal modes are turned off again before returning, even when the loop fails.
    ///
    /// # Errors
    ///
    /// - [`std::io::Error`] if the terminal cannot be configured, read or drawn to.
    /// - A report wrapping a [`GameError`](crate::error::GameError) if the session hits an
    ///   internal inconsistency.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        execute!(stdout(), EnableMouseCapture)?;
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        self.input.set_release_events(enhanced);
        info!(key_releases = enhanced, "terminal configured");

        let result = self.run_loop(terminal);

        if enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        execute!(stdout(), DisableMouseCapture)?;

        result
    }

    /// Processes input, advances the state, and draws, once per frame.
    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut frame_start = Instant::now();

        while !self.exit {
            let timeout = self.frame_period().saturating_sub(frame_start.elapsed());
            events::handle_events(self, timeout)?;
            frame_start = Instant::now();

            self.update(frame_start)?;
            let _ = terminal.try_draw(|frame| ui::draw(self, frame).map_err(io::Error::other))?;
        }

        Ok(())
    }

    /// Target frame period of the current screen.
    pub(crate) const fn frame_period(&self) -> Duration {
        match self.screen {
            Screen::InGame | Screen::Generating => GAME_FRAME,
            _ => MENU_FRAME,
        }
    }

    /// Advances whatever the current screen animates.
    ///
    /// # Errors
    ///
    /// - A report if the session reports an internal inconsistency.
    pub(crate) fn update(&mut self, now: Instant) -> Result<()> {
        if self.notice.as_ref().is_some_and(|notice| notice.is_expired(now)) {
            self.notice = None;
        }

        match self.screen {
            Screen::Generating => {
                let complete = self.generation.as_mut().is_none_or(|animation| {
                    let _ = animation.update(now);
                    animation.is_complete()
                });
                if complete {
                    self.finish_generation(now)?;
                }
            }
            Screen::InGame => self.tick(now)?,
            _ => {}
        }

        Ok(())
    }

    /// Runs one session tick and carries out what it asks for.
    fn tick(&mut self, now: Instant) -> Result<()> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };

        let input = TickInput {
            held: self.input.sample(now),
            actions: mem::take(&mut self.pending_actions),
        };
        let report = game
            .tick(now, &input)
            .inspect_err(|err| error!(%err, "session tick failed"))?;

        if let Some(entry) = report.win {
            match self.store.record_win(entry) {
                Ok(board) => self.leaderboard = board,
                Err(err) => warn!(%err, "failed to record win"),
            }
        }

        for request in report.requests {
            self.handle_request(request, now)?;
            if self.exit || self.screen != Screen::InGame {
                break;
            }
        }

        Ok(())
    }

    /// Carries out a request raised by the session.
    fn handle_request(&mut self, request: SessionRequest, now: Instant) -> Result<()> {
        debug!(?request, "session request");

        match request {
            SessionRequest::Restart => self.restart_session(now)?,
            SessionRequest::NewMaze => self.start_generation(now)?,
            SessionRequest::Menu => self.return_to_menu(),
            SessionRequest::Quit => self.exit = true,
            SessionRequest::Save => self.save(now),
            SessionRequest::Load => self.load(now),
        }

        Ok(())
    }

    /// Carries out the highlighted pause menu item.
    ///
    /// # Errors
    ///
    /// - A report if a new session cannot be created.
    pub(crate) fn select_pause_item(&mut self, now: Instant) -> Result<()> {
        match self.pause_item {
            PauseMenuItem::Resume => {
                if let Some(game) = self.game.as_mut() {
                    game.resume(now);
                }
            }
            PauseMenuItem::Restart => self.restart_session(now)?,
            PauseMenuItem::NewMaze => self.start_generation(now)?,
            PauseMenuItem::SaveGame => self.save(now),
            PauseMenuItem::LoadGame => self.load(now),
            PauseMenuItem::Settings => self.screen = Screen::Settings(SettingsItem::Theme),
            PauseMenuItem::MainMenu => self.return_to_menu(),
            PauseMenuItem::Quit => self.exit = true,
        }

        Ok(())
    }

    /// The size selected for new mazes.
    pub(crate) fn selected_size(&self) -> MazeSize {
        self.config
            .sizes
            .get(self.size_index)
            .copied()
            .unwrap_or(MazeSize::MEDIUM)
    }

    /// Starts generating a maze of the selected size.
    ///
    /// This function draws a fresh seed from the session random source and logs it, so any maze
    /// can be reproduced. With animation enabled the generation screen takes over; otherwise the
    /// session starts right away.
    ///
    /// # Errors
    ///
    /// - A report if the generated maze cannot host a session.
    pub(crate) fn start_generation(&mut self, now: Instant) -> Result<()> {
        let size = self.selected_size();
        let seed: u64 = self.rng.gen();
        info!(seed, %size, "generating maze");

        let rng = StdRng::seed_from_u64(seed);
        self.game = None;
        self.input.clear();
        self.pending_actions.clear();
        self.generation_view = ViewState::new();

        if self.config.animate {
            self.generation = Some(GenerationAnimation::new(size, rng, now));
            self.screen = Screen::Generating;
            Ok(())
        } else {
            let (maze, rng) = Carver::new(size, rng).finish();
            self.start_session(maze, rng, now)
        }
    }

    /// Completes the animated generation at once and starts the session.
    ///
    /// # Errors
    ///
    /// - A report if no generation is running or the maze cannot host a session.
    pub(crate) fn finish_generation(&mut self, now: Instant) -> Result<()> {
        let animation = self
            .generation
            .take()
            .ok_or_eyre("no maze generation in progress")?;
        let (maze, rng) = animation.finish();

        self.start_session(maze, rng, now)
    }

    /// Starts a session on a freshly generated maze.
    fn start_session(&mut self, maze: Maze, mut rng: StdRng, now: Instant) -> Result<()> {
        debug!("generated maze:\n{maze}");

        let mut game = GameState::new(Rc::new(maze), &mut rng, now)?;
        game.set_show_hint_path(self.settings.show_hint_path);
        *game.view_mut() = self.generation_view;

        self.game = Some(game);
        self.input.clear();
        self.screen = Screen::InGame;

        Ok(())
    }

    /// Starts the current maze over.
    fn restart_session(&mut self, now: Instant) -> Result<()> {
        let Some(game) = self.game.as_ref() else {
            return Ok(());
        };

        let restarted = game.restart(&mut self.rng, now)?;
        info!("restarted maze");
        self.game = Some(restarted);
        self.input.clear();
        self.pending_actions.clear();

        Ok(())
    }

    /// Drops the session and shows the main menu.
    fn return_to_menu(&mut self) {
        self.game = None;
        self.generation = None;
        self.input.clear();
        self.pending_actions.clear();
        self.screen = Screen::MainMenu(MainMenuItem::StartGame);
    }

    /// Reloads the leaderboard and shows it.
    pub(crate) fn open_leaderboard(&mut self) {
        self.leaderboard = self.store.load_leaderboard();
        self.screen = Screen::Leaderboard;
    }

    /// Writes the session to the save slot and reports the outcome in a notice.
    fn save(&mut self, now: Instant) {
        let Some(game) = self.game.as_ref() else {
            return;
        };

        let snapshot = game.snapshot(now, self.settings.theme.name());
        match self.store.save_snapshot(&snapshot) {
            Ok(()) => self.show_notice("Game saved successfully!", true, now),
            Err(err) => {
                warn!(%err, "failed to save game");
                self.show_notice("Game save failed!", false, now);
            }
        }
    }

    /// Replaces the session with the save slot and reports the outcome in a notice.
    ///
    /// A failed load leaves the current session untouched.
    fn load(&mut self, now: Instant) {
        let loaded = self.store.load_snapshot().and_then(|snapshot| {
            GameState::from_snapshot(&snapshot, now).map(|game| (snapshot.theme, game))
        });

        match loaded {
            Ok((theme, game)) => {
                if let Some(theme) = Theme::from_name(&theme) {
                    self.settings.theme = theme;
                }
                self.game = Some(game);
                self.input.clear();
                self.pending_actions.clear();
                self.screen = Screen::InGame;
                self.show_notice("Game loaded!", true, now);
            }
            Err(err) => {
                warn!(%err, "failed to load game");
                self.show_notice("Load failed!", false, now);
            }
        }
    }

    /// Shows a notice in the info bar.
    fn show_notice(&mut self, text: &'static str, success: bool, now: Instant) {
        self.notice = Some(Notice {
            text,
            success,
            shown_at: now,
        });
    }

    /// The view that pointer gestures act on, if the current screen shows a maze.
    pub(crate) fn active_view_mut(&mut self) -> Option<&mut ViewState> {
        match self.screen {
            Screen::Generating => Some(&mut self.generation_view),
            Screen::InGame => self.game.as_mut().map(GameState::view_mut),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        error::PersistenceError,
        persistence::{LeaderboardEntry, Snapshot},
    };

    /// In-memory [`Store`] for tests.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStore {
        /// Save slot.
        snapshot: RefCell<Option<Snapshot>>,
        /// Leaderboard.
        leaderboard: RefCell<Leaderboard>,
    }

    impl Store for MemoryStore {
        fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
            *self.snapshot.borrow_mut() = Some(snapshot.clone());
            Ok(())
        }

        fn load_snapshot(&self) -> Result<Snapshot, PersistenceError> {
            self.snapshot
                .borrow()
                .clone()
                .ok_or_else(|| PersistenceError::Corrupted("empty save slot".to_owned()))
        }

        fn load_leaderboard(&self) -> Leaderboard {
            self.leaderboard.borrow().clone()
        }

        fn record_win(&self, entry: LeaderboardEntry) -> Result<Leaderboard, PersistenceError> {
            let mut board = self.leaderboard.borrow_mut();
            board.insert(entry);
            Ok(board.clone())
        }
    }

    /// A seeded application without animation, backed by a [`MemoryStore`].
    pub(crate) fn test_app() -> App {
        let config = Config {
            seed: Some(7),
            animate: false,
            ..Config::default()
        };

        App::new(
            config,
            Box::new(MemoryStore::default()),
            KeyBindings::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::test_app, *};
    use crate::{game::SessionMode, maze::Direction, pathfinding::shortest_path};

    /// Walks the player to the exit along the shortest route, one throttled move per tick.
    fn walk_to_exit(app: &mut App, mut now: Instant) -> Instant {
        let game = app.game.as_ref().expect("session started");
        let route = shortest_path(game.maze(), game.player().pos(), game.exit())
            .expect("exit is reachable");
        let mut pos = game.player().pos();

        for next in route {
            let direction = Direction::ALL
                .into_iter()
                .find(|direction| pos.step(*direction) == Some(next))
                .expect("route cells are adjacent");
            app.input.press(direction, now);
            app.update(now).expect("update succeeds");
            pos = next;
            now += Duration::from_millis(200);
        }

        now
    }

    #[test]
    fn test_new_app_starts_on_main_menu() {
        let app = test_app();

        assert_eq!(app.screen, Screen::MainMenu(MainMenuItem::StartGame));
        assert!(app.game.is_none());
        assert_eq!(app.selected_size(), MazeSize::MEDIUM);
        assert_eq!(app.frame_period(), MENU_FRAME);
    }

    #[test]
    fn test_start_generation_without_animation() {
        let mut app = test_app();

        app.start_generation(Instant::now())
            .expect("generation succeeds");

        assert_eq!(app.screen, Screen::InGame);
        assert_eq!(app.frame_period(), GAME_FRAME);
        let game = app.game.as_ref().expect("session started");
        assert_eq!(game.maze().width(), 21);
        assert_eq!(game.player().pos(), game.start());
    }

    #[test]
    fn test_same_seed_same_maze() {
        let mut first = test_app();
        let mut second = test_app();
        let t0 = Instant::now();

        first.start_generation(t0).expect("generation succeeds");
        second.start_generation(t0).expect("generation succeeds");

        assert_eq!(
            first.game.as_ref().map(GameState::maze),
            second.game.as_ref().map(GameState::maze)
        );
    }

    #[test]
    fn test_animated_generation_finishes_into_a_session() {
        let mut app = test_app();
        app.config.animate = true;
        let t0 = Instant::now();

        app.start_generation(t0).expect("generation starts");
        assert_eq!(app.screen, Screen::Generating);

        let mut now = t0;
        while app.screen == Screen::Generating {
            now += GAME_FRAME;
            app.update(now).expect("update succeeds");
        }

        assert_eq!(app.screen, Screen::InGame);
        assert!(app.generation.is_none());
        assert!(app.game.is_some());
    }

    #[test]
    fn test_win_is_recorded_once() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");

        let now = walk_to_exit(&mut app, t0);
        for extra in 0..5 {
            app.update(now + Duration::from_millis(200 * extra))
                .expect("update succeeds");
        }

        let game = app.game.as_ref().expect("session kept");
        assert_eq!(game.mode(), SessionMode::Won);
        assert_eq!(app.leaderboard.entries().len(), 1);
        assert_eq!(app.store.load_leaderboard(), app.leaderboard);
        assert_eq!(
            app.leaderboard.entries().first().map(|entry| entry.steps),
            Some(game.player().steps())
        );
    }

    #[test]
    fn test_save_then_load_restores_the_session() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");
        app.settings.theme = Theme::Sunset;

        app.pending_actions.push(Action::Save);
        app.update(t0).expect("update succeeds");
        let saved = app.game.as_ref().expect("session started").player().clone();
        assert_eq!(app.notice.map(|notice| notice.success), Some(true));

        app.settings.theme = Theme::Classic;
        let _ = walk_to_exit(&mut app, t0 + Duration::from_secs(1));
        app.pending_actions.push(Action::Load);
        app.update(t0 + Duration::from_secs(60))
            .expect("update succeeds");

        let game = app.game.as_ref().expect("session loaded");
        assert_eq!(game.player(), &saved);
        assert_eq!(game.mode(), SessionMode::Playing);
        assert_eq!(app.settings.theme, Theme::Sunset);
        assert_eq!(app.notice.map(|notice| notice.text), Some("Game loaded!"));
    }

    #[test]
    fn test_failed_load_keeps_the_session() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");
        let before = app.game.as_ref().expect("session started").player().clone();

        app.pending_actions.push(Action::Load);
        app.update(t0).expect("update succeeds");

        let notice = app.notice.expect("failure is reported");
        assert!(!notice.success);
        assert_eq!(notice.text, "Load failed!");
        assert_eq!(app.game.as_ref().map(GameState::player), Some(&before));
    }

    #[test]
    fn test_notice_expires() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");

        app.pending_actions.push(Action::Save);
        app.update(t0).expect("update succeeds");
        app.update(t0 + Duration::from_millis(1499))
            .expect("update succeeds");
        assert!(app.notice.is_some());

        app.update(t0 + NOTICE_DURATION).expect("update succeeds");
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_restart_and_menu_requests() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");
        let maze = app.game.as_ref().expect("session started").maze().clone();

        app.input.press(Direction::Down, t0);
        app.input.press(Direction::Right, t0);
        app.update(t0).expect("update succeeds");
        app.pending_actions.push(Action::Restart);
        app.update(t0 + Duration::from_secs(1))
            .expect("update succeeds");

        let game = app.game.as_ref().expect("session restarted");
        assert_eq!(game.maze(), &maze);
        assert_eq!(game.player().steps(), 0);

        app.pending_actions.push(Action::Menu);
        app.update(t0 + Duration::from_secs(2))
            .expect("update succeeds");
        assert_eq!(app.screen, Screen::MainMenu(MainMenuItem::StartGame));
        assert!(app.game.is_none());
    }

    #[test]
    fn test_new_maze_request_starts_over() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");
        let first = app.game.as_ref().expect("session started").maze().clone();

        app.pending_actions.push(Action::NewMaze);
        app.update(t0).expect("update succeeds");

        let game = app.game.as_ref().expect("new session started");
        assert_ne!(game.maze(), &first);
        assert_eq!(game.player().steps(), 0);
    }

    #[test]
    fn test_quit_request_sets_exit() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");

        app.pending_actions.push(Action::Quit);
        app.update(t0).expect("update succeeds");

        assert!(app.exit);
    }

    #[test]
    fn test_pause_menu_save_keeps_session_paused() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.start_generation(t0).expect("generation succeeds");
        app.game.as_mut().expect("session started").pause(t0);

        app.pause_item = PauseMenuItem::SaveGame;
        app.select_pause_item(t0).expect("save succeeds");

        assert_eq!(
            app.game.as_ref().map(GameState::mode),
            Some(SessionMode::Paused)
        );
        assert!(app.store.load_snapshot().is_ok());
    }
}
