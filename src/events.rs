//! Event handling functions for user input and application state updates.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::{
    game::SessionMode,
    keys::Action,
    maze::Direction,
    types::{MainMenuItem, MenuItem as _, PauseMenuItem, Screen, SettingsItem},
    view::Offset,
    App,
};

/// How long a direction counts as held after its last press when the terminal does not report
/// key releases.
///
/// Kept below the movement delay so that a single tap moves the player at most once, while the
/// terminal's key repeat keeps a held key inside the window.
pub(crate) const HOLD_WINDOW: Duration = Duration::from_millis(120);

/// Tracker of the direction keys currently held down.
#[derive(Debug, Default)]
pub(crate) struct HeldKeys {
    /// Whether the terminal reports key releases.
    releases: bool,
    /// Time of the last press or repeat of each direction that is down.
    down: BTreeMap<Direction, Instant>,
    /// Directions pressed since the last sample, so that taps shorter than a frame still count.
    tapped: Vec<Direction>,
}

impl HeldKeys {
    /// Selects between release tracking and the hold-window fallback.
    pub(crate) fn set_release_events(&mut self, releases: bool) {
        self.releases = releases;
    }

    /// Records a press or repeat of `direction`.
    pub(crate) fn press(&mut self, direction: Direction, now: Instant) {
        let _ = self.down.insert(direction, now);
        if !self.tapped.contains(&direction) {
            self.tapped.push(direction);
        }
    }

    /// Records a release of `direction`.
    pub(crate) fn release(&mut self, direction: Direction) {
        let _ = self.down.remove(&direction);
    }

    /// Forgets every key, for screen changes.
    pub(crate) fn clear(&mut self) {
        self.down.clear();
        self.tapped.clear();
    }

    /// Directions held at `now`, in priority order, and resets the tap list.
    pub(crate) fn sample(&mut self, now: Instant) -> Vec<Direction> {
        let held = Direction::ALL
            .into_iter()
            .filter(|direction| {
                self.tapped.contains(direction)
                    || self.down.get(direction).is_some_and(|at| {
                        self.releases || now.saturating_duration_since(*at) < HOLD_WINDOW
                    })
            })
            .collect();
        self.tapped.clear();

        held
    }
}

/// Lower-case name of a key, as used in the key binding file.
pub(crate) fn key_code_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "space".to_owned(),
        KeyCode::Char(c) => c.to_lowercase().collect(),
        KeyCode::F(number) => format!("f{number}"),
        KeyCode::Up => "up".to_owned(),
        KeyCode::Down => "down".to_owned(),
        KeyCode::Left => "left".to_owned(),
        KeyCode::Right => "right".to_owned(),
        KeyCode::Esc => "esc".to_owned(),
        KeyCode::Enter => "enter".to_owned(),
        KeyCode::Tab => "tab".to_owned(),
        KeyCode::Backspace => "backspace".to_owned(),
        KeyCode::Delete => "delete".to_owned(),
        KeyCode::Insert => "insert".to_owned(),
        KeyCode::Home => "home".to_owned(),
        KeyCode::End => "end".to_owned(),
        KeyCode::PageUp => "pageup".to_owned(),
        KeyCode::PageDown => "pagedown".to_owned(),
        _ => return None,
    };

    Some(name)
}

/// Menu navigation intent of a key, shared by every menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuKey {
    /// Move the highlight down.
    Down,
    /// Move the highlight up.
    Up,
    /// Pick the highlighted item.
    Select,
    /// Leave the menu.
    Back,
}

/// Maps the fixed menu keys: j/k or arrows to move, l or Enter to select, h or Esc to go back.
const fn menu_key(code: KeyCode) -> Option<MenuKey> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => Some(MenuKey::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(MenuKey::Up),
        KeyCode::Char('l') | KeyCode::Enter => Some(MenuKey::Select),
        KeyCode::Char('h') | KeyCode::Esc => Some(MenuKey::Back),
        _ => None,
    }
}

/// Waits up to `timeout` for input and handles every event that arrived.
///
/// This function blocks on the first event only; the ones queued behind it are drained without
/// waiting, so a burst of key repeats never delays the next frame by more than the timeout.
pub(crate) fn handle_events(app: &mut App, timeout: Duration) -> Result<()> {
    if event::poll(timeout)? {
        handle_event(app, event::read()?, Instant::now())?;
        while event::poll(Duration::ZERO)? {
            handle_event(app, event::read()?, Instant::now())?;
        }
    }

    Ok(())
}

/// Dispatches a single terminal event.
pub(crate) fn handle_event(app: &mut App, event: Event, now: Instant) -> Result<()> {
    match event {
        Event::Key(key) => handle_key(app, key, now),
        Event::Mouse(mouse) => {
            handle_mouse(app, mouse);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Handles a key event according to the current screen.
fn handle_key(app: &mut App, key: KeyEvent, now: Instant) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.exit = true;
        return Ok(());
    }

    if key.kind == KeyEventKind::Release {
        if app.screen == Screen::InGame {
            handle_in_game_release(app, key.code);
        }
        return Ok(());
    }

    match app.screen {
        Screen::MainMenu(item) => handle_main_menu(app, item, key.code),
        Screen::SizeMenu(idx) => handle_size_menu(app, idx, key.code, now)?,
        Screen::Settings(item) => handle_settings(app, item, key.code),
        Screen::Leaderboard => {
            if menu_key(key.code).is_some_and(|intent| intent != MenuKey::Down && intent != MenuKey::Up)
            {
                app.screen = Screen::MainMenu(MainMenuItem::Leaderboard);
            }
        }
        Screen::Generating => app.finish_generation(now)?,
        Screen::InGame => handle_in_game(app, key, now)?,
    }

    Ok(())
}

/// Handles keys on the main menu.
fn handle_main_menu(app: &mut App, item: MainMenuItem, code: KeyCode) {
    match (menu_key(code), code) {
        (Some(MenuKey::Down), _) => app.screen = Screen::MainMenu(item.next()),
        (Some(MenuKey::Up), _) => app.screen = Screen::MainMenu(item.previous()),
        (Some(MenuKey::Select), _) => match item {
            MainMenuItem::StartGame => app.screen = Screen::SizeMenu(app.size_index),
            MainMenuItem::Leaderboard => app.open_leaderboard(),
            MainMenuItem::Settings => app.screen = Screen::Settings(SettingsItem::Theme),
            MainMenuItem::Quit => app.exit = true,
        },
        (Some(MenuKey::Back), _) | (None, KeyCode::Char('q')) => app.exit = true,
        (None, _) => {}
    }
}

/// Handles keys on the size menu.
fn handle_size_menu(app: &mut App, idx: usize, code: KeyCode, now: Instant) -> Result<()> {
    let len = app.config.sizes.len().max(1);

    match menu_key(code) {
        Some(MenuKey::Down) => app.screen = Screen::SizeMenu((idx + 1) % len),
        Some(MenuKey::Up) => app.screen = Screen::SizeMenu((idx + len - 1) % len),
        Some(MenuKey::Select) => {
            app.size_index = idx;
            app.start_generation(now)?;
        }
        Some(MenuKey::Back) => app.screen = Screen::MainMenu(MainMenuItem::StartGame),
        None => {}
    }

    Ok(())
}

/// Handles keys on the settings menu.
///
/// When a session exists the screen was opened from the pause menu, so leaving it goes back to
/// the paused game and a hint toggle applies to that session as well.
fn handle_settings(app: &mut App, item: SettingsItem, code: KeyCode) {
    match menu_key(code) {
        Some(MenuKey::Down) => app.screen = Screen::Settings(item.next()),
        Some(MenuKey::Up) => app.screen = Screen::Settings(item.previous()),
        Some(MenuKey::Select) => match item {
            SettingsItem::Theme => app.settings.theme = app.settings.theme.next(),
            SettingsItem::HintPath => {
                app.settings.show_hint_path = !app.settings.show_hint_path;
                if let Some(game) = app.game.as_mut() {
                    game.set_show_hint_path(app.settings.show_hint_path);
                }
            }
            SettingsItem::Back => leave_settings(app),
        },
        Some(MenuKey::Back) => leave_settings(app),
        None => {}
    }
}

/// Returns from the settings menu to wherever it was opened from.
fn leave_settings(app: &mut App) {
    app.screen = if app.game.is_some() {
        Screen::InGame
    } else {
        Screen::MainMenu(MainMenuItem::Settings)
    };
}

/// Handles a key press or repeat on the in-game screen.
///
/// While the session is paused, the menu keys drive the pause menu, going back resumes the
/// session, and every other key still goes through the bindings, where only pause and quit have
/// an effect.
fn handle_in_game(app: &mut App, key: KeyEvent, now: Instant) -> Result<()> {
    let paused = app
        .game
        .as_ref()
        .is_some_and(|game| game.mode() == SessionMode::Paused);

    if paused {
        match menu_key(key.code) {
            Some(MenuKey::Down) => {
                app.pause_item = app.pause_item.next();
                return Ok(());
            }
            Some(MenuKey::Up) => {
                app.pause_item = app.pause_item.previous();
                return Ok(());
            }
            Some(MenuKey::Select) => return app.select_pause_item(now),
            Some(MenuKey::Back) => {
                if let Some(game) = app.game.as_mut() {
                    game.resume(now);
                }
                return Ok(());
            }
            None => {}
        }
    }

    let Some(action) = key_code_name(key.code).and_then(|name| app.bindings.action_for(&name))
    else {
        return Ok(());
    };

    match action.direction() {
        Some(direction) => app.input.press(direction, now),
        None if key.kind == KeyEventKind::Press => {
            if action == Action::Pause {
                app.pause_item = PauseMenuItem::Resume;
            }
            app.pending_actions.push(action);
        }
        None => {}
    }

    Ok(())
}

/// Handles a key release on the in-game screen.
fn handle_in_game_release(app: &mut App, code: KeyCode) {
    if let Some(direction) = key_code_name(code)
        .and_then(|name| app.bindings.action_for(&name))
        .and_then(Action::direction)
    {
        app.input.release(direction);
    }
}

/// Handles zooming with the wheel and panning with a left-button drag.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let Some(view) = app.active_view_mut() else {
        return;
    };
    let pointer = Offset::new(f64::from(mouse.column), f64::from(mouse.row));

    match mouse.kind {
        MouseEventKind::ScrollUp => view.zoom_in(),
        MouseEventKind::ScrollDown => view.zoom_out(),
        MouseEventKind::Down(MouseButton::Left) => view.begin_drag(pointer),
        MouseEventKind::Drag(MouseButton::Left) => view.drag_to(pointer),
        MouseEventKind::Up(MouseButton::Left) => view.end_drag(),
        _ => {}
    }
}
