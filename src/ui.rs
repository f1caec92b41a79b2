//! User interface rendering functions for all application screens.

use std::{ops::Range, rc::Rc, time::Instant};

use color_eyre::eyre::Result;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize as _},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::{
    app::{App, Notice},
    game::{GameState, SessionMode},
    keys::{Action, KeyBindings},
    maze::{Maze, MazeSize, Position},
    types::{MenuItem, MenuType, Screen, SettingsItem, Theme},
    view::{CellRect, CellSize, ViewState, ViewTransform},
};

/// Width of every menu box, borders included.
const MENU_WIDTH: u16 = 34;
/// Height of the info bar below the maze, border included.
const INFO_BAR_HEIGHT: u16 = 3;
/// Colour of uncollected power-ups in every theme.
const POWER_UP_COLOR: Color = Color::Rgb(255, 200, 0);
/// Colour of success messages and of the win popup.
const SUCCESS_COLOR: Color = Color::Rgb(50, 255, 50);
/// Colour of failure messages.
const FAILURE_COLOR: Color = Color::Rgb(255, 80, 80);

/// Colours of a theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Palette {
    /// Wall cells.
    wall: Color,
    /// Open cells.
    path: Color,
    /// The player marker.
    player: Color,
    /// The exit marker.
    exit: Color,
    /// Previously visited cells.
    trail: Color,
    /// Hint route.
    hint: Color,
    /// Screen background around the maze and the menus.
    background: Color,
    /// Info bar and menu background.
    info_bar: Color,
    /// Regular text.
    text: Color,
    /// Selected menu items and the exit of a solved maze.
    highlight: Color,
}

impl Palette {
    /// Colours of `theme`.
    const fn of(theme: Theme) -> Self {
        match theme {
            Theme::Classic => Self {
                wall: Color::Rgb(0, 0, 0),
                path: Color::Rgb(255, 255, 255),
                player: Color::Rgb(50, 50, 255),
                exit: Color::Rgb(255, 255, 120),
                trail: Color::Rgb(100, 149, 237),
                hint: Color::Rgb(255, 140, 0),
                background: Color::Rgb(135, 206, 235),
                info_bar: Color::Rgb(40, 40, 40),
                text: Color::Rgb(255, 255, 255),
                highlight: Color::Rgb(255, 255, 120),
            },
            Theme::Dark => Self {
                wall: Color::Rgb(20, 20, 20),
                path: Color::Rgb(30, 30, 30),
                player: Color::Rgb(0, 255, 255),
                exit: Color::Rgb(255, 100, 100),
                trail: Color::Rgb(0, 100, 255),
                hint: Color::Rgb(0, 255, 255),
                background: Color::Rgb(10, 10, 10),
                info_bar: Color::Rgb(10, 10, 10),
                text: Color::Rgb(200, 200, 200),
                highlight: Color::Rgb(255, 100, 100),
            },
            Theme::Forest => Self {
                wall: Color::Rgb(34, 50, 20),
                path: Color::Rgb(170, 220, 140),
                player: Color::Rgb(20, 100, 20),
                exit: Color::Rgb(255, 220, 145),
                trail: Color::Rgb(60, 100, 20),
                hint: Color::Rgb(0, 100, 0),
                background: Color::Rgb(130, 170, 110),
                info_bar: Color::Rgb(20, 40, 10),
                text: Color::Rgb(220, 220, 180),
                highlight: Color::Rgb(255, 220, 145),
            },
            Theme::Sunset => Self {
                wall: Color::Rgb(80, 30, 0),
                path: Color::Rgb(255, 190, 140),
                player: Color::Rgb(255, 50, 0),
                exit: Color::Rgb(255, 255, 120),
                trail: Color::Rgb(255, 120, 20),
                hint: Color::Rgb(255, 140, 0),
                background: Color::Rgb(255, 150, 100),
                info_bar: Color::Rgb(100, 50, 10),
                text: Color::Rgb(255, 220, 180),
                highlight: Color::Rgb(255, 255, 120),
            },
        }
    }

    /// Style of a menu entry.
    const fn item(self, active: bool) -> Style {
        if active {
            Style::new().fg(self.info_bar).bg(self.highlight)
        } else {
            Style::new().fg(self.text).bg(self.info_bar)
        }
    }
}

/// Updates the application UI based on the persistent state.
///
/// This function renders different screens based on the current state stored in the [`App`]
/// structure, dispatching to the appropriate rendering function for each screen type. The colours
/// follow the selected theme.
///
/// # Errors
///
/// This function may return errors from data conversion failures while laying out the screen.
pub(crate) fn draw(app: &App, frame: &mut Frame) -> Result<()> {
    let palette = Palette::of(app.settings.theme);
    clear(frame, palette);

    match app.screen {
        Screen::MainMenu(item) => fixed_menu(frame, MenuType::MainMenu(4), item, palette),
        Screen::SizeMenu(idx) => size_menu(app, frame, idx, palette)?,
        Screen::Settings(item) => settings_menu(app, frame, item, palette),
        Screen::Leaderboard => leaderboard(app, frame, palette)?,
        Screen::Generating => generating(app, frame, palette)?,
        Screen::InGame => in_game(app, frame, palette)?,
    }

    Ok(())
}

/// Clears the terminal screen and paints the theme background.
///
/// This function renders a clear widget over the entire area of the frame to prepare for
/// rendering new content without artifacts from previous buffers rendered on the same frame.
fn clear(frame: &mut Frame, palette: Palette) {
    frame.render_widget(Clear, frame.area());
    frame.render_widget(
        Block::new().style(Style::new().bg(palette.background)),
        frame.area(),
    );
}

/// Renders the generic layout structure shared by every menu.
///
/// This function creates the centered box with its border and title, and returns one row per
/// menu entry. The specific menu content is handled by the caller using the [`MenuType`]
/// parameter. The box is cleared first, so menus can be drawn over the maze.
#[expect(
    clippy::indexing_slicing,
    reason = "The collection is created in-place with few, known elements; there is no risk of bad indexing."
)]
fn init_menu(frame: &mut Frame, menu: MenuType, palette: Palette) -> Rc<[Rect]> {
    let layout = Layout::vertical([Constraint::Length(menu.value() + 2)])
        .flex(Flex::Center)
        .split(frame.area())[0];
    let layout = Layout::horizontal([Constraint::Length(MENU_WIDTH)])
        .flex(Flex::Center)
        .split(layout)[0];

    let block = Block::bordered()
        .title(menu.repr())
        .title_bottom("(j) down / (k) up / (l) select")
        .title_alignment(Alignment::Center)
        .style(palette.item(false))
        .border_type(BorderType::Rounded);

    let inner_space = block.inner(layout);

    frame.render_widget(Clear, layout);
    frame.render_widget(block, layout);

    Layout::vertical(vec![Constraint::Length(1); menu.value().into()]).split(inner_space)
}

/// Renders a menu made of `labels`, highlighting the one at `selected`.
fn render_menu<S: AsRef<str>>(
    frame: &mut Frame,
    menu: MenuType,
    labels: &[S],
    selected: usize,
    palette: Palette,
) {
    let rows = init_menu(frame, menu, palette);

    for (idx, (label, row)) in labels.iter().zip(rows.iter()).enumerate() {
        let line = Line::raw(label.as_ref())
            .centered()
            .style(palette.item(idx == selected));
        frame.render_widget(line, *row);
    }
}

/// Renders one of the menus with fixed entries.
fn fixed_menu<T: MenuItem>(frame: &mut Frame, menu: MenuType, selected: T, palette: Palette) {
    let labels: Vec<&str> = T::ALL.iter().copied().map(T::label).collect();
    let selected = T::ALL
        .iter()
        .position(|item| *item == selected)
        .unwrap_or(0);

    render_menu(frame, menu, &labels, selected, palette);
}

/// Renders the size selection menu.
///
/// Preset sizes are shown with their difficulty name, and a size given on the command line is
/// shown as custom.
fn size_menu(app: &App, frame: &mut Frame, selected: usize, palette: Palette) -> Result<()> {
    let labels: Vec<String> = app.config.sizes.iter().copied().map(size_label).collect();

    render_menu(
        frame,
        MenuType::SizeMenu(u16::try_from(labels.len())?),
        &labels,
        selected,
        palette,
    );

    Ok(())
}

/// Menu label of a maze size.
fn size_label(size: MazeSize) -> String {
    let name = match MazeSize::PRESETS.iter().position(|preset| *preset == size) {
        Some(0) => "Small",
        Some(1) => "Medium",
        Some(2) => "Large",
        _ => "Custom",
    };

    format!("{name} ({size})")
}

/// Renders the settings menu with the current value of every setting.
fn settings_menu(app: &App, frame: &mut Frame, item: SettingsItem, palette: Palette) {
    let labels = [
        format!(
            "{}: {}",
            SettingsItem::Theme.label(),
            app.settings.theme.name()
        ),
        format!(
            "{}: {}",
            SettingsItem::HintPath.label(),
            on_off(app.settings.show_hint_path)
        ),
        SettingsItem::Back.label().to_owned(),
    ];
    let selected = SettingsItem::ALL
        .iter()
        .position(|entry| *entry == item)
        .unwrap_or(0);

    render_menu(frame, MenuType::Settings(3), &labels, selected, palette);
}

/// Renders the best runs, fastest first.
fn leaderboard(app: &App, frame: &mut Frame, palette: Palette) -> Result<()> {
    let mut lines: Vec<Line> = app
        .leaderboard
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            Line::raw(format!(
                "{}. Time: {}s, Steps: {}",
                idx + 1,
                entry.time,
                entry.steps
            ))
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::raw("No runs yet"));
    }

    let height = u16::try_from(lines.len())?.saturating_add(2);
    let area = centered(frame.area(), MENU_WIDTH, height)?;
    let block = Block::bordered()
        .title("Leaderboard")
        .title_bottom("(l) / (h) return")
        .title_alignment(Alignment::Center)
        .style(palette.item(false))
        .border_type(BorderType::Rounded);

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).centered().block(block), area);

    Ok(())
}

/// Renders the maze while it is being carved.
///
/// The room the carver stands on is highlighted and the info bar shows how many rooms have been
/// opened so far.
fn generating(app: &App, frame: &mut Frame, palette: Palette) -> Result<()> {
    let Some(animation) = app.generation.as_ref() else {
        return Ok(());
    };
    let [maze_area, bar_area] = split_info_bar(frame.area());

    let marks = animation
        .current()
        .map(|pos| Mark {
            pos,
            style: Style::new().bg(palette.player),
            glyph: " ",
        })
        .into_iter()
        .collect();
    frame.render_widget(
        MazeView {
            maze: animation.maze(),
            view: &app.generation_view,
            palette,
            marks,
        },
        maze_area,
    );

    let (carved, rooms) = animation.progress();
    let percent = rounded_div::i32(
        i32::try_from(carved.saturating_mul(100))?,
        i32::try_from(rooms.max(1))?,
    );
    let status = format!(
        "Generating {} maze... {percent}%",
        app.selected_size()
    );
    info_bar(
        frame,
        bar_area,
        "(any key) skip",
        vec![Line::raw(status)],
        palette,
    );

    Ok(())
}

/// Renders the in-game screen with the maze, the info bar, and the pause or win overlay.
fn in_game(app: &App, frame: &mut Frame, palette: Palette) -> Result<()> {
    let Some(game) = app.game.as_ref() else {
        return Ok(());
    };
    let [maze_area, bar_area] = split_info_bar(frame.area());

    frame.render_widget(
        MazeView {
            maze: game.maze(),
            view: game.view(),
            palette,
            marks: session_marks(game, palette),
        },
        maze_area,
    );

    let status = format!(
        "Time: {}s | Steps: {} | Size: {}x{} | Zoom: {:.1}x",
        game.elapsed(Instant::now()).as_secs(),
        game.player().steps(),
        game.maze().width(),
        game.maze().height(),
        game.view().zoom()
    );
    let status_style = if game.mode() == SessionMode::Won {
        Style::new().fg(SUCCESS_COLOR)
    } else {
        Style::new()
    };
    let remaining = game
        .power_ups()
        .iter()
        .filter(|power_up| !power_up.is_collected())
        .count();
    let detail = app.notice.map_or_else(
        || {
            Line::raw(format!(
                "Power-ups left: {remaining} | Hint path: {}",
                on_off(game.show_hint_path())
            ))
        },
        notice_line,
    );
    info_bar(
        frame,
        bar_area,
        &controls_hint(&app.bindings),
        vec![Line::styled(status, status_style), detail],
        palette,
    );

    match game.mode() {
        SessionMode::Playing => {}
        SessionMode::Paused => fixed_menu(frame, MenuType::PauseMenu(8), app.pause_item, palette),
        SessionMode::Won => win_popup(frame, maze_area, &app.bindings, palette)?,
    }

    Ok(())
}

/// Markers drawn over the bare maze of a session, bottom layer first.
fn session_marks(game: &GameState, palette: Palette) -> Vec<Mark> {
    let mut marks: Vec<Mark> = game
        .player()
        .trail()
        .iter()
        .map(|pos| Mark {
            pos: *pos,
            style: Style::new().fg(palette.trail).bg(palette.path),
            glyph: ".",
        })
        .collect();

    if let Some(hint) = game.hint().filter(|_| game.show_hint_path()) {
        marks.extend(hint.path().iter().map(|pos| Mark {
            pos: *pos,
            style: Style::new().fg(palette.hint).bg(palette.path).bold(),
            glyph: "+",
        }));
    }

    marks.extend(
        game.power_ups()
            .iter()
            .filter(|power_up| !power_up.is_collected())
            .map(|power_up| Mark {
                pos: power_up.pos(),
                style: Style::new().fg(POWER_UP_COLOR).bg(palette.path).bold(),
                glyph: "*",
            }),
    );

    let exit = if game.mode() == SessionMode::Won {
        palette.highlight
    } else {
        palette.exit
    };
    marks.push(Mark {
        pos: game.exit(),
        style: Style::new().fg(palette.wall).bg(exit),
        glyph: "E",
    });
    marks.push(Mark {
        pos: game.player().pos(),
        style: Style::new().fg(palette.text).bg(palette.player).bold(),
        glyph: "@",
    });

    marks
}

/// Renders the popup shown once the exit is reached.
fn win_popup(frame: &mut Frame, area: Rect, bindings: &KeyBindings, palette: Palette) -> Result<()> {
    let keys = format!(
        "({}) new maze / ({}) restart / ({}) menu / ({}) quit",
        key_label(bindings, Action::NewMaze),
        key_label(bindings, Action::Restart),
        key_label(bindings, Action::Menu),
        key_label(bindings, Action::Quit)
    );
    let width = u16::try_from(keys.len())?.saturating_add(4);
    let popup = centered(area, width, 4)?;

    let block = Block::bordered()
        .title("Solved")
        .title_alignment(Alignment::Center)
        .style(Style::new().fg(SUCCESS_COLOR).bg(palette.info_bar))
        .border_type(BorderType::Rounded);
    let lines = vec![Line::raw("You found the exit!").bold(), Line::raw(keys)];

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).centered().block(block), popup);

    Ok(())
}

/// Splits the screen into the maze viewport and the info bar below it.
fn split_info_bar(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(1), Constraint::Length(INFO_BAR_HEIGHT)]).areas(area)
}

/// Renders the info bar with a key hint title.
fn info_bar(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, palette: Palette) {
    let block = Block::new()
        .borders(Borders::TOP)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::new().fg(palette.text).bg(palette.info_bar))
        .border_type(BorderType::Plain);

    frame.render_widget(Paragraph::new(lines).centered().block(block), area);
}

/// Info bar line of a save or load notice.
fn notice_line(notice: Notice) -> Line<'static> {
    let color = if notice.success {
        SUCCESS_COLOR
    } else {
        FAILURE_COLOR
    };

    Line::styled(notice.text, Style::new().fg(color).bold())
}

/// Key hint shown on top of the info bar during play.
fn controls_hint(bindings: &KeyBindings) -> String {
    format!(
        "({}) pause / ({}) hint / ({}) hint path / ({}) save / ({}) load",
        key_label(bindings, Action::Pause),
        key_label(bindings, Action::Hint),
        key_label(bindings, Action::ToggleHint),
        key_label(bindings, Action::Save),
        key_label(bindings, Action::Load)
    )
}

/// First code bound to `action`.
fn key_label(bindings: &KeyBindings, action: Action) -> &str {
    bindings.codes(action).first().map_or("-", String::as_str)
}

/// Display form of a switch.
const fn on_off(value: bool) -> &'static str {
    if value {
        "On"
    } else {
        "Off"
    }
}

/// Centers a box of at most `width` by `height` cells in `area`.
///
/// # Errors
///
/// This function may return an error if the offset does not fit in a screen coordinate.
fn centered(area: Rect, width: u16, height: u16) -> Result<Rect> {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = rounded_div::i32(i32::from(area.width - width), 2);
    let y = rounded_div::i32(i32::from(area.height - height), 2);

    Ok(Rect::new(
        area.x.saturating_add(u16::try_from(x)?),
        area.y.saturating_add(u16::try_from(y)?),
        width,
        height,
    ))
}

/// A glyph and style painted over a maze cell.
#[derive(Clone, Copy, Debug)]
struct Mark {
    /// Cell to paint.
    pos: Position,
    /// Colours of the whole cell.
    style: Style,
    /// Symbol in the top-left corner of the cell.
    glyph: &'static str,
}

/// Maze viewport honouring the zoom and pan of a [`ViewState`].
///
/// Every cell is painted as a block of terminal cells, twice as wide as it is tall, so the maze
/// keeps its square proportions. Marks are painted in order over the bare maze.
struct MazeView<'view> {
    /// Maze to draw.
    maze: &'view Maze,
    /// Zoom and pan.
    view: &'view ViewState,
    /// Colours.
    palette: Palette,
    /// Markers over the maze, bottom layer first.
    marks: Vec<Mark>,
}

impl Widget for MazeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let viewport = CellRect {
            x: f64::from(area.x),
            y: f64::from(area.y),
            width: f64::from(area.width),
            height: f64::from(area.height),
        };
        let transform = ViewTransform::centered(
            self.view,
            CellSize::TERMINAL,
            (self.maze.width(), self.maze.height()),
            viewport,
        );

        for pos in self.maze.positions() {
            let color = if self.maze.is_open(pos) {
                self.palette.path
            } else {
                self.palette.wall
            };
            paint_cell(buf, area, &transform, pos, Style::new().bg(color), " ");
        }

        for mark in &self.marks {
            paint_cell(buf, area, &transform, mark.pos, mark.style, mark.glyph);
        }
    }
}

/// Paints the screen cells covered by the maze cell at `pos`, clipped to `area`.
fn paint_cell(
    buf: &mut Buffer,
    area: Rect,
    transform: &ViewTransform,
    pos: Position,
    style: Style,
    glyph: &str,
) {
    let rect = transform.cell_rect(pos);
    let columns = screen_span(rect.x, rect.width, area.left()..area.right());
    let rows = screen_span(rect.y, rect.height, area.top()..area.bottom());

    for y in rows.clone() {
        for x in columns.clone() {
            let symbol = if x == columns.start && y == rows.start {
                glyph
            } else {
                " "
            };
            if let Some(cell) = buf.cell_mut((x, y)) {
                let _ = cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

/// Screen cells covered by an extent starting at `start`, clipped to `bounds`.
///
/// Extents narrower than a cell still cover one, so heavily zoomed-out mazes stay visible.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Both ends are clamped to the viewport bounds, which are u16 values."
)]
fn screen_span(start: f64, extent: f64, bounds: Range<u16>) -> Range<u16> {
    let low = f64::from(bounds.start);
    let high = f64::from(bounds.end);
    let first = start.floor();
    let last = (start + extent).floor().max(first + 1.0);

    (first.clamp(low, high) as u16)..(last.clamp(low, high) as u16)
}
