//! Game session module.
//!
//! This module contains [`GameState`], the single owner of a play session. The application feeds
//! it one [`TickInput`] per frame and gets a [`TickReport`] back; everything that changes the
//! player, the power-ups, the hint or the session mode happens inside [`GameState::tick`].

use std::{
    rc::Rc,
    time::{Duration, Instant},
};

use rand::{seq::SliceRandom as _, Rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{GameError, PersistenceError},
    keys::Action,
    maze::{Direction, Maze, Position},
    pathfinding::shortest_path,
    persistence::{LeaderboardEntry, Snapshot, SNAPSHOT_VERSION},
    view::{Offset, ViewState},
};

/// Minimum time between two accepted moves.
pub const MOVE_DELAY: Duration = Duration::from_millis(150);
/// Lifetime of a hint route.
pub const HINT_DURATION: Duration = Duration::from_millis(4000);
/// Number of power-ups placed in a fresh session.
pub const POWER_UP_COUNT: usize = 5;

/// Coarse state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// The player can move.
    Playing,
    /// Movement and the clock are frozen.
    Paused,
    /// The exit was reached. Terminal for this maze.
    Won,
}

/// What a power-up does when collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Shows the route to the exit.
    Hint,
}

/// Collectable item lying on an open cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    /// Cell the power-up lies on.
    pos: Position,
    /// Effect of the power-up.
    kind: PowerUpKind,
    /// Set once the player walks over it. Never reset.
    collected: bool,
}

impl PowerUp {
    /// An uncollected power-up.
    #[must_use]
    pub const fn new(pos: Position, kind: PowerUpKind) -> Self {
        Self {
            pos,
            kind,
            collected: false,
        }
    }

    /// Cell the power-up lies on.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }

    /// Effect of the power-up.
    #[must_use]
    pub const fn kind(&self) -> PowerUpKind {
        self.kind
    }

    /// Whether the power-up was already collected.
    #[must_use]
    pub const fn is_collected(&self) -> bool {
        self.collected
    }
}

/// Time-limited route to the exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintPath {
    /// Cells from the one after the requester's position up to the exit.
    path: Vec<Position>,
    /// When the route was computed.
    created: Instant,
}

impl HintPath {
    /// Cells of the route, ending with the exit.
    #[must_use]
    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// When the route was computed.
    #[must_use]
    pub const fn created(&self) -> Instant {
        self.created
    }

    /// Whether the route outlived [`HINT_DURATION`] at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > HINT_DURATION
    }
}

/// Position and progress of the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    /// Current cell, always open.
    pos: Position,
    /// Previously occupied cells, oldest first.
    trail: Vec<Position>,
    /// Accepted moves.
    steps: u64,
}

impl PlayerState {
    /// A player standing on `pos` with no history.
    const fn at(pos: Position) -> Self {
        Self {
            pos,
            trail: Vec::new(),
            steps: 0,
        }
    }

    /// Current cell.
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.pos
    }

    /// Previously occupied cells, oldest first.
    #[must_use]
    pub fn trail(&self) -> &[Position] {
        &self.trail
    }

    /// Accepted moves.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }
}

/// Input sampled by the application for a single tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Directions whose keys are currently held.
    pub held: Vec<Direction>,
    /// Actions triggered since the previous tick, in arrival order.
    pub actions: Vec<Action>,
}

/// Request that only the application can fulfil, usually by replacing the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionRequest {
    /// Start the same maze over.
    Restart,
    /// Generate a fresh maze.
    NewMaze,
    /// Leave to the main menu.
    Menu,
    /// Leave the game.
    Quit,
    /// Write the session to the save slot.
    Save,
    /// Replace the session with the save slot.
    Load,
}

/// Outcome of a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Result to record, set only on the tick the exit was reached.
    pub win: Option<LeaderboardEntry>,
    /// Cells whose power-ups were collected this tick.
    pub collected: Vec<Position>,
    /// Requests for the application, in arrival order.
    pub requests: Vec<SessionRequest>,
}

/// Elapsed play time bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SessionClock {
    /// When the session was created or loaded.
    started: Instant,
    /// Play time carried over from a save slot.
    carried: Duration,
    /// Sum of the finished pauses.
    paused_total: Duration,
    /// Start of the current pause, or the moment of the win.
    frozen_at: Option<Instant>,
}

impl SessionClock {
    /// A running clock that already shows `carried`.
    const fn new(now: Instant, carried: Duration) -> Self {
        Self {
            started: now,
            carried,
            paused_total: Duration::ZERO,
            frozen_at: None,
        }
    }

    /// Play time at `now`.
    fn elapsed(&self, now: Instant) -> Duration {
        let until = self.frozen_at.unwrap_or(now);

        (self.carried + until.saturating_duration_since(self.started))
            .saturating_sub(self.paused_total)
    }

    /// Stops the clock. Freezing a frozen clock keeps the first freeze.
    fn freeze(&mut self, now: Instant) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(now);
        }
    }

    /// Restarts a frozen clock, discarding the frozen interval.
    fn thaw(&mut self, now: Instant) {
        if let Some(at) = self.frozen_at.take() {
            self.paused_total += now.saturating_duration_since(at);
        }
    }
}

/// A single play session on one maze.
///
/// The maze is shared with the session that may replace this one on restart, so it lives behind
/// an [`Rc`]. Everything else is owned exclusively and only changes through [`Self::tick`] or the
/// pause helpers used by the pause menu.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Maze being played.
    maze: Rc<Maze>,
    /// Cell the player starts on.
    start: Position,
    /// Goal cell, distinct from the start.
    exit: Position,
    /// Player progress.
    player: PlayerState,
    /// Power-ups of the session.
    power_ups: Vec<PowerUp>,
    /// Active hint route.
    hint: Option<HintPath>,
    /// Coarse state.
    mode: SessionMode,
    /// Render-only zoom and pan.
    view: ViewState,
    /// Whether hint routes are drawn.
    show_hint_path: bool,
    /// Play time.
    clock: SessionClock,
    /// When the last move was accepted.
    last_move: Option<Instant>,
}

impl GameState {
    /// Starts a session on `maze`.
    ///
    /// This function places the player on the maze's start cell and scatters [`POWER_UP_COUNT`]
    /// hint power-ups over the other open cells using `rng`. Passing the generator that carved the
    /// maze keeps a whole session reproducible from one seed.
    ///
    /// # Errors
    ///
    /// - [`GameError::NoEndpoints`] if the maze has fewer than two open cells.
    pub fn new<R: Rng + ?Sized>(
        maze: Rc<Maze>,
        rng: &mut R,
        now: Instant,
    ) -> Result<Self, GameError> {
        let (start, exit) = maze.endpoints().ok_or(GameError::NoEndpoints)?;
        let power_ups = place_power_ups(&maze, start, exit, rng);
        info!(
            width = maze.width(),
            height = maze.height(),
            ?start,
            ?exit,
            "started session"
        );

        Ok(Self {
            maze,
            start,
            exit,
            player: PlayerState::at(start),
            power_ups,
            hint: None,
            mode: SessionMode::Playing,
            view: ViewState::new(),
            show_hint_path: true,
            clock: SessionClock::new(now, Duration::ZERO),
            last_move: None,
        })
    }

    /// Starts the same maze over with fresh power-ups and an unzoomed view.
    ///
    /// # Errors
    ///
    /// - [`GameError::NoEndpoints`] if the shared maze lost its endpoints, which cannot happen to a
    ///   maze that already started a session.
    pub fn restart<R: Rng + ?Sized>(&self, rng: &mut R, now: Instant) -> Result<Self, GameError> {
        let mut session = Self::new(Rc::clone(&self.maze), rng, now)?;
        session.show_hint_path = self.show_hint_path;

        Ok(session)
    }

    /// Rebuilds a session from a save slot.
    ///
    /// The restored session is playing, with its clock showing the stored play time.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Corrupted`] if the grid is invalid, the player or exit is not open,
    ///   they coincide, or the trail or a power-up lies on a wall.
    pub fn from_snapshot(snapshot: &Snapshot, now: Instant) -> Result<Self, PersistenceError> {
        let maze = snapshot.maze()?;
        let corrupted = |what: &str| PersistenceError::Corrupted(what.to_owned());

        let (start, _) = maze
            .endpoints()
            .ok_or_else(|| corrupted("maze has no endpoints"))?;
        if !maze.is_open(snapshot.player) {
            return Err(corrupted("player is not on an open cell"));
        }
        if !maze.is_open(snapshot.exit) {
            return Err(corrupted("exit is not on an open cell"));
        }
        if snapshot.player == snapshot.exit {
            return Err(corrupted("player already stands on the exit"));
        }
        if !snapshot.trail.iter().all(|pos| maze.is_open(*pos)) {
            return Err(corrupted("trail leaves the open cells"));
        }
        if !snapshot.power_ups.iter().all(|power_up| maze.is_open(power_up.pos)) {
            return Err(corrupted("power-up lies on a wall"));
        }

        Ok(Self {
            maze: Rc::new(maze),
            start,
            exit: snapshot.exit,
            player: PlayerState {
                pos: snapshot.player,
                trail: snapshot.trail.clone(),
                steps: snapshot.steps,
            },
            power_ups: snapshot.power_ups.clone(),
            hint: None,
            mode: SessionMode::Playing,
            view: ViewState::restore(snapshot.zoom, Offset::new(snapshot.pan_x, snapshot.pan_y)),
            show_hint_path: snapshot.show_hint_path,
            clock: SessionClock::new(now, Duration::from_millis(snapshot.elapsed_ms)),
            last_move: None,
        })
    }

    /// Captures the session for the save slot.
    #[must_use]
    pub fn snapshot(&self, now: Instant, theme: &str) -> Snapshot {
        let pan = self.view.pan();

        Snapshot {
            version: SNAPSHOT_VERSION,
            maze: self.maze.cells().to_vec(),
            width: self.maze.width(),
            height: self.maze.height(),
            player: self.player.pos,
            exit: self.exit,
            trail: self.player.trail.clone(),
            steps: self.player.steps,
            elapsed_ms: u64::try_from(self.elapsed(now).as_millis()).unwrap_or(u64::MAX),
            theme: theme.to_owned(),
            show_hint_path: self.show_hint_path,
            zoom: self.view.zoom(),
            pan_x: pan.x,
            pan_y: pan.y,
            power_ups: self.power_ups.clone(),
        }
    }

    /// Advances the session by one frame.
    ///
    /// This function first applies the triggered actions in order, then drops an expired hint,
    /// then resolves movement, and finally checks for the win. Movement is throttled to one
    /// accepted move per [`MOVE_DELAY`]; on an eligible tick the first held direction, in
    /// [`Direction::ALL`] order, whose target is open moves the player.
    ///
    /// # Errors
    ///
    /// - [`GameError::Path`] if a hint route cannot be computed, which means the maze is broken.
    pub fn tick(&mut self, now: Instant, input: &TickInput) -> Result<TickReport, GameError> {
        let mut report = TickReport::default();

        for action in &input.actions {
            self.apply_action(*action, now, &mut report)?;
        }

        if self.hint.as_ref().is_some_and(|hint| hint.is_expired(now)) {
            debug!("hint expired");
            self.hint = None;
        }

        if self.mode == SessionMode::Playing {
            self.resolve_movement(now, &input.held, &mut report)?;

            if self.player.pos == self.exit {
                self.mode = SessionMode::Won;
                self.clock.freeze(now);
                let entry = LeaderboardEntry {
                    time: self.elapsed(now).as_secs(),
                    steps: self.player.steps,
                };
                info!(time = entry.time, steps = entry.steps, "maze solved");
                report.win = Some(entry);
            }
        }

        Ok(report)
    }

    /// Freezes a playing session.
    ///
    /// Any active hint is dropped. Pausing a paused or won session does nothing.
    pub fn pause(&mut self, now: Instant) {
        if self.mode == SessionMode::Playing {
            self.mode = SessionMode::Paused;
            self.clock.freeze(now);
            self.hint = None;
            debug!("paused");
        }
    }

    /// Resumes a paused session. Resuming a playing or won session does nothing.
    pub fn resume(&mut self, now: Instant) {
        if self.mode == SessionMode::Paused {
            self.mode = SessionMode::Playing;
            self.clock.thaw(now);
            debug!("resumed");
        }
    }

    /// Computes a fresh hint route from the player to the exit, replacing any active one.
    ///
    /// # Errors
    ///
    /// - [`GameError::Path`] if no route exists.
    pub fn request_hint(&mut self, now: Instant) -> Result<(), GameError> {
        let path = shortest_path(&self.maze, self.player.pos, self.exit)?;
        debug!(length = path.len(), "hint computed");
        self.hint = Some(HintPath { path, created: now });

        Ok(())
    }

    /// Maze being played.
    #[must_use]
    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// Cell the player started on.
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Goal cell.
    #[must_use]
    pub const fn exit(&self) -> Position {
        self.exit
    }

    /// Player progress.
    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Power-ups of the session.
    #[must_use]
    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    /// Active hint route.
    #[must_use]
    pub const fn hint(&self) -> Option<&HintPath> {
        self.hint.as_ref()
    }

    /// Coarse state.
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Render-only zoom and pan.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Mutable access to the zoom and pan, for pointer gestures.
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Whether hint routes are drawn.
    #[must_use]
    pub const fn show_hint_path(&self) -> bool {
        self.show_hint_path
    }

    /// Overrides whether hint routes are drawn.
    pub fn set_show_hint_path(&mut self, show: bool) {
        self.show_hint_path = show;
    }

    /// Play time at `now`, excluding pauses and anything after the win.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    /// Applies a single triggered action.
    fn apply_action(
        &mut self,
        action: Action,
        now: Instant,
        report: &mut TickReport,
    ) -> Result<(), GameError> {
        match (self.mode, action) {
            (_, Action::Quit) => report.requests.push(SessionRequest::Quit),
            (SessionMode::Playing, Action::Pause) => self.pause(now),
            (SessionMode::Paused, Action::Pause) => self.resume(now),
            // The pause menu offers everything else while paused.
            (SessionMode::Paused, _)
            | (_, Action::Up | Action::Down | Action::Left | Action::Right)
            | (SessionMode::Won, Action::Pause | Action::Hint | Action::Save) => {}
            (_, Action::Restart) => report.requests.push(SessionRequest::Restart),
            (_, Action::NewMaze) => report.requests.push(SessionRequest::NewMaze),
            (_, Action::Menu) => report.requests.push(SessionRequest::Menu),
            (_, Action::Load) => report.requests.push(SessionRequest::Load),
            (_, Action::Save) => report.requests.push(SessionRequest::Save),
            (_, Action::Hint) => self.request_hint(now)?,
            (_, Action::ToggleHint) => {
                self.show_hint_path = !self.show_hint_path;
                debug!(show = self.show_hint_path, "toggled hint visibility");
            }
        }

        Ok(())
    }

    /// Moves the player if the throttle allows it and a held direction leads to an open cell.
    fn resolve_movement(
        &mut self,
        now: Instant,
        held: &[Direction],
        report: &mut TickReport,
    ) -> Result<(), GameError> {
        if self
            .last_move
            .is_some_and(|last| now.saturating_duration_since(last) <= MOVE_DELAY)
        {
            return Ok(());
        }

        let Some(target) = Direction::ALL
            .into_iter()
            .filter(|direction| held.contains(direction))
            .filter_map(|direction| self.player.pos.step(direction))
            .find(|target| self.maze.is_open(*target))
        else {
            return Ok(());
        };

        self.player.trail.push(self.player.pos);
        self.player.pos = target;
        self.player.steps += 1;
        self.last_move = Some(now);

        self.collect_power_up(now, report)
    }

    /// Collects an uncollected power-up under the player, if any.
    fn collect_power_up(&mut self, now: Instant, report: &mut TickReport) -> Result<(), GameError> {
        let pos = self.player.pos;
        let Some(power_up) = self
            .power_ups
            .iter_mut()
            .find(|power_up| power_up.pos == pos && !power_up.collected)
        else {
            return Ok(());
        };

        power_up.collected = true;
        report.collected.push(pos);
        info!(?pos, "collected power-up");

        match power_up.kind {
            PowerUpKind::Hint => self.request_hint(now),
        }
    }
}

/// Scatters [`POWER_UP_COUNT`] hint power-ups over the open cells other than the endpoints.
fn place_power_ups<R: Rng + ?Sized>(
    maze: &Maze,
    start: Position,
    exit: Position,
    rng: &mut R,
) -> Vec<PowerUp> {
    let mut candidates: Vec<Position> = maze
        .open_cells()
        .filter(|pos| *pos != start && *pos != exit)
        .collect();
    candidates.shuffle(rng);

    candidates
        .into_iter()
        .take(POWER_UP_COUNT)
        .map(|pos| PowerUp::new(pos, PowerUpKind::Hint))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng as _};

    use super::*;
    use crate::maze::{Cell, MazeSize};

    /// A hand-made 5x5 maze shaped like a "Z": start (1,1), exit (3,3).
    ///
    /// ```text
    /// #####
    /// #...#
    /// ###.#
    /// #...#
    /// #####
    /// ```
    fn zigzag() -> Rc<Maze> {
        use crate::maze::Cell::{Open, Wall};

        #[rustfmt::skip]
        let cells = vec![
            Wall, Wall, Wall, Wall, Wall,
            Wall, Open, Open, Open, Wall,
            Wall, Wall, Wall, Open, Wall,
            Wall, Open, Open, Open, Wall,
            Wall, Wall, Wall, Wall, Wall,
        ];
        let size = MazeSize::new(5, 5).expect("valid size");

        Rc::new(Maze::from_cells(size, cells).expect("cell count matches"))
    }

    /// A session on [`zigzag`] without power-ups.
    fn session(now: Instant) -> GameState {
        let mut game =
            GameState::new(zigzag(), &mut StdRng::seed_from_u64(1), now).expect("maze has endpoints");
        game.power_ups.clear();
        game
    }

    /// Input holding the given directions.
    fn hold(directions: &[Direction]) -> TickInput {
        TickInput {
            held: directions.to_vec(),
            actions: Vec::new(),
        }
    }

    /// Input triggering the given actions.
    fn press(actions: &[Action]) -> TickInput {
        TickInput {
            held: Vec::new(),
            actions: actions.to_vec(),
        }
    }

    /// Milliseconds after `t0`.
    fn at(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn test_new_session_starts_at_first_open_cell() {
        let t0 = Instant::now();
        let game = session(t0);

        assert_eq!(game.player().pos(), Position::new(1, 1));
        assert_eq!(game.start(), Position::new(1, 1));
        assert_eq!(game.exit(), Position::new(3, 3));
        assert_eq!(game.mode(), SessionMode::Playing);
        assert!(game.player().trail().is_empty());
        assert_eq!(game.player().steps(), 0);
    }

    #[test]
    fn test_maze_without_endpoints_is_rejected() {
        let size = MazeSize::new(5, 5).expect("valid size");
        let walls = Maze::from_cells(size, vec![Cell::Wall; 25]).expect("cell count matches");

        let result = GameState::new(
            Rc::new(walls),
            &mut StdRng::seed_from_u64(0),
            Instant::now(),
        );

        assert!(matches!(result, Err(GameError::NoEndpoints)));
    }

    #[test]
    fn test_power_ups_avoid_endpoints() {
        let t0 = Instant::now();
        for seed in 0..10 {
            let size = MazeSize::new(15, 15).expect("valid size");
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = Rc::new(Maze::generate(size, &mut rng));
            let game = GameState::new(maze, &mut rng, t0).expect("maze has endpoints");

            assert_eq!(game.power_ups().len(), POWER_UP_COUNT);
            for power_up in game.power_ups() {
                assert!(game.maze().is_open(power_up.pos()), "seed {seed}: on a wall");
                assert_ne!(power_up.pos(), game.start(), "seed {seed}: on the start");
                assert_ne!(power_up.pos(), game.exit(), "seed {seed}: on the exit");
                assert!(!power_up.is_collected());
                assert_eq!(power_up.kind(), PowerUpKind::Hint);
            }

            let mut cells: Vec<Position> =
                game.power_ups().iter().map(PowerUp::pos).collect();
            cells.sort_unstable();
            cells.dedup();
            assert_eq!(cells.len(), POWER_UP_COUNT, "seed {seed}: duplicate cells");
        }
    }

    #[test]
    fn test_moving_into_a_wall_changes_nothing() {
        let t0 = Instant::now();
        let mut game = session(t0);

        for (millis, direction) in [(0, Direction::Up), (200, Direction::Down), (400, Direction::Left)]
        {
            let report = game
                .tick(at(t0, millis), &hold(&[direction]))
                .expect("tick succeeds");

            assert_eq!(report, TickReport::default());
            assert_eq!(game.player().pos(), Position::new(1, 1));
            assert!(game.player().trail().is_empty());
            assert_eq!(game.player().steps(), 0);
        }
    }

    #[test]
    fn test_accepted_move_updates_trail_and_steps() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game
            .tick(t0, &hold(&[Direction::Right]))
            .expect("tick succeeds");

        assert_eq!(game.player().pos(), Position::new(2, 1));
        assert_eq!(game.player().trail(), [Position::new(1, 1)]);
        assert_eq!(game.player().steps(), 1);
    }

    #[test]
    fn test_movement_is_throttled() {
        let t0 = Instant::now();
        let mut game = session(t0);
        let right = hold(&[Direction::Right]);

        let _ = game.tick(t0, &right).expect("tick succeeds");
        for millis in [16, 33, 100, 150] {
            let _ = game.tick(at(t0, millis), &right).expect("tick succeeds");
        }
        assert_eq!(game.player().steps(), 1, "no second move within the delay");

        let _ = game.tick(at(t0, 151), &right).expect("tick succeeds");
        assert_eq!(game.player().pos(), Position::new(3, 1));
        assert_eq!(game.player().steps(), 2);
    }

    #[test]
    fn test_rejected_move_does_not_consume_the_throttle() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game.tick(t0, &hold(&[Direction::Up])).expect("tick succeeds");
        let _ = game
            .tick(at(t0, 16), &hold(&[Direction::Right]))
            .expect("tick succeeds");

        assert_eq!(game.player().pos(), Position::new(2, 1));
    }

    #[test]
    fn test_first_open_held_direction_wins() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game
            .tick(t0, &hold(&[Direction::Right, Direction::Down]))
            .expect("tick succeeds");
        assert_eq!(game.player().pos(), Position::new(2, 1), "down is a wall");

        let _ = game
            .tick(at(t0, 200), &hold(&[Direction::Right]))
            .expect("tick succeeds");
        let _ = game
            .tick(at(t0, 400), &hold(&[Direction::Left, Direction::Down]))
            .expect("tick succeeds");
        assert_eq!(
            game.player().pos(),
            Position::new(3, 2),
            "down comes before left"
        );
    }

    #[test]
    fn test_win_is_reported_exactly_once() {
        let t0 = Instant::now();
        let mut game = session(t0);
        let route = [
            Direction::Right,
            Direction::Right,
            Direction::Down,
            Direction::Down,
        ];

        let mut wins = Vec::new();
        for (millis, direction) in [1000, 2000, 3000, 4000].into_iter().zip(route) {
            let report = game
                .tick(at(t0, millis), &hold(&[direction]))
                .expect("tick succeeds");
            wins.extend(report.win);
        }
        for millis in [5000, 5200, 9000] {
            let report = game
                .tick(at(t0, millis), &hold(&[Direction::Left]))
                .expect("tick succeeds");
            wins.extend(report.win);
        }

        assert_eq!(game.mode(), SessionMode::Won);
        assert_eq!(game.player().pos(), Position::new(3, 3), "won sessions ignore movement");
        assert_eq!(wins, vec![LeaderboardEntry { time: 4, steps: 4 }]);
        assert_eq!(game.elapsed(at(t0, 60_000)), Duration::from_secs(4));
    }

    #[test]
    fn test_hint_lives_for_four_seconds() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game.tick(t0, &press(&[Action::Hint])).expect("tick succeeds");
        let hint = game.hint().expect("hint requested");
        assert_eq!(hint.path().last(), Some(&game.exit()));
        assert_eq!(hint.path().len(), 4);

        let _ = game
            .tick(at(t0, 4000), &TickInput::default())
            .expect("tick succeeds");
        assert!(game.hint().is_some(), "hint is kept at exactly four seconds");

        let _ = game
            .tick(at(t0, 4001), &TickInput::default())
            .expect("tick succeeds");
        assert!(game.hint().is_none(), "hint expires after four seconds");
    }

    #[test]
    fn test_new_hint_replaces_the_old_one() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game.tick(t0, &press(&[Action::Hint])).expect("tick succeeds");
        let _ = game
            .tick(at(t0, 3000), &hold(&[Direction::Right]))
            .expect("tick succeeds");
        let _ = game
            .tick(at(t0, 3500), &press(&[Action::Hint]))
            .expect("tick succeeds");

        let hint = game.hint().expect("hint requested");
        assert_eq!(hint.created(), at(t0, 3500));
        assert_eq!(hint.path().len(), 3);

        let _ = game
            .tick(at(t0, 6000), &TickInput::default())
            .expect("tick succeeds");
        assert!(game.hint().is_some(), "the new hint has its own lifetime");
    }

    #[test]
    fn test_power_up_shows_hint_once() {
        let t0 = Instant::now();
        let mut game = session(t0);
        game.power_ups = vec![PowerUp::new(Position::new(2, 1), PowerUpKind::Hint)];

        let report = game
            .tick(t0, &hold(&[Direction::Right]))
            .expect("tick succeeds");
        assert_eq!(report.collected, vec![Position::new(2, 1)]);
        assert!(game.power_ups().iter().all(PowerUp::is_collected));
        let hint = game.hint().cloned().expect("power-up shows a hint");
        assert_eq!(hint.path().len(), 3);

        let _ = game
            .tick(at(t0, 200), &hold(&[Direction::Left]))
            .expect("tick succeeds");
        let report = game
            .tick(at(t0, 400), &hold(&[Direction::Right]))
            .expect("tick succeeds");

        assert!(report.collected.is_empty(), "collected power-ups stay collected");
        assert_eq!(game.hint(), Some(&hint), "hint is not refreshed");
    }

    #[test]
    fn test_pause_freezes_movement_and_clock() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let _ = game
            .tick(at(t0, 1000), &press(&[Action::Hint, Action::Pause]))
            .expect("tick succeeds");
        assert_eq!(game.mode(), SessionMode::Paused);
        assert!(game.hint().is_none(), "pausing drops the hint");

        let paused_input = TickInput {
            held: vec![Direction::Right],
            actions: vec![Action::Hint, Action::Restart],
        };
        let report = game
            .tick(at(t0, 3000), &paused_input)
            .expect("tick succeeds");
        assert!(report.requests.is_empty());
        assert!(game.hint().is_none());
        assert_eq!(game.player().pos(), Position::new(1, 1));
        assert_eq!(game.elapsed(at(t0, 4000)), Duration::from_secs(1));

        let _ = game
            .tick(at(t0, 5000), &press(&[Action::Pause]))
            .expect("tick succeeds");
        assert_eq!(game.mode(), SessionMode::Playing);
        assert_eq!(game.elapsed(at(t0, 6000)), Duration::from_secs(2));
    }

    #[test]
    fn test_session_requests_are_forwarded() {
        let t0 = Instant::now();
        let mut game = session(t0);

        let report = game
            .tick(
                t0,
                &press(&[
                    Action::Save,
                    Action::Load,
                    Action::Restart,
                    Action::NewMaze,
                    Action::Menu,
                    Action::Quit,
                ]),
            )
            .expect("tick succeeds");

        assert_eq!(
            report.requests,
            vec![
                SessionRequest::Save,
                SessionRequest::Load,
                SessionRequest::Restart,
                SessionRequest::NewMaze,
                SessionRequest::Menu,
                SessionRequest::Quit,
            ]
        );
    }

    #[test]
    fn test_quit_is_honoured_while_paused() {
        let t0 = Instant::now();
        let mut game = session(t0);
        game.pause(t0);

        let report = game
            .tick(t0, &press(&[Action::Quit]))
            .expect("tick succeeds");

        assert_eq!(report.requests, vec![SessionRequest::Quit]);
    }

    #[test]
    fn test_toggle_hint_visibility() {
        let t0 = Instant::now();
        let mut game = session(t0);
        assert!(game.show_hint_path());

        let _ = game
            .tick(t0, &press(&[Action::ToggleHint]))
            .expect("tick succeeds");
        assert!(!game.show_hint_path());

        let _ = game
            .tick(t0, &press(&[Action::ToggleHint]))
            .expect("tick succeeds");
        assert!(game.show_hint_path());
    }

    #[test]
    fn test_restart_keeps_maze_and_resets_progress() {
        let t0 = Instant::now();
        let mut game = session(t0);
        let _ = game
            .tick(t0, &hold(&[Direction::Right]))
            .expect("tick succeeds");
        game.view_mut().zoom_in();
        game.set_show_hint_path(false);

        let restarted = game
            .restart(&mut StdRng::seed_from_u64(2), at(t0, 500))
            .expect("maze has endpoints");

        assert!(Rc::ptr_eq(&restarted.maze, &game.maze));
        assert_eq!(restarted.player().pos(), restarted.start());
        assert_eq!(restarted.player().steps(), 0);
        assert_eq!(restarted.view(), &ViewState::new());
        assert!(!restarted.show_hint_path());
        assert_eq!(restarted.elapsed(at(t0, 500)), Duration::ZERO);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let t0 = Instant::now();
        let size = MazeSize::new(21, 21).expect("valid size");
        let mut rng = StdRng::seed_from_u64(8);
        let maze = Rc::new(Maze::generate(size, &mut rng));
        let mut game = GameState::new(maze, &mut rng, t0).expect("maze has endpoints");

        let all = hold(&Direction::ALL);
        for step in 0..6 {
            let _ = game.tick(at(t0, 200 * step), &all).expect("tick succeeds");
        }
        game.view_mut().zoom_in();
        let saved_at = at(t0, 2345);

        let snapshot = game.snapshot(saved_at, "Forest");
        let text = snapshot.to_json().expect("serializable");
        let restored = GameState::from_snapshot(
            &Snapshot::from_json(&text).expect("own output parses"),
            at(t0, 90_000),
        )
        .expect("snapshot is valid");

        assert_eq!(restored.maze(), game.maze());
        assert_eq!(restored.player(), game.player());
        assert_eq!(restored.exit(), game.exit());
        assert_eq!(restored.power_ups(), game.power_ups());
        assert!((restored.view().zoom() - game.view().zoom()).abs() < f64::EPSILON);
        assert_eq!(snapshot.theme, "Forest");
        assert_eq!(
            restored.elapsed(at(t0, 90_000)),
            Duration::from_millis(2345)
        );
    }

    #[test]
    fn test_snapshot_with_player_on_wall_is_rejected() {
        let t0 = Instant::now();
        let mut snapshot = session(t0).snapshot(t0, "Classic");
        snapshot.player = Position::new(0, 0);

        assert!(matches!(
            GameState::from_snapshot(&snapshot, t0),
            Err(PersistenceError::Corrupted(_))
        ));
    }

    #[test]
    fn test_snapshot_with_player_on_exit_is_rejected() {
        let t0 = Instant::now();
        let mut snapshot = session(t0).snapshot(t0, "Classic");
        snapshot.player = snapshot.exit;

        assert!(matches!(
            GameState::from_snapshot(&snapshot, t0),
            Err(PersistenceError::Corrupted(_))
        ));
    }

    #[test]
    fn test_snapshot_with_bad_zoom_restores_default_view() {
        let t0 = Instant::now();
        let mut snapshot = session(t0).snapshot(t0, "Classic");
        snapshot.zoom = 12.0;

        let restored = GameState::from_snapshot(&snapshot, t0).expect("snapshot is valid");

        assert!((restored.view().zoom() - 1.0).abs() < f64::EPSILON);
    }
}
