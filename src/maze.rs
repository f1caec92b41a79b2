//! Maze grid and generation module.
//!
//! This module contains the [`Maze`] grid, the coordinate types used across the game, and the
//! randomized depth-first backtracker that carves perfect mazes. The carver is exposed as an
//! iterator of steps so that the generation screen can observe it frame by frame without
//! changing the carve order or the randomness it consumes.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest accepted maze dimension on either axis.
pub const MIN_DIMENSION: usize = 5;

/// Largest accepted maze dimension on either axis.
pub const MAX_DIMENSION: usize = 1001;

/// Order in which the carver inspects the rooms around the current cell.
const CARVE_ORDER: [Direction; 4] = [
    Direction::Down,
    Direction::Up,
    Direction::Right,
    Direction::Left,
];

/// Integer cell coordinate within a maze.
///
/// Positions are plain values. Moving the player produces a new position instead of mutating
/// the current one, so the previous cell pushed onto the trail can never alias the new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing to the right.
    pub x: usize,
    /// Row, growing downwards.
    pub y: usize,
}

impl Position {
    /// Builds a position from its column and row.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the adjacent position in the given direction.
    ///
    /// Returns [`None`] when the step would leave the non-negative quadrant. Upper bounds are the
    /// maze's business and are checked through [`Maze::cell`].
    #[must_use]
    pub const fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        let Some(x) = self.x.checked_add_signed(dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add_signed(dy) else {
            return None;
        };

        Some(Self::new(x, y))
    }
}

/// One of the four grid directions.
///
/// The declaration order doubles as the priority used when several direction keys are held at
/// once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards row zero.
    Up,
    /// Away from row zero.
    Down,
    /// Towards column zero.
    Left,
    /// Away from column zero.
    Right,
}

impl Direction {
    /// Every direction, in priority order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Column and row offsets of a single step.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Kind of a single grid unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Impassable cell.
    Wall,
    /// Walkable cell.
    Open,
}

/// Validated maze dimensions.
///
/// Both axes are odd and at least [`MIN_DIMENSION`], which is what the odd-coordinate room
/// lattice used by the carver needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeSize {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
}

impl MazeSize {
    /// The "Small" difficulty.
    pub const SMALL: Self = Self {
        width: 15,
        height: 15,
    };
    /// The "Medium" difficulty.
    pub const MEDIUM: Self = Self {
        width: 21,
        height: 21,
    };
    /// The "Large" difficulty.
    pub const LARGE: Self = Self {
        width: 31,
        height: 31,
    };
    /// The difficulties offered by the size menu, smallest first.
    pub const PRESETS: [Self; 3] = [Self::SMALL, Self::MEDIUM, Self::LARGE];

    /// Validates a pair of dimensions.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::TooSmall`] if a dimension is below [`MIN_DIMENSION`].
    /// - [`ConfigError::TooLarge`] if a dimension is above [`MAX_DIMENSION`].
    /// - [`ConfigError::EvenDimension`] if a dimension is even.
    pub const fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        if let Err(err) = check_dimension(width) {
            return Err(err);
        }
        if let Err(err) = check_dimension(height) {
            return Err(err);
        }

        Ok(Self { width, height })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(self) -> usize {
        self.height
    }

    /// Number of cells in a grid of this size.
    #[must_use]
    pub const fn area(self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

impl fmt::Display for MazeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Checks a single maze dimension.
const fn check_dimension(value: usize) -> Result<(), ConfigError> {
    if value < MIN_DIMENSION {
        Err(ConfigError::TooSmall {
            value,
            min: MIN_DIMENSION,
        })
    } else if value > MAX_DIMENSION {
        Err(ConfigError::TooLarge {
            value,
            max: MAX_DIMENSION,
        })
    } else if value % 2 == 0 {
        Err(ConfigError::EvenDimension(value))
    } else {
        Ok(())
    }
}

/// Rectangular grid of walls and open cells.
///
/// A generated maze is perfect: its open cells form a spanning tree, so every open cell can be
/// reached from every other one through exactly one route. The grid is never edited once
/// generation finishes; a new maze replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
    /// Cells in row-major order.
    cells: Vec<Cell>,
}

impl Maze {
    /// Builds a grid made only of walls.
    fn filled(size: MazeSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            cells: vec![Cell::Wall; size.area()],
        }
    }

    /// Generates a perfect maze of the given size.
    ///
    /// The result is fully determined by the state of `rng`, so a seeded generator always yields
    /// the same grid.
    pub fn generate<R: Rng + ?Sized>(size: MazeSize, rng: &mut R) -> Self {
        Carver::new(size, rng).finish().0
    }

    /// Rebuilds a grid from row-major cells, as stored in a save slot.
    ///
    /// Returns [`None`] if the number of cells does not match the dimensions.
    #[must_use]
    pub fn from_cells(size: MazeSize, cells: Vec<Cell>) -> Option<Self> {
        (cells.len() == size.area()).then_some(Self {
            width: size.width,
            height: size.height,
            cells,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at `pos`, or [`None`] when it lies outside the grid.
    #[must_use]
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.cells.get(self.index(pos)?).copied()
    }

    /// Whether `pos` is inside the grid and walkable.
    #[must_use]
    pub fn is_open(&self, pos: Position) -> bool {
        self.cell(pos) == Some(Cell::Open)
    }

    /// Iterates over every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Iterates over the open cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |pos| self.is_open(*pos))
    }

    /// Iterates over the open cells sharing an edge with `pos`.
    pub fn open_neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| pos.step(direction))
            .filter(move |neighbor| self.is_open(*neighbor))
    }

    /// Picks the start and exit cells of a session.
    ///
    /// The start is the first open cell scanning rows top-down and left to right, and the exit is
    /// the first open cell scanning bottom-up and right to left. Returns [`None`] if the grid has
    /// fewer than two open cells.
    #[must_use]
    pub fn endpoints(&self) -> Option<(Position, Position)> {
        let start = self.open_cells().next()?;
        let exit = self.open_cells().last()?;

        (start != exit).then_some((start, exit))
    }

    /// Row-major index of `pos`, if it lies within the grid.
    const fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    /// Overwrites the cell at `pos`. Positions outside the grid are ignored.
    fn set(&mut self, pos: Position, cell: Cell) {
        if let Some(slot) = self.index(pos).and_then(|idx| self.cells.get_mut(idx)) {
            *slot = cell;
        }
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.cells.chunks(self.width).enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            for cell in row {
                match cell {
                    Cell::Wall => write!(f, "#")?,
                    Cell::Open => write!(f, ".")?,
                }
            }
        }

        Ok(())
    }
}

/// A single observable step of the carver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarveStep {
    /// The wall between the current room and `room` was opened and `room` became current.
    Carve {
        /// Wall cell that was opened.
        wall: Position,
        /// Room that was opened and pushed.
        room: Position,
    },
    /// The room had no unvisited neighbours left and was popped.
    Backtrack(Position),
}

/// Step-by-step randomized depth-first backtracker.
///
/// Rooms live on odd coordinates and the cells between them are walls. The carver starts from
/// a random room, then repeatedly looks at the room on top of its stack: if it still has
/// unvisited rooms two cells away it opens one of them at random together with the wall in
/// between, otherwise it backtracks. Every room is pushed and popped exactly once, so the
/// iterator is finite. Dropping a carver cancels the generation; creating a new one from the
/// same seed restarts it.
#[derive(Debug)]
pub struct Carver<R> {
    /// Grid carved so far.
    maze: Maze,
    /// Rooms on the current depth-first branch.
    stack: Vec<Position>,
    /// Source of randomness, consumed only by the carver.
    rng: R,
}

impl<R: Rng> Carver<R> {
    /// Starts a generation by opening a random room.
    pub fn new(size: MazeSize, mut rng: R) -> Self {
        let mut maze = Maze::filled(size);
        let start = Position::new(
            random_room_coordinate(&mut rng, size.width),
            random_room_coordinate(&mut rng, size.height),
        );
        maze.set(start, Cell::Open);

        Self {
            maze,
            stack: vec![start],
            rng,
        }
    }

    /// The partially carved grid.
    pub const fn maze(&self) -> &Maze {
        &self.maze
    }

    /// The room on top of the stack, or [`None`] once generation has finished.
    pub fn current(&self) -> Option<Position> {
        self.stack.last().copied()
    }

    /// Whether every reachable room has been visited.
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    /// Runs the remaining steps and hands back the finished maze and the random source.
    pub fn finish(mut self) -> (Maze, R) {
        while self.next().is_some() {}

        (self.maze, self.rng)
    }

    /// Rooms two cells away from `room` that lie strictly inside the border and are still walls.
    fn unvisited_neighbors(&self, room: Position) -> Vec<Position> {
        CARVE_ORDER
            .into_iter()
            .filter_map(|direction| room.step(direction)?.step(direction))
            .filter(|candidate| {
                self.is_interior(*candidate) && self.maze.cell(*candidate) == Some(Cell::Wall)
            })
            .collect()
    }

    /// Whether `pos` lies strictly inside the outer border.
    const fn is_interior(&self, pos: Position) -> bool {
        pos.x > 0 && pos.x < self.maze.width - 1 && pos.y > 0 && pos.y < self.maze.height - 1
    }
}

impl<R: Rng> Iterator for Carver<R> {
    type Item = CarveStep;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current()?;
        let neighbors = self.unvisited_neighbors(current);

        if neighbors.is_empty() {
            let _ = self.stack.pop();
            return Some(CarveStep::Backtrack(current));
        }

        let room = *neighbors.get(self.rng.gen_range(0..neighbors.len()))?;
        let wall = Position::new((current.x + room.x) / 2, (current.y + room.y) / 2);
        self.maze.set(wall, Cell::Open);
        self.maze.set(room, Cell::Open);
        self.stack.push(room);

        Some(CarveStep::Carve { wall, room })
    }
}

/// Picks a random odd coordinate strictly inside a dimension.
fn random_room_coordinate<R: Rng + ?Sized>(rng: &mut R, dimension: usize) -> usize {
    2 * rng.gen_range(0..(dimension - 1) / 2) + 1
}
