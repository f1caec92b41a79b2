//! Shortest-path search module.
//!
//! This module contains the breadth-first search used both for the on-demand hint and for the
//! hint power-ups. Perfect mazes have exactly one route between two cells, so the search mostly
//! serves to find that route, but it returns the shortest one on any grid.

use std::collections::{HashMap, VecDeque};

use crate::{
    error::PathError,
    maze::{Maze, Position},
};

/// Finds the shortest open-cell route from `start` to `goal`.
///
/// The search explores 4-directional neighbours layer by layer while recording the cell each
/// one was first reached from, then walks those predecessors back from the goal. The returned
/// route excludes `start` and ends with `goal`, so it is empty when both are the same cell.
///
/// # Errors
///
/// - [`PathError::NotOpen`] if either endpoint is a wall or out of bounds.
/// - [`PathError::Unreachable`] if no route exists, which a generated maze never allows.
pub fn shortest_path(
    maze: &Maze,
    start: Position,
    goal: Position,
) -> Result<Vec<Position>, PathError> {
    for endpoint in [start, goal] {
        if !maze.is_open(endpoint) {
            return Err(PathError::NotOpen(endpoint));
        }
    }

    let mut predecessors: HashMap<Position, Option<Position>> = HashMap::from([(start, None)]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return Ok(walk_back(&predecessors, goal));
        }

        for neighbor in maze.open_neighbors(current) {
            if !predecessors.contains_key(&neighbor) {
                let _ = predecessors.insert(neighbor, Some(current));
                queue.push_back(neighbor);
            }
        }
    }

    Err(PathError::Unreachable { start, goal })
}

/// Rebuilds the route to `goal` from the predecessor map, leaving out the start cell.
fn walk_back(predecessors: &HashMap<Position, Option<Position>>, goal: Position) -> Vec<Position> {
    let mut path = Vec::new();
    let mut cursor = goal;

    while let Some(Some(previous)) = predecessors.get(&cursor) {
        path.push(cursor);
        cursor = *previous;
    }
    path.reverse();

    path
}
