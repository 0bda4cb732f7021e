//! Breadth-first route search on the square room grid.
//!
//! Movement is 4-connected. Neighbors are expanded in the fixed order
//! up, down, left, right, so identical inputs always produce the same route.

use super::types::Position;
use std::collections::{HashMap, HashSet, VecDeque};

const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Shortest route from `from` to `to`, excluding the start and including the
/// destination. Empty when the destination is blocked, out of range, equal to
/// the start, or unreachable.
pub fn find_path(
    from: Position,
    to: Position,
    grid_size: i32,
    blocked: &HashSet<Position>,
) -> Vec<Position> {
    if from == to || !from.in_bounds(grid_size) || !to.in_bounds(grid_size) {
        return Vec::new();
    }
    if blocked.contains(&to) {
        return Vec::new();
    }

    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(from);
    came_from.insert(from, from);

    while let Some(current) = queue.pop_front() {
        if current == to {
            return rebuild(&came_from, from, to);
        }
        for (d_row, d_col) in NEIGHBOR_OFFSETS {
            let next = Position::new(current.row + d_row, current.col + d_col);
            if !next.in_bounds(grid_size) || blocked.contains(&next) {
                continue;
            }
            if came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, current);
            queue.push_back(next);
        }
    }

    Vec::new()
}

fn rebuild(came_from: &HashMap<Position, Position>, from: Position, to: Position) -> Vec<Position> {
    let mut path = vec![to];
    let mut cursor = to;
    while let Some(&previous) = came_from.get(&cursor) {
        if previous == from {
            break;
        }
        path.push(previous);
        cursor = previous;
    }
    path.reverse();
    path
}
