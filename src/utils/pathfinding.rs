//! # Pathing
//!
//! Straight-line paths for AI sight and approach, and a flood fill used to
//! check that generated floors are connected.
//!
//! Creatures never route around obstacles: one whose line to the player
//! crosses a wall simply never aggroes. The A* route is only used by the
//! scripted runner.

use crate::Position;
use ::pathfinding::directed::{astar::astar, bfs::bfs_reach};
use std::collections::HashSet;

/// Cells on the Bresenham line from `from` to `to`, both ends included.
///
/// The first element is always `from`, so the first step toward the target is
/// element `1` when the endpoints differ.
///
/// # Examples
///
/// ```
/// use delve::{straight_line_path, Position};
///
/// let path = straight_line_path(Position::new(0, 0), Position::new(3, 1));
/// assert_eq!(path.first(), Some(&Position::new(0, 0)));
/// assert_eq!(path.last(), Some(&Position::new(3, 1)));
/// assert_eq!(path.len(), 4);
/// ```
pub fn straight_line_path(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };

    let mut path = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let mut error = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    loop {
        path.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }

    path
}

/// All cells reachable from `start` through cardinal steps onto passable cells.
///
/// `start` itself is always part of the result.
pub fn reachable_from<F>(start: Position, passable: F) -> HashSet<Position>
where
    F: Fn(Position) -> bool,
{
    bfs_reach(start, |pos: &Position| {
        pos.cardinal_neighbors()
            .filter(|next| passable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Shortest eight-way route from `start` to `goal` over passable cells.
///
/// `goal` is always accepted as the last step, so a route can end on an
/// occupied cell (a creature to fight, say). Includes both endpoints.
pub fn route<F>(start: Position, goal: Position, passable: F) -> Option<Vec<Position>>
where
    F: Fn(Position) -> bool,
{
    astar(
        &start,
        |pos: &Position| {
            pos.neighbors()
                .filter(|next| *next == goal || passable(*next))
                .map(|next| (next, 1u32))
                .collect::<Vec<_>>()
        },
        |pos: &Position| crate::chebyshev_distance(*pos, goal),
        |pos: &Position| *pos == goal,
    )
    .map(|(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_single_cell() {
        let p = Position::new(4, 4);
        assert_eq!(straight_line_path(p, p), vec![p]);
    }

    #[test]
    fn test_line_horizontal_and_vertical() {
        let path = straight_line_path(Position::new(2, 5), Position::new(6, 5));
        assert_eq!(path.len(), 5);
        assert!(path.iter().all(|p| p.y == 5));

        let path = straight_line_path(Position::new(3, 9), Position::new(3, 6));
        assert_eq!(
            path,
            vec![
                Position::new(3, 9),
                Position::new(3, 8),
                Position::new(3, 7),
                Position::new(3, 6)
            ]
        );
    }

    #[test]
    fn test_line_diagonal() {
        let path = straight_line_path(Position::new(0, 0), Position::new(-3, 3));
        assert_eq!(
            path,
            vec![
                Position::new(0, 0),
                Position::new(-1, 1),
                Position::new(-2, 2),
                Position::new(-3, 3)
            ]
        );
    }

    #[test]
    fn test_line_steps_are_adjacent() {
        let path = straight_line_path(Position::new(1, 2), Position::new(12, 7));
        for pair in path.windows(2) {
            let delta = pair[1] - pair[0];
            assert!(delta.x.abs() <= 1 && delta.y.abs() <= 1);
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn test_reachable_from_respects_walls() {
        // A 5-wide corridor at y == 0 with a wall at x == 3.
        let passable = |p: Position| p.y == 0 && (0..5).contains(&p.x) && p.x != 3;
        let reached = reachable_from(Position::new(0, 0), passable);

        assert!(reached.contains(&Position::new(2, 0)));
        assert!(!reached.contains(&Position::new(4, 0)));
        assert_eq!(reached.len(), 3);
    }

    #[test]
    fn test_route_goes_around_walls() {
        // Open 7x5 box with a wall column at x == 3 except for y == 4.
        let passable = |p: Position| {
            (0..7).contains(&p.x) && (0..5).contains(&p.y) && !(p.x == 3 && p.y < 4)
        };
        let path = route(Position::new(1, 1), Position::new(5, 1), passable).unwrap();

        assert_eq!(path.first(), Some(&Position::new(1, 1)));
        assert_eq!(path.last(), Some(&Position::new(5, 1)));
        assert!(path.contains(&Position::new(3, 4)));
    }

    #[test]
    fn test_route_missing_when_sealed() {
        let passable = |p: Position| p.y == 0 && (0..5).contains(&p.x) && p.x != 2;
        assert!(route(Position::new(0, 0), Position::new(4, 0), passable).is_none());
    }
}
