//! Coordinate geometry for hexagonal mesh/torus fabrics.
//!
//! Chips sit on a 2D grid with six links each: the four compass directions
//! plus the north-east/south-west diagonal. Distances and shortest-path
//! vectors are computed in the redundant (x, y, z) hexagonal form, where the
//! z axis runs along the diagonal.
//!
//! # Reference
//! J. Navaridas et al. (2015), "SpiNNaker: Enhanced multicast routing",
//! Parallel Computing 45.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chip coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Creates a coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the six router links of a chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    North,
    West,
    SouthWest,
    South,
}

impl Direction {
    /// All directions, in link-id order.
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
    ];

    /// The link seen from the other end.
    pub fn opposite(self) -> Self {
        match self {
            Direction::East => Direction::West,
            Direction::NorthEast => Direction::SouthWest,
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::SouthWest => Direction::NorthEast,
            Direction::South => Direction::North,
        }
    }

    /// The (dx, dy) step this link takes.
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, 1),
            Direction::North => (0, 1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, -1),
            Direction::South => (0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::East => "east",
            Direction::NorthEast => "north-east",
            Direction::North => "north",
            Direction::West => "west",
            Direction::SouthWest => "south-west",
            Direction::South => "south",
        };
        f.write_str(name)
    }
}

/// Lifts a 2D coordinate into the redundant (x, y, 0) hexagonal form.
pub fn to_xyz(coord: Coord) -> (i32, i32, i32) {
    (coord.x, coord.y, 0)
}

/// Reduces an (x, y, z) vector to its minimal equivalent form.
///
/// Adding (1, 1, 1) to a hexagonal vector does not change the displacement
/// it describes; the minimal form has the smallest total magnitude.
pub fn minimise_xyz(vector: (i32, i32, i32)) -> (i32, i32, i32) {
    let (x, y, z) = vector;
    let m = x.min(y).max(x.max(y).min(z));
    (x - m, y - m, z - m)
}

/// Hop count of the shortest path between two points on a non-wrapping mesh.
pub fn shortest_mesh_path_length(source: (i32, i32, i32), destination: (i32, i32, i32)) -> u32 {
    let x = destination.0 - source.0;
    let y = destination.1 - source.1;
    let z = destination.2 - source.2;
    // A minimal hexagonal vector's magnitude is the range of its components.
    (x.max(y).max(z) - x.min(y).min(z)) as u32
}

/// The minimal vector from source to destination on a non-wrapping mesh.
pub fn shortest_mesh_path(
    source: (i32, i32, i32),
    destination: (i32, i32, i32),
) -> (i32, i32, i32) {
    minimise_xyz((
        destination.0 - source.0,
        destination.1 - source.1,
        destination.2 - source.2,
    ))
}

/// Hop count of the shortest path between two points on a torus.
pub fn shortest_torus_path_length(
    source: (i32, i32, i32),
    destination: (i32, i32, i32),
    width: i32,
    height: i32,
) -> u32 {
    let x = (destination.0 - source.0 - (destination.2 - source.2)).rem_euclid(width);
    let y = (destination.1 - source.1 - (destination.2 - source.2)).rem_euclid(height);
    let candidates = [
        x.max(y),                      // no wrap
        width - x + y,                 // wrap x only
        x + height - y,                // wrap y only
        (width - x).max(height - y),   // wrap both
    ];
    candidates.into_iter().min().unwrap_or(0) as u32
}

/// The minimal vector from source to destination on a torus.
///
/// Of the four wrap candidates the shortest wins; ties pick the first in
/// no-wrap, wrap-x, wrap-y, wrap-both order, so the result is deterministic.
pub fn shortest_torus_path(
    source: (i32, i32, i32),
    destination: (i32, i32, i32),
    width: i32,
    height: i32,
) -> (i32, i32, i32) {
    let x = (destination.0 - source.0 - (destination.2 - source.2)).rem_euclid(width);
    let y = (destination.1 - source.1 - (destination.2 - source.2)).rem_euclid(height);
    let candidates = [
        (x.max(y), (x, y, 0)),
        (width - x + y, (x - width, y, 0)),
        (x + height - y, (x, y - height, 0)),
        ((width - x).max(height - y), (x - width, y - height, 0)),
    ];
    let best = candidates
        .into_iter()
        .min_by_key(|&(length, _)| length)
        .map(|(_, vector)| vector)
        .unwrap_or((0, 0, 0));
    minimise_xyz(best)
}

/// Expands an (x, y, z) vector into unit steps, longest dimension first.
///
/// Returns `(direction, coordinate reached)` pairs starting from `start`.
/// Coordinates wrap when `wrap` is set; on a mesh the walk never leaves the
/// bounding box of start and destination.
pub fn longest_dimension_first(
    vector: (i32, i32, i32),
    start: Coord,
    width: i32,
    height: i32,
    wrap: bool,
) -> Vec<(Direction, Coord)> {
    let mut dimensions = [(0usize, vector.0), (1, vector.1), (2, vector.2)];
    dimensions.sort_by_key(|&(_, magnitude)| std::cmp::Reverse(magnitude.abs()));

    let mut steps = Vec::new();
    let (mut x, mut y) = (start.x, start.y);
    for (dimension, magnitude) in dimensions {
        if magnitude == 0 {
            break;
        }
        let direction = match (dimension, magnitude > 0) {
            (0, true) => Direction::East,
            (0, false) => Direction::West,
            (1, true) => Direction::North,
            (1, false) => Direction::South,
            (2, true) => Direction::SouthWest,
            _ => Direction::NorthEast,
        };
        let (dx, dy) = direction.vector();
        for _ in 0..magnitude.abs() {
            x += dx;
            y += dy;
            if wrap {
                x = x.rem_euclid(width);
                y = y.rem_euclid(height);
            }
            steps.push((direction, Coord::new(x, y)));
        }
    }
    steps
}

/// Offsets of concentric hexagonal rings out to the given radius, innermost
/// first, starting with the origin itself.
pub fn concentric_hexagons(radius: u32) -> Vec<Coord> {
    let mut out = vec![Coord::new(0, 0)];
    let (mut x, mut y) = (0i32, 0i32);
    for ring in 1..=radius as i32 {
        y -= 1;
        for (dx, dy) in [(1, 1), (0, 1), (-1, 0), (-1, -1), (0, -1), (1, 0)] {
            for _ in 0..ring {
                out.push(Coord::new(x, y));
                x += dx;
                y += dy;
            }
        }
    }
    out
}
