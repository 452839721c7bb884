//! Machine topology: which chips and links exist and which are usable.
//!
//! Routing only needs a narrow view of the machine, so the fabric is a
//! trait: dimensions, wrap-around, liveness queries, and neighbour lookup.
//! [`GridTopology`] is the bundled implementation, a rectangular grid with
//! explicit dead-chip and dead-link sets.

use std::collections::HashSet;

use super::geometry::{
    shortest_mesh_path_length, shortest_torus_path_length, to_xyz, Coord, Direction,
};

/// A routable machine fabric.
pub trait Topology {
    /// Grid width in chips.
    fn width(&self) -> i32;

    /// Grid height in chips.
    fn height(&self) -> i32;

    /// Whether edges wrap, making the fabric a torus.
    fn has_wrap_around(&self) -> bool;

    /// Whether the chip at `coord` is present and working.
    fn is_chip_alive(&self, coord: Coord) -> bool;

    /// Whether the given link of the chip at `coord` is working.
    fn is_link_alive(&self, coord: Coord, direction: Direction) -> bool;

    /// The chip reached by following a link, or `None` when the link leaves
    /// the fabric.
    fn neighbour(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        let (dx, dy) = direction.vector();
        let (mut x, mut y) = (coord.x + dx, coord.y + dy);
        if self.has_wrap_around() {
            x = x.rem_euclid(self.width());
            y = y.rem_euclid(self.height());
        } else if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return None;
        }
        Some(Coord::new(x, y))
    }

    /// Hop count of the shortest possible path between two chips, ignoring
    /// faults.
    fn distance(&self, from: Coord, to: Coord) -> u32 {
        if self.has_wrap_around() {
            shortest_torus_path_length(to_xyz(from), to_xyz(to), self.width(), self.height())
        } else {
            shortest_mesh_path_length(to_xyz(from), to_xyz(to))
        }
    }
}

/// A rectangular grid, optionally wrapping, with explicit fault sets.
#[derive(Debug, Clone)]
pub struct GridTopology {
    width: i32,
    height: i32,
    wrap_around: bool,
    dead_chips: HashSet<Coord>,
    dead_links: HashSet<(Coord, Direction)>,
}

impl GridTopology {
    /// A fully-working non-wrapping mesh.
    pub fn mesh(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            wrap_around: false,
            dead_chips: HashSet::new(),
            dead_links: HashSet::new(),
        }
    }

    /// A fully-working torus.
    pub fn torus(width: i32, height: i32) -> Self {
        Self {
            wrap_around: true,
            ..Self::mesh(width, height)
        }
    }

    /// Marks a chip dead.
    pub fn with_dead_chip(mut self, coord: Coord) -> Self {
        self.dead_chips.insert(coord);
        self
    }

    /// Marks a link dead. Links are bidirectional, so the opposite link of
    /// the chip at the far end dies with it.
    pub fn with_dead_link(mut self, coord: Coord, direction: Direction) -> Self {
        self.dead_links.insert((coord, direction));
        if let Some(other) = self.neighbour(coord, direction) {
            self.dead_links.insert((other, direction.opposite()));
        }
        self
    }
}

impl Topology for GridTopology {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn has_wrap_around(&self) -> bool {
        self.wrap_around
    }

    fn is_chip_alive(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.x < self.width
            && coord.y < self.height
            && !self.dead_chips.contains(&coord)
    }

    fn is_link_alive(&self, coord: Coord, direction: Direction) -> bool {
        if self.dead_links.contains(&(coord, direction)) {
            return false;
        }
        match self.neighbour(coord, direction) {
            Some(other) => self.is_chip_alive(coord) && self.is_chip_alive(other),
            None => false,
        }
    }
}
