//! Neighbour-exploring multicast routing with dead-link repair.
//!
//! # Algorithm
//! Destinations are visited in ascending order of distance from the source.
//! Each is connected to the nearest existing tree node within a hop radius
//! (found by ring expansion around the destination or a linear scan of the
//! tree, whichever is cheaper) via a longest-dimension-first walk, truncated
//! where it re-touches the tree. If the finished tree crosses links or chips
//! the machine reports dead, the broken segments are disconnected and
//! reattached one by one with a heuristic-guided search over live links.
//!
//! # Reference
//! J. Navaridas et al. (2015), "SpiNNaker: Enhanced multicast routing",
//! Parallel Computing 45.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use tracing::debug;

use super::geometry::{
    concentric_hexagons, longest_dimension_first, shortest_mesh_path, shortest_torus_path, to_xyz,
    Coord, Direction,
};
use super::topology::Topology;
use super::tree::RoutingTree;
use crate::error::RoutingError;

/// Builds multicast routing trees for one partition at a time.
#[derive(Debug, Clone)]
pub struct NerRouter {
    radius: u32,
}

impl Default for NerRouter {
    fn default() -> Self {
        Self { radius: 20 }
    }
}

impl NerRouter {
    /// A router with the default 20-hop neighbour search radius.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the neighbour search radius in hops.
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    /// Routes one partition: source to every destination.
    ///
    /// Fails with [`RoutingError::DeadSource`] when the source chip is dead
    /// and [`RoutingError::NoPath`] when a broken segment cannot be
    /// reconnected over live links.
    pub fn route<T: Topology>(
        &self,
        topology: &T,
        source: Coord,
        destinations: &[Coord],
    ) -> Result<RoutingTree, RoutingError> {
        if !topology.is_chip_alive(source) {
            return Err(RoutingError::DeadSource(source));
        }
        let mut tree = self.generate_tree(topology, source, destinations);
        if has_dead_links(&tree, topology) {
            debug!(%source, "routing tree crosses dead links, repairing");
            self.repair(&mut tree, topology)?;
        }
        Ok(tree)
    }

    /// Grows the initial tree, ignoring faults.
    fn generate_tree<T: Topology>(
        &self,
        topology: &T,
        source: Coord,
        destinations: &[Coord],
    ) -> RoutingTree {
        let mut tree = RoutingTree::new(source);

        let mut ordered: Vec<Coord> = destinations.to_vec();
        ordered.sort_by_key(|&destination| (topology.distance(source, destination), destination));
        ordered.dedup();

        for destination in ordered {
            if tree.contains(destination) {
                continue;
            }
            let neighbour = self
                .nearest_tree_node(&tree, topology, destination)
                .unwrap_or(source);

            let wrap = topology.has_wrap_around();
            let vector = if wrap {
                shortest_torus_path(
                    to_xyz(neighbour),
                    to_xyz(destination),
                    topology.width(),
                    topology.height(),
                )
            } else {
                shortest_mesh_path(to_xyz(neighbour), to_xyz(destination))
            };
            let mut path = longest_dimension_first(
                vector,
                neighbour,
                topology.width(),
                topology.height(),
                wrap,
            );

            // The walk may graze the existing tree; connect from the last
            // such touch so no coordinate is added twice.
            let mut attach_at = neighbour;
            for (i, &(_, coord)) in path.iter().enumerate().rev() {
                if tree.contains(coord) {
                    attach_at = coord;
                    path.drain(..=i);
                    break;
                }
            }

            let mut current = attach_at;
            for (direction, coord) in path {
                // Truncation guarantees these coordinates are new.
                let added = tree.add_child(current, direction, coord);
                debug_assert!(added.is_ok());
                current = coord;
            }
        }
        tree
    }

    /// The nearest tree node within the search radius, or `None`.
    fn nearest_tree_node<T: Topology>(
        &self,
        tree: &RoutingTree,
        topology: &T,
        destination: Coord,
    ) -> Option<Coord> {
        let rings = concentric_hexagons(self.radius);
        if rings.len() < tree.len() / 3 {
            // Small neighbourhood, large tree: scan rings outward from the
            // destination and take the first hit.
            for offset in rings {
                let mut x = destination.x + offset.x;
                let mut y = destination.y + offset.y;
                if topology.has_wrap_around() {
                    x = x.rem_euclid(topology.width());
                    y = y.rem_euclid(topology.height());
                }
                let candidate = Coord::new(x, y);
                if tree.contains(candidate) {
                    return Some(candidate);
                }
            }
            None
        } else {
            // Small tree: scan it directly, keeping the first node at the
            // smallest distance.
            let mut best: Option<(u32, Coord)> = None;
            for node in tree.coords() {
                let distance = topology.distance(node, destination);
                if distance <= self.radius && best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, node));
                }
            }
            best.map(|(_, node)| node)
        }
    }

    /// Disconnects broken segments and reattaches each over live links.
    fn repair<T: Topology>(
        &self,
        tree: &mut RoutingTree,
        topology: &T,
    ) -> Result<(), RoutingError> {
        for (parent, orphan) in disconnect_dead(tree, topology) {
            let orphan_coords = tree.subtree_coords(orphan);
            let reachable: BTreeSet<Coord> = tree
                .coords()
                .filter(|coord| !orphan_coords.contains(coord))
                .collect();

            let (target, steps) = a_star(topology, orphan, parent, &reachable)?;

            let mut current = target;
            for (direction, coord) in steps {
                if coord == orphan || orphan_coords.contains(&coord) {
                    tree.disconnect(coord);
                    tree.attach(current, direction, coord)?;
                } else {
                    tree.add_child(current, direction, coord)?;
                }
                current = coord;
            }
        }
        Ok(())
    }
}

/// Whether the tree traverses any dead link or rests on any dead chip.
pub fn has_dead_links<T: Topology>(tree: &RoutingTree, topology: &T) -> bool {
    tree.coords().any(|coord| !topology.is_chip_alive(coord))
        || tree
            .edges()
            .iter()
            .any(|&(from, direction, _)| !topology.is_link_alive(from, direction))
}

/// Severs every broken edge, removing dead chips outright.
///
/// Children of a removed chip hang off its nearest alive ancestor, so each
/// becomes one broken `(ancestor, child)` record. Returns the broken edges
/// in deterministic order.
fn disconnect_dead<T: Topology>(tree: &mut RoutingTree, topology: &T) -> BTreeSet<(Coord, Coord)> {
    let mut broken = BTreeSet::new();

    // Dead chips first: removal orphans their children under the closest
    // alive ancestor. The root is known alive.
    let dead_chips: Vec<Coord> = tree
        .coords()
        .filter(|&coord| !topology.is_chip_alive(coord))
        .collect();
    for chip in dead_chips {
        let ancestor = nearest_alive_ancestor(tree, topology, chip);
        for (_, child) in tree.remove(chip) {
            if topology.is_chip_alive(child) {
                broken.insert((ancestor, child));
            }
            // A dead child is itself in dead_chips and handled in turn.
        }
    }

    // Scan every edge, not just the root-reachable ones: a subtree orphaned
    // above may still hold broken links of its own.
    let edges: Vec<(Coord, Direction, Coord)> = tree
        .coords()
        .flat_map(|from| {
            tree.children(from)
                .into_iter()
                .map(move |(direction, to)| (from, direction, to))
        })
        .collect();
    for (from, direction, to) in edges {
        if !topology.is_link_alive(from, direction) {
            tree.disconnect(to);
            broken.insert((from, to));
        }
    }
    broken
}

fn nearest_alive_ancestor<T: Topology>(tree: &RoutingTree, topology: &T, coord: Coord) -> Coord {
    let mut current = coord;
    loop {
        let parent = tree
            .edges()
            .iter()
            .find(|&&(_, _, child)| child == current)
            .map(|&(parent, _, _)| parent);
        match parent {
            Some(parent) if topology.is_chip_alive(parent) => return parent,
            Some(parent) => current = parent,
            None => return tree.root(),
        }
    }
}

/// Heuristic-guided search from an orphaned subtree root back to the rest
/// of the tree.
///
/// Expands outward from `orphan`, ordered by distance to `goal_hint` (the
/// broken edge's parent), following only links that are alive in the
/// direction the repaired route will traverse them. Returns the reached
/// tree coordinate and the hop sequence from it back to `orphan`.
fn a_star<T: Topology>(
    topology: &T,
    orphan: Coord,
    goal_hint: Coord,
    reachable: &BTreeSet<Coord>,
) -> Result<(Coord, Vec<(Direction, Coord)>), RoutingError> {
    // visited[c] = the hop taken from c toward the orphan root.
    let mut visited: HashMap<Coord, Option<(Direction, Coord)>> = HashMap::new();
    visited.insert(orphan, None);

    let mut frontier = BinaryHeap::new();
    frontier.push((Reverse(topology.distance(orphan, goal_hint)), orphan));

    while let Some((_, node)) = frontier.pop() {
        for direction in Direction::ALL {
            let Some(neighbour) = topology.neighbour(node, direction) else {
                continue;
            };
            if visited.contains_key(&neighbour) || !topology.is_chip_alive(neighbour) {
                continue;
            }
            // The repaired route runs neighbour -> node, so that side of
            // the link is the one that must be alive.
            if !topology.is_link_alive(neighbour, direction.opposite()) {
                continue;
            }
            visited.insert(neighbour, Some((direction.opposite(), node)));

            if reachable.contains(&neighbour) {
                let mut steps = Vec::new();
                let mut current = neighbour;
                while let Some(&Some((step_direction, next))) = visited.get(&current) {
                    steps.push((step_direction, next));
                    current = next;
                }
                return Ok((neighbour, steps));
            }
            frontier.push((Reverse(topology.distance(neighbour, goal_hint)), neighbour));
        }
    }
    Err(RoutingError::NoPath {
        from: orphan,
        to: goal_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::topology::GridTopology;

    fn assert_connected_and_acyclic(tree: &RoutingTree, destinations: &[Coord]) {
        let reached = tree.subtree_coords(tree.root());
        for destination in destinations {
            assert!(reached.contains(destination), "missing {destination}");
        }
        // Acyclic and no duplicates: every non-root node has exactly one
        // incoming edge.
        let edges = tree.edges();
        let mut children: Vec<_> = edges.iter().map(|&(_, _, child)| child).collect();
        children.sort();
        children.dedup();
        assert_eq!(children.len(), edges.len());
        assert_eq!(reached.len(), edges.len() + 1);
    }

    #[test]
    fn test_route_simple_mesh() {
        let machine = GridTopology::mesh(4, 4);
        let destinations = [Coord::new(2, 0), Coord::new(0, 2)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();

        assert_connected_and_acyclic(&tree, &destinations);
        // Every edge is load-bearing: removing any disconnects a destination
        for &(_, _, cut) in &tree.edges() {
            let mut pruned = tree.clone();
            pruned.disconnect(cut);
            let reached = pruned.subtree_coords(pruned.root());
            assert!(destinations.iter().any(|d| !reached.contains(d)));
        }
    }

    #[test]
    fn test_route_merges_shared_prefix() {
        let machine = GridTopology::mesh(8, 8);
        let destinations = [Coord::new(4, 0), Coord::new(6, 0)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();

        assert_connected_and_acyclic(&tree, &destinations);
        // The further destination rides the nearer one's path
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_route_uses_wrap_around() {
        let machine = GridTopology::torus(8, 8);
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &[Coord::new(7, 0)])
            .unwrap();
        // One hop west instead of seven east
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.children(Coord::new(0, 0)),
            vec![(Direction::West, Coord::new(7, 0))]
        );
    }

    #[test]
    fn test_repair_routes_around_dead_link() {
        let machine = GridTopology::mesh(4, 2).with_dead_link(Coord::new(1, 0), Direction::East);
        let destinations = [Coord::new(3, 0)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();

        assert_connected_and_acyclic(&tree, &destinations);
        for (from, direction, _) in tree.edges() {
            assert!(machine.is_link_alive(from, direction));
        }
    }

    #[test]
    fn test_repair_routes_around_dead_chip() {
        let machine = GridTopology::mesh(5, 5).with_dead_chip(Coord::new(2, 2));
        let destinations = [Coord::new(4, 4)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();

        assert_connected_and_acyclic(&tree, &destinations);
        assert!(!tree.contains(Coord::new(2, 2)));
        for (from, direction, _) in tree.edges() {
            assert!(machine.is_link_alive(from, direction));
        }
    }

    #[test]
    fn test_repair_keeps_downstream_destinations() {
        // Break the path midway; the subtree past the break must survive
        let machine = GridTopology::mesh(6, 3).with_dead_link(Coord::new(2, 0), Direction::East);
        let destinations = [Coord::new(5, 0)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();
        assert_connected_and_acyclic(&tree, &destinations);
    }

    #[test]
    fn test_dead_source_fails() {
        let machine = GridTopology::mesh(4, 4).with_dead_chip(Coord::new(0, 0));
        let error = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &[Coord::new(1, 1)])
            .unwrap_err();
        assert!(matches!(error, RoutingError::DeadSource(c) if c == Coord::new(0, 0)));
    }

    #[test]
    fn test_no_path_fails() {
        // Sever every link out of the source's corner neighbourhood
        let machine = GridTopology::mesh(3, 1)
            .with_dead_link(Coord::new(0, 0), Direction::East);
        let error = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &[Coord::new(2, 0)])
            .unwrap_err();
        assert!(matches!(error, RoutingError::NoPath { .. }));
    }

    #[test]
    fn test_destinations_processed_nearest_first() {
        let machine = GridTopology::mesh(8, 8);
        // Listed far-first; the router must still merge paths cleanly
        let destinations = [Coord::new(6, 0), Coord::new(2, 0), Coord::new(4, 0)];
        let tree = NerRouter::new()
            .route(&machine, Coord::new(0, 0), &destinations)
            .unwrap();
        assert_connected_and_acyclic(&tree, &destinations);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_duplicate_destinations_ignored() {
        let machine = GridTopology::mesh(4, 4);
        let tree = NerRouter::new()
            .route(
                &machine,
                Coord::new(0, 0),
                &[Coord::new(2, 2), Coord::new(2, 2)],
            )
            .unwrap();
        assert_connected_and_acyclic(&tree, &[Coord::new(2, 2)]);
    }

    #[test]
    fn test_has_dead_links_detects_both_kinds() {
        let mut tree = RoutingTree::new(Coord::new(0, 0));
        tree.add_child(Coord::new(0, 0), Direction::East, Coord::new(1, 0))
            .unwrap();

        let healthy = GridTopology::mesh(4, 4);
        assert!(!has_dead_links(&tree, &healthy));
        let bad_link = GridTopology::mesh(4, 4).with_dead_link(Coord::new(0, 0), Direction::East);
        assert!(has_dead_links(&tree, &bad_link));
        let bad_chip = GridTopology::mesh(4, 4).with_dead_chip(Coord::new(1, 0));
        assert!(has_dead_links(&tree, &bad_chip));
    }
}
