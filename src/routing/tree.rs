//! Multicast routing tree.
//!
//! A tree of chip coordinates rooted at the partition source, each edge
//! labelled with the link direction it traverses. Nodes live in an arena so
//! repair can disconnect and re-parent subtrees without reallocating; a
//! coordinate index enforces the structural invariant that no coordinate
//! appears twice.

use std::collections::{BTreeSet, HashMap};

use super::geometry::{Coord, Direction};
use crate::error::RoutingError;

#[derive(Debug, Clone)]
struct TreeNode {
    coord: Coord,
    parent: Option<(Direction, usize)>,
    children: Vec<(Direction, usize)>,
}

/// A multicast tree over machine coordinates.
#[derive(Debug, Clone)]
pub struct RoutingTree {
    // Removed nodes leave a tombstone so indices stay stable.
    nodes: Vec<Option<TreeNode>>,
    by_coord: HashMap<Coord, usize>,
    root: usize,
}

impl RoutingTree {
    /// A tree holding only its root.
    pub fn new(root: Coord) -> Self {
        Self {
            nodes: vec![Some(TreeNode {
                coord: root,
                parent: None,
                children: Vec::new(),
            })],
            by_coord: HashMap::from([(root, 0)]),
            root: 0,
        }
    }

    /// The source coordinate.
    pub fn root(&self) -> Coord {
        self.coord_of(self.root)
    }

    /// Number of coordinates in the tree.
    pub fn len(&self) -> usize {
        self.by_coord.len()
    }

    /// Whether the tree is empty. It never is; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.by_coord.is_empty()
    }

    /// Whether a coordinate is in the tree.
    pub fn contains(&self, coord: Coord) -> bool {
        self.by_coord.contains_key(&coord)
    }

    /// All coordinates, in insertion order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.nodes
            .iter()
            .filter_map(|node| node.as_ref().map(|n| n.coord))
    }

    /// The outgoing edges of one coordinate.
    pub fn children(&self, coord: Coord) -> Vec<(Direction, Coord)> {
        match self.by_coord.get(&coord) {
            Some(&index) => self.node(index)
                .children
                .iter()
                .map(|&(direction, child)| (direction, self.coord_of(child)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Adds a fresh coordinate under `parent`.
    ///
    /// `parent` must already be in the tree. Fails with
    /// [`RoutingError::CycleCreated`] if `child` already is.
    pub fn add_child(
        &mut self,
        parent: Coord,
        direction: Direction,
        child: Coord,
    ) -> Result<(), RoutingError> {
        if self.contains(child) {
            return Err(RoutingError::CycleCreated(child));
        }
        let parent_index = self.by_coord[&parent];
        let child_index = self.nodes.len();
        self.nodes.push(Some(TreeNode {
            coord: child,
            parent: Some((direction, parent_index)),
            children: Vec::new(),
        }));
        self.by_coord.insert(child, child_index);
        self.node_mut(parent_index)
            .children
            .push((direction, child_index));
        Ok(())
    }

    /// Re-parents an existing coordinate (which must currently have no
    /// parent) under `parent`.
    ///
    /// Fails with [`RoutingError::CycleCreated`] if `parent` sits inside the
    /// subtree being attached.
    pub fn attach(
        &mut self,
        parent: Coord,
        direction: Direction,
        child: Coord,
    ) -> Result<(), RoutingError> {
        if self.subtree_coords(child).contains(&parent) {
            return Err(RoutingError::CycleCreated(child));
        }
        let parent_index = self.by_coord[&parent];
        let child_index = self.by_coord[&child];
        self.node_mut(child_index).parent = Some((direction, parent_index));
        self.node_mut(parent_index)
            .children
            .push((direction, child_index));
        Ok(())
    }

    /// Severs the edge from a coordinate to its parent, orphaning its
    /// subtree in place. No-op for the root or coordinates not in the tree.
    pub fn disconnect(&mut self, child: Coord) {
        let Some(&child_index) = self.by_coord.get(&child) else {
            return;
        };
        let Some((_, parent_index)) = self.node(child_index).parent else {
            return;
        };
        self.node_mut(child_index).parent = None;
        self.node_mut(parent_index)
            .children
            .retain(|&(_, index)| index != child_index);
    }

    /// Removes one coordinate entirely, orphaning its children.
    ///
    /// Returns the removed node's former children.
    pub fn remove(&mut self, coord: Coord) -> Vec<(Direction, Coord)> {
        let Some(&index) = self.by_coord.get(&coord) else {
            return Vec::new();
        };
        self.disconnect(coord);
        let children = self.node(index).children.clone();
        for &(_, child_index) in &children {
            self.node_mut(child_index).parent = None;
        }
        self.by_coord.remove(&coord);
        self.nodes[index] = None;
        children
            .into_iter()
            .map(|(direction, child_index)| (direction, self.coord_of(child_index)))
            .collect()
    }

    /// Every coordinate reachable from `coord` through child edges,
    /// including `coord` itself.
    pub fn subtree_coords(&self, coord: Coord) -> BTreeSet<Coord> {
        let mut out = BTreeSet::new();
        let Some(&start) = self.by_coord.get(&coord) else {
            return out;
        };
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let node = self.node(index);
            out.insert(node.coord);
            stack.extend(node.children.iter().map(|&(_, child)| child));
        }
        out
    }

    /// All edges reachable from the root, in depth-first preorder.
    pub fn edges(&self) -> Vec<(Coord, Direction, Coord)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = self.node(index);
            for &(direction, child) in node.children.iter().rev() {
                out.push((node.coord, direction, self.coord_of(child)));
                stack.push(child);
            }
        }
        out
    }

    fn node(&self, index: usize) -> &TreeNode {
        self.nodes[index]
            .as_ref()
            .unwrap_or_else(|| unreachable!("tree index {index} points at a removed node"))
    }

    fn node_mut(&mut self, index: usize) -> &mut TreeNode {
        self.nodes[index]
            .as_mut()
            .unwrap_or_else(|| unreachable!("tree index {index} points at a removed node"))
    }

    fn coord_of(&self, index: usize) -> Coord {
        self.node(index).coord
    }
}
