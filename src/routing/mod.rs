//! Multicast routing-tree construction over mesh and torus fabrics.

pub mod geometry;
pub mod ner;
pub mod topology;
pub mod tree;

pub use geometry::{Coord, Direction};
pub use ner::{has_dead_links, NerRouter};
pub use topology::{GridTopology, Topology};
pub use tree::RoutingTree;
