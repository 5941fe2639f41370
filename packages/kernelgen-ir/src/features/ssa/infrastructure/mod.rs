//! SSA infrastructure
//!
//! Node assignment, dominance, phi placement, renaming and the verifiers.
//! Each stage works on a [`BasicBlockGraph`] snapshot; stages that edit the
//! blocks consume the graph and hand back the [`FunctionBody`].
//!
//! [`FunctionBody`]: crate::features::flow_graph::domain::FunctionBody

pub mod dominance;
pub mod errors;
pub mod graph;
pub mod node_assignment;
pub mod phi_placement;
pub mod renaming;
pub mod verify;

pub use dominance::{DominanceFrontier, DominatorSets, DominatorTree, ImmediateDominators};
pub use errors::*;
pub use graph::BasicBlockGraph;
pub use node_assignment::{assign_nodes_to_blocks, NodeBlockMap};
pub use phi_placement::{place_phi_nodes, PhiPlacementStats};
pub use renaming::{rename_variables, RenameStats};
pub use verify::{verify_cfg, verify_ssa};
