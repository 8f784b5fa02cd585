//! Generic directed-graph algorithms used by the sorter.
//!
//! ## Submodules
//!
//! - [`scc`]: Tarjan strongly connected components over an ordered
//!   adjacency map, with an explicit call stack.

pub mod scc;

pub use scc::{AdjacencyMap, Graph, has_self_loop, is_cyclic, strongly_connected_components};
