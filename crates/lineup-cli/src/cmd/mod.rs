pub mod completions;
pub mod config;
pub mod cycles;
pub mod graph;
pub mod input;
pub mod plan;
pub mod sort;
