//! Agent node implementations.
//!
//! Currently one flavor: [`react`], the think/act/observe loop. Graph
//! assembly lives in [`crate::factory`], which wires these nodes together
//! with the compression subgraph from [`crate::compress`].

pub mod react;
