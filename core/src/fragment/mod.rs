//! Fragments

mod chain;
mod node;

// Re-export
pub use chain::*;
pub use node::*;
