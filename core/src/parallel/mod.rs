//! Parallel

mod atomic_float;
mod thread_manager;

// Re-export
pub use atomic_float::*;
pub use thread_manager::*;
