//! Shelf application library
//!
//! Book tracking pages built on the shelf kernel, plus the bootstrap that
//! wires store, modules and HTTP server together.

pub mod bootstrap;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
