// Thin re-export module: blocks, the chain, its integrity checks and read-side
// statistics live under `blockchain/core/`.

pub mod core;
pub use core::*;
