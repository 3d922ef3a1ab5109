//! Core Igor Binary Wave (version 5) types: header layout constants,
//! the in-memory wave model, and wave name rules.
//!
//! The on-disk encoding itself lives in the `ibw-io` crate.

pub mod header;
pub mod name;
pub mod wave;

pub use header::*;
pub use name::*;
pub use wave::*;
