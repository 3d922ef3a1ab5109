//! SMD → Igor Binary Wave converter core.
//!
//! Parses SMD hyperspectral scan files (XML-like header + dense f32 payload)
//! into a 4-D cube model and builds IBW wave objects from it: per-detector
//! image cubes and derived spectral axes (nm, Raman shift, Brillouin shift).

pub mod convert;
pub mod cube;
pub mod error;
pub mod header;
pub mod note;
pub mod parser;

#[cfg(test)]
pub(crate) mod testdata;

pub use convert::*;
pub use cube::*;
pub use error::*;
pub use header::*;
pub use note::*;
pub use parser::*;
