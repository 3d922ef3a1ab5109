//! Binary I/O for Igor Binary Wave (version 5) files: encoding waves to
//! bytes/streams and decoding them back.

pub mod reader;
pub mod writer;

pub use reader::*;
pub use writer::*;
