//! Pad geometry types and pad-to-polygon conversion.

pub mod pad;
pub mod types;

pub use pad::*;
pub use types::*;
