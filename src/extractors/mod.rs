//! Request extractors.

pub mod params;
pub use params::*;
