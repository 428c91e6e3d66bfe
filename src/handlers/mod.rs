//! HTTP handlers exposing blueprint resolution.

pub mod find;
pub use find::*;
