pub mod common;
pub mod blueprint;

pub use common::*;
pub use blueprint::*;
