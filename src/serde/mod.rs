//! Serde helpers.

pub mod duration;
pub mod quantity;
