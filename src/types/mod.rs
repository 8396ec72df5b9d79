//! Shared primitive types.
mod address;
pub use address::*;

mod amount;
pub use amount::*;

mod chain;
pub use chain::*;

mod estimate;
pub use estimate::*;

mod request;
pub use request::*;
