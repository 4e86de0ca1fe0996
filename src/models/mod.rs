//! Domain models shared across the whole monitor.

pub mod position;
pub mod quote;

pub use position::{NewPosition, Position, Side};
pub use quote::Quote;
