//! Small helpers shared by workers and the handle.

mod clock;
mod ids;

pub use clock::Clock;
pub(crate) use ids::{bot_display_name, random_hex};
