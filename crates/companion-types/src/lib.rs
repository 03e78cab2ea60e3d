//! Shared types for the campus companion.

mod agenda;
mod event;
mod interaction;
mod ws;

pub use agenda::*;
pub use event::*;
pub use interaction::*;
pub use ws::*;
