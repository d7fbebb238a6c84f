//! Core game module - states, the event bus, and the animation interface.
//!
//! This module provides the foundation that all other game systems build upon.

mod animation;
mod events;
mod plugin;
mod states;

pub use animation::*;
pub use events::*;
pub use plugin::{register_event_bus, CorePlugin, EncounterSet};
pub use states::*;
