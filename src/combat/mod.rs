//! Combat module - weapons, projectiles and damage.

mod components;
mod plugin;
mod systems;
mod weapons;

pub use components::*;
pub use plugin::CombatPlugin;
pub use systems::{apply_damage, resolve_hit, HitOutcome, HitTarget};
pub use weapons::{FireResult, Loadout, Weapon, WeaponStats};
