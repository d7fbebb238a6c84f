//! Combat plugin - projectiles, hits and damage.

use bevy::prelude::*;

use super::systems::{apply_damage, contact_damage, move_projectiles, resolve_projectile_hits};
use crate::core::EncounterSet;

/// Combat plugin - handles all combat systems.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (move_projectiles, resolve_projectile_hits, contact_damage, apply_damage)
                .chain()
                .in_set(EncounterSet::Combat),
        );
    }
}
