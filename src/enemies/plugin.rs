//! Enemy plugin - registers all enemy systems.

use bevy::prelude::*;

use super::ai;
use super::spawning::tick_spawners;
use crate::combat::apply_damage;
use crate::core::EncounterSet;

/// Enemy plugin - handles spawning, AI, death and despawning.
pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, tick_spawners.in_set(EncounterSet::Spawn))
            .add_systems(
                Update,
                (ai::ai_detection, ai::ai_chase, ai::ai_attack)
                    .chain()
                    .in_set(EncounterSet::Ai),
            )
            .add_systems(
                Update,
                ai::handle_enemy_death
                    .after(apply_damage)
                    .in_set(EncounterSet::Combat),
            )
            .add_systems(Update, ai::despawn_dead_enemies.in_set(EncounterSet::Cleanup));
    }
}
