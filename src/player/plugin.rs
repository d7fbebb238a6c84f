//! Player plugin - movement, weapons and death.

use bevy::prelude::*;

use super::components::PlayerInput;
use super::movement::{announce_loadout, handle_player_death, player_movement, player_weapons};
use crate::combat::apply_damage;
use crate::core::EncounterSet;

/// Player plugin - handles player input, weapons and losing.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInput>()
            .add_systems(
                Update,
                (announce_loadout, player_movement, player_weapons)
                    .chain()
                    .in_set(EncounterSet::Input),
            )
            .add_systems(
                Update,
                handle_player_death
                    .after(apply_damage)
                    .in_set(EncounterSet::Combat),
            );
    }
}
