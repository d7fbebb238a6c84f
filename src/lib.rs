//! Dungeon Encounter - a room-by-room top-down shooter simulation in Bevy.
//!
//! A seeded generator lays out rooms and corridors. Entering a room locks its
//! doors, wakes its spawners and unleashes enemies that chase and shoot the
//! player. Killing everything a room produced opens it again; clearing every
//! room wins.
//!
//! # Architecture
//!
//! The game is organized into plugins, each handling a specific aspect:
//!
//! - **Core**: Game states, the event bus, system ordering, animation clock
//! - **World**: Layout generation, tile map, rooms, doors, chests
//! - **Player**: Movement and weapons driven by `PlayerInput`
//! - **Enemies**: Spawners and the enemy state machine
//! - **Combat**: Projectiles, hit resolution, damage and death
//!
//! Rendering, audio and input devices are collaborators: they read the bus
//! (`PlaySound`, `ImpactEffect`, HUD topics) and `Animator` components, and
//! write `PlayerInput`.

pub mod combat;
pub mod core;
pub mod enemies;
pub mod player;
pub mod world;

#[cfg(test)]
mod testing;

use bevy::prelude::*;

/// Main game plugin that adds all sub-plugins.
///
/// Expects `StatesPlugin` and a `Time` source; collisions come from
/// `RapierPhysicsPlugin` when it is added.
pub struct DungeonEncounterPlugin;

impl Plugin for DungeonEncounterPlugin {
    fn build(&self, app: &mut App) {
        app
            // Core systems (must be first)
            .add_plugins(core::CorePlugin)

            // Level generation and room flow
            .add_plugins(world::WorldPlugin)

            // Player systems
            .add_plugins(player::PlayerPlugin)

            // Enemy systems
            .add_plugins(enemies::EnemyPlugin)

            // Combat systems
            .add_plugins(combat::CombatPlugin);
    }
}
