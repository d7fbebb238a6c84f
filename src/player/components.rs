//! Player-related components.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component for the player entity.
#[derive(Component)]
pub struct Player;

/// Player tuning, read from the encounter config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// World units per second.
    pub move_speed: f32,
    pub max_health: f32,
    /// Damage taken per enemy for every frame it presses against the player.
    pub contact_damage: f32,
    pub body_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 250.0,
            max_health: 100.0,
            contact_damage: 1.0,
            body_radius: 8.0,
        }
    }
}

/// Intent written by whatever drives the player (keyboard, a bot, a test).
///
/// `reload_pressed` and `swap_pressed` are one-shot and cleared once read.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct PlayerInput {
    /// Desired direction in world space, y up. Need not be normalised.
    pub move_axis: Vec2,
    /// World point the player aims at.
    pub aim: Option<Vec2>,
    /// Trigger held.
    pub fire: bool,
    pub reload_pressed: bool,
    pub swap_pressed: bool,
}
