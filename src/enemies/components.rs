//! Enemy-related components.

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component for all enemies.
#[derive(Component)]
pub struct Enemy;

/// AI state machine for enemy behavior.
#[derive(Component, Default, PartialEq, Eq, Clone, Copy, Debug)]
pub enum AiState {
    /// Standing still, waiting for the target to come within aggression range.
    #[default]
    Idle,
    /// Walking toward the target.
    Moving,
    /// Standing and shooting at the target.
    Attacking,
    /// Terminal. Plays the death animation, then the enemy is despawned.
    Dead,
}

/// Enemy tuning, read from the encounter config.
///
/// Distances are in world units. `move_speed` is per millisecond of frame
/// time, so the velocity scales with the frame delta.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    pub max_health: f32,
    pub move_speed: f32,
    pub aggression_radius: f32,
    pub attack_radius: f32,
    pub fire_cooldown_ms: u64,
    pub projectile_damage: f32,
    pub projectile_speed: f32,
    pub projectile_max_travel: f32,
    pub body_radius: f32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 1.5,
            aggression_radius: 200.0,
            attack_radius: 120.0,
            fire_cooldown_ms: 1500,
            projectile_damage: 10.0,
            projectile_speed: 150.0,
            projectile_max_travel: 350.0,
            body_radius: 12.0,
        }
    }
}

/// Who the enemy is after. The target may despawn; lookups then fail and the
/// enemy treats it as out of range.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTarget(pub Entity);

/// Elapsed time of the last shot, used for the fire cooldown.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LastAttack(pub Option<Duration>);

impl LastAttack {
    pub fn ready(&self, now: Duration, cooldown: Duration) -> bool {
        match self.0 {
            Some(last) => now.saturating_sub(last) >= cooldown,
            None => true,
        }
    }
}
