//! Event bus topics used for cross-system communication.
//!
//! Producers (spawners, enemies, weapons) and consumers (rooms, the HUD, the
//! audio layer) never reference each other directly. Every topic is a Bevy
//! event registered on the `App`, so the bus lives exactly as long as the
//! session that owns it and is cleared when the level restarts.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Win,
    Lose,
}

/// The two guns the player carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    #[default]
    AutoRifle,
}

impl WeaponKind {
    /// Display name used by the HUD.
    pub fn name(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Pistol",
            WeaponKind::AutoRifle => "AutoRifle",
        }
    }
}

/// Sound cues requested from the audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    EnemyDeath,
    PistolFire,
    AutoRifleFire,
    NoAmmo,
    WeaponSwap,
    DoorOpenClose,
    Pickup,
    BulletHit,
    WallImpact,
}

/// What a projectile struck, for particle/flash effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactKind {
    Wall,
    Enemy,
    Player,
}

/// A spawner produced a new enemy.
///
/// `position` is the spawn point; rooms use it to attribute the enemy.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EnemyAdded {
    pub enemy: Entity,
    pub position: Vec2,
}

/// An enemy entered its Dead state. Sent exactly once per enemy.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyDeath {
    pub enemy: Entity,
}

/// A room finished spawning and every enemy attributed to it is dead.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomCleared {
    pub room: Entity,
}

/// The player's health changed.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlayerHp {
    pub current: f32,
}

/// Total rounds left for the active weapon. `None` means unlimited.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmoCount {
    pub ammo: Option<u32>,
}

/// The player fired a round.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerFire {
    pub clip_remaining: u32,
}

/// The player reloaded the active weapon.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerReload {
    pub clip_loaded: u32,
}

/// The active weapon changed.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSwap {
    pub weapon: WeaponKind,
    pub clip: u32,
    pub ammo: Option<u32>,
}

/// The session ended in a win or a loss.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEnd {
    pub status: GameStatus,
}

/// The player opened a chest.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChestLoot {
    pub chest: Entity,
}

/// Sent when an entity takes damage.
///
/// The damage system listens for these and applies the actual health
/// reduction.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    /// Entity receiving damage
    pub target: Entity,
    /// Entity that caused the damage, if it still exists
    pub source: Option<Entity>,
    pub amount: f32,
}

/// Sent when an entity's health reaches 0. Internal to combat resolution;
/// enemies re-publish it as [`EnemyDeath`].
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathEvent {
    pub entity: Entity,
}

/// A projectile hit something and the renderer should show it.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ImpactEffect {
    pub position: Vec2,
    pub kind: ImpactKind,
}

/// Request for the audio layer.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlaySound {
    pub cue: SoundCue,
    /// Seconds to wait before playing.
    pub delay_secs: f32,
}

impl PlaySound {
    pub fn now(cue: SoundCue) -> Self {
        Self { cue, delay_secs: 0.0 }
    }

    pub fn delayed(cue: SoundCue, delay_secs: f32) -> Self {
        Self { cue, delay_secs }
    }
}

/// Tear the level down and generate a fresh one.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestartRequested;
