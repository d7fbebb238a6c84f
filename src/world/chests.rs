//! Ammo chests.

use std::collections::HashSet;

use bevy::math::IVec2;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

use super::builder::LevelEntity;
use super::generator::RoomLayout;
use crate::combat::Loadout;
use crate::core::{AmmoCount, ChestLoot, PlaySound, SoundCue, WeaponKind, WeaponSwap};
use crate::player::Player;

/// Rounds granted by one chest.
pub const CHEST_AMMO: u32 = 30;

/// Loot lying in a room, picked up on touch.
#[derive(Component, Debug)]
pub struct Chest {
    pub room: Entity,
}

/// Roll for a chest in `room`. Returns the tile to put it on, if any.
pub fn maybe_create_chests(room: &RoomLayout, chance: f64, rng: &mut impl Rng) -> Option<IVec2> {
    if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    let x = rng.gen_range(room.left() + 1..=room.right() - 1);
    let y = rng.gen_range(room.top() + 1..=room.bottom() - 1);
    Some(IVec2::new(x, y))
}

pub fn spawn_chest(commands: &mut Commands, room: Entity, position: Vec2, size: f32) -> Entity {
    commands
        .spawn((
            Chest { room },
            Transform::from_translation(position.extend(0.5)),
            RigidBody::Fixed,
            Collider::cuboid(size * 0.4, size * 0.4),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            LevelEntity,
        ))
        .id()
}

/// The player touching a chest switches to the rifle, stocks up and reloads.
#[allow(clippy::too_many_arguments)]
pub fn collect_chests(
    mut commands: Commands,
    mut collisions: EventReader<CollisionEvent>,
    chests: Query<(), With<Chest>>,
    mut players: Query<&mut Loadout, With<Player>>,
    mut loot_events: EventWriter<ChestLoot>,
    mut swap_events: EventWriter<WeaponSwap>,
    mut ammo_events: EventWriter<AmmoCount>,
    mut sounds: EventWriter<PlaySound>,
) {
    let mut opened = HashSet::new();

    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _) = event else {
            continue;
        };
        let (chest, player) = if chests.contains(*a) && players.contains(*b) {
            (*a, *b)
        } else if chests.contains(*b) && players.contains(*a) {
            (*b, *a)
        } else {
            continue;
        };
        if !opened.insert(chest) {
            continue;
        }
        let Ok(mut loadout) = players.get_mut(player) else {
            continue;
        };

        if loadout.select(WeaponKind::AutoRifle) {
            let weapon = loadout.active();
            swap_events.send(WeaponSwap {
                weapon: weapon.kind(),
                clip: weapon.clip(),
                ammo: weapon.ammo(),
            });
        }
        let weapon = loadout.active_mut();
        weapon.add_ammo(CHEST_AMMO);
        weapon.reload();
        ammo_events.send(AmmoCount { ammo: weapon.ammo() });

        loot_events.send(ChestLoot { chest });
        sounds.send(PlaySound::now(SoundCue::Pickup));
        commands.entity(chest).despawn_recursive();
        info!("Chest opened, +{} rifle ammo", CHEST_AMMO);
    }
}
