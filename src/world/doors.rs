//! Doors in room walls.

use bevy::math::IVec2;
use bevy::prelude::*;
use bevy_rapier2d::prelude::ColliderDisabled;

use super::generator::DoorEdge;
use crate::core::{AnimationKey, Animator, PlaySound, SoundCue};

/// A door owned by one room. Doors start open and are never despawned while
/// the level exists.
#[derive(Component, Debug)]
pub struct Door {
    pub tile: IVec2,
    pub orientation: DoorEdge,
    pub room: Entity,
    open: bool,
}

impl Door {
    pub fn new(tile: IVec2, orientation: DoorEdge, room: Entity) -> Self {
        Self {
            tile,
            orientation,
            room,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns false when the door already was in the requested state.
    pub fn set_open(&mut self, open: bool) -> bool {
        if self.open == open {
            return false;
        }
        self.open = open;
        true
    }
}

/// Open or close a door and everything hanging off it: the collider, the
/// animation and the sound. Asking for the current state does nothing.
pub fn set_door_open(
    commands: &mut Commands,
    entity: Entity,
    door: &mut Door,
    animator: &mut Animator,
    sounds: &mut EventWriter<PlaySound>,
    open: bool,
) {
    if !door.set_open(open) {
        return;
    }

    if open {
        commands.entity(entity).insert(ColliderDisabled);
    } else {
        commands.entity(entity).remove::<ColliderDisabled>();
    }

    // Only doors in horizontal walls have an opening animation.
    if door.orientation.is_horizontal_wall() {
        let key = if open { AnimationKey::DoorOpen } else { AnimationKey::DoorClose };
        animator.play(key, true);
    }

    let sound = if open {
        PlaySound::delayed(SoundCue::DoorOpenClose, 1.0)
    } else {
        PlaySound::now(SoundCue::DoorOpenClose)
    };
    sounds.send(sound);
}
