//! Animation interface between the simulation and whatever draws it.
//!
//! Gameplay code only asks an [`Animator`] to play a clip and checks whether
//! something is still playing. A renderer drives the clip and calls
//! [`Animator::finish`] when a one-shot clip ends. Without a renderer,
//! [`AnimationClockPlugin`] finishes clips after their nominal length.

use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Every clip the encounter asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKey {
    EnemyIdle,
    EnemyRun,
    EnemyDeath,
    PlayerRun,
    PlayerAttack,
    DoorOpen,
    DoorClose,
    DoorIdle,
}

/// Frame count and rate of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    pub frames: u32,
    pub fps: f32,
    #[serde(default)]
    pub looping: bool,
}

impl ClipSpec {
    pub const fn once(frames: u32, fps: f32) -> Self {
        Self {
            frames,
            fps,
            looping: false,
        }
    }

    /// Length of one pass through the clip.
    pub fn duration(&self) -> Duration {
        if self.fps <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f32(self.frames as f32 / self.fps)
    }
}

/// Clip lengths, keyed by animation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationLibrary {
    pub clips: HashMap<AnimationKey, ClipSpec>,
}

impl Default for AnimationLibrary {
    fn default() -> Self {
        let clips = HashMap::from([
            (AnimationKey::EnemyIdle, ClipSpec::once(4, 8.0)),
            (AnimationKey::EnemyRun, ClipSpec::once(4, 8.0)),
            (AnimationKey::EnemyDeath, ClipSpec::once(8, 8.0)),
            (AnimationKey::PlayerRun, ClipSpec::once(4, 8.0)),
            (AnimationKey::PlayerAttack, ClipSpec::once(4, 32.0)),
            (AnimationKey::DoorOpen, ClipSpec::once(12, 4.0)),
            (AnimationKey::DoorClose, ClipSpec::once(12, 4.0)),
            (
                AnimationKey::DoorIdle,
                ClipSpec {
                    frames: 4,
                    fps: 4.0,
                    looping: true,
                },
            ),
        ]);
        Self { clips }
    }
}

impl AnimationLibrary {
    pub fn get(&self, key: AnimationKey) -> Option<&ClipSpec> {
        self.clips.get(&key)
    }
}

/// Playback state of one sprite.
#[derive(Component, Debug, Default, Clone)]
pub struct Animator {
    current: Option<AnimationKey>,
    playing: bool,
    elapsed: Duration,
}

impl Animator {
    /// Start `key`. Unless `restart` is set, asking for the clip that is
    /// already playing does nothing.
    pub fn play(&mut self, key: AnimationKey, restart: bool) {
        if !restart && self.playing && self.current == Some(key) {
            return;
        }
        self.current = Some(key);
        self.playing = true;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current(&self) -> Option<AnimationKey> {
        self.current
    }

    /// Mark the current clip as ended.
    pub fn finish(&mut self) {
        self.playing = false;
    }

    /// True once `key` was the last clip and it has ended.
    pub fn has_finished(&self, key: AnimationKey) -> bool {
        self.current == Some(key) && !self.playing
    }
}

/// Which way a sprite faces. The renderer mirrors it horizontally when set.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Facing {
    pub flip_x: bool,
}

impl Facing {
    /// Face along `direction`; a vertical direction keeps the current facing.
    pub fn look_along(&mut self, direction: Vec2) {
        if direction.x < 0.0 {
            self.flip_x = true;
        } else if direction.x > 0.0 {
            self.flip_x = false;
        }
    }
}

/// Advances every playing clip and ends one-shot clips that ran their length.
pub fn advance_animations(
    time: Res<Time>,
    library: Res<AnimationLibrary>,
    mut animators: Query<&mut Animator>,
) {
    for mut animator in animators.iter_mut() {
        if !animator.playing {
            continue;
        }
        let Some(key) = animator.current else {
            continue;
        };
        let Some(clip) = library.get(key) else {
            // Unknown clip: nothing will ever finish it, so end it now.
            animator.finish();
            continue;
        };
        if clip.looping {
            continue;
        }

        animator.elapsed += time.delta();
        if animator.elapsed >= clip.duration() {
            animator.finish();
        }
    }
}

/// Headless stand-in for a sprite renderer.
///
/// Add this when nothing else ends clips, otherwise enemies never finish
/// dying and are never despawned.
pub struct AnimationClockPlugin;

impl Plugin for AnimationClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationLibrary>()
            .add_systems(Update, advance_animations.before(super::EncounterSet::Input));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{advance, create_test_app};

    #[test]
    fn play_without_restart_keeps_running_clip() {
        let mut animator = Animator::default();
        animator.play(AnimationKey::EnemyRun, false);
        animator.elapsed = Duration::from_millis(200);

        animator.play(AnimationKey::EnemyRun, false);
        assert_eq!(animator.elapsed, Duration::from_millis(200));

        animator.play(AnimationKey::EnemyRun, true);
        assert_eq!(animator.elapsed, Duration::ZERO);
    }

    #[test]
    fn clock_finishes_one_shot_clips() {
        let mut app = create_test_app();
        app.init_resource::<AnimationLibrary>()
            .add_systems(Update, advance_animations);

        let mut animator = Animator::default();
        animator.play(AnimationKey::EnemyDeath, false);
        let entity = app.world_mut().spawn(animator).id();

        // Death clip: 8 frames at 8 fps.
        advance(&mut app, 600);
        assert!(app.world().get::<Animator>(entity).unwrap().is_playing());

        advance(&mut app, 500);
        let animator = app.world().get::<Animator>(entity).unwrap();
        assert!(animator.has_finished(AnimationKey::EnemyDeath));
    }

    #[test]
    fn looping_clips_never_finish() {
        let mut app = create_test_app();
        app.init_resource::<AnimationLibrary>()
            .add_systems(Update, advance_animations);

        let mut animator = Animator::default();
        animator.play(AnimationKey::DoorIdle, false);
        let entity = app.world_mut().spawn(animator).id();

        advance(&mut app, 10_000);
        assert!(app.world().get::<Animator>(entity).unwrap().is_playing());
    }

    #[test]
    fn facing_follows_horizontal_direction() {
        let mut facing = Facing::default();
        facing.look_along(Vec2::new(-1.0, 0.5));
        assert!(facing.flip_x);
        facing.look_along(Vec2::new(0.0, 1.0));
        assert!(facing.flip_x);
        facing.look_along(Vec2::new(2.0, 0.0));
        assert!(!facing.flip_x);
    }
}
