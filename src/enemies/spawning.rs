//! Timed enemy spawners.
//!
//! Each spawner belongs to one room and produces a fixed quota of enemies on
//! a repeating timer. Spawners are paused while their room is dormant; a
//! paused spawner keeps its progress and does not catch up when resumed.

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::{AiState, Enemy, EnemyStats, EnemyTarget, LastAttack};
use crate::combat::Health;
use crate::core::{Animator, EnemyAdded, Facing};
use crate::player::Player;
use crate::world::{EncounterConfig, LevelEntity};

/// Spawner tuning, read from the encounter config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Time between spawns once the first enemy is out.
    pub spawn_rate_ms: u64,
    /// Enemies per spawner.
    pub quota: u32,
    /// The first spawn happens after a random delay in this range.
    pub start_at_min_ms: u64,
    pub start_at_max_ms: u64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_rate_ms: 5000,
            quota: 3,
            start_at_min_ms: 500,
            start_at_max_ms: 4000,
        }
    }
}

/// Produces enemies for one room.
#[derive(Component, Debug)]
pub struct Spawner {
    pub room: Entity,
    spawn_rate: Duration,
    quota: u32,
    spawned: u32,
    /// Runs the initial delay first, then the spawn rate.
    timer: Timer,
    started: bool,
}

impl Spawner {
    /// New spawners start paused; their room resumes them when it activates.
    pub fn new(room: Entity, start_at: Duration, spawn_rate: Duration, quota: u32) -> Self {
        let mut timer = Timer::new(start_at, TimerMode::Once);
        timer.pause();
        Self {
            room,
            spawn_rate,
            quota,
            spawned: 0,
            timer,
            started: false,
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.timer.pause();
        } else {
            self.timer.unpause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.timer.paused()
    }

    pub fn spawned_count(&self) -> u32 {
        self.spawned
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Whether the quota has been produced.
    pub fn is_exhausted(&self) -> bool {
        self.spawned >= self.quota
    }

    /// Advance by `delta`. Returns true when one enemy is due now.
    ///
    /// At most one enemy comes out per tick, however large the delta.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.timer.tick(delta);
        if !self.timer.just_finished() {
            return false;
        }

        if !self.started {
            self.started = true;
            self.timer = Timer::new(self.spawn_rate, TimerMode::Repeating);
        }
        self.spawned += 1;
        true
    }
}

/// Spawn one enemy hunting `target`.
pub fn spawn_enemy(commands: &mut Commands, position: Vec2, stats: &EnemyStats, target: Entity) -> Entity {
    commands
        .spawn((
            Enemy,
            AiState::default(),
            stats.clone(),
            Health::new(stats.max_health),
            EnemyTarget(target),
            LastAttack::default(),
            Animator::default(),
            Facing::default(),
            Transform::from_translation(position.extend(1.0)),
            LevelEntity,
        ))
        .insert((
            RigidBody::Dynamic,
            Collider::ball(stats.body_radius),
            Velocity::zero(),
            LockedAxes::ROTATION_LOCKED,
            GravityScale(0.0),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Tick every spawner and create the enemies that are due.
pub fn tick_spawners(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<EncounterConfig>,
    player_query: Query<Entity, With<Player>>,
    mut spawners: Query<(&mut Spawner, &Transform)>,
    mut added_events: EventWriter<EnemyAdded>,
) {
    // Enemies need someone to hunt; without a player nothing spawns.
    let Ok(player) = player_query.get_single() else {
        return;
    };

    for (mut spawner, transform) in spawners.iter_mut() {
        if !spawner.tick(time.delta()) {
            continue;
        }

        let position = transform.translation.truncate();
        let enemy = spawn_enemy(&mut commands, position, &config.enemy, player);
        debug!(
            "Spawner produced enemy {:?} ({}/{})",
            enemy,
            spawner.spawned_count(),
            spawner.quota()
        );
        added_events.send(EnemyAdded { enemy, position });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{advance, create_test_app, record_events, recorded};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn spawns_on_schedule_until_quota() {
        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(4000), ms(5000), 3);
        spawner.set_paused(false);

        let mut elapsed = 0;
        let mut spawn_times = Vec::new();
        for now in [0, 4000, 9000, 14000, 19000] {
            if spawner.tick(ms(now - elapsed)) {
                spawn_times.push(now);
            }
            elapsed = now;
        }

        assert_eq!(spawn_times, vec![4000, 9000, 14000]);
        assert_eq!(spawner.spawned_count(), 3);
        assert!(spawner.is_exhausted());
    }

    #[test]
    fn paused_spawner_freezes_progress() {
        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(1000), ms(1000), 2);
        assert!(spawner.is_paused());
        assert!(!spawner.tick(ms(60_000)));

        spawner.set_paused(false);
        assert!(!spawner.tick(ms(600)));
        spawner.set_paused(true);
        assert!(!spawner.tick(ms(10_000)));
        spawner.set_paused(false);
        assert!(spawner.tick(ms(400)));
        assert_eq!(spawner.spawned_count(), 1);
    }

    #[test]
    fn large_delta_spawns_only_once() {
        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(0), ms(100), 5);
        spawner.set_paused(false);
        assert!(spawner.tick(ms(0)));
        assert!(spawner.tick(ms(1000)));
        assert_eq!(spawner.spawned_count(), 2);
    }

    #[test]
    fn spawned_count_never_exceeds_quota() {
        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(10), ms(10), 2);
        spawner.set_paused(false);
        for _ in 0..50 {
            spawner.tick(ms(10));
        }
        assert_eq!(spawner.spawned_count(), 2);
    }

    #[test]
    fn tick_spawners_creates_enemies_and_publishes_them() {
        let mut app = create_test_app();
        app.insert_resource(EncounterConfig::default())
            .add_systems(Update, tick_spawners);
        record_events::<EnemyAdded>(&mut app);

        let player = app
            .world_mut()
            .spawn((Player, Transform::default()))
            .id();
        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(100), ms(1000), 2);
        spawner.set_paused(false);
        app.world_mut()
            .spawn((spawner, Transform::from_xyz(64.0, -32.0, 0.0)));

        advance(&mut app, 100);
        advance(&mut app, 1000);
        advance(&mut app, 1000);

        let added = recorded::<EnemyAdded>(&app);
        assert_eq!(added.len(), 2);
        for event in &added {
            assert_eq!(event.position, Vec2::new(64.0, -32.0));
            let target = app.world().get::<EnemyTarget>(event.enemy).unwrap();
            assert_eq!(target.0, player);
            assert_eq!(app.world().get::<AiState>(event.enemy), Some(&AiState::Idle));
        }
    }

    #[test]
    fn no_player_means_no_spawns() {
        let mut app = create_test_app();
        app.insert_resource(EncounterConfig::default())
            .add_systems(Update, tick_spawners);
        record_events::<EnemyAdded>(&mut app);

        let mut spawner = Spawner::new(Entity::PLACEHOLDER, ms(0), ms(10), 1);
        spawner.set_paused(false);
        app.world_mut().spawn((spawner, Transform::default()));
        advance(&mut app, 100);

        assert!(recorded::<EnemyAdded>(&app).is_empty());
    }
}
