//! Room activation and clearance.
//!
//! A room is dormant until the player walks into it. Activation lights it up,
//! resumes its spawners and, after a short delay, shuts its doors. The room
//! is cleared once all of its spawners are exhausted and every enemy it
//! claimed is dead; clearing opens the doors for good.

use std::collections::HashSet;
use std::time::Duration;

use bevy::prelude::*;

use super::builder::CurrentDungeon;
use super::data::EncounterConfig;
use super::doors::{set_door_open, Door};
use super::generator::RoomLayout;
use crate::core::{Animator, EnemyAdded, EnemyDeath, GameEnd, GameStatus, PlaySound, RoomCleared, SessionOutcome};
use crate::enemies::Spawner;
use crate::player::Player;

/// A room of the current level.
#[derive(Component, Debug)]
pub struct DungeonRoom {
    pub layout: RoomLayout,
    pub spawners: Vec<Entity>,
    pub doors: Vec<Entity>,
}

/// Activation flag plus the two one-way latches of a room.
#[derive(Component, Debug, Default)]
pub struct RoomProgress {
    active: bool,
    finished_spawning: bool,
    cleared: bool,
}

impl RoomProgress {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Returns true if this changed the activation state.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        true
    }

    /// Whether every spawner has produced its quota. Once true, stays true
    /// without looking at the spawners again.
    pub fn is_finished_spawning<'a>(&mut self, spawners: impl IntoIterator<Item = &'a Spawner>) -> bool {
        if !self.finished_spawning {
            self.finished_spawning = spawners.into_iter().all(Spawner::is_exhausted);
        }
        self.finished_spawning
    }

    /// Latch the cleared flag if spawning is over and nobody is left.
    /// Returns true only on the call that cleared the room.
    pub fn try_clear(&mut self, finished_spawning: bool, live_enemies: usize) -> bool {
        if self.cleared || !finished_spawning || live_enemies > 0 {
            return false;
        }
        self.cleared = true;
        true
    }
}

/// Enemies a room is waiting on. Entries are removed as they die.
#[derive(Component, Debug, Default)]
pub struct RoomEnemies(HashSet<Entity>);

impl RoomEnemies {
    pub fn add_enemy(&mut self, enemy: Entity) {
        self.0.insert(enemy);
    }

    pub fn remove(&mut self, enemy: Entity) -> bool {
        self.0.remove(&enemy)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pending door lock of a freshly activated room.
#[derive(Component, Debug)]
pub struct DoorLockTimer(pub Timer);

impl DoorLockTimer {
    pub fn new(delay: Duration) -> Self {
        Self(Timer::new(delay, TimerMode::Once))
    }
}

/// Darkening overlay alpha for the renderer.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RoomShade {
    pub alpha: f32,
}

/// The room the player is standing in, if any.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRoom(pub Option<Entity>);

/// Make the room containing the player active and every other room dormant.
#[allow(clippy::too_many_arguments)]
pub fn track_active_room(
    mut commands: Commands,
    dungeon: Option<Res<CurrentDungeon>>,
    config: Res<EncounterConfig>,
    mut active_room: ResMut<ActiveRoom>,
    player_query: Query<&Transform, With<Player>>,
    mut rooms: Query<(&DungeonRoom, &mut RoomProgress, &mut RoomShade, &RoomEnemies)>,
    mut spawners: Query<&mut Spawner>,
    mut cleared_events: EventWriter<RoomCleared>,
) {
    let Some(dungeon) = dungeon else {
        return;
    };
    let Ok(player_transform) = player_query.get_single() else {
        return;
    };

    let tile = dungeon.tiles.world_to_tile(player_transform.translation.truncate());
    let current = dungeon.room_entity_at(tile);
    if current == active_room.0 {
        return;
    }

    if let Some(previous) = active_room.0 {
        if let Ok((room, mut progress, mut shade, _)) = rooms.get_mut(previous) {
            if progress.set_active(false) {
                shade.alpha = config.rooms.dormant_shade;
                for &spawner in &room.spawners {
                    if let Ok(mut spawner) = spawners.get_mut(spawner) {
                        spawner.set_paused(true);
                    }
                }
                commands.entity(previous).remove::<DoorLockTimer>();
                debug!("Room {} is dormant", room.layout.id);
            }
        }
    }

    if let Some(next) = current {
        if let Ok((room, mut progress, mut shade, enemies)) = rooms.get_mut(next) {
            if progress.set_active(true) {
                shade.alpha = config.rooms.active_shade;
                for &spawner in &room.spawners {
                    if let Ok(mut spawner) = spawners.get_mut(spawner) {
                        spawner.set_paused(false);
                    }
                }
                info!("Entered room {}", room.layout.id);

                if !progress.is_cleared() {
                    let finished = progress.is_finished_spawning(room.spawners.iter().filter_map(|s| spawners.get(*s).ok()));
                    if progress.try_clear(finished, enemies.len()) {
                        info!("Room {} has nothing to fight, cleared", room.layout.id);
                        cleared_events.send(RoomCleared { room: next });
                    } else {
                        let delay = Duration::from_millis(config.rooms.door_lock_delay_ms);
                        commands.entity(next).insert(DoorLockTimer::new(delay));
                    }
                }
            }
        }
    }

    active_room.0 = current;
}

/// A room claims an enemy spawned inside its rectangle.
pub fn attribute_enemies(
    mut added_events: EventReader<EnemyAdded>,
    dungeon: Option<Res<CurrentDungeon>>,
    mut rooms: Query<(&DungeonRoom, &mut RoomEnemies)>,
) {
    let Some(dungeon) = dungeon else {
        return;
    };

    for event in added_events.read() {
        let tile = dungeon.tiles.world_to_tile(event.position);
        if let Some((room, mut enemies)) = rooms.iter_mut().find(|(room, _)| room.layout.contains(tile)) {
            enemies.add_enemy(event.enemy);
            debug!("Room {} claimed enemy {:?}", room.layout.id, event.enemy);
        }
    }
}

/// Close the doors of rooms whose lock delay ran out.
pub fn tick_door_locks(
    mut commands: Commands,
    time: Res<Time>,
    mut rooms: Query<(Entity, &DungeonRoom, &RoomProgress, &mut DoorLockTimer)>,
    mut doors: Query<(&mut Door, &mut Animator)>,
    mut sounds: EventWriter<PlaySound>,
) {
    for (entity, room, progress, mut lock) in rooms.iter_mut() {
        if !lock.0.tick(time.delta()).just_finished() {
            continue;
        }
        commands.entity(entity).remove::<DoorLockTimer>();

        // The player may have left, or the room cleared, during the delay.
        if !progress.is_active() || progress.is_cleared() {
            continue;
        }

        for &door_entity in &room.doors {
            if let Ok((mut door, mut animator)) = doors.get_mut(door_entity) {
                set_door_open(&mut commands, door_entity, &mut door, &mut animator, &mut sounds, false);
            }
        }
        info!("Room {} locked", room.layout.id);
    }
}

/// Forget dead enemies and clear rooms that have nothing left to fight.
pub fn check_room_clearance(
    mut death_events: EventReader<EnemyDeath>,
    mut rooms: Query<(Entity, &DungeonRoom, &mut RoomProgress, &mut RoomEnemies)>,
    spawners: Query<&Spawner>,
    mut cleared_events: EventWriter<RoomCleared>,
) {
    for death in death_events.read() {
        for (entity, room, mut progress, mut enemies) in rooms.iter_mut() {
            if !enemies.remove(death.enemy) {
                continue;
            }
            let finished = progress.is_finished_spawning(room.spawners.iter().filter_map(|s| spawners.get(*s).ok()));
            if progress.try_clear(finished, enemies.len()) {
                info!("Room {} cleared", room.layout.id);
                cleared_events.send(RoomCleared { room: entity });
            }
        }
    }
}

/// Cleared rooms open their doors permanently.
pub fn open_cleared_room_doors(
    mut commands: Commands,
    mut cleared_events: EventReader<RoomCleared>,
    rooms: Query<&DungeonRoom>,
    mut doors: Query<(&mut Door, &mut Animator)>,
    mut sounds: EventWriter<PlaySound>,
) {
    for event in cleared_events.read() {
        let Ok(room) = rooms.get(event.room) else {
            continue;
        };
        commands.entity(event.room).remove::<DoorLockTimer>();
        for &door_entity in &room.doors {
            if let Ok((mut door, mut animator)) = doors.get_mut(door_entity) {
                set_door_open(&mut commands, door_entity, &mut door, &mut animator, &mut sounds, true);
            }
        }
    }
}

/// Announce the win once every room is cleared.
pub fn check_victory(
    rooms: Query<&RoomProgress>,
    mut outcome: ResMut<SessionOutcome>,
    mut game_end: EventWriter<GameEnd>,
) {
    if rooms.is_empty() || outcome.status().is_some() {
        return;
    }
    if rooms.iter().all(RoomProgress::is_cleared) && outcome.conclude(GameStatus::Win) {
        info!("All rooms cleared");
        game_end.send(GameEnd { status: GameStatus::Win });
    }
}
