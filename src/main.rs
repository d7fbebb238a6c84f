//! Dungeon Encounter - headless runner.
//!
//! Plays one session at a fixed 16 ms step with a scripted bot in place of a
//! human: it shoots the nearest enemy, reloads and swaps when dry, and warps
//! to the next uncleared room once the current one is done. The event bus is
//! logged until the game ends.
//!
//! Tuning comes from `assets/data/encounter.ron`.

use std::time::Duration;

use bevy::app::AppExit;
use bevy::core::FrameCount;
use bevy::hierarchy::HierarchyPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use bevy_rapier2d::prelude::*;

use dungeon_encounter::combat::{Dead, Loadout};
use dungeon_encounter::core::{
    AnimationClockPlugin, ChestLoot, EncounterSet, EnemyAdded, EnemyDeath, GameEnd, GameState, PlayerHp,
    RoomCleared,
};
use dungeon_encounter::enemies::Enemy;
use dungeon_encounter::player::{Player, PlayerInput};
use dungeon_encounter::world::{CurrentDungeon, DungeonRoom, RoomProgress};
use dungeon_encounter::DungeonEncounterPlugin;

/// Simulation step.
const STEP: Duration = Duration::from_millis(16);

/// Give up after ten simulated minutes.
const MAX_FRAMES: u32 = 37_500;

/// The bot opens fire inside this distance.
const ENGAGE_RANGE: f32 = 300.0;

fn main() {
    App::new()
        .add_plugins((
            MinimalPlugins,
            LogPlugin::default(),
            TransformPlugin,
            HierarchyPlugin,
            StatesPlugin,
        ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(STEP))
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(32.0))
        // No renderer: clips end on their nominal length
        .add_plugins(AnimationClockPlugin)
        // Our game plugin
        .add_plugins(DungeonEncounterPlugin)
        .add_systems(
            Update,
            drive_bot
                .before(EncounterSet::Input)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(Update, (log_bus, stop_when_done))
        .run();
}

/// Aim, shoot and travel on behalf of the player.
fn drive_bot(
    mut input: ResMut<PlayerInput>,
    dungeon: Option<Res<CurrentDungeon>>,
    mut player_query: Query<(&mut Transform, &Loadout), With<Player>>,
    enemies: Query<&Transform, (With<Enemy>, Without<Dead>, Without<Player>)>,
    rooms: Query<(&DungeonRoom, &RoomProgress)>,
) {
    let Some(dungeon) = dungeon else {
        return;
    };
    let Ok((mut transform, loadout)) = player_query.get_single_mut() else {
        return;
    };
    let position = transform.translation.truncate();

    let nearest = enemies
        .iter()
        .map(|t| t.translation.truncate())
        .min_by(|a, b| a.distance_squared(position).total_cmp(&b.distance_squared(position)));

    input.move_axis = Vec2::ZERO;
    input.aim = nearest;
    input.fire = nearest.is_some_and(|target| target.distance(position) <= ENGAGE_RANGE);

    let weapon = loadout.active();
    if weapon.clip() == 0 {
        if weapon.ammo() == Some(0) {
            input.swap_pressed = true;
        } else {
            input.reload_pressed = true;
        }
    }

    if nearest.is_some() {
        return;
    }

    // Nothing left to shoot here: move on once the room is done.
    let tile = dungeon.tiles.world_to_tile(position);
    let here = dungeon.tiles.room_at(tile);
    let mut pending: Vec<&DungeonRoom> = rooms
        .iter()
        .filter(|(_, progress)| !progress.is_cleared())
        .map(|(room, _)| room)
        .collect();
    if pending.iter().any(|room| Some(room.layout.id) == here) {
        return;
    }
    pending.sort_by_key(|room| room.layout.id);
    if let Some(next) = pending.first() {
        let target = dungeon.tiles.tile_to_world(next.layout.center());
        info!("Bot moving to room {}", next.layout.id);
        transform.translation = target.extend(transform.translation.z);
    }
}

fn log_bus(
    mut added: EventReader<EnemyAdded>,
    mut deaths: EventReader<EnemyDeath>,
    mut cleared: EventReader<RoomCleared>,
    mut loot: EventReader<ChestLoot>,
    mut hp: EventReader<PlayerHp>,
) {
    for event in added.read() {
        debug!("Enemy {:?} spawned at {}", event.enemy, event.position);
    }
    for event in deaths.read() {
        info!("Enemy {:?} died", event.enemy);
    }
    for event in cleared.read() {
        info!("Room {:?} cleared", event.room);
    }
    for _ in loot.read() {
        info!("Chest looted");
    }
    for event in hp.read() {
        debug!("Player hp {}", event.current);
    }
}

fn stop_when_done(
    mut game_end: EventReader<GameEnd>,
    state: Res<State<GameState>>,
    frames: Res<FrameCount>,
    mut exit: EventWriter<AppExit>,
) {
    if let Some(event) = game_end.read().last() {
        info!("Game over: {:?} after {} frames", event.status, frames.0);
        exit.send(AppExit::Success);
        return;
    }
    if *state.get() == GameState::GenerationFailed {
        error!("No playable dungeon could be generated");
        exit.send(AppExit::error());
        return;
    }
    if frames.0 >= MAX_FRAMES {
        warn!("Stopping after {} frames without a result", frames.0);
        exit.send(AppExit::Success);
    }
}
