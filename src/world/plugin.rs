//! World plugin - config loading, level generation, rooms and doors.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::{EncounterSet, GameState};

use super::builder::{build_level, CurrentDungeon, LevelEntity};
use super::chests::collect_chests;
use super::data::{load_encounter_config, EncounterConfig};
use super::generator::generate_with_retries;
use super::rooms::{
    attribute_enemies, check_room_clearance, check_victory, open_cleared_room_doors, tick_door_locks,
    track_active_room, ActiveRoom,
};
use super::tilemap::TileMap;

/// Salt separating the dressing RNG stream from the layout stream.
const DRESSING_SEED_SALT: u64 = 0xA5A5_5A5A_C3C3_3C3C;

/// World plugin - handles level loading and room flow.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveRoom>()
            .add_systems(OnEnter(GameState::Loading), (teardown_level, load_encounter_config).chain())
            .add_systems(OnEnter(GameState::InGame), setup_level)
            .add_systems(Update, collect_chests.in_set(EncounterSet::Input))
            .add_systems(Update, attribute_enemies.in_set(EncounterSet::Attribution))
            .add_systems(
                Update,
                (
                    track_active_room,
                    tick_door_locks,
                    check_room_clearance,
                    open_cleared_room_doors,
                    check_victory,
                )
                    .chain()
                    .in_set(EncounterSet::Rooms),
            );
    }
}

/// Generate a layout and spawn the level for it.
pub fn setup_level(
    mut commands: Commands,
    config: Res<EncounterConfig>,
    mut active_room: ResMut<ActiveRoom>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let seed = config.seed.unwrap_or_else(rand::random);
    let layout = match generate_with_retries(&config.generator, seed, config.max_generation_retries) {
        Ok(layout) => layout,
        Err(e) => {
            error!("Dungeon generation failed: {}", e);
            next_state.set(GameState::GenerationFailed);
            return;
        }
    };
    info!("Generating level from seed {}", layout.seed);

    let tiles = TileMap::from_layout(&layout, config.tile_size);
    let mut rng = StdRng::seed_from_u64(layout.seed ^ DRESSING_SEED_SALT);
    let room_entities = build_level(&mut commands, &config, &layout, &tiles, &mut rng);

    let mut dungeon = CurrentDungeon::new(layout, tiles);
    dungeon.set_room_entities(room_entities);
    commands.insert_resource(dungeon);
    active_room.0 = None;
}

/// Despawn the previous level, if any. Timers live on level entities and die
/// with them.
fn teardown_level(
    mut commands: Commands,
    level_query: Query<Entity, With<LevelEntity>>,
    mut active_room: ResMut<ActiveRoom>,
) {
    let mut count = 0;
    for entity in level_query.iter() {
        commands.entity(entity).despawn_recursive();
        count += 1;
    }
    if count > 0 {
        info!("Tore down level ({} entities)", count);
    }
    commands.remove_resource::<CurrentDungeon>();
    active_room.0 = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Dead;
    use crate::core::{DamageEvent, EnemyAdded, GameEnd, RestartRequested, RoomCleared};
    use crate::enemies::{spawn_enemy, Spawner, SpawnerConfig};
    use crate::player::Player;
    use crate::testing::{record_events, recorded};
    use crate::world::generator::SizeRange;
    use crate::world::rooms::{DungeonRoom, RoomEnemies, RoomProgress};
    use crate::world::doors::Door;
    use crate::DungeonEncounterPlugin;
    use bevy::state::app::StatesPlugin;
    use std::time::Duration;

    fn encounter_app(config: EncounterConfig) -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_event::<bevy_rapier2d::prelude::CollisionEvent>()
            .insert_resource(config)
            .add_plugins((StatesPlugin, DungeonEncounterPlugin));
        app
    }

    fn step(app: &mut App) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(16));
        app.update();
    }

    fn state(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    #[test]
    fn level_is_built_on_entering_the_game() {
        let mut app = encounter_app(EncounterConfig {
            seed: Some(77),
            ..default()
        });
        step(&mut app);
        step(&mut app);

        assert_eq!(state(&app), GameState::InGame);
        let room_count = app.world().resource::<CurrentDungeon>().layout.rooms.len();
        let world = app.world_mut();
        assert_eq!(world.query::<&DungeonRoom>().iter(world).count(), room_count);
        assert_eq!(world.query::<&Player>().iter(world).count(), 1);
        assert!(world.query::<&Spawner>().iter(world).count() >= room_count);
        assert!(world.query::<&Door>().iter(world).all(Door::is_open));
    }

    #[test]
    fn restart_rebuilds_the_level() {
        let mut app = encounter_app(EncounterConfig {
            seed: Some(78),
            ..default()
        });
        step(&mut app);
        step(&mut app);
        let before = {
            let world = app.world_mut();
            world.query_filtered::<Entity, With<Player>>().single(world)
        };

        app.world_mut().send_event(RestartRequested);
        for _ in 0..4 {
            step(&mut app);
        }

        assert_eq!(state(&app), GameState::InGame);
        let world = app.world_mut();
        let players: Vec<Entity> = world.query_filtered::<Entity, With<Player>>().iter(world).collect();
        assert_eq!(players.len(), 1);
        assert_ne!(players[0], before);
        assert!(world.get_resource::<CurrentDungeon>().is_some());
    }

    #[test]
    fn impossible_generation_blocks_the_game() {
        let mut config = EncounterConfig {
            max_generation_retries: 1,
            ..default()
        };
        config.generator.grid_width = 12;
        config.generator.grid_height = 12;
        let mut app = encounter_app(config);
        step(&mut app);
        step(&mut app);
        step(&mut app);

        assert_eq!(state(&app), GameState::GenerationFailed);
        assert!(app.world().get_resource::<CurrentDungeon>().is_none());
        assert!(app.world().resource::<Events<GameEnd>>().is_empty());
    }

    fn lethal(target: Entity) -> DamageEvent {
        DamageEvent {
            target,
            source: None,
            amount: 10_000.0,
        }
    }

    #[test]
    fn spawned_enemy_is_claimed_killed_and_clears_its_room() {
        let mut config = EncounterConfig {
            seed: Some(77),
            ..default()
        };
        config.rooms.spawners_per_room = SizeRange::new(1, 1);
        config.spawner = SpawnerConfig {
            spawn_rate_ms: 100,
            quota: 1,
            start_at_min_ms: 200,
            start_at_max_ms: 200,
        };
        let mut app = encounter_app(config);
        record_events::<EnemyAdded>(&mut app);
        record_events::<RoomCleared>(&mut app);
        step(&mut app);
        step(&mut app);

        let room = app.world().resource::<ActiveRoom>().0.expect("player starts in a room");
        let (player, position) = {
            let world = app.world_mut();
            let (entity, transform) = world.query_filtered::<(Entity, &Transform), With<Player>>().single(world);
            (entity, transform.translation.truncate())
        };

        // An enemy announced and killed in the same frame is claimed first,
        // so it never lingers in the room.
        let intruder = {
            let stats = app.world().resource::<EncounterConfig>().enemy.clone();
            let mut commands = app.world_mut().commands();
            spawn_enemy(&mut commands, position, &stats, player)
        };
        app.world_mut().flush();
        app.world_mut().send_event(EnemyAdded { enemy: intruder, position });
        app.world_mut().send_event(lethal(intruder));
        step(&mut app);

        assert!(app.world().entity(intruder).contains::<Dead>());
        assert!(app.world().get::<RoomEnemies>(room).unwrap().is_empty());
        assert!(!app.world().get::<RoomProgress>(room).unwrap().is_cleared());

        let mut spawned = None;
        for _ in 0..40 {
            step(&mut app);
            spawned = recorded::<EnemyAdded>(&app)
                .iter()
                .map(|event| event.enemy)
                .find(|enemy| *enemy != intruder);
            if spawned.is_some() {
                break;
            }
        }
        let spawned = spawned.expect("the room's spawner fires");
        assert_eq!(app.world().get::<RoomEnemies>(room).unwrap().len(), 1);
        assert!(recorded::<RoomCleared>(&app).is_empty());

        app.world_mut().send_event(lethal(spawned));
        step(&mut app);

        assert_eq!(recorded::<RoomCleared>(&app), vec![RoomCleared { room }]);
        assert!(app.world().get::<RoomProgress>(room).unwrap().is_cleared());
        let world = app.world_mut();
        let doors: Vec<&Door> = world.query::<&Door>().iter(world).filter(|door| door.room == room).collect();
        assert!(!doors.is_empty());
        assert!(doors.iter().all(|door| door.is_open()));
        assert!(world.resource::<Events<GameEnd>>().is_empty());
    }
}
