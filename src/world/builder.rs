//! Level construction from a generated layout.

use std::collections::HashSet;
use std::time::Duration;

use bevy::math::IVec2;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use super::chests::{maybe_create_chests, spawn_chest};
use super::data::EncounterConfig;
use super::doors::Door;
use super::generator::{DungeonLayout, RoomLayout};
use super::rooms::{DungeonRoom, RoomEnemies, RoomProgress, RoomShade};
use super::tilemap::{Tile, TileMap};
use crate::combat::Obstacle;
use crate::core::Animator;
use crate::enemies::Spawner;
use crate::player::spawn_player;

/// Marker for everything that belongs to the current level and must go when
/// it is torn down.
#[derive(Component)]
pub struct LevelEntity;

/// Non-interactive clutter that blocks movement and bullets.
#[derive(Component)]
pub struct Decoration;

/// The generated map of the running level.
#[derive(Resource, Debug)]
pub struct CurrentDungeon {
    pub layout: DungeonLayout,
    pub tiles: TileMap,
    room_entities: Vec<Entity>,
}

impl CurrentDungeon {
    pub fn new(layout: DungeonLayout, tiles: TileMap) -> Self {
        Self {
            layout,
            tiles,
            room_entities: Vec::new(),
        }
    }

    pub fn set_room_entities(&mut self, rooms: Vec<Entity>) {
        self.room_entities = rooms;
    }

    pub fn room_entity(&self, id: usize) -> Option<Entity> {
        self.room_entities.get(id).copied()
    }

    /// Room entity whose rectangle covers `tile`.
    pub fn room_entity_at(&self, tile: IVec2) -> Option<Entity> {
        self.tiles.room_at(tile).and_then(|id| self.room_entity(id))
    }
}

/// Spawn every entity of a level. Returns the room entities, indexed by room
/// id.
pub fn build_level(
    commands: &mut Commands,
    config: &EncounterConfig,
    layout: &DungeonLayout,
    tiles: &TileMap,
    rng: &mut StdRng,
) -> Vec<Entity> {
    let tile_size = tiles.tile_size();
    spawn_walls(commands, tiles);

    let mut room_entities = Vec::with_capacity(layout.rooms.len());
    for room_layout in &layout.rooms {
        room_entities.push(spawn_room(commands, config, room_layout, tiles, rng));
    }

    if let Some(start) = layout.rooms.first() {
        let position = tiles.tile_to_world(start.center());
        spawn_player(commands, position, config);
    }

    info!(
        "Built level: {} rooms, {} corridors, tile size {}",
        layout.rooms.len(),
        layout.corridors.len(),
        tile_size
    );
    room_entities
}

fn spawn_room(
    commands: &mut Commands,
    config: &EncounterConfig,
    layout: &RoomLayout,
    tiles: &TileMap,
    rng: &mut StdRng,
) -> Entity {
    let room = commands.spawn_empty().id();
    let tile_size = tiles.tile_size();
    let mut occupied = HashSet::from([layout.center()]);

    let doors: Vec<Entity> = layout
        .doors
        .iter()
        .map(|door| {
            commands
                .spawn((
                    Door::new(door.tile, door.edge, room),
                    Animator::default(),
                    Transform::from_translation(tiles.tile_to_world(door.tile).extend(0.0)),
                    RigidBody::Fixed,
                    Collider::cuboid(tile_size / 2.0, tile_size / 2.0),
                    // Doors start open.
                    ColliderDisabled,
                    Obstacle,
                    LevelEntity,
                ))
                .id()
        })
        .collect();

    let rooms_config = &config.rooms;
    let spawner_count = rng.gen_range(rooms_config.spawners_per_room.min..=rooms_config.spawners_per_room.max);
    let mut spawners = Vec::new();
    for _ in 0..spawner_count {
        let tile = spawner_tile(layout, rooms_config.spawner_margin, rng);
        occupied.insert(tile);
        let spawner_config = &config.spawner;
        let start_at = rng.gen_range(spawner_config.start_at_min_ms..=spawner_config.start_at_max_ms.max(spawner_config.start_at_min_ms));
        let spawner = Spawner::new(
            room,
            Duration::from_millis(start_at),
            Duration::from_millis(spawner_config.spawn_rate_ms),
            spawner_config.quota,
        );
        spawners.push(
            commands
                .spawn((
                    spawner,
                    Transform::from_translation(tiles.tile_to_world(tile).extend(0.0)),
                    LevelEntity,
                ))
                .id(),
        );
    }

    if let Some(tile) = maybe_create_chests(layout, rooms_config.chest_chance, rng) {
        if occupied.insert(tile) {
            spawn_chest(commands, room, tiles.tile_to_world(tile), tile_size);
        }
    }

    if rooms_config.decorations {
        // A few tries to find a free tile; a room without clutter is fine.
        for _ in 0..4 {
            let tile = IVec2::new(
                rng.gen_range(layout.left() + 1..=layout.right() - 1),
                rng.gen_range(layout.top() + 1..=layout.bottom() - 1),
            );
            if occupied.insert(tile) {
                spawn_decoration(commands, tiles.tile_to_world(tile), tile_size);
                break;
            }
        }
    }

    commands.entity(room).insert((
        DungeonRoom {
            layout: layout.clone(),
            spawners,
            doors,
        },
        RoomProgress::default(),
        RoomEnemies::default(),
        RoomShade {
            alpha: rooms_config.dormant_shade,
        },
        Transform::from_translation(tiles.tile_to_world(layout.center()).extend(0.0)),
        LevelEntity,
    ));
    room
}

/// Interior tile at least `margin` tiles from the room edge, or the centre
/// when the room is too small for that.
fn spawner_tile(layout: &RoomLayout, margin: i32, rng: &mut StdRng) -> IVec2 {
    let (min_x, max_x) = (layout.left() + margin, layout.right() - margin);
    let (min_y, max_y) = (layout.top() + margin, layout.bottom() - margin);
    if min_x > max_x || min_y > max_y {
        return layout.center();
    }
    IVec2::new(rng.gen_range(min_x..=max_x), rng.gen_range(min_y..=max_y))
}

/// One fixed collider per horizontal run of wall tiles.
fn spawn_walls(commands: &mut Commands, tiles: &TileMap) {
    let tile_size = tiles.tile_size();
    let mut count = 0;

    for y in 0..tiles.height() {
        let mut x = 0;
        while x < tiles.width() {
            if tiles.tile_at(IVec2::new(x, y)) != Tile::Wall {
                x += 1;
                continue;
            }
            let start = x;
            while x < tiles.width() && tiles.tile_at(IVec2::new(x, y)) == Tile::Wall {
                x += 1;
            }
            let run = (x - start) as f32;
            let left = tiles.tile_to_world(IVec2::new(start, y));
            let center = left + Vec2::new((run - 1.0) * tile_size / 2.0, 0.0);
            commands.spawn((
                Transform::from_translation(center.extend(0.0)),
                RigidBody::Fixed,
                Collider::cuboid(run * tile_size / 2.0, tile_size / 2.0),
                Obstacle,
                LevelEntity,
            ));
            count += 1;
        }
    }

    debug!("Spawned {} wall colliders", count);
}

fn spawn_decoration(commands: &mut Commands, position: Vec2, tile_size: f32) {
    commands.spawn((
        Decoration,
        Transform::from_translation(position.extend(0.5)),
        RigidBody::Fixed,
        Collider::cuboid(tile_size * 0.4, tile_size * 0.4),
        Obstacle,
        LevelEntity,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generator::generate_with_retries;
    use rand::SeedableRng;

    #[test]
    fn spawner_tiles_keep_their_distance_from_walls() {
        let layout = RoomLayout::new(0, 4, 4, 9, 7);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let tile = spawner_tile(&layout, 2, &mut rng);
            assert!(tile.x >= layout.left() + 2 && tile.x <= layout.right() - 2);
            assert!(tile.y >= layout.top() + 2 && tile.y <= layout.bottom() - 2);
        }

        let tiny = RoomLayout::new(1, 0, 0, 3, 3);
        assert_eq!(spawner_tile(&tiny, 2, &mut rng), tiny.center());
    }

    #[test]
    fn room_entity_lookup_follows_tiles() {
        let config = EncounterConfig::default();
        let layout = generate_with_retries(&config.generator, 5, 10).unwrap();
        let tiles = TileMap::from_layout(&layout, config.tile_size);
        let center = layout.rooms[1].center();

        let mut dungeon = CurrentDungeon::new(layout.clone(), tiles);
        let entities: Vec<Entity> = (0..layout.rooms.len() as u32).map(Entity::from_raw).collect();
        dungeon.set_room_entities(entities.clone());

        assert_eq!(dungeon.room_entity_at(center), Some(entities[1]));
        assert_eq!(dungeon.room_entity_at(IVec2::new(-3, -3)), None);
    }
}
