//! Tile grid built from a [`DungeonLayout`].
//!
//! The grid is what a renderer draws and what the level builder turns into
//! colliders. Tile `(0, 0)` is the north-west corner; tile y grows southwards
//! while world y grows upwards.

use bevy::math::IVec2;
use bevy::prelude::*;

use super::generator::DungeonLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tile {
    #[default]
    Empty,
    Floor,
    Wall,
    Door,
    Corridor,
}

/// Row-major grid of tiles plus the room owning each tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: i32,
    height: i32,
    tile_size: f32,
    tiles: Vec<Tile>,
    rooms: Vec<Option<usize>>,
}

impl TileMap {
    pub fn from_layout(layout: &DungeonLayout, tile_size: f32) -> Self {
        let cell_count = (layout.width * layout.height).max(0) as usize;
        let mut map = Self {
            width: layout.width,
            height: layout.height,
            tile_size,
            tiles: vec![Tile::Empty; cell_count],
            rooms: vec![None; cell_count],
        };

        for room in &layout.rooms {
            for y in room.top()..=room.bottom() {
                for x in room.left()..=room.right() {
                    let tile = IVec2::new(x, y);
                    let kind = if room.contains_interior(tile) { Tile::Floor } else { Tile::Wall };
                    map.set(tile, kind);
                    if let Some(index) = map.index(tile) {
                        map.rooms[index] = Some(room.id);
                    }
                }
            }
            for door in &room.doors {
                map.set(door.tile, Tile::Door);
            }
        }

        for corridor in &layout.corridors {
            for &tile in &corridor.tiles {
                map.set(tile, Tile::Corridor);
            }
        }

        // Frame corridors with walls wherever nothing else was carved.
        for corridor in &layout.corridors {
            for &tile in &corridor.tiles {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let neighbour = tile + IVec2::new(dx, dy);
                        if map.tile_at(neighbour) == Tile::Empty {
                            map.set(neighbour, Tile::Wall);
                        }
                    }
                }
            }
        }

        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn index(&self, tile: IVec2) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some((tile.y * self.width + tile.x) as usize)
    }

    fn set(&mut self, tile: IVec2, kind: Tile) {
        if let Some(index) = self.index(tile) {
            self.tiles[index] = kind;
        }
    }

    /// Tile at `tile`; anything off the grid is `Empty`.
    pub fn tile_at(&self, tile: IVec2) -> Tile {
        self.index(tile).map_or(Tile::Empty, |index| self.tiles[index])
    }

    /// Id of the room whose rectangle covers `tile`.
    pub fn room_at(&self, tile: IVec2) -> Option<usize> {
        self.index(tile).and_then(|index| self.rooms[index])
    }

    /// All tiles of one kind, in row-major order.
    pub fn tiles_of(&self, kind: Tile) -> impl Iterator<Item = IVec2> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, tile)| **tile == kind)
            .map(|(index, _)| IVec2::new(index as i32 % self.width, index as i32 / self.width))
    }

    /// World position of the centre of `tile`.
    pub fn tile_to_world(&self, tile: IVec2) -> Vec2 {
        Vec2::new(
            (tile.x as f32 + 0.5) * self.tile_size,
            -(tile.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Tile containing the world position `position`.
    pub fn world_to_tile(&self, position: Vec2) -> IVec2 {
        IVec2::new(
            (position.x / self.tile_size).floor() as i32,
            (-position.y / self.tile_size).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generator::{generate_with_retries, GeneratorConfig};
    use std::collections::{HashSet, VecDeque};

    fn sample_map() -> (DungeonLayout, TileMap) {
        let layout = generate_with_retries(&GeneratorConfig::default(), 99, 10).unwrap();
        let map = TileMap::from_layout(&layout, 32.0);
        (layout, map)
    }

    #[test]
    fn rooms_have_wall_rings_and_floor_interiors() {
        let (layout, map) = sample_map();
        for room in &layout.rooms {
            assert_eq!(map.tile_at(room.center()), Tile::Floor);
            let corner = IVec2::new(room.left(), room.top());
            assert_eq!(map.tile_at(corner), Tile::Wall);
            for door in &room.doors {
                assert_eq!(map.tile_at(door.tile), Tile::Door);
                assert_eq!(map.tile_at(door.outside()), Tile::Corridor);
            }
            assert_eq!(map.room_at(room.center()), Some(room.id));
        }
    }

    #[test]
    fn every_walkable_tile_is_reachable() {
        let (layout, map) = sample_map();
        let start = layout.rooms[0].center();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(tile) = queue.pop_front() {
            for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
                let next = tile + step;
                let walkable = matches!(map.tile_at(next), Tile::Floor | Tile::Door | Tile::Corridor);
                if walkable && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let walkable: HashSet<IVec2> = [Tile::Floor, Tile::Door, Tile::Corridor]
            .into_iter()
            .flat_map(|kind| map.tiles_of(kind).collect::<Vec<_>>())
            .collect();
        assert_eq!(seen, walkable);
    }

    #[test]
    fn walkable_tiles_never_touch_the_void() {
        let (_, map) = sample_map();
        for kind in [Tile::Floor, Tile::Corridor] {
            for tile in map.tiles_of(kind) {
                for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
                    assert_ne!(map.tile_at(tile + step), Tile::Empty, "{tile} leaks into the void");
                }
            }
        }
    }

    #[test]
    fn world_and_tile_coordinates_round_trip() {
        let (_, map) = sample_map();
        let tile = IVec2::new(12, 7);
        let world = map.tile_to_world(tile);
        assert_eq!(world, Vec2::new(400.0, -240.0));
        assert_eq!(map.world_to_tile(world), tile);
        assert_eq!(map.world_to_tile(world + Vec2::new(15.0, -15.0)), tile);
        assert_eq!(map.tile_at(IVec2::new(-1, 0)), Tile::Empty);
    }
}
