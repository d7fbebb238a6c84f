//! Procedural room graph generation.
//!
//! Rooms are scattered over a tile grid, then joined with a spanning tree
//! grown from the first room: each step connects the closest pending room to
//! the connected set through a pair of facing doors and an L-shaped corridor.
//! Everything is driven by one seeded `StdRng`, so a seed always yields the
//! same layout.

use bevy::math::IVec2;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::LayoutGenerationError;

/// Inclusive integer range read from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: i32,
    pub max: i32,
}

impl SizeRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn has_odd_value(&self) -> bool {
        (self.min..=self.max).any(|value| value % 2 != 0)
    }
}

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    pub room_count: SizeRange,
    pub room_width: SizeRange,
    pub room_height: SizeRange,
    /// Minimum distance, in tiles, between a door and a room corner.
    pub door_padding: i32,
    /// Empty tiles kept between any two rooms.
    pub room_spacing: i32,
    /// Only use odd room sizes, so rooms have a centre tile.
    pub odd_sizes_only: bool,
    pub max_placement_attempts: u32,
    /// Door placements tried per edge pair before giving up on a connection.
    pub max_corridor_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            grid_width: 50,
            grid_height: 50,
            room_count: SizeRange::new(4, 12),
            room_width: SizeRange::new(7, 15),
            room_height: SizeRange::new(7, 15),
            door_padding: 3,
            room_spacing: 2,
            odd_sizes_only: true,
            max_placement_attempts: 500,
            max_corridor_attempts: 8,
        }
    }
}

impl GeneratorConfig {
    /// Reject configs that can never produce a layout.
    pub fn validate(&self) -> Result<(), LayoutGenerationError> {
        let invalid = |reason: String| Err(LayoutGenerationError::InvalidConfig(reason));

        if self.room_count.min < 2 || self.room_count.min > self.room_count.max {
            return invalid(format!(
                "room count {}..={} must start at 2 or more",
                self.room_count.min, self.room_count.max
            ));
        }
        for (name, range, grid) in [
            ("width", self.room_width, self.grid_width),
            ("height", self.room_height, self.grid_height),
        ] {
            if range.min > range.max {
                return invalid(format!("room {name} range {}..={} is empty", range.min, range.max));
            }
            if range.min < 2 * self.door_padding + 1 || range.min < 3 {
                return invalid(format!(
                    "room {name} {} leaves no door position with padding {}",
                    range.min, self.door_padding
                ));
            }
            // One border tile on each side stays free for corridor walls.
            if range.min + 2 > grid {
                return invalid(format!("room {name} {} does not fit a grid of {grid}", range.min));
            }
            if self.odd_sizes_only && !range.has_odd_value() {
                return invalid(format!("room {name} range has no odd size"));
            }
        }
        if self.door_padding < 1 {
            return invalid("door padding must be at least 1".to_string());
        }
        if self.room_spacing < 1 {
            return invalid("rooms need at least one tile between them".to_string());
        }
        if self.max_placement_attempts == 0 || self.max_corridor_attempts == 0 {
            return invalid("attempt limits must be positive".to_string());
        }
        Ok(())
    }
}

/// Which wall of a room a door sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorEdge {
    North,
    South,
    East,
    West,
}

impl DoorEdge {
    /// Tile offset pointing out of the room. Tile y grows southwards.
    pub fn outward(self) -> IVec2 {
        match self {
            DoorEdge::North => IVec2::new(0, -1),
            DoorEdge::South => IVec2::new(0, 1),
            DoorEdge::East => IVec2::new(1, 0),
            DoorEdge::West => IVec2::new(-1, 0),
        }
    }

    /// North and south doors sit in horizontal walls.
    pub fn is_horizontal_wall(self) -> bool {
        matches!(self, DoorEdge::North | DoorEdge::South)
    }
}

/// A door tile in absolute grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorLocation {
    pub tile: IVec2,
    pub edge: DoorEdge,
}

impl DoorLocation {
    /// The corridor tile just outside this door.
    pub fn outside(&self) -> IVec2 {
        self.tile + self.edge.outward()
    }
}

/// Rectangle of one room, walls included. Immutable after generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLayout {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub doors: Vec<DoorLocation>,
}

impl RoomLayout {
    pub fn new(id: usize, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            doors: Vec::new(),
        }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Whether `tile` lies inside the room rectangle, walls included.
    pub fn contains(&self, tile: IVec2) -> bool {
        tile.x >= self.left() && tile.x <= self.right() && tile.y >= self.top() && tile.y <= self.bottom()
    }

    /// Whether `tile` is a floor tile of this room.
    pub fn contains_interior(&self, tile: IVec2) -> bool {
        tile.x > self.left() && tile.x < self.right() && tile.y > self.top() && tile.y < self.bottom()
    }

    /// Whether `tile` is on the wall ring.
    pub fn is_wall(&self, tile: IVec2) -> bool {
        self.contains(tile) && !self.contains_interior(tile)
    }

    /// True when the rooms come closer than `spacing` empty tiles.
    pub fn overlaps(&self, other: &RoomLayout, spacing: i32) -> bool {
        self.left() - spacing <= other.right()
            && self.right() + spacing >= other.left()
            && self.top() - spacing <= other.bottom()
            && self.bottom() + spacing >= other.top()
    }

    fn random_door(&self, edge: DoorEdge, padding: i32, rng: &mut StdRng) -> DoorLocation {
        let tile = match edge {
            DoorEdge::North => IVec2::new(rng.gen_range(self.left() + padding..=self.right() - padding), self.top()),
            DoorEdge::South => IVec2::new(rng.gen_range(self.left() + padding..=self.right() - padding), self.bottom()),
            DoorEdge::West => IVec2::new(self.left(), rng.gen_range(self.top() + padding..=self.bottom() - padding)),
            DoorEdge::East => IVec2::new(self.right(), rng.gen_range(self.top() + padding..=self.bottom() - padding)),
        };
        DoorLocation { tile, edge }
    }

    fn add_door(&mut self, door: DoorLocation) {
        if !self.doors.contains(&door) {
            self.doors.push(door);
        }
    }
}

/// Tiles joining the doors of two rooms, from the tile outside the first door
/// to the tile outside the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corridor {
    pub from_room: usize,
    pub to_room: usize,
    pub tiles: Vec<IVec2>,
}

/// Output of the generator: the room graph of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonLayout {
    pub width: i32,
    pub height: i32,
    pub seed: u64,
    pub rooms: Vec<RoomLayout>,
    pub corridors: Vec<Corridor>,
}

impl DungeonLayout {
    pub fn room_at(&self, tile: IVec2) -> Option<&RoomLayout> {
        self.rooms.iter().find(|room| room.contains(tile))
    }

    /// Whether every room can reach every other room through corridors.
    pub fn is_connected(&self) -> bool {
        if self.rooms.is_empty() {
            return true;
        }
        let mut reached = vec![false; self.rooms.len()];
        let mut frontier = vec![0usize];
        reached[0] = true;
        while let Some(room) = frontier.pop() {
            for corridor in &self.corridors {
                let next = if corridor.from_room == room {
                    corridor.to_room
                } else if corridor.to_room == room {
                    corridor.from_room
                } else {
                    continue;
                };
                if !reached[next] {
                    reached[next] = true;
                    frontier.push(next);
                }
            }
        }
        reached.into_iter().all(|r| r)
    }
}

/// Generate a layout for `seed`.
pub fn generate(config: &GeneratorConfig, seed: u64) -> Result<DungeonLayout, LayoutGenerationError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rooms = place_rooms(config, &mut rng)?;
    let corridors = connect_rooms(config, &mut rng, &mut rooms)?;

    Ok(DungeonLayout {
        width: config.grid_width,
        height: config.grid_height,
        seed,
        rooms,
        corridors,
    })
}

/// Generate with `seed`, then with up to `retries` derived seeds.
pub fn generate_with_retries(
    config: &GeneratorConfig,
    seed: u64,
    retries: u32,
) -> Result<DungeonLayout, LayoutGenerationError> {
    let mut last_error = None;
    for attempt in 0..=retries {
        let attempt_seed = if attempt == 0 { seed } else { derive_seed(seed, attempt) };
        match generate(config, attempt_seed) {
            Ok(layout) => return Ok(layout),
            Err(error @ LayoutGenerationError::InvalidConfig(_)) => return Err(error),
            Err(error) => {
                warn!("Layout attempt {} (seed {}) failed: {}", attempt, attempt_seed, error);
                last_error = Some(error);
            }
        }
    }

    Err(LayoutGenerationError::RetriesExhausted {
        attempts: retries + 1,
        last: Box::new(last_error.unwrap_or(LayoutGenerationError::Disconnected { room: 0 })),
    })
}

/// Mix a base seed with an attempt number into an unrelated seed.
pub fn derive_seed(seed: u64, attempt: u32) -> u64 {
    let mut mixed = seed ^ (attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

fn random_dimension(range: SizeRange, odd_only: bool, rng: &mut StdRng) -> i32 {
    let value = rng.gen_range(range.min..=range.max);
    if !odd_only || value % 2 != 0 {
        return value;
    }
    if value < range.max {
        value + 1
    } else {
        value - 1
    }
}

fn place_rooms(config: &GeneratorConfig, rng: &mut StdRng) -> Result<Vec<RoomLayout>, LayoutGenerationError> {
    let target = rng.gen_range(config.room_count.min..=config.room_count.max) as usize;
    let mut rooms: Vec<RoomLayout> = Vec::with_capacity(target);
    let mut attempts = 0;

    while rooms.len() < target && attempts < config.max_placement_attempts {
        attempts += 1;
        let width = random_dimension(config.room_width, config.odd_sizes_only, rng);
        let height = random_dimension(config.room_height, config.odd_sizes_only, rng);
        if width + 2 > config.grid_width || height + 2 > config.grid_height {
            continue;
        }

        let x = rng.gen_range(1..=config.grid_width - width - 1);
        let y = rng.gen_range(1..=config.grid_height - height - 1);
        let candidate = RoomLayout::new(rooms.len(), x, y, width, height);
        if rooms.iter().any(|room| room.overlaps(&candidate, config.room_spacing)) {
            continue;
        }
        rooms.push(candidate);
    }

    if rooms.len() < config.room_count.min as usize {
        return Err(LayoutGenerationError::RoomPlacement {
            placed: rooms.len(),
            required: config.room_count.min as usize,
            attempts,
        });
    }
    Ok(rooms)
}

struct Route {
    from_door: DoorLocation,
    to_door: DoorLocation,
    tiles: Vec<IVec2>,
}

fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn connect_rooms(
    config: &GeneratorConfig,
    rng: &mut StdRng,
    rooms: &mut [RoomLayout],
) -> Result<Vec<Corridor>, LayoutGenerationError> {
    let centers: Vec<IVec2> = rooms.iter().map(RoomLayout::center).collect();
    let mut connected = vec![0usize];
    let mut pending: Vec<usize> = (1..rooms.len()).collect();
    let mut corridors = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let mut candidates = Vec::with_capacity(connected.len() * pending.len());
        for &from in &connected {
            for &to in &pending {
                candidates.push((manhattan(centers[from], centers[to]), from, to));
            }
        }
        candidates.sort_unstable();

        let mut joined = None;
        for &(_, from, to) in &candidates {
            if let Some(route) = route_corridor(config, rng, rooms, from, to) {
                joined = Some((from, to, route));
                break;
            }
        }
        let Some((from, to, route)) = joined else {
            return Err(LayoutGenerationError::Disconnected { room: pending[0] });
        };

        rooms[from].add_door(route.from_door);
        rooms[to].add_door(route.to_door);
        corridors.push(Corridor {
            from_room: from,
            to_room: to,
            tiles: route.tiles,
        });
        connected.push(to);
        pending.retain(|&room| room != to);
    }

    Ok(corridors)
}

fn route_corridor(
    config: &GeneratorConfig,
    rng: &mut StdRng,
    rooms: &[RoomLayout],
    from: usize,
    to: usize,
) -> Option<Route> {
    let (a, b) = (&rooms[from], &rooms[to]);
    let delta = b.center() - a.center();

    let horizontal = match delta.x.signum() {
        1 => Some((DoorEdge::East, DoorEdge::West)),
        -1 => Some((DoorEdge::West, DoorEdge::East)),
        _ => None,
    };
    let vertical = match delta.y.signum() {
        1 => Some((DoorEdge::South, DoorEdge::North)),
        -1 => Some((DoorEdge::North, DoorEdge::South)),
        _ => None,
    };
    let edge_pairs = if delta.x.abs() >= delta.y.abs() {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    };

    for (edge_a, edge_b) in edge_pairs.into_iter().flatten() {
        for _ in 0..config.max_corridor_attempts {
            let from_door = a.random_door(edge_a, config.door_padding, rng);
            let to_door = b.random_door(edge_b, config.door_padding, rng);
            let horizontal_first = rng.gen_bool(0.5);

            for orientation in [horizontal_first, !horizontal_first] {
                let tiles = l_path(from_door.outside(), to_door.outside(), orientation);
                if tiles.iter().all(|&tile| corridor_tile_is_free(config, rooms, tile)) {
                    return Some(Route {
                        from_door,
                        to_door,
                        tiles,
                    });
                }
            }
        }
    }
    None
}

fn corridor_tile_is_free(config: &GeneratorConfig, rooms: &[RoomLayout], tile: IVec2) -> bool {
    // Keep the outer ring free so corridor walls stay on the grid.
    let on_grid = tile.x >= 1 && tile.y >= 1 && tile.x <= config.grid_width - 2 && tile.y <= config.grid_height - 2;
    on_grid && !rooms.iter().any(|room| room.contains(tile))
}

fn l_path(start: IVec2, end: IVec2, horizontal_first: bool) -> Vec<IVec2> {
    let corner = if horizontal_first {
        IVec2::new(end.x, start.y)
    } else {
        IVec2::new(start.x, end.y)
    };

    let mut tiles = vec![start];
    let mut cursor = start;
    for target in [corner, end] {
        let step = (target - cursor).signum();
        while cursor != target {
            cursor += step;
            tiles.push(cursor);
        }
    }
    tiles
}
