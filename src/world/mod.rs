//! World module - level generation, rooms, doors and chests.

mod builder;
mod chests;
mod data;
mod doors;
mod error;
pub mod generator;
mod plugin;
mod rooms;
pub mod tilemap;

pub use builder::{CurrentDungeon, Decoration, LevelEntity};
pub use chests::{Chest, CHEST_AMMO};
pub use data::{read_encounter_config, EncounterConfig, RoomConfig, ENCOUNTER_CONFIG_PATH};
pub use doors::Door;
pub use error::{DataLoadError, LayoutGenerationError};
pub use generator::{DoorEdge, DungeonLayout, GeneratorConfig, RoomLayout, SizeRange};
pub use plugin::{setup_level, WorldPlugin};
pub use rooms::{ActiveRoom, DoorLockTimer, DungeonRoom, RoomEnemies, RoomProgress, RoomShade};
pub use tilemap::{Tile, TileMap};
