//! Encounter configuration and RON loading.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::WeaponStats;
use crate::core::AnimationLibrary;
use crate::enemies::{EnemyStats, SpawnerConfig};
use crate::player::PlayerConfig;

use super::error::DataLoadError;
use super::generator::{GeneratorConfig, SizeRange};

/// Where the encounter config lives, relative to the working directory.
pub const ENCOUNTER_CONFIG_PATH: &str = "assets/data/encounter.ron";

/// Room pacing and dressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Delay between entering a room and its doors closing.
    pub door_lock_delay_ms: u64,
    pub spawners_per_room: SizeRange,
    /// Spawners keep this many tiles away from the room edge.
    pub spawner_margin: i32,
    /// Chance that a room holds a chest.
    pub chest_chance: f64,
    /// Overlay alpha of the room the player is in.
    pub active_shade: f32,
    /// Overlay alpha of every other room.
    pub dormant_shade: f32,
    /// Place one decorative obstacle per room.
    pub decorations: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            door_lock_delay_ms: 2000,
            spawners_per_room: SizeRange::new(1, 3),
            spawner_margin: 2,
            chest_chance: 0.5,
            active_shade: 0.0,
            dormant_shade: 0.8,
            decorations: true,
        }
    }
}

impl RoomConfig {
    /// Reject values the level builder cannot roll with.
    pub fn validate(&self) -> Result<(), DataLoadError> {
        let invalid = |reason: String| Err(DataLoadError::InvalidConfig(reason));

        let spawners = self.spawners_per_room;
        if spawners.min < 0 || spawners.min > spawners.max {
            return invalid(format!("spawners per room {}..={} is empty or negative", spawners.min, spawners.max));
        }
        if self.spawner_margin < 0 {
            return invalid(format!("spawner margin {} is negative", self.spawner_margin));
        }
        if !(0.0..=1.0).contains(&self.chest_chance) {
            return invalid(format!("chest chance {} is not a probability", self.chest_chance));
        }
        for (name, alpha) in [("active", self.active_shade), ("dormant", self.dormant_shade)] {
            if !(0.0..=1.0).contains(&alpha) {
                return invalid(format!("{name} shade {alpha} is outside 0..=1"));
            }
        }
        Ok(())
    }
}

/// Everything tunable about an encounter, loaded from
/// `assets/data/encounter.ron`.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Fixed layout seed. `None` draws a fresh seed per level.
    pub seed: Option<u64>,
    pub max_generation_retries: u32,
    /// Edge length of one tile in world units.
    pub tile_size: f32,
    pub generator: GeneratorConfig,
    pub rooms: RoomConfig,
    pub spawner: SpawnerConfig,
    pub enemy: EnemyStats,
    pub player: PlayerConfig,
    pub pistol: WeaponStats,
    pub auto_rifle: WeaponStats,
    pub animations: AnimationLibrary,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_generation_retries: 8,
            tile_size: 32.0,
            generator: GeneratorConfig::default(),
            rooms: RoomConfig::default(),
            spawner: SpawnerConfig::default(),
            enemy: EnemyStats::default(),
            player: PlayerConfig::default(),
            pistol: WeaponStats::pistol(),
            auto_rifle: WeaponStats::auto_rifle(),
            animations: AnimationLibrary::default(),
        }
    }
}

impl EncounterConfig {
    /// Check the values the level builder depends on. Generator settings are
    /// left to the generator, which reports them as a failed generation.
    pub fn validate(&self) -> Result<(), DataLoadError> {
        if !(self.tile_size > 0.0 && self.tile_size.is_finite()) {
            return Err(DataLoadError::InvalidConfig(format!(
                "tile size {} must be positive",
                self.tile_size
            )));
        }
        self.rooms.validate()
    }
}

/// Read and parse an encounter config file.
pub fn read_encounter_config(path: &Path) -> Result<EncounterConfig, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path).map_err(|e| DataLoadError::ReadError {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    let config: EncounterConfig = ron::from_str(&contents).map_err(|e| DataLoadError::ParseError {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load the encounter config unless one was already provided.
///
/// A missing, broken or invalid config falls back to the built-in defaults.
pub fn load_encounter_config(mut commands: Commands, existing: Option<Res<EncounterConfig>>) {
    let config = match existing {
        Some(config) => match config.validate() {
            Ok(()) => config.clone(),
            Err(e) => {
                error!("{}, using defaults", e);
                EncounterConfig::default()
            }
        },
        None => match read_encounter_config(Path::new(ENCOUNTER_CONFIG_PATH)) {
            Ok(config) => {
                info!("Loaded encounter config from {}", ENCOUNTER_CONFIG_PATH);
                config
            }
            Err(DataLoadError::FileNotFound(path)) => {
                warn!("Encounter config '{}' not found, using defaults", path);
                EncounterConfig::default()
            }
            Err(e) => {
                error!("Failed to load encounter config: {}", e);
                EncounterConfig::default()
            }
        },
    };

    commands.insert_resource(config.animations.clone());
    commands.insert_resource(config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bundled_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(ENCOUNTER_CONFIG_PATH);
        let config = read_encounter_config(&path).unwrap();
        assert_eq!(config, EncounterConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EncounterConfig = ron::from_str("(seed: Some(42), rooms: (door_lock_delay_ms: 500))").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.rooms.door_lock_delay_ms, 500);
        assert_eq!(config.rooms.dormant_shade, 0.8);
        assert_eq!(config.spawner, SpawnerConfig::default());
    }

    #[test]
    fn missing_file_is_reported() {
        let result = read_encounter_config(Path::new("does/not/exist.ron"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound(_))));
    }

    #[test]
    fn unusable_room_values_are_rejected() {
        assert!(RoomConfig::default().validate().is_ok());

        let inverted = RoomConfig {
            spawners_per_room: SizeRange::new(3, 1),
            ..default()
        };
        assert!(matches!(inverted.validate(), Err(DataLoadError::InvalidConfig(_))));

        for chance in [f64::NAN, -0.1, 1.5] {
            let rooms = RoomConfig {
                chest_chance: chance,
                ..default()
            };
            assert!(rooms.validate().is_err(), "chest chance {chance} accepted");
        }

        let margin = RoomConfig {
            spawner_margin: -1,
            ..default()
        };
        assert!(margin.validate().is_err());

        let config = EncounterConfig {
            tile_size: 0.0,
            ..default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("encounter-invalid-{}.ron", std::process::id()));
        fs::write(&path, "(rooms: (spawners_per_room: (min: 4, max: 2)))").unwrap();
        let result = read_encounter_config(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(DataLoadError::InvalidConfig(_))));
    }

    #[test]
    fn invalid_provided_config_is_replaced_by_defaults() {
        let mut app = App::new();
        let mut config = EncounterConfig::default();
        config.rooms.chest_chance = f64::NAN;
        config.seed = Some(9);
        app.insert_resource(config).add_systems(Update, load_encounter_config);
        app.update();

        assert_eq!(*app.world().resource::<EncounterConfig>(), EncounterConfig::default());
        assert!(app.world().get_resource::<AnimationLibrary>().is_some());
    }

    #[test]
    fn valid_provided_config_is_kept() {
        let mut app = App::new();
        let config = EncounterConfig {
            seed: Some(9),
            ..default()
        };
        app.insert_resource(config.clone()).add_systems(Update, load_encounter_config);
        app.update();

        assert_eq!(*app.world().resource::<EncounterConfig>(), config);
    }
}
