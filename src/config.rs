use std::path::PathBuf;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyTables;

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_game_config);
    }
}

/// Every tunable number in the game.
///
/// Loaded once at startup from a RON file. Each section (and the top level)
/// carries #[serde(default)], so a file that only mentions a handful of
/// fields is fine: everything else keeps its built-in value.
///
/// Distances and speeds are in pixels (world units), times in seconds.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub level: LevelSettings,
    pub difficulty: DifficultyTables,
    pub stamina: StaminaSettings,
    pub movement: MovementSettings,
    pub pickup: PickupSettings,
    pub audio: AudioSettings,
}

/// Level timing, spawn cadence and population cap.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LevelSettings {
    pub start_level: u32,
    pub max_level: u32,
    pub time_limit: f32,
    pub min_spawn_distance: f32,
    pub max_spawn_distance: f32,
    pub max_active_pickups: usize,
    pub spawn_interval: f32,
    /// Cooldown primed at level start so the first pickup shows up quickly.
    pub initial_spawn_delay: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            start_level: 1,
            max_level: 3,
            time_limit: 60.0,
            min_spawn_distance: 160.0,
            max_spawn_distance: 480.0,
            max_active_pickups: 3,
            spawn_interval: 2.0,
            initial_spawn_delay: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StaminaSettings {
    pub max: f32,
    /// Points regained per second.
    pub regen_rate: f32,
    /// Fraction of max below which the low-stamina warning plays.
    pub low_fraction: f32,
    pub warning_interval: f32,
}

impl Default for StaminaSettings {
    fn default() -> Self {
        Self {
            max: 100.0,
            regen_rate: 1.0,
            low_fraction: 0.25,
            warning_interval: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MovementSettings {
    pub default_speed: f32,
    /// Acceleration used when changing direction or easing off.
    pub adapt_speed: f32,
    /// Acceleration used when speeding up in the current direction or stopping.
    pub decay_speed: f32,
    pub dash_multiplier: f32,
    pub dash_cost: f32,
    pub dash_duration: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            default_speed: 320.0,
            adapt_speed: 16.0,
            decay_speed: 160.0,
            dash_multiplier: 5.0,
            dash_cost: 10.0,
            dash_duration: 0.2,
        }
    }
}

/// What a pickup does when it strays too far from the player.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsMode {
    /// Teleport to the opposite edge of the bounds circle.
    #[default]
    Wrap,
    /// Turn around and head back toward the player.
    Steer,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PickupSettings {
    pub move_speed: f32,
    pub change_direction_interval: f32,
    pub bounds_radius: f32,
    pub bounds_mode: BoundsMode,
    pub collect_radius: f32,
    pub stamina_restore: f32,
    pub despawn_delay: f32,
    pub size: f32,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            move_speed: 64.0,
            change_direction_interval: 2.0,
            bounds_radius: 800.0,
            bounds_mode: BoundsMode::Wrap,
            collect_radius: 40.0,
            stamina_restore: 30.0,
            despawn_delay: 0.5,
            size: 24.0,
        }
    }
}

/// Asset paths for each sound cue. A `None` leaves that cue silent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub background_music: Option<String>,
    pub pickup: Option<String>,
    pub dash: Option<String>,
    pub low_stamina: Option<String>,
    pub level_complete: Option<String>,
    pub game_over: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            background_music: Some("audio/music.mp3".to_string()),
            pickup: Some("audio/pickup.wav".to_string()),
            dash: Some("audio/dash.wav".to_string()),
            low_stamina: Some("audio/low_stamina.wav".to_string()),
            level_complete: Some("audio/level_complete.wav".to_string()),
            game_over: Some("audio/game_over.wav".to_string()),
        }
    }
}

/// How far past the farthest spawn a raised wander bound sits.
const BOUNDS_HEADROOM: f32 = 1.25;

impl GameConfig {
    /// Farthest a pickup can spawn from the player on any level.
    pub fn spawn_reach(&self) -> f32 {
        let largest = self
            .difficulty
            .spawn_distance_multipliers
            .iter()
            .copied()
            .reduce(f32::max)
            .unwrap_or(1.0);
        self.level.max_spawn_distance * largest
    }

    /// Parses a RON document into a config and sanitizes it.
    pub fn from_ron(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str::<GameConfig>(contents).map(GameConfig::sanitized)
    }

    /// Pulls values that would break the rules back into range.
    ///
    /// A hand-edited file can say anything; rather than erroring we warn and
    /// clamp so the game stays playable.
    pub fn sanitized(mut self) -> Self {
        let level = &mut self.level;
        if level.max_level == 0 {
            warn!("max_level must be at least 1; using 1");
            level.max_level = 1;
        }
        if level.max_active_pickups == 0 {
            warn!("max_active_pickups is 0; no pickups will ever spawn");
        }
        if level.min_spawn_distance > level.max_spawn_distance {
            warn!(
                "min_spawn_distance {} exceeds max_spawn_distance {}; swapping",
                level.min_spawn_distance, level.max_spawn_distance
            );
            std::mem::swap(&mut level.min_spawn_distance, &mut level.max_spawn_distance);
        }
        level.start_level = level.start_level.clamp(1, level.max_level);

        let reach = self.spawn_reach();
        if self.pickup.bounds_radius < reach {
            let raised = reach * BOUNDS_HEADROOM;
            warn!(
                "bounds_radius {} is inside the farthest spawn distance {}; using {}",
                self.pickup.bounds_radius, reach, raised
            );
            self.pickup.bounds_radius = raised;
        }

        if self.stamina.max <= 0.0 {
            warn!("stamina max must be positive; using 100");
            self.stamina.max = 100.0;
        }
        self
    }
}

// =============================================================================
// Where the config file lives.
//
// A file next to the executable's working directory wins (handy while
// tweaking numbers); otherwise we look in the per-user config dir.
// =============================================================================

const LOCAL_CONFIG_FILE: &str = "burrito_rush.ron";

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("burrito-rush").join("config.ron"));
    }
    paths
}

/// Reads the first config file that exists, or returns None.
///
/// A file that exists but can't be read or parsed is logged and skipped;
/// the game falls back to defaults rather than crashing.
pub fn load_from_disk() -> Option<GameConfig> {
    let Some(path) = candidate_paths().into_iter().find(|path| path.exists()) else {
        info!("No config file found. Using default settings.");
        return None;
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => match GameConfig::from_ron(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                error!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                None
            }
        },
        Err(e) => {
            error!("Failed to read config file {:?}: {}. Using defaults.", path, e);
            None
        }
    }
}

fn load_game_config(mut commands: Commands) {
    let config = load_from_disk().unwrap_or_default();
    commands.insert_resource(config);
}
