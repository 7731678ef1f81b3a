use serde::{Deserialize, Serialize};

/// Per-level difficulty knobs, one entry per level.
///
/// The four tables are parallel: index 0 is level 1, index 1 is level 2, and
/// so on. Levels past the end of a table reuse its last entry, so difficulty
/// plateaus instead of running off the end.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DifficultyTables {
    pub speed_multipliers: Vec<f32>,
    pub spawn_distance_multipliers: Vec<f32>,
    pub spawn_interval_dividers: Vec<f32>,
    pub required_per_level: Vec<u32>,
    /// Each level past the first shortens pickup direction changes by this
    /// fraction of the base interval.
    pub wander_interval_step: f32,
}

impl Default for DifficultyTables {
    fn default() -> Self {
        Self {
            speed_multipliers: vec![1.0, 1.5, 2.2],
            spawn_distance_multipliers: vec![1.0, 1.3, 1.6],
            spawn_interval_dividers: vec![1.0, 1.2, 1.5],
            required_per_level: vec![10, 15, 20],
            wander_interval_step: 0.2,
        }
    }
}

/// Clamp `level - 1` into the table and read it. Empty tables give `neutral`.
fn lookup<T: Copy>(table: &[T], level: u32, neutral: T) -> T {
    let Some(last) = table.len().checked_sub(1) else {
        return neutral;
    };
    let index = (level.saturating_sub(1) as usize).min(last);
    table[index]
}

impl DifficultyTables {
    pub fn speed_multiplier(&self, level: u32) -> f32 {
        lookup(&self.speed_multipliers, level, 1.0)
    }

    pub fn spawn_distance_multiplier(&self, level: u32) -> f32 {
        lookup(&self.spawn_distance_multipliers, level, 1.0)
    }

    /// Divisor applied to the base spawn interval. Non-positive entries
    /// would stall or invert the cadence, so they read as 1.
    pub fn spawn_interval_divider(&self, level: u32) -> f32 {
        let divider = lookup(&self.spawn_interval_dividers, level, 1.0);
        if divider > 0.0 {
            divider
        } else {
            1.0
        }
    }

    /// How many pickups a level asks for. Never zero.
    pub fn required_count(&self, level: u32) -> u32 {
        lookup(&self.required_per_level, level, 1).max(1)
    }

    /// Multiplier for a pickup's direction-change interval at this level.
    /// Level 1 is 1.0; each level after divides by another step.
    pub fn wander_interval_scale(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        1.0 / (1.0 + steps * self.wander_interval_step.max(0.0))
    }
}
