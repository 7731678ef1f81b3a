use bevy::prelude::*;

use crate::config::{GameConfig, MovementSettings};
use crate::GameSet;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player)
            .add_systems(Update, read_input_system.in_set(GameSet::Input))
            .add_systems(
                Update,
                (
                    player_motion_system,
                    stamina_regen_system,
                    stamina_warning_system,
                )
                    .chain()
                    .in_set(GameSet::Simulate),
            );
    }
}

/// Marker for the one player entity.
#[derive(Component)]
pub struct Player;

/// The player's stamina pool.
///
/// Fields are private so every write goes through a method that clamps into
/// `[0, max]`. Nothing outside this type can push stamina out of range.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Stamina {
    current: f32,
    max: f32,
}

impl Stamina {
    /// A full pool.
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Stamina { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Current stamina as a fraction of max (0.0 when max is 0).
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn set(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }

    /// Spend `cost` if there is enough. Returns false and leaves the pool
    /// untouched otherwise.
    pub fn consume(&mut self, cost: f32) -> bool {
        let cost = cost.max(0.0);
        if self.current >= cost {
            self.set(self.current - cost);
            true
        } else {
            false
        }
    }

    pub fn restore(&mut self, amount: f32) {
        self.set(self.current + amount.max(0.0));
    }

    pub fn regenerate(&mut self, rate: f32, delta: f32) {
        self.restore(rate * delta);
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

/// What the input layer wants the player to do this frame.
/// `direction` components are -1, 0 or 1 per axis.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct MoveIntent {
    pub direction: Vec2,
    pub dash: bool,
}

/// Velocity plus dash state. Steering is ignored while a dash is running.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct PlayerMotion {
    pub velocity: Vec2,
    dash_timer: f32,
}

/// Below this difference the speed snaps straight to the goal.
const SNAP_THRESHOLD: f32 = 0.1;

/// Moves one velocity axis toward `goal`.
///
/// Speeding up in the direction already travelled and coming to a stop both
/// use `decay`; reversing or easing off uses the gentler `adapt`. The step
/// never overshoots the goal.
pub fn blend_axis(current: f32, goal: f32, adapt: f32, decay: f32, delta: f32) -> f32 {
    let diff = goal - current;
    if diff.abs() < SNAP_THRESHOLD {
        return goal;
    }

    let rate = if goal == 0.0 {
        decay
    } else if current != 0.0 && goal.signum() == current.signum() {
        if goal.abs() > current.abs() {
            decay
        } else {
            adapt
        }
    } else {
        adapt
    };

    let step = rate * delta;
    if step >= diff.abs() {
        goal
    } else {
        current + diff.signum() * step
    }
}

impl PlayerMotion {
    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    /// Blend velocity toward `goal` (in world units per second).
    pub fn steer(&mut self, goal: Vec2, settings: &MovementSettings, delta: f32) {
        if self.is_dashing() {
            return;
        }
        self.velocity = Vec2::new(
            blend_axis(self.velocity.x, goal.x, settings.adapt_speed, settings.decay_speed, delta),
            blend_axis(self.velocity.y, goal.y, settings.adapt_speed, settings.decay_speed, delta),
        );
    }

    /// Start a dash if not already dashing and the stamina covers it.
    pub fn try_dash(&mut self, stamina: &mut Stamina, settings: &MovementSettings) -> bool {
        if self.is_dashing() || !stamina.consume(settings.dash_cost) {
            return false;
        }

        // Standing still dashes "up" rather than nowhere
        let direction = if self.velocity.length() > SNAP_THRESHOLD {
            self.velocity.normalize()
        } else {
            Vec2::Y
        };
        self.velocity = direction * settings.default_speed * settings.dash_multiplier;
        self.dash_timer = settings.dash_duration;
        true
    }

    pub fn tick_dash(&mut self, delta: f32) {
        if self.dash_timer > 0.0 {
            self.dash_timer -= delta;
        }
    }

    pub fn reset(&mut self) {
        *self = PlayerMotion::default();
    }
}

/// Which low-stamina sound to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCue {
    /// Stamina just dropped below the threshold.
    First,
    /// Still low after another interval; played quieter.
    Repeat,
}

/// Tracks the low-stamina warning so it fires on the crossing and then on a
/// fixed interval, not every frame.
#[derive(Component, Debug, Default)]
pub struct StaminaWarning {
    was_low: bool,
    timer: f32,
}

impl StaminaWarning {
    pub fn update(&mut self, is_low: bool, interval: f32, delta: f32) -> Option<WarningCue> {
        let mut cue = None;

        if is_low && !self.was_low {
            self.timer = interval;
            cue = Some(WarningCue::First);
        }

        if is_low {
            self.timer -= delta;
            if self.timer <= 0.0 {
                self.timer = interval;
                cue = cue.or(Some(WarningCue::Repeat));
            }
        }

        self.was_low = is_low;
        cue
    }
}

/// Fired when the player starts a dash.
#[derive(Event)]
pub struct DashEvent;

/// Fired when the low-stamina warning should play.
#[derive(Event)]
pub struct LowStaminaEvent {
    pub cue: WarningCue,
}

/// Puts the player back in a fresh-game state. Position is left alone.
pub fn reset_player(
    stamina: &mut Stamina,
    motion: &mut PlayerMotion,
    warning: &mut StaminaWarning,
    intent: &mut MoveIntent,
) {
    stamina.refill();
    motion.reset();
    *warning = StaminaWarning::default();
    *intent = MoveIntent::default();
}

pub fn player_bundle(config: &GameConfig) -> impl Bundle {
    (
        Player,
        Stamina::new(config.stamina.max),
        PlayerMotion::default(),
        MoveIntent::default(),
        StaminaWarning::default(),
        Transform::default(),
    )
}

fn spawn_player(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        player_bundle(&config),
        Sprite::from_color(Color::srgb(0.35, 0.55, 0.85), Vec2::splat(36.0)),
    ));
}

/// WASD sets the goal direction, Space requests a dash.
fn read_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut MoveIntent, With<Player>>,
) {
    for mut intent in &mut query {
        let mut direction = Vec2::ZERO;
        // Later keys win when opposite keys are held together
        if keys.pressed(KeyCode::KeyW) {
            direction.y = 1.0;
        }
        if keys.pressed(KeyCode::KeyS) {
            direction.y = -1.0;
        }
        if keys.pressed(KeyCode::KeyA) {
            direction.x = -1.0;
        }
        if keys.pressed(KeyCode::KeyD) {
            direction.x = 1.0;
        }

        intent.direction = direction;
        intent.dash |= keys.just_pressed(KeyCode::Space);
    }
}

pub fn player_motion_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut query: Query<
        (&mut Transform, &mut PlayerMotion, &mut Stamina, &mut MoveIntent),
        With<Player>,
    >,
) {
    let delta = time.delta_secs();
    let settings = &config.movement;

    for (mut transform, mut motion, mut stamina, mut intent) in query.iter_mut() {
        let goal = intent.direction * settings.default_speed;
        motion.steer(goal, settings, delta);

        // Consume the request whether or not the dash goes through
        if std::mem::take(&mut intent.dash) && motion.try_dash(&mut stamina, settings) {
            debug!("Dash! stamina left: {:.0}", stamina.current());
            commands.trigger(DashEvent);
        }
        motion.tick_dash(delta);

        transform.translation += motion.velocity.extend(0.0) * delta;
    }
}

pub fn stamina_regen_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut query: Query<&mut Stamina, With<Player>>,
) {
    for mut stamina in query.iter_mut() {
        stamina.regenerate(config.stamina.regen_rate, time.delta_secs());
    }
}

pub fn stamina_warning_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut query: Query<(&Stamina, &mut StaminaWarning), With<Player>>,
) {
    for (stamina, mut warning) in query.iter_mut() {
        let is_low = stamina.fraction() < config.stamina.low_fraction;
        if let Some(cue) = warning.update(is_low, config.stamina.warning_interval, time.delta_secs()) {
            commands.trigger(LowStaminaEvent { cue });
        }
    }
}
