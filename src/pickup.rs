use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::{
    config::{BoundsMode, GameConfig, PickupSettings},
    director::PickupSpawn,
    player::{Player, Stamina},
    GameSet,
};

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        // Wander first so collection sees this frame's positions
        app.add_systems(
            Update,
            (wander_system, collect_pickups_system, despawn_after_system)
                .chain()
                .in_set(GameSet::Simulate),
        );
    }
}

/// A burrito. Collected exactly once, then removed after a short delay.
///
/// `speed_scale` and `interval_scale` are baked in at spawn time from the
/// level that spawned it, so a pickup keeps its difficulty even if the level
/// changes around it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    collected: bool,
    pub speed_scale: f32,
    pub interval_scale: f32,
}

impl Pickup {
    pub fn new(speed_scale: f32, interval_scale: f32) -> Self {
        Pickup {
            collected: false,
            speed_scale,
            interval_scale,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Flip to collected. Returns true only the first time.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        true
    }
}

/// Shortest interval a pickup will hold one direction for.
const MIN_DIRECTION_INTERVAL: f32 = 0.05;

pub fn random_unit_vector(rng: &mut impl Rng) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU))
}

/// Random-walk state for a pickup.
#[derive(Component, Debug, Clone, Copy)]
pub struct Wander {
    pub direction: Vec2,
    timer: f32,
}

impl Wander {
    pub fn new(direction: Vec2, timer: f32) -> Self {
        Wander { direction, timer }
    }

    pub fn random(rng: &mut impl Rng, pickup: &Pickup, settings: &PickupSettings) -> Self {
        Wander::new(
            random_unit_vector(rng),
            next_interval(rng, pickup, settings),
        )
    }

    /// Advance one frame and return the new position.
    ///
    /// With no player around there is nothing to stay near, so the bounds
    /// check is skipped.
    pub fn step(
        &mut self,
        position: Vec2,
        player: Option<Vec2>,
        pickup: &Pickup,
        settings: &PickupSettings,
        delta: f32,
        rng: &mut impl Rng,
    ) -> Vec2 {
        self.timer -= delta;
        if self.timer <= 0.0 {
            self.direction = random_unit_vector(rng);
            self.timer = next_interval(rng, pickup, settings);
        }

        let speed = settings.move_speed * pickup.speed_scale;
        let next = position + self.direction * speed * delta;

        match player {
            Some(player) => self.keep_in_bounds(next, player, settings),
            None => next,
        }
    }

    fn keep_in_bounds(&mut self, position: Vec2, player: Vec2, settings: &PickupSettings) -> Vec2 {
        let offset = position - player;
        let distance = offset.length();
        if distance <= settings.bounds_radius || distance == 0.0 {
            return position;
        }

        let outward = offset / distance;
        match settings.bounds_mode {
            BoundsMode::Wrap => player - outward * settings.bounds_radius,
            BoundsMode::Steer => {
                self.direction = -outward;
                position
            }
        }
    }
}

/// `(base ± 0.5) × interval_scale`, floored so it can't go to zero.
fn next_interval(rng: &mut impl Rng, pickup: &Pickup, settings: &PickupSettings) -> f32 {
    let jitter: f32 = rng.gen_range(-0.5..=0.5);
    ((settings.change_direction_interval + jitter) * pickup.interval_scale)
        .max(MIN_DIRECTION_INTERVAL)
}

/// Despawns its entity when the timer runs out.
#[derive(Component)]
pub struct DespawnAfter(pub Timer);

/// Fired the moment a pickup is collected (before it despawns).
#[derive(Event)]
pub struct PickupCollected {
    pub entity: Entity,
}

/// Spawns a pickup entity from a director spawn order.
pub fn spawn_pickup(
    commands: &mut Commands,
    spawn: &PickupSpawn,
    settings: &PickupSettings,
    rng: &mut impl Rng,
) -> Entity {
    let pickup = Pickup::new(spawn.speed_scale, spawn.interval_scale);
    let wander = Wander::random(rng, &pickup, settings);

    commands
        .spawn((
            pickup,
            wander,
            Transform::from_translation(spawn.position.extend(0.0)),
            Sprite::from_color(Color::srgb(0.95, 0.7, 0.25), Vec2::splat(settings.size)),
        ))
        .id()
}

pub fn wander_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    players: Query<&Transform, With<Player>>,
    mut pickups: Query<(&mut Transform, &mut Wander, &Pickup), Without<Player>>,
) {
    let mut rng = rand::thread_rng();
    let player = players.single().ok().map(|t| t.translation.truncate());
    let delta = time.delta_secs();

    for (mut transform, mut wander, pickup) in pickups.iter_mut() {
        // Collected pickups sit still until they despawn
        if pickup.is_collected() {
            continue;
        }
        let position = transform.translation.truncate();
        let next = wander.step(position, player, pickup, &config.pickup, delta, &mut rng);
        transform.translation = next.extend(transform.translation.z);
    }
}

/// Touching a pickup collects it: stamina goes up, a PickupCollected event
/// fires, and the pickup is scheduled for removal.
pub fn collect_pickups_system(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut players: Query<(&Transform, &mut Stamina), With<Player>>,
    mut pickups: Query<(Entity, &Transform, &mut Pickup), Without<Player>>,
) {
    let Ok((player_transform, mut stamina)) = players.single_mut() else {
        return;
    };
    let player_pos = player_transform.translation.truncate();
    let settings = &config.pickup;

    for (entity, transform, mut pickup) in pickups.iter_mut() {
        if transform.translation.truncate().distance(player_pos) > settings.collect_radius {
            continue;
        }
        if !pickup.collect() {
            continue;
        }

        stamina.restore(settings.stamina_restore);
        commands.entity(entity).insert(DespawnAfter(Timer::from_seconds(
            settings.despawn_delay,
            TimerMode::Once,
        )));
        commands.trigger(PickupCollected { entity });
    }
}

pub fn despawn_after_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut DespawnAfter)>,
) {
    for (entity, mut despawn_after) in query.iter_mut() {
        despawn_after.0.tick(time.delta());
        if despawn_after.0.is_finished() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::time::TimePlugin;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{director::LevelDirector, player::player_bundle};

    #[test]
    fn collect_flips_once() {
        let mut pickup = Pickup::new(1.0, 1.0);
        assert!(!pickup.is_collected());
        assert!(pickup.collect());
        assert!(pickup.is_collected());
        assert!(!pickup.collect());
        assert!(pickup.is_collected());
    }

    #[test]
    fn random_directions_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!((random_unit_vector(&mut rng).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn wander_moves_at_scaled_speed() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = PickupSettings::default();
        let pickup = Pickup::new(2.0, 1.0);
        let mut wander = Wander::new(Vec2::X, 10.0);

        let next = wander.step(Vec2::ZERO, None, &pickup, &settings, 0.5, &mut rng);

        assert!((next.x - settings.move_speed * 2.0 * 0.5).abs() < 1e-4);
        assert_eq!(next.y, 0.0);
        assert_eq!(wander.direction, Vec2::X);
    }

    #[test]
    fn expired_timer_picks_a_scaled_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        let settings = PickupSettings::default();
        let pickup = Pickup::new(1.0, 0.5);
        let mut wander = Wander::new(Vec2::X, 0.01);

        wander.step(Vec2::ZERO, None, &pickup, &settings, 0.02, &mut rng);

        let base = settings.change_direction_interval;
        assert!(wander.timer >= (base - 0.5) * 0.5 - 1e-6);
        assert!(wander.timer <= (base + 0.5) * 0.5 + 1e-6);
        assert!((wander.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn wrap_mode_teleports_to_the_opposite_edge() {
        let mut rng = StdRng::seed_from_u64(0);
        let settings = PickupSettings {
            bounds_radius: 100.0,
            bounds_mode: BoundsMode::Wrap,
            ..default()
        };
        let pickup = Pickup::new(1.0, 1.0);
        let mut wander = Wander::new(Vec2::X, 10.0);
        let player = Vec2::new(10.0, 0.0);

        let next = wander.step(Vec2::new(109.0, 0.0), Some(player), &pickup, &settings, 0.1, &mut rng);

        assert!((next - Vec2::new(-90.0, 0.0)).length() < 1e-4);
        assert_eq!(wander.direction, Vec2::X);
    }

    #[test]
    fn steer_mode_turns_back_toward_the_player() {
        let mut rng = StdRng::seed_from_u64(0);
        let settings = PickupSettings {
            bounds_radius: 100.0,
            bounds_mode: BoundsMode::Steer,
            ..default()
        };
        let pickup = Pickup::new(1.0, 1.0);
        let mut wander = Wander::new(Vec2::Y, 10.0);

        let next = wander.step(Vec2::new(0.0, 99.0), Some(Vec2::ZERO), &pickup, &settings, 0.1, &mut rng);

        assert!(next.y > 100.0);
        assert!((wander.direction - Vec2::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn fresh_spawns_are_not_wrapped_on_their_first_step() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let player = Vec2::new(30.0, -20.0);
        let delta = 1.0 / 60.0;

        for level in 1..=3 {
            for _ in 0..200 {
                let mut director = LevelDirector::from_level(&config, level);
                let spawn = director
                    .tick(0.2, Some(player), |_| false, &mut rng)
                    .spawn
                    .unwrap();
                let pickup = Pickup::new(spawn.speed_scale, spawn.interval_scale);
                let mut wander = Wander::random(&mut rng, &pickup, &config.pickup);

                let next = wander.step(
                    spawn.position,
                    Some(player),
                    &pickup,
                    &config.pickup,
                    delta,
                    &mut rng,
                );

                let max_step = config.pickup.move_speed * spawn.speed_scale * delta;
                assert!(
                    next.distance(spawn.position) <= max_step + 1e-3,
                    "level {level} spawn at {:?} moved to {next:?}",
                    spawn.position
                );
            }
        }
    }

    #[derive(Resource, Default)]
    struct Collected(Vec<Entity>);

    fn record_collection(trigger: On<PickupCollected>, mut collected: ResMut<Collected>) {
        collected.0.push(trigger.entity);
    }

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins.build().disable::<TimePlugin>());
        app.insert_resource(Time::<()>::default());
        app.insert_resource(GameConfig::default());
        app.init_resource::<Collected>();
        app.add_observer(record_collection);
        app.add_systems(
            Update,
            (collect_pickups_system, despawn_after_system).chain(),
        );
        app
    }

    fn step(app: &mut App, seconds: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds));
        app.update();
    }

    #[test]
    fn standing_on_a_pickup_restores_stamina_once_then_despawns_it() {
        let mut app = setup_app();
        let config = GameConfig::default();
        let player = app.world_mut().spawn(player_bundle(&config)).id();
        app.world_mut().get_mut::<Stamina>(player).unwrap().set(10.0);
        let pickup = app
            .world_mut()
            .spawn((Pickup::new(1.0, 1.0), Transform::from_xyz(5.0, 5.0, 0.0)))
            .id();

        step(&mut app, 0.1);
        step(&mut app, 0.1);

        let stamina = app.world().get::<Stamina>(player).unwrap();
        assert_eq!(stamina.current(), 10.0 + config.pickup.stamina_restore);
        assert_eq!(app.world().resource::<Collected>().0, vec![pickup]);
        assert!(app.world().get::<Pickup>(pickup).unwrap().is_collected());

        // 0.2s elapsed so far, despawn delay is 0.5s
        step(&mut app, 0.4);
        assert!(app.world().get_entity(pickup).is_err());
        assert_eq!(app.world().resource::<Collected>().0.len(), 1);
    }

    #[test]
    fn distant_pickups_are_left_alone() {
        let mut app = setup_app();
        let config = GameConfig::default();
        app.world_mut().spawn(player_bundle(&config));
        let pickup = app
            .world_mut()
            .spawn((
                Pickup::new(1.0, 1.0),
                Transform::from_xyz(config.pickup.collect_radius + 1.0, 0.0, 0.0),
            ))
            .id();

        step(&mut app, 0.1);

        assert!(!app.world().get::<Pickup>(pickup).unwrap().is_collected());
        assert!(app.world().resource::<Collected>().0.is_empty());
    }
}
