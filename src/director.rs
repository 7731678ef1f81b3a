use bevy::prelude::*;
use rand::Rng;

use crate::{
    config::{GameConfig, LevelSettings},
    difficulty::DifficultyTables,
    pickup::{random_unit_vector, spawn_pickup, Pickup, PickupCollected},
    player::Player,
    GameSet,
};

pub struct DirectorPlugin;

impl Plugin for DirectorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_director)
            .add_systems(
                Update,
                (
                    director_tick_system.run_if(level_is_active),
                    despawn_retired_pickups_system,
                )
                    .chain()
                    .in_set(GameSet::Director),
            )
            .add_observer(on_pickup_collected);
    }
}

/// Where the current level stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Active,
    Complete,
    Failed,
}

/// How a level (or the whole run) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    Complete,
    Failed,
    /// The last level was cleared and the player moved past it.
    Victory,
}

/// Fired whenever a level ends or the run is won.
/// Carries the numbers the result panels show.
#[derive(Event, Debug, Clone)]
pub struct LevelOutcomeEvent {
    pub outcome: LevelOutcome,
    pub snapshot: LevelSnapshot,
}

/// Fired when a level (re)starts, including after a restart.
#[derive(Event, Debug, Clone)]
pub struct LevelStarted {
    pub level: u32,
}

/// The numbers the HUD needs each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSnapshot {
    pub level: u32,
    pub remaining_time: f32,
    pub collected: u32,
    pub required: u32,
}

/// A pickup the director wants placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupSpawn {
    pub position: Vec2,
    pub speed_scale: f32,
    pub interval_scale: f32,
}

/// What happened during one `tick`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub spawn: Option<PickupSpawn>,
    pub outcome: Option<LevelOutcome>,
}

/// What `advance_to_next_level` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Started(u32),
    Victory,
}

/// Runs the timed level loop: countdown, spawn cadence, population cap, and
/// the Complete / Failed / Victory transitions.
///
/// The director never touches the world directly. `tick` hands back a spawn
/// order for the caller to fulfil (and then `track_pickup`), and any pickups
/// dropped when a level ends or resets go into a retired list that a system
/// drains.
/// That keeps every rule here testable with plain method calls.
#[derive(Resource, Debug, Clone)]
pub struct LevelDirector {
    settings: LevelSettings,
    tables: DifficultyTables,
    current_level: u32,
    collected_count: u32,
    remaining_time: f32,
    active_pickups: Vec<Entity>,
    retired_pickups: Vec<Entity>,
    spawn_cooldown: f32,
    state: LevelState,
    victorious: bool,
}

impl LevelDirector {
    /// Builds a director already running `level`. Nothing else is needed to
    /// resume a session: the config plus a level number is the whole state.
    pub fn from_level(config: &GameConfig, level: u32) -> Self {
        let mut director = LevelDirector {
            settings: config.level.clone(),
            tables: config.difficulty.clone(),
            current_level: 1,
            collected_count: 0,
            remaining_time: 0.0,
            active_pickups: Vec::new(),
            retired_pickups: Vec::new(),
            spawn_cooldown: 0.0,
            state: LevelState::Active,
            victorious: false,
        };
        director.start_level(level);
        director
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn collected_count(&self) -> u32 {
        self.collected_count
    }

    pub fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn is_victorious(&self) -> bool {
        self.victorious
    }

    pub fn active_pickups(&self) -> &[Entity] {
        &self.active_pickups
    }

    pub fn max_level(&self) -> u32 {
        self.settings.max_level.max(1)
    }

    pub fn required_count(&self) -> u32 {
        self.tables.required_count(self.current_level)
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            level: self.current_level,
            remaining_time: self.remaining_time,
            collected: self.collected_count,
            required: self.required_count(),
        }
    }

    pub fn start_level(&mut self, level: u32) {
        self.current_level = level.clamp(1, self.max_level());
        self.collected_count = 0;
        self.remaining_time = self.settings.time_limit;
        self.state = LevelState::Active;
        self.spawn_cooldown = self.settings.initial_spawn_delay;
        self.retire_all_pickups();
    }

    /// Back to level 1 with a clean slate, victory included.
    pub fn restart(&mut self) {
        self.victorious = false;
        self.start_level(1);
    }

    /// Moves on after a cleared level. Past the last level the run is won;
    /// that is terminal until `restart`.
    pub fn advance_to_next_level(&mut self) -> Advance {
        let Some(next) = self
            .current_level
            .checked_add(1)
            .filter(|&next| next <= self.max_level())
        else {
            self.victorious = true;
            self.retire_all_pickups();
            return Advance::Victory;
        };
        self.start_level(next);
        Advance::Started(self.current_level)
    }

    /// Counts one collection. Ignored once the level is no longer active.
    pub fn on_pickup_collected(&mut self) -> bool {
        if self.state != LevelState::Active {
            return false;
        }
        self.collected_count += 1;
        true
    }

    /// One simulation step.
    ///
    /// `is_live` says whether a tracked pickup still counts toward the cap
    /// (exists and not yet collected). `player` is None when there is no
    /// player to spawn around; the spawn attempt is then skipped and retried
    /// next tick.
    pub fn tick(
        &mut self,
        delta: f32,
        player: Option<Vec2>,
        is_live: impl Fn(Entity) -> bool,
        rng: &mut impl Rng,
    ) -> TickReport {
        let mut report = TickReport::default();
        if self.state != LevelState::Active {
            return report;
        }

        self.remaining_time -= delta;
        if self.remaining_time <= 0.0 {
            self.remaining_time = 0.0;
            self.state = LevelState::Failed;
            self.retire_all_pickups();
            report.outcome = Some(LevelOutcome::Failed);
            return report;
        }

        self.active_pickups.retain(|&entity| is_live(entity));

        if self.active_pickups.len() < self.settings.max_active_pickups {
            self.spawn_cooldown -= delta;
            if self.spawn_cooldown <= 0.0 {
                if let Some(player) = player {
                    report.spawn = Some(self.plan_spawn(player, rng));
                    self.spawn_cooldown = self.settings.spawn_interval
                        / self.tables.spawn_interval_divider(self.current_level);
                }
            }
        }

        if self.collected_count >= self.required_count() {
            // A finished level keeps no pickups, including one ordered this tick
            self.state = LevelState::Complete;
            self.retire_all_pickups();
            report.spawn = None;
            report.outcome = Some(LevelOutcome::Complete);
        }

        report
    }

    /// Records a pickup spawned from a `tick` order. Refuses (and returns
    /// false) if the cap is already reached.
    pub fn track_pickup(&mut self, entity: Entity) -> bool {
        if self.active_pickups.len() >= self.settings.max_active_pickups {
            return false;
        }
        self.active_pickups.push(entity);
        true
    }

    /// Pickups dropped by a level ending or resetting that still need
    /// despawning.
    pub fn take_retired_pickups(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.retired_pickups)
    }

    fn retire_all_pickups(&mut self) {
        self.retired_pickups.append(&mut self.active_pickups);
    }

    /// Random direction, random distance in the level-scaled band.
    fn plan_spawn(&self, player: Vec2, rng: &mut impl Rng) -> PickupSpawn {
        let level = self.current_level;
        let scale = self.tables.spawn_distance_multiplier(level);
        let min = self.settings.min_spawn_distance * scale;
        let max = self.settings.max_spawn_distance * scale;
        let distance = if max > min { rng.gen_range(min..=max) } else { min };

        PickupSpawn {
            position: player + random_unit_vector(rng) * distance,
            speed_scale: self.tables.speed_multiplier(level),
            interval_scale: self.tables.wander_interval_scale(level),
        }
    }
}

pub fn level_is_active(director: Option<Res<LevelDirector>>) -> bool {
    director.is_some_and(|director| director.state() == LevelState::Active)
}

fn setup_director(mut commands: Commands, config: Res<GameConfig>) {
    let director = LevelDirector::from_level(&config, config.level.start_level);
    info!(
        "Starting at level {} of {}",
        director.current_level(),
        director.max_level()
    );
    commands.trigger(LevelStarted {
        level: director.current_level(),
    });
    commands.insert_resource(director);
}

pub fn director_tick_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut director: ResMut<LevelDirector>,
    players: Query<&Transform, With<Player>>,
    pickups: Query<&Pickup>,
) {
    let mut rng = rand::thread_rng();
    let player = players.single().ok().map(|t| t.translation.truncate());

    let report = director.tick(
        time.delta_secs(),
        player,
        |entity| pickups.get(entity).is_ok_and(|pickup| !pickup.is_collected()),
        &mut rng,
    );

    if let Some(spawn) = report.spawn {
        let entity = spawn_pickup(&mut commands, &spawn, &config.pickup, &mut rng);
        if director.track_pickup(entity) {
            debug!("Spawned pickup at {:?}", spawn.position);
        } else {
            warn!("Pickup cap reached; dropping spawn");
            commands.entity(entity).despawn();
        }
    }

    if let Some(outcome) = report.outcome {
        let snapshot = director.snapshot();
        match outcome {
            LevelOutcome::Complete => info!(
                "Level {} complete with {:.1}s left",
                snapshot.level, snapshot.remaining_time
            ),
            LevelOutcome::Failed => info!(
                "Out of time on level {} ({}/{} collected)",
                snapshot.level, snapshot.collected, snapshot.required
            ),
            LevelOutcome::Victory => {}
        }
        commands.trigger(LevelOutcomeEvent { outcome, snapshot });
    }
}

/// Despawns whatever an ended or reset level left behind. Once a level is
/// over that includes collected pickups still waiting on their timer.
pub fn despawn_retired_pickups_system(
    mut commands: Commands,
    mut director: ResMut<LevelDirector>,
    pickups: Query<Entity, With<Pickup>>,
) {
    if director.state() != LevelState::Active {
        director.take_retired_pickups();
        for entity in &pickups {
            commands.entity(entity).despawn();
        }
        return;
    }

    for entity in director.take_retired_pickups() {
        // Might already be gone via its own despawn timer
        if pickups.contains(entity) {
            commands.entity(entity).despawn();
        }
    }
}

fn on_pickup_collected(_trigger: On<PickupCollected>, mut director: ResMut<LevelDirector>) {
    director.on_pickup_collected();
}
