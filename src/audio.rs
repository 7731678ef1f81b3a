use bevy::{audio::Volume, prelude::*};

use crate::{
    config::GameConfig,
    director::{LevelOutcome, LevelOutcomeEvent},
    pickup::PickupCollected,
    player::{DashEvent, LowStaminaEvent, WarningCue},
};

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_audio, start_music).chain())
            .add_observer(on_pickup_collected)
            .add_observer(on_dash)
            .add_observer(on_low_stamina)
            .add_observer(on_level_outcome);
    }
}

/// Sound cues. Each one is optional: a cue with no configured path stays
/// None and its trigger plays nothing.
#[derive(Resource, Default)]
pub struct GameAudio {
    /// Handle<T> is Bevy's way of referencing assets.
    pub background_music: Option<Handle<AudioSource>>,
    pub pickup: Option<Handle<AudioSource>>,
    pub dash: Option<Handle<AudioSource>>,
    pub low_stamina: Option<Handle<AudioSource>>,
    pub level_complete: Option<Handle<AudioSource>>,
    pub game_over: Option<Handle<AudioSource>>,
}

/// Repeated low-stamina warnings play quieter than the first one.
const REPEAT_WARNING_VOLUME: f32 = 0.5;

pub fn setup_audio(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<GameConfig>) {
    // The actual loading happens in the background - asset_server.load()
    // returns immediately with a Handle that will be valid once loading completes.
    let settings = &config.audio;
    let load = |path: &Option<String>| -> Option<Handle<AudioSource>> {
        path.as_ref().map(|path| asset_server.load(path.clone()))
    };

    commands.insert_resource(GameAudio {
        background_music: load(&settings.background_music),
        pickup: load(&settings.pickup),
        dash: load(&settings.dash),
        low_stamina: load(&settings.low_stamina),
        level_complete: load(&settings.level_complete),
        game_over: load(&settings.game_over),
    });
}

fn start_music(mut commands: Commands, audio: Res<GameAudio>) {
    if let Some(music) = &audio.background_music {
        commands.spawn((AudioPlayer::new(music.clone()), PlaybackSettings::LOOP));
    }
}

/// Spawns a one-shot player for `sound` if that cue is wired up.
fn play_once(commands: &mut Commands, sound: &Option<Handle<AudioSource>>, volume: f32) {
    if let Some(sound) = sound {
        commands.spawn((
            AudioPlayer::new(sound.clone()),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(volume)),
        ));
    }
}

fn on_pickup_collected(_trigger: On<PickupCollected>, mut commands: Commands, audio: Res<GameAudio>) {
    play_once(&mut commands, &audio.pickup, 1.0);
}

fn on_dash(_trigger: On<DashEvent>, mut commands: Commands, audio: Res<GameAudio>) {
    play_once(&mut commands, &audio.dash, 1.0);
}

fn on_low_stamina(trigger: On<LowStaminaEvent>, mut commands: Commands, audio: Res<GameAudio>) {
    let volume = match trigger.cue {
        WarningCue::First => 1.0,
        WarningCue::Repeat => REPEAT_WARNING_VOLUME,
    };
    play_once(&mut commands, &audio.low_stamina, volume);
}

fn on_level_outcome(trigger: On<LevelOutcomeEvent>, mut commands: Commands, audio: Res<GameAudio>) {
    let sound = match trigger.outcome {
        LevelOutcome::Complete | LevelOutcome::Victory => &audio.level_complete,
        LevelOutcome::Failed => &audio.game_over,
    };
    play_once(&mut commands, sound, 1.0);
}
