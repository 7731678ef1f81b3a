use bevy::prelude::*;

use crate::{
    director::{Advance, LevelDirector, LevelOutcome, LevelOutcomeEvent, LevelStarted, LevelState},
    player::{reset_player, MoveIntent, Player, PlayerMotion, Stamina, StaminaWarning},
    GameSet,
};

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, session_input_system.in_set(GameSet::Input))
            .add_observer(on_session_command);
    }
}

/// Player-facing requests that move the run between levels.
/// The panels' key prompts trigger these.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Only honoured right after a level is completed.
    NextLevel,
    /// Only honoured after a failed level or a won run.
    Restart,
}

fn session_input_system(mut commands: Commands, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyN) {
        commands.trigger(SessionCommand::NextLevel);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        commands.trigger(SessionCommand::Restart);
    }
}

fn on_session_command(
    trigger: On<SessionCommand>,
    mut commands: Commands,
    mut director: ResMut<LevelDirector>,
    mut players: Query<
        (&mut Stamina, &mut PlayerMotion, &mut StaminaWarning, &mut MoveIntent),
        With<Player>,
    >,
) {
    match *trigger.event() {
        SessionCommand::NextLevel => {
            if director.state() != LevelState::Complete || director.is_victorious() {
                debug!("Next level requested with nothing to advance from");
                return;
            }

            match director.advance_to_next_level() {
                Advance::Started(level) => {
                    info!("Starting level {}", level);
                    commands.trigger(LevelStarted { level });
                }
                Advance::Victory => {
                    info!("Victory! All {} levels complete", director.max_level());
                    commands.trigger(LevelOutcomeEvent {
                        outcome: LevelOutcome::Victory,
                        snapshot: director.snapshot(),
                    });
                }
            }
        }
        SessionCommand::Restart => {
            if director.state() != LevelState::Failed && !director.is_victorious() {
                debug!("Restart requested mid-run; ignoring");
                return;
            }

            director.restart();
            for (mut stamina, mut motion, mut warning, mut intent) in players.iter_mut() {
                reset_player(&mut stamina, &mut motion, &mut warning, &mut intent);
            }
            info!("Restarting from level 1");
            commands.trigger(LevelStarted {
                level: director.current_level(),
            });
        }
    }
}
