use bevy::prelude::*;

mod audio;
mod config;
mod difficulty;
mod director;
mod hud;
mod pickup;
mod player;
mod render;
mod session;

/// Frame phases for gameplay systems. Each plugin drops its systems into
/// one of these, and the sets run in this order every Update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Keyboard to intents and session commands.
    Input,
    /// Player motion, stamina, pickup wander and collection.
    Simulate,
    /// Level clock, spawning and outcomes.
    Director,
    /// HUD, camera, draw order.
    Present,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Burrito Rush".to_string(),
                ..default()
            }),
            ..default()
        }))
        .configure_sets(
            Update,
            (
                GameSet::Input,
                GameSet::Simulate,
                GameSet::Director,
                GameSet::Present,
            )
                .chain(),
        )
        .add_plugins((
            config::ConfigPlugin,
            player::PlayerPlugin,
            pickup::PickupPlugin,
            director::DirectorPlugin,
            session::SessionPlugin,
            hud::HudPlugin,
            audio::AudioPlugin,
            render::RenderPlugin,
        ))
        .run();
}
