use bevy::prelude::*;

use crate::{player::Player, GameSet};

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb(0.42, 0.62, 0.38)))
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (y_sort_system, camera_follow_system).in_set(GameSet::Present),
            );
    }
}

/// How quickly the camera closes the gap to the player (per second).
const CAMERA_FOLLOW_RATE: f32 = 6.0;

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Exponential ease from `camera` toward `target`. Never passes the target.
pub fn follow(camera: Vec2, target: Vec2, rate: f32, delta: f32) -> Vec2 {
    let t = (rate * delta).clamp(0.0, 1.0);
    camera.lerp(target, t)
}

fn camera_follow_system(
    time: Res<Time>,
    players: Query<&Transform, With<Player>>,
    mut cameras: Query<&mut Transform, (With<Camera2d>, Without<Player>)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let target = player.translation.truncate();

    for mut transform in &mut cameras {
        let next = follow(
            transform.translation.truncate(),
            target,
            CAMERA_FOLLOW_RATE,
            time.delta_secs(),
        );
        transform.translation = next.extend(transform.translation.z);
    }
}

/// Sorts sprites by y position so lower ones appear in front
fn y_sort_system(mut query: Query<&mut Transform, (With<Sprite>, Without<Camera2d>)>) {
    for mut transform in &mut query {
        // Negate y: lower y (bottom of screen) -> higher z (drawn in front)
        // Scale down to keep z values small and leave room for other layers
        transform.translation.z = -transform.translation.y * 0.001;
    }
}
