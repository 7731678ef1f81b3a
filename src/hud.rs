use bevy::prelude::*;

use crate::{
    director::{LevelDirector, LevelOutcome, LevelOutcomeEvent, LevelSnapshot, LevelStarted},
    player::{Player, Stamina},
    GameSet,
};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (update_hud_text_system, update_stamina_bar_system).in_set(GameSet::Present),
            )
            .add_observer(show_outcome_panel)
            .add_observer(hide_outcome_panel);
    }
}

/// Which HUD line a text entity shows.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudLine {
    Level,
    Timer,
    Burritos,
    Stamina,
}

/// The coloured fill inside the stamina bar.
#[derive(Component)]
pub struct StaminaFill;

/// Root of the result panel. Hidden while a level is being played.
#[derive(Component)]
pub struct OutcomePanel;

#[derive(Component)]
pub struct OutcomeTitle;

#[derive(Component)]
pub struct OutcomeDetail;

// ── Formatting ──────────────────────────────────────────────────────────────

/// `MM:SS`, both parts floored. Negative input reads as zero.
pub fn format_clock(seconds: f32) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u32;
    let secs = (seconds % 60.0).floor() as u32;
    format!("{:02}:{:02}", minutes, secs)
}

pub fn hud_line_text(line: HudLine, snapshot: &LevelSnapshot, stamina: Option<f32>) -> String {
    match line {
        HudLine::Level => format!("Level: {}", snapshot.level),
        HudLine::Timer => format!("Time: {}", format_clock(snapshot.remaining_time)),
        HudLine::Burritos => format!("Burritos: {} / {}", snapshot.collected, snapshot.required),
        HudLine::Stamina => match stamina {
            Some(stamina) => format!("Stamina: {}", stamina.round() as i32),
            None => "Stamina: -".to_string(),
        },
    }
}

const LOW_STAMINA_FRACTION: f32 = 0.3;
const MEDIUM_STAMINA_FRACTION: f32 = 0.6;

pub fn stamina_color(fraction: f32) -> Color {
    if fraction <= LOW_STAMINA_FRACTION {
        Color::srgb(0.9, 0.2, 0.2)
    } else if fraction <= MEDIUM_STAMINA_FRACTION {
        Color::srgb(0.9, 0.9, 0.2)
    } else {
        Color::srgb(0.2, 0.8, 0.2)
    }
}

pub fn outcome_title(outcome: LevelOutcome) -> &'static str {
    match outcome {
        LevelOutcome::Complete => "LEVEL COMPLETE!",
        LevelOutcome::Failed => "GAME OVER",
        LevelOutcome::Victory => "VICTORY!",
    }
}

pub fn outcome_detail(outcome: LevelOutcome, snapshot: &LevelSnapshot) -> String {
    match outcome {
        LevelOutcome::Complete => format!(
            "Burritos Collected: {}/{}\nTime Remaining: {}\n\nPress N for the next level",
            snapshot.collected,
            snapshot.required,
            format_clock(snapshot.remaining_time)
        ),
        LevelOutcome::Failed => format!(
            "Burritos Collected: {}\nLevel Reached: {}\n\nPress R to try again",
            snapshot.collected, snapshot.level
        ),
        LevelOutcome::Victory => "All levels complete!\n\nPress R to play again".to_string(),
    }
}

// ── Setup ───────────────────────────────────────────────────────────────────

fn hud_text(line: HudLine) -> impl Bundle {
    (
        line,
        Text::new(""),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(Color::srgb(0.9, 0.9, 0.9)),
    )
}

fn setup_hud(mut commands: Commands) {
    // Top-left column of status lines plus the stamina bar
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(20.0),
            top: Val::Px(20.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(4.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn(hud_text(HudLine::Level));
            parent.spawn(hud_text(HudLine::Timer));
            parent.spawn(hud_text(HudLine::Burritos));
            parent.spawn(hud_text(HudLine::Stamina));

            parent
                .spawn((
                    Node {
                        width: Val::Px(200.0),
                        height: Val::Px(14.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.15, 0.15, 0.15)),
                ))
                .with_children(|bar| {
                    bar.spawn((
                        StaminaFill,
                        Node {
                            width: Val::Percent(100.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(stamina_color(1.0)),
                    ));
                });
        });

    // Full-screen centered result panel, hidden until a level ends
    commands
        .spawn((
            OutcomePanel,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                OutcomeTitle,
                Text::new(""),
                TextFont {
                    font_size: 72.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(Justify::Center),
            ));
            parent.spawn((
                OutcomeDetail,
                Text::new(""),
                TextFont {
                    font_size: 28.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.85, 0.85)),
                TextLayout::new_with_justify(Justify::Center),
            ));
        });
}

// ── Systems ─────────────────────────────────────────────────────────────────

pub fn update_hud_text_system(
    director: Res<LevelDirector>,
    players: Query<&Stamina, With<Player>>,
    mut lines: Query<(&HudLine, &mut Text)>,
) {
    let snapshot = director.snapshot();
    let stamina = players.single().ok().map(Stamina::current);

    for (line, mut text) in lines.iter_mut() {
        let new_text = hud_line_text(*line, &snapshot, stamina);
        // Only write on change so Text isn't marked changed every frame
        if text.0 != new_text {
            text.0 = new_text;
        }
    }
}

pub fn update_stamina_bar_system(
    players: Query<&Stamina, With<Player>>,
    mut fills: Query<(&mut Node, &mut BackgroundColor), With<StaminaFill>>,
) {
    let Ok(stamina) = players.single() else {
        return;
    };
    let fraction = stamina.fraction();

    for (mut node, mut color) in fills.iter_mut() {
        node.width = Val::Percent(fraction * 100.0);
        color.0 = stamina_color(fraction);
    }
}

fn show_outcome_panel(
    trigger: On<LevelOutcomeEvent>,
    mut panels: Query<&mut Visibility, With<OutcomePanel>>,
    mut titles: Query<&mut Text, (With<OutcomeTitle>, Without<OutcomeDetail>)>,
    mut details: Query<&mut Text, (With<OutcomeDetail>, Without<OutcomeTitle>)>,
) {
    for mut visibility in panels.iter_mut() {
        *visibility = Visibility::Visible;
    }
    for mut title in titles.iter_mut() {
        title.0 = outcome_title(trigger.outcome).to_string();
    }
    for mut detail in details.iter_mut() {
        detail.0 = outcome_detail(trigger.outcome, &trigger.snapshot);
    }
}

fn hide_outcome_panel(
    _trigger: On<LevelStarted>,
    mut panels: Query<&mut Visibility, With<OutcomePanel>>,
) {
    for mut visibility in panels.iter_mut() {
        *visibility = Visibility::Hidden;
    }
}
