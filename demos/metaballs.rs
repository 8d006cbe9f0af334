use bevy::prelude::*;
use bevy_metaballs::{
    MetaballPlugin, MetaballSurface, Strategy,
    field::{Ball, MetaballField},
    plugin::MetaballConfig,
    types::{Point, Vector},
};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            MetaballPlugin::default(),
            PanOrbitCameraPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, (toggle_strategy, debug))
        .run();
}

fn setup(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(6., 4., 6.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let field = MetaballField::new(1.).with_balls([
        Ball::oscillating(Point::new(-1., 0., 0.), Vector::new(1.2, 0.4, 0.), 1.1, 0.),
        Ball::oscillating(Point::new(1., 0.2, 0.), Vector::new(0.5, 1., 0.6), 0.8, 1.7),
        Ball::oscillating(Point::new(0., -0.5, 0.8), Vector::new(0.3, 0.6, 1.1), 1.4, 3.1),
    ]);

    commands.spawn((
        MetaballSurface::new(field),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.35, 0.3),
            perceptual_roughness: 0.3,
            ..default()
        })),
    ));
}

/// Press Space to switch between the sequential and the parallel strategy.
fn toggle_strategy(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<MetaballConfig>) {
    if keyboard.just_pressed(KeyCode::Space) {
        let strategy = match config.polygonizer.strategy {
            Strategy::Sequential => Strategy::Parallel,
            Strategy::Parallel => Strategy::Sequential,
        };
        config.polygonizer.strategy = strategy;
        info!(?strategy, "switched polygonizer strategy");
    }
}

fn debug(keyboard: Res<ButtonInput<KeyCode>>, surfaces: Query<&MetaballSurface>) {
    if keyboard.just_pressed(KeyCode::KeyD) {
        for surface in surfaces.iter() {
            info!(
                triangles = surface.triangles,
                time = surface.field.time(),
                "metaball surface"
            );
        }
    }
}
