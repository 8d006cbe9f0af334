use bevy::{asset::RenderAssetUsages, mesh::PrimitiveTopology, prelude::*};

use crate::{
    field::{MetaballField, ScalarField},
    mesh::GeneratedMesh,
    polygonize::{Polygonizer, Strategy},
};

/// System sets for the per-frame metaball pipeline.
///
/// ```text
/// MetaballSet::Advance  →  MetaballSet::Rebuild  →  [your systems]
/// ```
///
/// Ball motion only ever happens in `Advance`, so a surface is never sampled
/// while its balls are moving.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaballSet {
    /// Calls [`ScalarField::update`] on every [`MetaballSurface`].
    Advance,
    /// Polygonizes every [`MetaballSurface`] and swaps in the new [`Mesh3d`].
    Rebuild,
}

/// A metaball surface, rebuilt from scratch every frame.
///
/// ```rust,ignore
/// commands.spawn((
///     MetaballSurface::new(
///         MetaballField::new(1.)
///             .with_ball(Ball::stationary(Point::new(-1., 0., 0.)))
///             .with_ball(Ball::stationary(Point::new(1., 0., 0.))),
///     ),
///     MeshMaterial3d(materials.add(StandardMaterial::default())),
/// ));
/// ```
#[derive(Component)]
#[require(Transform)]
pub struct MetaballSurface {
    pub field: MetaballField,
    /// Triangle count of the last published mesh.
    pub triangles: usize,
}

impl MetaballSurface {
    pub fn new(field: MetaballField) -> Self {
        Self {
            field,
            triangles: 0,
        }
    }
}

/// Polygonizer settings shared by every surface.
///
/// Inserted as a resource by [`MetaballPlugin`]. The strategy may be switched at
/// runtime; both strategies produce the same triangles.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct MetaballConfig {
    pub polygonizer: Polygonizer,
}

/// Bevy plugin that animates and polygonizes [`MetaballSurface`]s.
///
/// When the `auto_rebuild` feature is enabled, every surface is advanced and
/// re-meshed on each `Update`:
///
/// ```text
/// MetaballSurface
///   → field.update()                  (MetaballSet::Advance)
///   → Polygonizer::polygonize         (MetaballSet::Rebuild, blocks until done)
///   → Mesh3d replaced                 (previous mesh asset dropped)
/// ```
#[derive(Default)]
pub struct MetaballPlugin {
    /// Initial value for [`MetaballConfig::polygonizer`].
    pub polygonizer: Polygonizer,
}

impl MetaballPlugin {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            polygonizer: Polygonizer::default().with_strategy(strategy),
        }
    }
}

impl Plugin for MetaballPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(MetaballConfig {
            polygonizer: self.polygonizer,
        });

        #[cfg(feature = "auto_rebuild")]
        app.configure_sets(Update, (MetaballSet::Advance, MetaballSet::Rebuild).chain())
            .add_systems(
                Update,
                (
                    advance_fields.in_set(MetaballSet::Advance),
                    rebuild_meshes.in_set(MetaballSet::Rebuild),
                ),
            );
    }
}

/// Advances ball motion of every surface by one frame.
pub fn advance_fields(mut query: Query<&mut MetaballSurface>) {
    for mut surface in query.iter_mut() {
        surface.field.update();
    }
}

/// Polygonizes every surface and inserts the result as its [`Mesh3d`].
///
/// A surface whose field cannot be polygonized keeps its previous mesh.
pub fn rebuild_meshes(
    mut commands: Commands,
    config: Res<MetaballConfig>,
    mut query: Query<(Entity, &mut MetaballSurface)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, mut surface) in query.iter_mut() {
        let generated = match config.polygonizer.polygonize(&surface.field) {
            Ok(generated) => generated,
            Err(err) => {
                error!(?entity, %err, "could not polygonize metaball surface");
                continue;
            }
        };

        let triangles = generated.triangle_count();
        match to_bevy_mesh(generated) {
            Ok(mesh) => {
                surface.triangles = triangles;
                commands.entity(entity).insert(Mesh3d(meshes.add(mesh)));
            }
            Err(err) => error!(?entity, %err, "could not publish metaball surface"),
        }
    }
}

/// Publishes `generated` into a new Bevy [`Mesh`].
pub fn to_bevy_mesh(generated: GeneratedMesh) -> crate::error::Result<Mesh> {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    generated.publish(&mut mesh)?;
    Ok(mesh)
}
