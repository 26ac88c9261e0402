use rapier3d::{
    na::{Translation3, UnitQuaternion},
    prelude::*,
};

use crate::surface::{Surface, SurfaceMask, pack_user_data};

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - Planes use a pose-derived normal: `normal = rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// What the controller may do with this surface.
    pub surface: SurfaceMask,
    /// World-space point a mantle zone delivers the avatar root to.
    pub stand_point: Option<Vector<f32>>,
}

impl WorldStaticDef {
    /// Axis-aligned definition at `translation`.
    pub fn new(
        id: u32,
        translation: Vector<f32>,
        shape: ColliderShapeDef,
        surface: SurfaceMask,
    ) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            surface,
            stand_point: None,
        }
    }

    pub fn with_stand_point(mut self, stand_point: Vector<f32>) -> Self {
        self.stand_point = Some(stand_point);
        self
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn pose(&self) -> Isometry<f32> {
        Isometry::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) whose normal is `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters). `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },

    /// Convex hull of local-space points, the usual shape for a low-poly rock.
    ConvexHull { points: Vec<Point<f32>> },
}

/// Build a Rapier collider from a `WorldStaticDef`.
///
/// Surface flags and the def id are packed into `user_data`. Surfaces that are
/// not `Solid` become sensors so the capsule mover never collides with them.
/// Returns `None` for shapes Rapier cannot build (e.g. a flat convex hull).
pub fn collider_from_def(def: &WorldStaticDef) -> Option<Collider> {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // The half-space normal is local +Y; the pose rotates it. The offset
            // slides the plane along its own normal.
            let n = def.rotation * Vector::y();
            let pose = Isometry::from_parts(
                Translation3::from(def.translation + n * *offset_along_normal),
                def.rotation,
            );
            ColliderBuilder::halfspace(Vector::y_axis()).position(pose)
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .position(def.pose())
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).position(def.pose()),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius).position(def.pose()),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        )
        .position(def.pose()),

        ColliderShapeDef::ConvexHull { points } => {
            let Some(builder) = ColliderBuilder::convex_hull(points) else {
                log::warn!("Static {} has a degenerate convex hull; skipped", def.id);
                return None;
            };
            builder.position(def.pose())
        }
    };

    Some(
        builder
            .sensor(!def.surface.has(Surface::Solid))
            .user_data(pack_user_data(def.id, def.surface))
            .build(),
    )
}
