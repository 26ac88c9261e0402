//! The seam between the controller and whatever answers its spatial questions.
//!
//! Everything the climbing controller knows about geometry comes through
//! [`ClimbWorld`]. `scene::QueryWorld` implements it over Rapier; tests use an
//! analytic stub.

use scene::{
    CapsuleMover, CapsulePose, Penetration, QueryHits, QueryWorld, SurfaceHit, SurfaceMask, Sweep,
    Vec3,
};

pub trait ClimbWorld {
    /// Surfaces matching `mask` within `radius` of `point`, nearest first,
    /// each with its closest boundary point.
    fn surfaces_near(&self, point: &Vec3, radius: f32, mask: SurfaceMask) -> QueryHits<SurfaceHit>;

    /// Current overlaps between the capsule and surfaces matching `mask`.
    fn capsule_penetrations(&self, pose: &CapsulePose, mask: SurfaceMask) -> QueryHits<Penetration>;

    /// Would a capsule at `pose` overlap anything matching `mask`?
    /// Implementations report `true` when unsure.
    fn capsule_blocked(&self, pose: &CapsulePose, mask: SurfaceMask) -> bool;

    /// Collision-aware displacement of the capsule. `None` means no movement
    /// primitive is available for this body and the caller must not move it.
    fn move_capsule(&self, pose: &CapsulePose, delta: Vec3, dt: f32) -> Option<Sweep>;

    /// Stand point offered by a mantle zone within `radius` of `point`.
    fn mantle_target(&self, point: &Vec3, radius: f32) -> Option<Vec3>;
}

/// Rapier-backed world: a static query world plus the capsule mover.
pub struct SceneWorld<'a> {
    pub world: &'a QueryWorld,
    pub mover: CapsuleMover,
}

impl<'a> SceneWorld<'a> {
    pub fn new(world: &'a QueryWorld) -> Self {
        Self {
            world,
            mover: CapsuleMover::default(),
        }
    }
}

impl ClimbWorld for SceneWorld<'_> {
    fn surfaces_near(&self, point: &Vec3, radius: f32, mask: SurfaceMask) -> QueryHits<SurfaceHit> {
        self.world.surfaces_near(point, radius, mask)
    }

    fn capsule_penetrations(&self, pose: &CapsulePose, mask: SurfaceMask) -> QueryHits<Penetration> {
        self.world.capsule_penetrations(pose, mask)
    }

    fn capsule_blocked(&self, pose: &CapsulePose, mask: SurfaceMask) -> bool {
        self.world.capsule_overlaps(pose, mask)
    }

    fn move_capsule(&self, pose: &CapsulePose, delta: Vec3, dt: f32) -> Option<Sweep> {
        self.mover.move_capsule(self.world, pose, delta, dt)
    }

    fn mantle_target(&self, point: &Vec3, radius: f32) -> Option<Vec3> {
        self.world.mantle_stand_point(point, radius)
    }
}
