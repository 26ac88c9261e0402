//! Analytic stand-in for the scene, used by the unit tests.
//!
//! Surfaces are half-spaces described by a point on the boundary and an
//! outward unit normal. The mover clips the normal-aligned part of a move so
//! the capsule never ends up deeper inside a solid than it started.

use std::cell::{Cell, RefCell};

use scene::{
    CapsulePose, Penetration, QueryHits, SurfaceHit, SurfaceId, SurfaceMask, Sweep, Vec3,
};

use crate::world::ClimbWorld;

const GROUND_EPS: f32 = 0.02;

#[derive(Clone, Debug)]
pub struct HalfSpace {
    pub id: SurfaceId,
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: SurfaceMask,
}

impl HalfSpace {
    fn signed_distance(&self, p: &Vec3) -> f32 {
        (p - self.point).dot(&self.normal)
    }

    /// Distance from the capsule's skin to the boundary (negative inside).
    fn capsule_distance(&self, pose: &CapsulePose) -> f32 {
        self.signed_distance(&pose.center)
            - pose.spec.radius
            - pose.spec.half_height * self.normal.y.abs()
    }
}

#[derive(Clone, Debug)]
pub struct StubZone {
    pub center: Vec3,
    pub radius: f32,
    pub stand_point: Vec3,
}

#[derive(Default)]
pub struct StubWorld {
    pub surfaces: Vec<HalfSpace>,
    pub zones: Vec<StubZone>,
    /// Report every capsule check as obstructed.
    pub force_blocked: Cell<bool>,
    /// Flag every query result as overflowed.
    pub overflow: Cell<bool>,
    /// Pretend no movement primitive exists.
    pub no_mover: bool,
    /// Every delta submitted to `move_capsule`.
    pub moves: RefCell<Vec<Vec3>>,
}

impl StubWorld {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Climbable solid wall filling `x >= wall_x`.
    pub fn wall_facing_neg_x(wall_x: f32) -> Self {
        Self::empty().with_wall(wall_x)
    }

    pub fn with_wall(mut self, wall_x: f32) -> Self {
        self.surfaces.push(HalfSpace {
            id: 1,
            point: Vec3::new(wall_x, 0.0, 0.0),
            normal: -Vec3::x(),
            surface: SurfaceMask::climbable_rock(),
        });
        self
    }

    /// Non-climbable solid floor filling `y <= floor_y`.
    pub fn with_floor(mut self, floor_y: f32) -> Self {
        self.surfaces.push(HalfSpace {
            id: 2,
            point: Vec3::new(0.0, floor_y, 0.0),
            normal: Vec3::y(),
            surface: SurfaceMask::solid(),
        });
        self
    }

    /// Non-climbable solid ceiling filling `y >= ceiling_y`.
    pub fn with_ceiling(mut self, ceiling_y: f32) -> Self {
        self.surfaces.push(HalfSpace {
            id: 3,
            point: Vec3::new(0.0, ceiling_y, 0.0),
            normal: -Vec3::y(),
            surface: SurfaceMask::solid(),
        });
        self
    }

    /// Climbable solid ledge top filling `y <= top_y`.
    pub fn with_climbable_top(mut self, top_y: f32) -> Self {
        self.surfaces.push(HalfSpace {
            id: 4,
            point: Vec3::new(0.0, top_y, 0.0),
            normal: Vec3::y(),
            surface: SurfaceMask::climbable_rock(),
        });
        self
    }

    pub fn with_zone(mut self, center: Vec3, radius: f32, stand_point: Vec3) -> Self {
        self.zones.push(StubZone {
            center,
            radius,
            stand_point,
        });
        self
    }

    pub fn last_move(&self) -> Option<Vec3> {
        self.moves.borrow().last().copied()
    }
}

impl ClimbWorld for StubWorld {
    fn surfaces_near(&self, point: &Vec3, radius: f32, mask: SurfaceMask) -> QueryHits<SurfaceHit> {
        let mut hits: Vec<SurfaceHit> = self
            .surfaces
            .iter()
            .filter(|s| s.surface.intersects(mask))
            .filter_map(|s| {
                let d = s.signed_distance(point);
                (d <= radius).then(|| SurfaceHit {
                    id: s.id,
                    point: point - s.normal * d,
                    distance: d.max(0.0),
                    inside: d < 0.0,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        QueryHits {
            hits,
            overflowed: self.overflow.get(),
        }
    }

    fn capsule_penetrations(&self, pose: &CapsulePose, mask: SurfaceMask) -> QueryHits<Penetration> {
        let hits = self
            .surfaces
            .iter()
            .filter(|s| s.surface.intersects(mask))
            .filter_map(|s| {
                let d = s.capsule_distance(pose);
                (d < 0.0).then(|| Penetration {
                    id: s.id,
                    direction: s.normal,
                    depth: -d,
                })
            })
            .collect();
        QueryHits {
            hits,
            overflowed: self.overflow.get(),
        }
    }

    fn capsule_blocked(&self, pose: &CapsulePose, mask: SurfaceMask) -> bool {
        if self.force_blocked.get() || self.overflow.get() {
            return true;
        }
        !self.capsule_penetrations(pose, mask).is_empty()
    }

    fn move_capsule(&self, pose: &CapsulePose, delta: Vec3, _dt: f32) -> Option<Sweep> {
        if self.no_mover || pose.spec.is_degenerate() {
            return None;
        }
        self.moves.borrow_mut().push(delta);

        let mut translation = delta;
        for s in self.surfaces.iter().filter(|s| s.surface.has(scene::Surface::Solid)) {
            let gap = s.capsule_distance(pose).max(0.0);
            let along = translation.dot(&s.normal);
            if along < -gap {
                translation += s.normal * (-gap - along);
            }
        }

        let end = CapsulePose::new(pose.spec, pose.center + translation);
        let grounded = self.surfaces.iter().any(|s| {
            s.surface.has(scene::Surface::Solid)
                && s.normal.y > 0.7
                && s.capsule_distance(&end) <= GROUND_EPS
        });
        Some(Sweep {
            translation,
            grounded,
        })
    }

    fn mantle_target(&self, point: &Vec3, radius: f32) -> Option<Vec3> {
        self.zones
            .iter()
            .filter(|z| (z.center - point).norm() <= z.radius + radius)
            .min_by(|a, b| {
                (a.center - point)
                    .norm()
                    .total_cmp(&(b.center - point).norm())
            })
            .map(|z| z.stand_point)
    }
}
