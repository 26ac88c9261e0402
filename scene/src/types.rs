/*!
Math aliases and the small value types exchanged between the query world and
the climbing controller.

This module intentionally contains no algorithms. Every query in
[`crate::query_world`] speaks in terms of these types so callers never need to
touch Rapier handles directly.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Capsule specification for the avatar body and probes.
///
/// `half_height` is the half-length of the cylinder section (aligned with +Y),
/// so the total capsule height is `2 * half_height + 2 * radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    #[inline]
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius: radius.max(0.0),
            half_height: half_height.max(0.0),
        }
    }

    /// Build from a total height (tip to tip). A height shorter than the
    /// diameter collapses into a sphere.
    #[inline]
    pub fn from_height(radius: f32, height: f32) -> Self {
        let radius = radius.max(0.0);
        Self {
            radius,
            half_height: (height * 0.5 - radius).max(0.0),
        }
    }

    /// Total height tip to tip.
    #[inline]
    pub fn height(&self) -> f32 {
        2.0 * (self.half_height + self.radius)
    }

    /// A capsule with no volume cannot be swept or overlapped.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.radius <= 0.0
    }
}

/// A Y-aligned capsule placed in world space by its center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsulePose {
    pub spec: CapsuleSpec,
    pub center: Vec3,
}

impl CapsulePose {
    #[inline]
    pub fn new(spec: CapsuleSpec, center: Vec3) -> Self {
        Self { spec, center }
    }

    /// Convert to nalgebra `Isometry3` for use with Rapier/parry queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.center.x, self.center.y, self.center.z),
            Quat::identity(),
        )
    }
}

/// Stable identifier of a static surface, taken from its [`crate::WorldStaticDef::id`].
pub type SurfaceId = u32;

/// One surface found by a proximity query.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    pub id: SurfaceId,
    /// Closest point on the surface boundary to the query point.
    pub point: Vec3,
    /// Distance from the query point to `point` (0 when the point is inside).
    pub distance: f32,
    /// Whether the query point lies inside the surface volume.
    pub inside: bool,
}

/// Overlap between a query capsule and a static surface.
#[derive(Clone, Copy, Debug)]
pub struct Penetration {
    pub id: SurfaceId,
    /// Unit direction that moves the capsule out of the surface.
    pub direction: Vec3,
    /// Overlap depth along `direction` (meters, positive).
    pub depth: f32,
}

/// Bounded result list of a scene query.
///
/// `overflowed` is set when more candidates existed than the query capacity.
/// Callers must treat an overflowed result conservatively.
#[derive(Clone, Debug)]
pub struct QueryHits<T> {
    pub hits: Vec<T>,
    pub overflowed: bool,
}

impl<T> Default for QueryHits<T> {
    fn default() -> Self {
        Self {
            hits: Vec::new(),
            overflowed: false,
        }
    }
}

impl<T> QueryHits<T> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Push while respecting `capacity`; returns false once the list is full.
    #[inline]
    pub fn push_bounded(&mut self, hit: T, capacity: usize) -> bool {
        if self.hits.len() >= capacity {
            self.overflowed = true;
            return false;
        }
        self.hits.push(hit);
        true
    }
}

/// Result of a collision-aware capsule move.
#[derive(Clone, Copy, Debug)]
pub struct Sweep {
    /// Translation actually applied after collision response.
    pub translation: Vec3,
    /// Whether the capsule stands on walkable ground after the move.
    pub grounded: bool,
}
