//! Rapier-based query world over immutable static geometry.
//!
//! Built once from a list of [`WorldStaticDef`]s and then only read. It answers
//! the four questions the climbing controller asks every tick:
//! - which surfaces are near a point, and where is the closest point on each;
//! - how deep does a capsule penetrate the surfaces it overlaps;
//! - does a capsule overlap anything at all;
//! - where does a capsule end up when moved with collision response
//!   (see [`crate::mover`]).
//!
//! Design goals
//! - Deterministic: inputs are sorted by `id` before insertion.
//! - Bounded: proximity and overlap queries return at most [`MAX_QUERY_HITS`]
//!   results and flag overflow instead of silently dropping hits.

use std::collections::HashMap;

use rapier3d::{
    parry::{
        bounding_volume::{Aabb, BoundingVolume},
        query,
        shape::Capsule,
    },
    prelude::*,
};

use crate::{
    constants::MAX_QUERY_HITS,
    rapier::{WorldStaticDef, collider_from_def},
    surface::{SurfaceMask, unpack_user_data},
    types::{CapsulePose, Penetration, QueryHits, SurfaceHit, SurfaceId, Vec3},
};

/// In-memory Rapier structures needed for scene queries against a static world.
pub struct QueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    stand_points: HashMap<SurfaceId, Vec3>,
}

impl QueryWorld {
    /// Build a query world from static collider definitions.
    ///
    /// Definitions Rapier cannot turn into a collider are skipped and logged.
    pub fn build(world_statics: impl IntoIterator<Item = WorldStaticDef>) -> Self {
        let mut defs: Vec<WorldStaticDef> = world_statics.into_iter().collect();
        defs.sort_by_key(|d| d.id);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders = Vec::new();
        let mut stand_points = HashMap::new();

        for def in &defs {
            let Some(collider) = collider_from_def(def) else {
                continue;
            };
            modified_colliders.push(colliders.insert(collider));
            if let Some(point) = def.stand_point {
                stand_points.insert(def.id, point);
            }
        }

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        log::debug!(
            "Built query world with {} colliders ({} mantle stand points)",
            colliders.len(),
            stand_points.len()
        );

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
            stand_points,
        }
    }

    /// Number of colliders in the world.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.len() == 0
    }

    /// Create a borrowed `QueryPipeline` view suitable for the capsule mover.
    pub fn as_query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Linear broad-phase prune: colliders whose flags match `mask` and whose
    /// AABB touches `aabb`.
    fn candidates<'a>(
        &'a self,
        aabb: Aabb,
        mask: SurfaceMask,
    ) -> impl Iterator<Item = (SurfaceId, &'a Collider)> + 'a {
        self.colliders.iter().filter_map(move |(_, collider)| {
            let (id, flags) = unpack_user_data(collider.user_data);
            if !flags.intersects(mask) || !collider.compute_aabb().intersects(&aabb) {
                return None;
            }
            Some((id, collider))
        })
    }

    /// Surfaces within `radius` of `point`, nearest first, with the closest
    /// point on each surface boundary.
    pub fn surfaces_near(&self, point: &Vec3, radius: f32, mask: SurfaceMask) -> QueryHits<SurfaceHit> {
        let mut out = QueryHits::default();
        if radius < 0.0 {
            return out;
        }

        let probe = Point::from(*point);
        let aabb = Aabb::from_half_extents(probe, Vector::repeat(radius));
        for (id, collider) in self.candidates(aabb, mask) {
            // Non-solid projection so points inside a rock still report the
            // nearest boundary point.
            let proj = collider
                .shape()
                .project_point(collider.position(), &probe, false);
            let distance = if proj.is_inside {
                0.0
            } else {
                (proj.point - probe).norm()
            };
            if distance <= radius {
                out.hits.push(SurfaceHit {
                    id,
                    point: proj.point.coords,
                    distance,
                    inside: proj.is_inside,
                });
            }
        }

        out.hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        if out.hits.len() > MAX_QUERY_HITS {
            out.hits.truncate(MAX_QUERY_HITS);
            out.overflowed = true;
        }
        out
    }

    /// Penetrations between a capsule and the surfaces matching `mask`.
    ///
    /// Each entry carries the direction that separates the capsule from that
    /// surface and the overlap depth. Shape pairs parry cannot handle are
    /// skipped.
    pub fn capsule_penetrations(&self, pose: &CapsulePose, mask: SurfaceMask) -> QueryHits<Penetration> {
        let mut out = QueryHits::default();
        if pose.spec.is_degenerate() {
            return out;
        }

        let capsule = Capsule::new_y(pose.spec.half_height, pose.spec.radius);
        let iso = pose.iso();
        let aabb = capsule.compute_aabb(&iso);
        for (id, collider) in self.candidates(aabb, mask) {
            match query::contact(collider.position(), collider.shape(), &iso, &capsule, 0.0) {
                Ok(Some(contact)) if contact.dist < 0.0 => {
                    // normal1 is the surface's outward normal toward the capsule.
                    let penetration = Penetration {
                        id,
                        direction: contact.normal1.into_inner(),
                        depth: -contact.dist,
                    };
                    if !out.push_bounded(penetration, MAX_QUERY_HITS) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => log::trace!("Unsupported contact pair for surface {id}"),
            }
        }
        out
    }

    /// Does a capsule at `pose` overlap any surface matching `mask`?
    ///
    /// More candidates than the query capacity counts as overlapping.
    pub fn capsule_overlaps(&self, pose: &CapsulePose, mask: SurfaceMask) -> bool {
        if pose.spec.is_degenerate() {
            return false;
        }

        let capsule = Capsule::new_y(pose.spec.half_height, pose.spec.radius);
        let iso = pose.iso();
        let aabb = capsule.compute_aabb(&iso);
        let mut seen = 0;
        for (_, collider) in self.candidates(aabb, mask) {
            seen += 1;
            if seen > MAX_QUERY_HITS {
                log::warn!("Capsule overlap query overflowed; treating as blocked");
                return true;
            }
            if let Ok(true) =
                query::intersection_test(&iso, &capsule, collider.position(), collider.shape())
            {
                return true;
            }
        }
        false
    }

    /// Stand point of the nearest mantle zone within `radius` of `point`.
    pub fn mantle_stand_point(&self, point: &Vec3, radius: f32) -> Option<Vec3> {
        self.surfaces_near(point, radius, SurfaceMask::mantle_zone())
            .hits
            .iter()
            .find_map(|hit| self.stand_points.get(&hit.id).copied())
    }
}
