use rapier3d::{
    control::{CharacterLength, KinematicCharacterController},
    prelude::{Capsule, QueryFilter, Vector},
};

use crate::{
    constants::{MIN_MOVE_SQ, MOVER_OFFSET_RELATIVE},
    query_world::QueryWorld,
    types::{CapsulePose, Sweep, Vec3},
};

/// Collision-aware displacement for a Y-aligned capsule.
///
/// - Movement is expressed as a desired translation for this tick (meters).
/// - Collision is resolved by Rapier's kinematic character controller
///   (shape-cast, stop at contact minus offset, slide along the contact).
/// - The mover never owns a pose: every call starts from the pose it is given
///   and returns only the translation actually achieved.
#[derive(Clone, Copy, Debug)]
pub struct CapsuleMover {
    kcc: KinematicCharacterController,
}

impl Default for CapsuleMover {
    fn default() -> Self {
        Self {
            kcc: KinematicCharacterController {
                // Climbing moves along walls and over ledges, so the controller
                // must neither refuse steep slopes nor slide down them, and must
                // not pull the body back onto ground it is leaving.
                max_slope_climb_angle: std::f32::consts::FRAC_PI_2,
                min_slope_slide_angle: std::f32::consts::FRAC_PI_2,
                autostep: None,
                snap_to_ground: None,
                offset: CharacterLength::Relative(MOVER_OFFSET_RELATIVE),
                slide: true,
                ..KinematicCharacterController::default()
            },
        }
    }
}

impl CapsuleMover {
    /// Move `pose` by `desired` through `world`.
    ///
    /// Returns `None` when there is nothing to sweep (degenerate capsule), in
    /// which case callers should leave the body where it is.
    pub fn move_capsule(
        &self,
        world: &QueryWorld,
        pose: &CapsulePose,
        desired: Vec3,
        dt: f32,
    ) -> Option<Sweep> {
        if pose.spec.is_degenerate() {
            return None;
        }
        if desired.norm_squared() <= MIN_MOVE_SQ {
            return Some(Sweep {
                translation: Vec3::zeros(),
                grounded: self.grounded(world, pose, dt),
            });
        }

        let pipeline = world.as_query_pipeline(QueryFilter::only_fixed().exclude_sensors());
        let shape = Capsule::new_y(pose.spec.half_height, pose.spec.radius);
        let correction = self
            .kcc
            .move_shape(dt, &pipeline, &shape, &pose.iso(), desired, |_| {});

        Some(Sweep {
            translation: correction.translation,
            grounded: correction.grounded,
        })
    }

    /// Ground check without moving: a short downward probe whose result is
    /// discarded except for the grounded flag.
    pub fn grounded(&self, world: &QueryWorld, pose: &CapsulePose, dt: f32) -> bool {
        if pose.spec.is_degenerate() {
            return false;
        }
        let probe = Vector::new(0.0, -(pose.spec.radius * 0.1).max(0.01), 0.0);
        let pipeline = world.as_query_pipeline(QueryFilter::only_fixed().exclude_sensors());
        let shape = Capsule::new_y(pose.spec.half_height, pose.spec.radius);
        self.kcc
            .move_shape(dt, &pipeline, &shape, &pose.iso(), probe, |_| {})
            .grounded
    }
}
