use scene::{SurfaceMask, Vec3};

use crate::{avatar::Avatar, config::PenetrationConfig, math::clamp_length, world::ClimbWorld};

/// Late safety pass pushing the body out of solid geometry.
///
/// Pushes move the root directly; they are corrections, not motion, so they
/// bypass the collision executor and its smoothing.
#[derive(Clone, Debug)]
pub struct PenetrationResolver {
    config: PenetrationConfig,
}

impl PenetrationResolver {
    pub fn new(config: PenetrationConfig) -> Self {
        Self { config }
    }

    /// Resolve overlaps at the avatar's current pose. Returns the total push
    /// applied to the root this tick.
    pub fn resolve(&self, world: &dyn ClimbWorld, avatar: &mut Avatar) -> Vec3 {
        if avatar.capsule.spec().is_degenerate() {
            return Vec3::zeros();
        }

        let mut total = Vec3::zeros();
        let mut budget = self.config.max_push_per_tick;

        for _ in 0..self.config.iterations {
            if budget <= 0.0 {
                break;
            }
            let hits = world.capsule_penetrations(&avatar.capsule_pose(), SurfaceMask::solid());
            if hits.is_empty() {
                break;
            }
            if hits.overflowed {
                log::warn!(
                    "Penetration query overflowed; resolving {} of more overlaps",
                    hits.hits.len()
                );
            }

            let mut push = hits
                .hits
                .iter()
                .map(|p| p.direction * (p.depth + self.config.skin))
                .sum::<Vec3>();
            if self.config.horizontal_only {
                push.y = 0.0;
            }
            let push = clamp_length(push, budget);
            if push.norm_squared() <= f32::EPSILON * f32::EPSILON {
                break;
            }

            avatar.root += push;
            total += push;
            budget -= push.norm();
        }

        if total != Vec3::zeros() {
            log::trace!("Penetration push {:.4}", total.norm());
        }
        total
    }
}
