use scene::Vec3;

use crate::{avatar::Avatar, math::exp_blend, world::ClimbWorld};

/// How a displacement reaches the sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutorMode {
    /// Submit the delta as is.
    Direct,
    /// Low-pass the delta at `rate` (1/s) before submitting.
    Smoothed { rate: f32 },
}

/// Displacement the avatar root actually received.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Applied {
    pub delta: Vec3,
    pub grounded: bool,
}

/// Drives the avatar root through the world's collision-aware mover.
///
/// The probe capsule is always swept from the avatar's current pose and its
/// end pose is discarded; only the achieved translation is written back to
/// the root, so the probe never drifts from the rig.
#[derive(Clone, Debug, Default)]
pub struct CollisionExecutor {
    smoothed: Vec3,
}

impl CollisionExecutor {
    /// Forget the smoothed delta, e.g. when switching modes.
    pub fn reset(&mut self) {
        self.smoothed = Vec3::zeros();
    }

    pub fn smoothed(&self) -> Vec3 {
        self.smoothed
    }

    /// Returns `None` when the world has no movement primitive for the body;
    /// the root is left untouched in that case.
    pub fn apply(
        &mut self,
        world: &dyn ClimbWorld,
        avatar: &mut Avatar,
        delta: Vec3,
        dt: f32,
        mode: ExecutorMode,
    ) -> Option<Applied> {
        let submit = match mode {
            ExecutorMode::Direct => delta,
            ExecutorMode::Smoothed { rate } => {
                self.smoothed += (delta - self.smoothed) * exp_blend(rate, dt);
                self.smoothed
            }
        };

        let Some(sweep) = world.move_capsule(&avatar.capsule_pose(), submit, dt) else {
            log::warn!("No capsule mover available; body left in place");
            return None;
        };

        avatar.root += sweep.translation;
        Some(Applied {
            delta: sweep.translation,
            grounded: sweep.grounded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CapsuleConfig, testing::StubWorld};

    fn avatar() -> Avatar {
        Avatar::new(Vec3::new(0.0, 0.0, 0.0), &CapsuleConfig::default())
    }

    #[test]
    fn direct_mode_applies_the_swept_delta() {
        let world = StubWorld::wall_facing_neg_x(0.5);
        let mut avatar = avatar();
        let mut executor = CollisionExecutor::default();
        // The rest capsule (radius 0.25) has 0.25 of room before the wall.
        let applied = executor
            .apply(&world, &mut avatar, Vec3::new(1.0, 0.2, 0.0), 1.0, ExecutorMode::Direct)
            .unwrap();
        assert!((applied.delta - Vec3::new(0.25, 0.2, 0.0)).norm() < 1.0e-5);
        assert_eq!(avatar.root, applied.delta);
        assert_eq!(world.last_move(), Some(Vec3::new(1.0, 0.2, 0.0)));
    }

    #[test]
    fn smoothed_mode_lags_then_converges() {
        let world = StubWorld::empty();
        let mut avatar = avatar();
        let mut executor = CollisionExecutor::default();
        let delta = Vec3::new(0.0, -0.01, 0.0);
        let first = executor
            .apply(&world, &mut avatar, delta, 0.01, ExecutorMode::Smoothed { rate: 20.0 })
            .unwrap();
        assert!(first.delta.norm() < delta.norm());
        for _ in 0..200 {
            executor.apply(&world, &mut avatar, delta, 0.01, ExecutorMode::Smoothed { rate: 20.0 });
        }
        assert!((executor.smoothed() - delta).norm() < 1.0e-6);

        executor.reset();
        assert_eq!(executor.smoothed(), Vec3::zeros());
    }

    #[test]
    fn missing_mover_is_a_no_op() {
        let world = StubWorld {
            no_mover: true,
            ..StubWorld::empty()
        };
        let mut avatar = avatar();
        let mut executor = CollisionExecutor::default();
        let before = avatar.root;
        assert!(
            executor
                .apply(&world, &mut avatar, Vec3::x(), 0.1, ExecutorMode::Direct)
                .is_none()
        );
        assert_eq!(avatar.root, before);
    }
}
