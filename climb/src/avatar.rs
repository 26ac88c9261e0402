use scene::{CapsulePose, CapsuleSpec, Vec3};

use crate::{config::CapsuleConfig, math::lerp};

/// Body collision volume, placed relative to the avatar root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyCapsule {
    pub radius: f32,
    /// Total height, tip to tip.
    pub height: f32,
    /// Capsule center relative to the avatar root.
    pub center: Vec3,
}

impl BodyCapsule {
    pub fn new(radius: f32, height: f32, center: Vec3) -> Self {
        Self {
            radius,
            height,
            center,
        }
    }

    /// Resting shape standing on the root.
    pub fn rest(config: &CapsuleConfig) -> Self {
        Self::new(
            config.rest_radius,
            config.rest_height,
            Vec3::new(0.0, config.rest_height * 0.5, 0.0),
        )
    }

    /// Resting shape aligned under the tracked head: as tall as the head is
    /// high (within limits) and centered beneath it.
    pub fn rest_under_head(config: &CapsuleConfig, head: &Vec3) -> Self {
        let height = head.y.clamp(config.min_height, config.max_height);
        Self::new(
            config.rest_radius,
            height,
            Vec3::new(head.x, height * 0.5, head.z),
        )
    }

    /// Climbing shape hanging just below the head.
    pub fn climbing(config: &CapsuleConfig, head: &Vec3) -> Self {
        let center_y = head.y - config.head_clearance - config.climb_height * 0.5;
        Self::new(
            config.climb_radius,
            config.climb_height,
            Vec3::new(head.x, center_y, head.z),
        )
    }

    pub fn lerp(&self, other: &BodyCapsule, t: f32) -> Self {
        Self::new(
            lerp(self.radius, other.radius, t),
            lerp(self.height, other.height, t),
            self.center.lerp(&other.center, t),
        )
    }

    pub fn spec(&self) -> CapsuleSpec {
        CapsuleSpec::from_height(self.radius, self.height)
    }

    pub fn pose(&self, root: &Vec3) -> CapsulePose {
        CapsulePose::new(self.spec(), root + self.center)
    }
}

/// The rig the controller moves: world root, tracked head and body volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Avatar {
    /// Tracking-space origin in world space.
    pub root: Vec3,
    /// Head position relative to the root.
    pub head: Vec3,
    pub capsule: BodyCapsule,
}

impl Avatar {
    pub fn new(root: Vec3, config: &CapsuleConfig) -> Self {
        Self {
            root,
            head: Vec3::new(0.0, config.rest_height, 0.0),
            capsule: BodyCapsule::rest(config),
        }
    }

    pub fn capsule_pose(&self) -> CapsulePose {
        self.capsule.pose(&self.root)
    }

    pub fn head_world(&self) -> Vec3 {
        self.root + self.head
    }

    /// World position of a point given relative to the root.
    pub fn to_world(&self, local: &Vec3) -> Vec3 {
        self.root + local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_aligned_rest_clamps_height() {
        let config = CapsuleConfig::default();
        let tall = BodyCapsule::rest_under_head(&config, &Vec3::new(0.1, 2.6, -0.2));
        assert_eq!(tall.height, config.max_height);
        assert_eq!(tall.center, Vec3::new(0.1, config.max_height * 0.5, -0.2));

        let crouched = BodyCapsule::rest_under_head(&config, &Vec3::new(0.0, 0.4, 0.0));
        assert_eq!(crouched.height, config.min_height);
    }

    #[test]
    fn climbing_capsule_hangs_below_head() {
        let config = CapsuleConfig::default();
        let head = Vec3::new(0.0, 1.6, 0.0);
        let capsule = BodyCapsule::climbing(&config, &head);
        let top = capsule.center.y + capsule.height * 0.5;
        assert!((head.y - top - config.head_clearance).abs() < 1.0e-6);
    }

    #[test]
    fn lerp_blends_every_dimension() {
        let a = BodyCapsule::new(0.2, 1.0, Vec3::new(0.0, 0.5, 0.0));
        let b = BodyCapsule::new(0.4, 2.0, Vec3::new(1.0, 1.5, 0.0));
        assert_eq!(a.lerp(&b, 0.0), a);
        let end = a.lerp(&b, 1.0);
        assert!((end.radius - b.radius).abs() < 1.0e-6);
        assert!((end.center - b.center).norm() < 1.0e-6);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.radius - 0.3).abs() < 1.0e-6);
        assert!((mid.height - 1.5).abs() < 1.0e-6);
        assert!((mid.center - Vec3::new(0.5, 1.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn pose_places_capsule_relative_to_root() {
        let config = CapsuleConfig::default();
        let avatar = Avatar::new(Vec3::new(3.0, 1.0, 0.0), &config);
        let pose = avatar.capsule_pose();
        assert_eq!(pose.center, Vec3::new(3.0, 1.0 + config.rest_height * 0.5, 0.0));
        assert!((pose.spec.height() - config.rest_height).abs() < 1.0e-6);
    }
}
