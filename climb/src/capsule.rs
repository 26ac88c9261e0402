use scene::SurfaceMask;

use crate::{
    avatar::{Avatar, BodyCapsule},
    config::CapsuleConfig,
    world::ClimbWorld,
};

/// Blends the body capsule between its resting and climbing shapes.
///
/// Shrinking is always committed. Expansion is committed one step at a time
/// and only when the world reports the grown capsule unobstructed; otherwise
/// the blend holds and [`CapsuleBlender::is_resize_blocked`] reports it.
#[derive(Clone, Debug)]
pub struct CapsuleBlender {
    config: CapsuleConfig,
    rest: BodyCapsule,
    blend: f32,
    target: f32,
    since_release: f32,
    blocked: bool,
}

impl CapsuleBlender {
    pub fn new(config: CapsuleConfig) -> Self {
        let rest = BodyCapsule::rest(&config);
        Self {
            config,
            rest,
            blend: 0.0,
            target: 0.0,
            since_release: 0.0,
            blocked: false,
        }
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Cached resting shape the capsule returns to.
    pub fn rest(&self) -> BodyCapsule {
        self.rest
    }

    pub fn is_resize_blocked(&self) -> bool {
        self.blocked
    }

    /// The capsule is still travelling toward its current target shape.
    pub fn is_resizing(&self) -> bool {
        self.blend != self.target
    }

    /// Capsule shape for blend `t` around the avatar's current head.
    pub fn shape_at(&self, avatar: &Avatar, t: f32) -> BodyCapsule {
        self.rest
            .lerp(&BodyCapsule::climbing(&self.config, &avatar.head), t)
    }

    /// Advance the blend toward 1 when `shrink` is set, toward 0 otherwise,
    /// and write the resulting shape onto the avatar.
    pub fn tick(&mut self, world: &dyn ClimbWorld, avatar: &mut Avatar, shrink: bool, dt: f32) {
        self.target = if shrink { 1.0 } else { 0.0 };

        if shrink {
            self.since_release = 0.0;
            self.blocked = false;
            self.blend = (self.blend + self.config.shrink_rate * dt).min(1.0);
            avatar.capsule = self.shape_at(avatar, self.blend);
            return;
        }

        if self.blend <= 0.0 {
            self.blocked = false;
            if self.config.follow_head {
                self.rest = BodyCapsule::rest_under_head(&self.config, &avatar.head);
            }
            avatar.capsule = self.rest;
            return;
        }

        self.since_release += dt;
        if self.since_release < self.config.expand_delay {
            avatar.capsule = self.shape_at(avatar, self.blend);
            return;
        }

        let next = (self.blend - self.config.expand_rate * dt).max(0.0);
        let candidate = self.shape_at(avatar, next);
        if world.capsule_blocked(&candidate.pose(&avatar.root), SurfaceMask::solid()) {
            if !self.blocked {
                log::debug!("Capsule expansion blocked at blend {:.2}", self.blend);
            }
            self.blocked = true;
            avatar.capsule = self.shape_at(avatar, self.blend);
            return;
        }

        self.blocked = false;
        self.blend = next;
        if self.blend <= 0.0 {
            avatar.capsule = self.rest;
            log::debug!("Capsule restored to rest shape");
        } else {
            avatar.capsule = candidate;
        }
    }
}
