//! Hand displacement → body displacement.
//!
//! Each tick while climbing:
//! 1) raw delta of the active anchor, measured relative to the avatar root
//! 2) deadzone, then a one-pole low-pass (jitter filter)
//! 3) candidate = -filtered * climb_strength
//! 4) project onto the smoothed wall plane, with optional compliance along the normal
//! 5) corner slide when projection leaves almost nothing
//! 6) clamp to `max_climb_speed * dt`

use scene::Vec3;

use crate::{
    config::{ComplianceMode, MotionConfig},
    math::{
        clamp_length, exp_blend, project_on_plane, slerp_direction, time_constant_blend,
        try_direction, up,
    },
};

/// Output of one integrator step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    /// Unconstrained body displacement from the filtered hand delta.
    pub candidate: Vec3,
    /// Displacement to submit to the collision executor.
    pub displacement: Vec3,
    /// Whether the corner slide replaced the projected displacement.
    pub slid: bool,
}

#[derive(Clone, Debug)]
pub struct MotionIntegrator {
    config: MotionConfig,
    last_anchor: Option<Vec3>,
    filtered: Vec3,
    smoothed_normal: Option<Vec3>,
}

impl MotionIntegrator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            last_anchor: None,
            filtered: Vec3::zeros(),
            smoothed_normal: None,
        }
    }

    /// Start integrating from a new reference anchor (root-relative) and
    /// zero the jitter filter.
    pub fn reset(&mut self, anchor: Vec3, normal: Option<Vec3>) {
        self.last_anchor = Some(anchor);
        self.filtered = Vec3::zeros();
        self.smoothed_normal = normal;
    }

    pub fn clear(&mut self) {
        self.last_anchor = None;
        self.filtered = Vec3::zeros();
        self.smoothed_normal = None;
    }

    pub fn filtered(&self) -> Vec3 {
        self.filtered
    }

    pub fn smoothed_normal(&self) -> Option<Vec3> {
        self.smoothed_normal
    }

    /// Advance one tick.
    ///
    /// `anchor` is the active hand's anchor relative to the avatar root, so
    /// the body's own motion never shows up as hand motion. `to_anchor` points
    /// from the body toward the anchor in world space and signs the corner
    /// slide.
    pub fn step(
        &mut self,
        anchor: Vec3,
        hand_normal: Option<Vec3>,
        to_anchor: &Vec3,
        dt: f32,
    ) -> MotionStep {
        let mut raw = match self.last_anchor {
            Some(last) => anchor - last,
            None => Vec3::zeros(),
        };
        self.last_anchor = Some(anchor);

        if raw.norm() < self.config.deadzone {
            raw = Vec3::zeros();
        }
        let alpha = time_constant_blend(self.config.jitter_time_constant, dt);
        self.filtered += (raw - self.filtered) * alpha;

        let candidate = -self.filtered * self.config.climb_strength;

        if let Some(target) = hand_normal {
            let from = self.smoothed_normal.unwrap_or(target);
            let t = exp_blend(self.config.normal_smoothing, dt);
            self.smoothed_normal = Some(slerp_direction(&from, &target, t));
        }

        let (constrained, slid) = match self.smoothed_normal {
            Some(n) => self.constrain(&candidate, &n, to_anchor, dt),
            None => (candidate, false),
        };

        let displacement = clamp_length(constrained, self.config.max_climb_speed * dt);
        log::trace!(
            "climb step raw={:.4} filtered={:.4} out={:.4} slid={}",
            raw.norm(),
            self.filtered.norm(),
            displacement.norm(),
            slid
        );

        MotionStep {
            candidate,
            displacement,
            slid,
        }
    }

    /// Keep `candidate` on the wall plane of unit normal `n`, letting part of
    /// the normal component through on near-horizontal tops and sliding
    /// sideways when a convex corner swallows the whole move.
    pub fn constrain(
        &self,
        candidate: &Vec3,
        n: &Vec3,
        to_anchor: &Vec3,
        dt: f32,
    ) -> (Vec3, bool) {
        let projected = project_on_plane(candidate, n);
        let along = candidate.dot(n);
        let weight = self.config.normal_compliance * up().dot(n).max(0.0);

        let compliance = match self.config.compliance {
            ComplianceMode::Off => Vec3::zeros(),
            ComplianceMode::Symmetric => n * (along * weight),
            ComplianceMode::UphillOnly if along * n.y > 0.0 => n * (along * weight),
            ComplianceMode::UphillOnly => Vec3::zeros(),
        };
        let constrained = projected + compliance;

        let min_slide = self.config.min_slide_speed * dt;
        let candidate_len = candidate.norm();
        if candidate_len < min_slide || constrained.norm() >= min_slide {
            return (constrained, false);
        }

        let Some(mut tangent) =
            try_direction(&n.cross(&up())).or_else(|| try_direction(&n.cross(&Vec3::x())))
        else {
            return (constrained, false);
        };
        if tangent.dot(to_anchor) < 0.0 {
            tangent = -tangent;
        }
        (
            tangent * (self.config.corner_slide_ratio * candidate_len),
            true,
        )
    }
}
