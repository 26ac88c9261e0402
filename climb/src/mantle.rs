use scene::Vec3;

use crate::{
    avatar::Avatar,
    config::MantleConfig,
    executor::{CollisionExecutor, ExecutorMode},
    math::smoothstep,
    world::ClimbWorld,
};

/// Where a mantle ends: the root position standing on top of the ledge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MantleTarget {
    pub stand_point: Vec3,
}

impl MantleTarget {
    pub fn new(stand_point: Vec3) -> Self {
        Self { stand_point }
    }

    /// Mantle zone overlapping a sphere of `radius` around `head`, if any.
    pub fn probe(world: &dyn ClimbWorld, head: &Vec3, radius: f32) -> Option<Self> {
        world.mantle_target(head, radius).map(Self::new)
    }
}

#[derive(Clone, Copy, Debug)]
struct MantleRun {
    start: Vec3,
    end: Vec3,
    t: f32,
}

/// Per-tick result of a mantle in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MantleStep {
    pub applied: Vec3,
    pub finished: bool,
}

/// Scripted move of the root onto a stand point.
#[derive(Clone, Debug)]
pub struct MantleController {
    config: MantleConfig,
    explicit: Option<MantleTarget>,
    zone: Option<MantleTarget>,
    run: Option<MantleRun>,
}

impl MantleController {
    pub fn new(config: MantleConfig) -> Self {
        Self {
            config,
            explicit: None,
            zone: None,
            run: None,
        }
    }

    /// Target set by the caller, e.g. from its own zone triggers. Takes
    /// precedence over zones found by [`MantleController::sense`].
    pub fn set_target(&mut self, target: Option<MantleTarget>) {
        self.explicit = target;
    }

    /// Refresh the zone target from the world around the head.
    pub fn sense(&mut self, world: &dyn ClimbWorld, head: &Vec3) {
        self.zone = MantleTarget::probe(world, head, self.config.probe_radius);
    }

    pub fn target(&self) -> Option<MantleTarget> {
        self.explicit.or(self.zone)
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Interpolation parameter of the running mantle.
    pub fn progress(&self) -> Option<f32> {
        self.run.map(|r| r.t)
    }

    /// Begin moving from `start` toward the current target. Returns `false`
    /// when there is no target or a mantle is already running.
    pub fn start(&mut self, start: Vec3) -> bool {
        if self.run.is_some() {
            return false;
        }
        let Some(target) = self.target() else {
            return false;
        };
        self.run = Some(MantleRun {
            start,
            end: target.stand_point,
            t: 0.0,
        });
        true
    }

    pub fn cancel(&mut self) {
        self.run = None;
    }

    pub fn tick(
        &mut self,
        world: &dyn ClimbWorld,
        avatar: &mut Avatar,
        executor: &mut CollisionExecutor,
        dt: f32,
    ) -> MantleStep {
        let Some(mut run) = self.run else {
            return MantleStep::default();
        };

        run.t = (run.t + dt / self.config.duration).min(1.0);
        let goal = run.start.lerp(&run.end, smoothstep(run.t));
        let mode = ExecutorMode::Smoothed {
            rate: self.config.smoothing,
        };
        let mut applied = executor
            .apply(world, avatar, goal - avatar.root, dt, mode)
            .map(|a| a.delta)
            .unwrap_or_else(Vec3::zeros);

        if run.t < 1.0 {
            self.run = Some(run);
            return MantleStep {
                applied,
                finished: false,
            };
        }

        // Close whatever distance the smoothing left behind.
        let residual = run.end - avatar.root;
        if let Some(rest) = executor.apply(world, avatar, residual, dt, ExecutorMode::Direct) {
            applied += rest.delta;
        }
        executor.reset();
        self.run = None;
        log::debug!("Mantle finished at {:?}", avatar.root);
        MantleStep {
            applied,
            finished: true,
        }
    }
}
