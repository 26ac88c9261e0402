use scene::{TERMINAL_FALL_SPEED_MPS, Vec3};

use crate::{
    avatar::Avatar,
    config::ReleaseConfig,
    executor::{CollisionExecutor, ExecutorMode},
    world::ClimbWorld,
};

/// Landing reported after falling from a release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallImpact {
    /// Downward speed at touchdown (m/s, positive).
    pub speed: f32,
    pub damage: f32,
}

/// Per-tick result of the release fall.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FallStep {
    pub applied: Vec3,
    pub grounded: bool,
    pub impact: Option<FallImpact>,
}

/// Gravity-driven descent for a short window after letting go.
#[derive(Clone, Debug)]
pub struct ReleaseFallController {
    config: ReleaseConfig,
    timer: f32,
    vertical_speed: f32,
    airborne: bool,
}

impl ReleaseFallController {
    pub fn new(config: ReleaseConfig) -> Self {
        Self {
            config,
            timer: 0.0,
            vertical_speed: 0.0,
            airborne: false,
        }
    }

    /// Open the fall window. Momentum from the climb is discarded.
    pub fn start(&mut self) {
        self.timer = self.config.window;
        self.vertical_speed = 0.0;
        self.airborne = false;
    }

    pub fn cancel(&mut self) {
        self.timer = 0.0;
        self.vertical_speed = 0.0;
        self.airborne = false;
    }

    pub fn is_active(&self) -> bool {
        self.timer > 0.0
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    /// Damage dealt by landing at `speed`: none up to the safe speed, then
    /// linear up to `max_damage` at the lethal speed.
    pub fn impact_damage(&self, speed: f32) -> f32 {
        let safe = self.config.safe_impact_speed;
        let lethal = self.config.lethal_impact_speed;
        if speed <= safe {
            return 0.0;
        }
        let t = ((speed - safe) / (lethal - safe).max(f32::EPSILON)).clamp(0.0, 1.0);
        self.config.max_damage * t
    }

    pub fn tick(
        &mut self,
        world: &dyn ClimbWorld,
        avatar: &mut Avatar,
        executor: &mut CollisionExecutor,
        dt: f32,
    ) -> FallStep {
        if !self.is_active() {
            return FallStep::default();
        }

        self.vertical_speed =
            (self.vertical_speed - self.config.gravity * dt).max(TERMINAL_FALL_SPEED_MPS);
        self.timer = (self.timer - dt).max(0.0);

        let delta = Vec3::new(0.0, self.vertical_speed * dt, 0.0);
        let mode = ExecutorMode::Smoothed {
            rate: self.config.smoothing,
        };
        let Some(applied) = executor.apply(world, avatar, delta, dt, mode) else {
            return FallStep::default();
        };

        let mut impact = None;
        if applied.grounded {
            // Only a real descent counts as a landing.
            if self.airborne {
                let speed = -self.vertical_speed.min(0.0);
                let damage = self.impact_damage(speed);
                log::debug!("Landed at {speed:.2} m/s ({damage:.1} damage)");
                impact = Some(FallImpact { speed, damage });
            }
            self.airborne = false;
            self.vertical_speed = 0.0;
        } else if applied.delta.y < 0.0 {
            self.airborne = true;
        }

        FallStep {
            applied: applied.delta,
            grounded: applied.grounded,
            impact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CapsuleConfig, testing::StubWorld};

    const DT: f32 = 1.0 / 72.0;

    #[test]
    fn falls_for_the_window_then_stops() {
        let world = StubWorld::empty();
        let mut avatar = Avatar::new(Vec3::new(0.0, 10.0, 0.0), &CapsuleConfig::default());
        let mut executor = CollisionExecutor::default();
        let mut release = ReleaseFallController::new(ReleaseConfig::default());
        release.start();

        let mut ticks = 0;
        let mut last_speed = 0.0;
        while release.is_active() {
            release.tick(&world, &mut avatar, &mut executor, DT);
            assert!(release.vertical_speed() < last_speed);
            last_speed = release.vertical_speed();
            ticks += 1;
            assert!(ticks < 100);
        }
        // 0.35 s at 72 Hz.
        assert!((25..=26).contains(&ticks));
        assert!(avatar.root.y < 10.0);

        let before = avatar.root;
        assert_eq!(release.tick(&world, &mut avatar, &mut executor, DT), FallStep::default());
        assert_eq!(avatar.root, before);
    }

    #[test]
    fn impact_damage_curve() {
        let release = ReleaseFallController::new(ReleaseConfig::default());
        assert_eq!(release.impact_damage(3.0), 0.0);
        assert_eq!(release.impact_damage(6.5), 0.0);
        assert!((release.impact_damage(10.25) - 40.0).abs() < 1.0e-3);
        assert_eq!(release.impact_damage(14.0), 80.0);
        assert_eq!(release.impact_damage(40.0), 80.0);
    }

    fn drop_from(height: f32) -> (FallImpact, ReleaseFallController, Avatar) {
        let world = StubWorld::empty().with_floor(0.0);
        let mut avatar = Avatar::new(Vec3::new(0.0, height, 0.0), &CapsuleConfig::default());
        let mut executor = CollisionExecutor::default();
        let mut release = ReleaseFallController::new(ReleaseConfig {
            window: 5.0,
            ..ReleaseConfig::default()
        });
        release.start();

        for _ in 0..(5.0 / DT) as usize {
            if let Some(hit) = release.tick(&world, &mut avatar, &mut executor, DT).impact {
                return (hit, release, avatar);
            }
        }
        panic!("never landed from {height} m");
    }

    #[test]
    fn short_drop_lands_without_damage() {
        let (impact, release, avatar) = drop_from(1.0);
        assert!(impact.speed > 0.0 && impact.speed < 6.5);
        assert_eq!(impact.damage, 0.0);
        assert_eq!(release.vertical_speed(), 0.0);
        assert!(avatar.root.y >= -1.0e-4);
    }

    #[test]
    fn releasing_on_the_ground_is_not_a_landing() {
        let world = StubWorld::empty().with_floor(0.0);
        let mut avatar = Avatar::new(Vec3::zeros(), &CapsuleConfig::default());
        let mut executor = CollisionExecutor::default();
        let mut release = ReleaseFallController::new(ReleaseConfig::default());
        release.start();
        while release.is_active() {
            let step = release.tick(&world, &mut avatar, &mut executor, DT);
            assert_eq!(step.impact, None);
        }
        assert!(avatar.root.y.abs() < 1.0e-5);
    }

    #[test]
    fn long_drop_hurts() {
        let (impact, _, _) = drop_from(8.0);
        assert!(impact.speed > 6.5);
        assert!(impact.damage > 0.0 && impact.damage <= 80.0);
    }
}
