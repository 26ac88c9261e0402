//! Climb state machine and the per-tick driver.
//!
//! One [`ClimbManager`] per avatar. Callers feed it one [`TickInput`] per
//! simulated tick; everything that moves the root, reshapes the body capsule
//! or touches stamina happens inside [`ClimbManager::tick`], in this order:
//!
//! 1. hands: pose, contact sensing, grip edges (begin/end climb, mantle input)
//! 2. capsule blend
//! 3. locomotion re-enable once the capsule is back at rest
//! 4. stamina drain/regen, forced release on exhaustion
//! 5. release fall, mantle or climb motion
//! 6. penetration resolve on the post-movement root
//!
//! State transitions:
//! - Idle/Releasing → Climbing on a grab with contact and energy
//! - Climbing → Climbing when the active hand lets go and another still grips
//! - Climbing → Releasing when the last gripping hand lets go or energy runs out
//! - Releasing → Idle once the fall window is over and the capsule is at rest
//! - any → Mantling on the mantle input while a target is known
//! - Mantling → Idle when the stand point is reached

use scene::Vec3;

use crate::{
    avatar::Avatar,
    capsule::CapsuleBlender,
    config::ClimbConfig,
    executor::{CollisionExecutor, ExecutorMode},
    hand::{GripEdge, Hand, HandId, HandInput},
    locomotion::{LocomotionGate, LocomotionLock},
    mantle::{MantleController, MantleTarget},
    motion::MotionIntegrator,
    penetration::PenetrationResolver,
    registry::HandRegistry,
    release::{FallImpact, ReleaseFallController},
    stamina::{StaminaGate, StaminaOutcome, StaminaResource},
    world::ClimbWorld,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClimbState {
    #[default]
    Idle,
    Climbing,
    /// Gravity-driven fall window after letting go.
    Releasing,
    Mantling,
}

/// Notable things that happened during a tick, in order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClimbEvent {
    Grabbed(HandId),
    Released(HandId),
    ClimbStarted(HandId),
    HandOff { from: HandId, to: HandId },
    /// The climb ended and the fall window opened.
    ClimbEnded(HandId),
    Exhausted,
    Recovered,
    MantleStarted { stand_point: Vec3 },
    MantleFinished,
    Landed(FallImpact),
    LocomotionRestored,
}

/// Tracking input for one tick.
#[derive(Clone, Debug, Default)]
pub struct TickInput {
    pub dt: f32,
    /// Head position relative to the avatar root.
    pub head: Vec3,
    pub hands: Vec<HandInput>,
    /// Mantle button went down this tick.
    pub mantle: bool,
}

impl TickInput {
    pub fn new(dt: f32, head: Vec3) -> Self {
        Self {
            dt,
            head,
            hands: Vec::new(),
            mantle: false,
        }
    }

    pub fn with_hand(mut self, hand: HandInput) -> Self {
        self.hands.push(hand);
        self
    }

    pub fn with_mantle(mut self) -> Self {
        self.mantle = true;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub events: Vec<ClimbEvent>,
    /// Stamina spent this tick.
    pub drained: f32,
    /// Displacement the root received from climb, fall or mantle motion.
    pub applied: Vec3,
    /// Correction from the penetration pass.
    pub push: Vec3,
    pub state: ClimbState,
}

pub struct ClimbManager {
    config: ClimbConfig,
    avatar: Avatar,
    hands: HandRegistry,
    active: Option<HandId>,
    state: ClimbState,
    motion: MotionIntegrator,
    executor: CollisionExecutor,
    capsule: CapsuleBlender,
    penetration: PenetrationResolver,
    stamina: StaminaGate,
    release: ReleaseFallController,
    mantle: MantleController,
    gate: LocomotionGate,
    lock: Option<LocomotionLock>,
    pending_reenable: bool,
    grounded: bool,
    events: Vec<ClimbEvent>,
}

impl ClimbManager {
    pub fn new(config: ClimbConfig, root: Vec3) -> Self {
        Self::with_gate(config, root, LocomotionGate::new())
    }

    /// Build with a gate shared with the avatar's other locomotion systems.
    pub fn with_gate(config: ClimbConfig, root: Vec3, gate: LocomotionGate) -> Self {
        Self {
            avatar: Avatar::new(root, &config.capsule),
            hands: HandRegistry::default(),
            active: None,
            state: ClimbState::Idle,
            motion: MotionIntegrator::new(config.motion.clone()),
            executor: CollisionExecutor::default(),
            capsule: CapsuleBlender::new(config.capsule.clone()),
            penetration: PenetrationResolver::new(config.penetration.clone()),
            stamina: StaminaGate::new(config.stamina.clone()),
            release: ReleaseFallController::new(config.release.clone()),
            mantle: MantleController::new(config.mantle.clone()),
            gate,
            lock: None,
            pending_reenable: false,
            grounded: false,
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClimbConfig {
        &self.config
    }

    pub fn state(&self) -> ClimbState {
        self.state
    }

    pub fn is_climbing(&self) -> bool {
        self.state == ClimbState::Climbing
    }

    pub fn is_mantling(&self) -> bool {
        self.state == ClimbState::Mantling
    }

    pub fn is_releasing(&self) -> bool {
        self.state == ClimbState::Releasing
    }

    pub fn is_capsule_resizing(&self) -> bool {
        self.capsule.is_resizing()
    }

    pub fn is_capsule_resize_blocked(&self) -> bool {
        self.capsule.is_resize_blocked()
    }

    pub fn capsule_blend(&self) -> f32 {
        self.capsule.blend()
    }

    pub fn active_hand(&self) -> Option<HandId> {
        self.active
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    /// Ordinary locomotion moves the root through this while the gate is open.
    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn hand(&self, id: HandId) -> Option<&dyn Hand> {
        self.hands.get(id).map(|h| h as &dyn Hand)
    }

    pub fn hands(&self) -> &HandRegistry {
        &self.hands
    }

    pub fn locomotion_gate(&self) -> &LocomotionGate {
        &self.gate
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn mantle_target(&self) -> Option<MantleTarget> {
        self.mantle.target()
    }

    pub fn register_hand(&mut self, id: HandId) -> bool {
        let added = self.hands.register(id, self.config.hand.clone());
        if added {
            log::debug!("Registered {id} hand");
        }
        added
    }

    /// Force-release and forget a hand. If it was driving the climb, the climb
    /// hands off or ends exactly as if the hand had let go.
    pub fn unregister_hand(&mut self, id: HandId) -> bool {
        let Some(hand) = self.hands.get_mut(id) else {
            return false;
        };
        let was_grabbing = hand.is_grabbing();
        hand.force_release();
        if was_grabbing {
            self.events.push(ClimbEvent::Released(id));
        }
        self.try_end_climb(id);
        self.hands.unregister(id);
        log::debug!("Unregistered {id} hand");
        true
    }

    /// Start climbing on `id`, or make it the driving hand of a climb already
    /// in progress.
    pub fn try_begin_climb(&mut self, id: HandId, stamina: &dyn StaminaResource) -> bool {
        if self.state == ClimbState::Mantling || stamina.is_exhausted() {
            return false;
        }
        let Some(hand) = self.hands.get(id) else {
            return false;
        };
        if !(hand.is_grabbing() && hand.has_contact()) {
            return false;
        }

        match (self.state, self.active) {
            (ClimbState::Climbing, Some(current)) if current == id => return false,
            (ClimbState::Climbing, Some(current)) => {
                self.events.push(ClimbEvent::HandOff {
                    from: current,
                    to: id,
                });
                log::debug!("Climb hand-off {current} -> {id}");
            }
            _ => {
                self.events.push(ClimbEvent::ClimbStarted(id));
                log::debug!("Climb started on {id} hand");
            }
        }

        self.release.cancel();
        self.engage(id);
        self.state = ClimbState::Climbing;
        self.pending_reenable = false;
        self.acquire_lock();
        true
    }

    /// `id` let go. Hands the climb to another gripping hand when there is
    /// one, otherwise opens the fall window. No-op unless `id` is driving.
    pub fn try_end_climb(&mut self, id: HandId) -> bool {
        if self.state != ClimbState::Climbing || self.active != Some(id) {
            return false;
        }
        if let Some(next) = self.hands.fallback(id) {
            self.events.push(ClimbEvent::HandOff { from: id, to: next });
            log::debug!("Climb hand-off {id} -> {next}");
            self.engage(next);
            return true;
        }
        self.begin_release(id);
        true
    }

    pub fn set_mantle_target(&mut self, target: Option<MantleTarget>) {
        self.mantle.set_target(target);
    }

    /// Start mantling toward the current target. Suppresses climbing until
    /// the stand point is reached.
    pub fn trigger_mantle(&mut self) -> bool {
        if self.state == ClimbState::Mantling {
            return false;
        }
        let Some(target) = self.mantle.target() else {
            return false;
        };
        if !self.mantle.start(self.avatar.root) {
            return false;
        }

        self.active = None;
        self.motion.clear();
        self.release.cancel();
        self.executor.reset();
        self.state = ClimbState::Mantling;
        self.pending_reenable = false;
        self.acquire_lock();
        self.events.push(ClimbEvent::MantleStarted {
            stand_point: target.stand_point,
        });
        log::debug!("Mantle started toward {:?}", target.stand_point);
        true
    }

    /// Run one simulated tick.
    pub fn tick(
        &mut self,
        world: &dyn ClimbWorld,
        stamina: &mut dyn StaminaResource,
        input: &TickInput,
    ) -> TickReport {
        let dt = input.dt.clamp(0.0, self.config.motion.max_dt);
        self.avatar.head = input.head;

        // 1) Hands and input edges.
        self.update_hands(world, &*stamina, &input.hands);
        self.mantle.sense(world, &self.avatar.head_world());
        if input.mantle {
            self.trigger_mantle();
        }

        // 2) Capsule shrinks while climbing or mantling, expands otherwise.
        let shrink = matches!(self.state, ClimbState::Climbing | ClimbState::Mantling);
        self.capsule.tick(world, &mut self.avatar, shrink, dt);

        // 3) Hand locomotion back only once the body is at rest size.
        self.settle_locomotion();

        // 4) Stamina.
        let outcome = self
            .stamina
            .tick(stamina, self.hands.any_gripping(), self.grounded, dt);
        match outcome {
            StaminaOutcome::Exhausted { .. } => {
                self.events.push(ClimbEvent::Exhausted);
                self.exhaust();
            }
            StaminaOutcome::Recovered => self.events.push(ClimbEvent::Recovered),
            StaminaOutcome::Draining { .. } | StaminaOutcome::Regenerating => {}
        }

        // 5) Movement for the current state.
        let applied = match self.state {
            ClimbState::Climbing => self.climb_step(world, dt),
            ClimbState::Releasing => self.fall_step(world, dt),
            ClimbState::Mantling => self.mantle_step(world, dt),
            ClimbState::Idle => {
                self.grounded = self.probe_grounded(world, dt);
                Vec3::zeros()
            }
        };

        // 6) Penetration sees the post-movement root.
        let push = self.penetration.resolve(world, &mut self.avatar);

        TickReport {
            events: std::mem::take(&mut self.events),
            drained: outcome.drained(),
            applied,
            push,
            state: self.state,
        }
    }

    fn update_hands(
        &mut self,
        world: &dyn ClimbWorld,
        stamina: &dyn StaminaResource,
        inputs: &[HandInput],
    ) {
        let exhausted = stamina.is_exhausted();
        for input in inputs {
            let position = self.avatar.to_world(&input.local_position);
            let Some(hand) = self.hands.get_mut(input.id) else {
                log::trace!("Ignoring input for unregistered {} hand", input.id);
                continue;
            };
            hand.set_pose(position, input.forward);
            let edges = [hand.sense(world), hand.update_grip(world, input.grip, exhausted)];

            for edge in edges.into_iter().flatten() {
                match edge {
                    GripEdge::Grabbed => {
                        self.events.push(ClimbEvent::Grabbed(input.id));
                        self.try_begin_climb(input.id, stamina);
                    }
                    GripEdge::Released => {
                        self.events.push(ClimbEvent::Released(input.id));
                        self.try_end_climb(input.id);
                    }
                }
            }
        }
    }

    /// Make `id` the driving hand and restart the integrator from its anchor.
    fn engage(&mut self, id: HandId) {
        let Some(hand) = self.hands.get(id) else {
            return;
        };
        self.active = Some(id);
        self.motion
            .reset(hand.anchor() - self.avatar.root, hand.locked_normal());
        self.executor.reset();
    }

    fn begin_release(&mut self, from: HandId) {
        self.active = None;
        self.motion.clear();
        self.executor.reset();
        self.release.start();
        self.state = ClimbState::Releasing;
        self.events.push(ClimbEvent::ClimbEnded(from));
        log::debug!("Climb ended on {from} hand; falling");
    }

    fn exhaust(&mut self) {
        for id in self.hands.release_all() {
            self.events.push(ClimbEvent::Released(id));
        }
        if let (ClimbState::Climbing, Some(id)) = (self.state, self.active) {
            self.begin_release(id);
        }
    }

    fn acquire_lock(&mut self) {
        if self.lock.is_none() {
            self.lock = Some(self.gate.lock());
        }
    }

    fn restore_locomotion(&mut self) {
        if self.lock.take().is_some() {
            self.events.push(ClimbEvent::LocomotionRestored);
            log::debug!("Locomotion restored");
        }
    }

    fn settle_locomotion(&mut self) {
        if self.capsule.blend() > 0.0 {
            return;
        }
        if self.state == ClimbState::Releasing && !self.release.is_active() {
            self.state = ClimbState::Idle;
            self.restore_locomotion();
        }
        if self.pending_reenable && self.state == ClimbState::Idle {
            self.pending_reenable = false;
            self.restore_locomotion();
        }
    }

    fn climb_step(&mut self, world: &dyn ClimbWorld, dt: f32) -> Vec3 {
        let Some(id) = self.active else {
            return Vec3::zeros();
        };
        let Some(hand) = self.hands.get(id) else {
            return Vec3::zeros();
        };
        if !(hand.is_grabbing() && hand.has_contact()) {
            self.try_end_climb(id);
            return Vec3::zeros();
        }

        let anchor = hand.anchor();
        let to_anchor = anchor - self.avatar.capsule_pose().center;
        let step = self
            .motion
            .step(anchor - self.avatar.root, hand.locked_normal(), &to_anchor, dt);

        match self.executor.apply(
            world,
            &mut self.avatar,
            step.displacement,
            dt,
            ExecutorMode::Direct,
        ) {
            Some(applied) => {
                self.grounded = applied.grounded;
                applied.delta
            }
            None => Vec3::zeros(),
        }
    }

    fn fall_step(&mut self, world: &dyn ClimbWorld, dt: f32) -> Vec3 {
        if !self.release.is_active() {
            self.grounded = self.probe_grounded(world, dt);
            return Vec3::zeros();
        }
        let step = self
            .release
            .tick(world, &mut self.avatar, &mut self.executor, dt);
        self.grounded = step.grounded;
        if let Some(impact) = step.impact {
            self.events.push(ClimbEvent::Landed(impact));
        }
        step.applied
    }

    fn mantle_step(&mut self, world: &dyn ClimbWorld, dt: f32) -> Vec3 {
        let step = self
            .mantle
            .tick(world, &mut self.avatar, &mut self.executor, dt);
        if step.finished {
            self.state = ClimbState::Idle;
            self.pending_reenable = true;
            self.events.push(ClimbEvent::MantleFinished);
        }
        self.grounded = self.probe_grounded(world, dt);
        step.applied
    }

    fn probe_grounded(&self, world: &dyn ClimbWorld, dt: f32) -> bool {
        world
            .move_capsule(&self.avatar.capsule_pose(), Vec3::zeros(), dt)
            .is_some_and(|s| s.grounded)
    }
}
