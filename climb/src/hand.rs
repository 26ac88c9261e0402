//! Per-hand contact sensing, grip edges and anchor resolution.

use std::collections::BTreeSet;

use scene::{SurfaceId, SurfaceMask, Vec3};

use crate::{
    config::{AnchorStrategy, HandConfig},
    math::try_direction,
    world::ClimbWorld,
};

/// Identifier the caller assigns to a tracked hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandId(pub u8);

impl HandId {
    pub const LEFT: HandId = HandId(0);
    pub const RIGHT: HandId = HandId(1);
}

impl std::fmt::Display for HandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            HandId::LEFT => write!(f, "left"),
            HandId::RIGHT => write!(f, "right"),
            HandId(n) => write!(f, "hand#{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactEvent {
    Enter,
    Exit,
}

/// Edge produced when the grabbing flag changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GripEdge {
    Grabbed,
    Released,
}

/// Public contract the climb manager relies on, independent of how a hand
/// resolves its anchor.
pub trait Hand {
    fn has_contact(&self) -> bool;
    fn is_grabbing(&self) -> bool;
    /// World point the hand is locked onto (or the hand itself when unresolved).
    fn anchor(&self) -> Vec3;
    fn locked_normal(&self) -> Option<Vec3>;
    fn force_release(&mut self);
}

/// Counts climbable volumes overlapping the hand proxy.
#[derive(Clone, Debug, Default)]
pub struct ContactSensor {
    contacts: u32,
    touching: BTreeSet<SurfaceId>,
    raw_normal: Option<Vec3>,
}

impl ContactSensor {
    /// Apply one overlap event. Non-climbable volumes are ignored and the
    /// counter never drops below zero.
    pub fn update_contact(&mut self, event: ContactEvent, climbable: bool) {
        if !climbable {
            return;
        }
        match event {
            ContactEvent::Enter => self.contacts += 1,
            ContactEvent::Exit => self.contacts = self.contacts.saturating_sub(1),
        }
    }

    /// Derive enter/exit events from the climbable surfaces currently
    /// overlapping a sphere of `radius` at `position`, and sample the raw
    /// outward normal from the nearest one.
    pub fn sense(&mut self, world: &dyn ClimbWorld, position: &Vec3, radius: f32) {
        let hits = world.surfaces_near(position, radius, SurfaceMask::climbable());
        let now: BTreeSet<SurfaceId> = hits.hits.iter().map(|h| h.id).collect();

        let exits = self.touching.difference(&now).count();
        let enters = now.difference(&self.touching).count();
        for _ in 0..exits {
            self.update_contact(ContactEvent::Exit, true);
        }
        for _ in 0..enters {
            self.update_contact(ContactEvent::Enter, true);
        }
        self.touching = now;

        // A point inside the rock has no usable outward direction.
        if let Some(nearest) = hits.hits.first().filter(|h| !h.inside) {
            if let Some(n) = try_direction(&(position - nearest.point)) {
                self.raw_normal = Some(n);
            }
        }
    }

    pub fn contact_count(&self) -> u32 {
        self.contacts
    }

    pub fn has_contact(&self) -> bool {
        self.contacts > 0
    }

    /// Last outward normal sampled from a contact, if any was ever usable.
    pub fn raw_normal(&self) -> Option<Vec3> {
        self.raw_normal
    }

    pub fn clear(&mut self) {
        self.contacts = 0;
        self.touching.clear();
        self.raw_normal = None;
    }
}

/// Stable grab point and locked outward normal for one hand.
#[derive(Clone, Debug, Default)]
pub struct GrabAnchor {
    point: Option<Vec3>,
    normal: Option<Vec3>,
}

impl GrabAnchor {
    /// Re-resolve the anchor around `hand`.
    ///
    /// The closest point across every nearby climbable surface becomes the
    /// anchor and the anchor→hand direction the locked normal. An empty query
    /// or a hand sitting exactly on the surface keeps the previous normal;
    /// with no previous normal the hand's facing supplies one.
    pub fn resolve(
        &mut self,
        world: &dyn ClimbWorld,
        hand: &Vec3,
        forward: &Vec3,
        radius: f32,
        strategy: AnchorStrategy,
        sensed_normal: Option<Vec3>,
    ) {
        match strategy {
            AnchorStrategy::ClosestPoint => {
                let hits = world.surfaces_near(hand, radius, SurfaceMask::climbable());
                // Hits come back nearest first.
                if let Some(closest) = hits.hits.first() {
                    if closest.inside {
                        // Pushed into the rock: anchor on the hand, keep the normal.
                        self.point = Some(*hand);
                    } else {
                        self.point = Some(closest.point);
                        if let Some(n) = try_direction(&(hand - closest.point)) {
                            self.normal = Some(n);
                        }
                    }
                }
            }
            AnchorStrategy::HandPosition => {
                self.point = Some(*hand);
                if let Some(n) = sensed_normal {
                    self.normal = Some(n);
                }
            }
        }

        if self.normal.is_none() {
            self.normal = try_direction(&-forward);
        }
    }

    pub fn point(&self) -> Option<Vec3> {
        self.point
    }

    pub fn normal(&self) -> Option<Vec3> {
        self.normal
    }

    pub fn clear(&mut self) {
        self.point = None;
        self.normal = None;
    }
}

/// Per-tick tracking sample for one hand.
#[derive(Clone, Copy, Debug)]
pub struct HandInput {
    pub id: HandId,
    /// Hand position relative to the avatar root (tracking space).
    pub local_position: Vec3,
    /// Direction the palm faces, world-aligned.
    pub forward: Vec3,
    /// Grip intensity 0..1.
    pub grip: f32,
}

impl HandInput {
    pub fn new(id: HandId, local_position: Vec3, grip: f32) -> Self {
        Self {
            id,
            local_position,
            forward: Vec3::z(),
            grip,
        }
    }
}

/// Contact sensor + grab anchor behind the [`Hand`] contract.
#[derive(Clone, Debug)]
pub struct HandState {
    id: HandId,
    config: HandConfig,
    sensor: ContactSensor,
    anchor: GrabAnchor,
    position: Vec3,
    forward: Vec3,
    grip: f32,
    grabbing: bool,
}

impl HandState {
    pub fn new(id: HandId, config: HandConfig) -> Self {
        Self {
            id,
            config,
            sensor: ContactSensor::default(),
            anchor: GrabAnchor::default(),
            position: Vec3::zeros(),
            forward: Vec3::z(),
            grip: 0.0,
            grabbing: false,
        }
    }

    pub fn id(&self) -> HandId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn grip(&self) -> f32 {
        self.grip
    }

    pub fn contact_count(&self) -> u32 {
        self.sensor.contact_count()
    }

    /// Track the hand's world pose for this tick.
    pub fn set_pose(&mut self, position: Vec3, forward: Vec3) {
        self.position = position;
        self.forward = forward;
    }

    /// Apply one overlap event. Losing the last contact while grabbing
    /// releases immediately so grabbing never outlives contact.
    pub fn update_contact(&mut self, event: ContactEvent, climbable: bool) -> Option<GripEdge> {
        self.sensor.update_contact(event, climbable);
        self.drop_grab_without_contact()
    }

    /// Refresh contacts from the world at the current pose.
    pub fn sense(&mut self, world: &dyn ClimbWorld) -> Option<GripEdge> {
        self.sensor
            .sense(world, &self.position, self.config.contact_radius);
        self.drop_grab_without_contact()
    }

    fn drop_grab_without_contact(&mut self) -> Option<GripEdge> {
        if self.grabbing && !self.sensor.has_contact() {
            self.grabbing = false;
            return Some(GripEdge::Released);
        }
        None
    }

    /// Recompute the grabbing flag from this tick's grip.
    ///
    /// Grabbing holds iff the grip reaches the threshold, something climbable
    /// is touched and stamina is not exhausted. While grabbing, the anchor is
    /// re-resolved every call.
    pub fn update_grip(
        &mut self,
        world: &dyn ClimbWorld,
        press: f32,
        exhausted: bool,
    ) -> Option<GripEdge> {
        self.grip = press.clamp(0.0, 1.0);
        let should_grab =
            self.grip >= self.config.press_threshold && self.sensor.has_contact() && !exhausted;

        let edge = match (self.grabbing, should_grab) {
            (false, true) => Some(GripEdge::Grabbed),
            (true, false) => Some(GripEdge::Released),
            _ => None,
        };
        self.grabbing = should_grab;

        if self.grabbing {
            self.anchor.resolve(
                world,
                &self.position,
                &self.forward,
                self.config.anchor_probe_radius,
                self.config.anchor_strategy,
                self.sensor.raw_normal(),
            );
        }
        edge
    }
}

impl Hand for HandState {
    fn has_contact(&self) -> bool {
        self.sensor.has_contact()
    }

    fn is_grabbing(&self) -> bool {
        self.grabbing
    }

    fn anchor(&self) -> Vec3 {
        self.anchor.point().unwrap_or(self.position)
    }

    fn locked_normal(&self) -> Option<Vec3> {
        self.anchor.normal()
    }

    fn force_release(&mut self) {
        self.grabbing = false;
        self.anchor.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubWorld;

    fn hand() -> HandState {
        HandState::new(HandId::LEFT, HandConfig::default())
    }

    #[test]
    fn contact_counter_never_goes_negative() {
        let mut sensor = ContactSensor::default();
        let events = [
            (ContactEvent::Exit, true),
            (ContactEvent::Enter, true),
            (ContactEvent::Enter, false),
            (ContactEvent::Exit, true),
            (ContactEvent::Exit, true),
            (ContactEvent::Enter, true),
            (ContactEvent::Enter, true),
            (ContactEvent::Exit, false),
            (ContactEvent::Exit, true),
        ];
        let mut expected: i32 = 0;
        for (event, climbable) in events {
            sensor.update_contact(event, climbable);
            if climbable {
                expected = match event {
                    ContactEvent::Enter => expected + 1,
                    ContactEvent::Exit => (expected - 1).max(0),
                };
            }
            assert_eq!(sensor.contact_count() as i32, expected);
            assert_eq!(sensor.has_contact(), sensor.contact_count() > 0);
        }
    }

    #[test]
    fn grabbing_requires_contact_grip_and_energy() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.97, 1.5, 0.0), Vec3::x());

        // No contact yet.
        assert_eq!(hand.update_grip(&world, 1.0, false), None);
        assert!(!hand.is_grabbing());

        hand.update_contact(ContactEvent::Enter, true);
        // Below threshold.
        assert_eq!(hand.update_grip(&world, 0.5, false), None);
        assert!(!hand.is_grabbing());
        // Exhausted.
        assert_eq!(hand.update_grip(&world, 0.9, true), None);
        assert!(!hand.is_grabbing());
        // All three conditions.
        assert_eq!(hand.update_grip(&world, 0.6, false), Some(GripEdge::Grabbed));
        assert!(hand.is_grabbing());
        // Letting go fires the released edge once.
        assert_eq!(hand.update_grip(&world, 0.1, false), Some(GripEdge::Released));
        assert_eq!(hand.update_grip(&world, 0.1, false), None);
    }

    #[test]
    fn losing_last_contact_releases_immediately() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.97, 1.5, 0.0), Vec3::x());
        hand.update_contact(ContactEvent::Enter, true);
        hand.update_grip(&world, 1.0, false);
        assert_eq!(
            hand.update_contact(ContactEvent::Exit, true),
            Some(GripEdge::Released)
        );
        assert!(!hand.is_grabbing());
        assert!(!hand.has_contact());
    }

    #[test]
    fn anchor_locks_closest_point_and_outward_normal() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.95, 1.5, 0.2), Vec3::x());
        assert_eq!(hand.sense(&world), None);
        assert!(hand.has_contact());
        hand.update_grip(&world, 1.0, false);

        assert!((hand.anchor() - Vec3::new(1.0, 1.5, 0.2)).norm() < 1.0e-5);
        let n = hand.locked_normal().unwrap();
        assert!((n - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn hand_on_the_surface_keeps_last_normal() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.95, 1.5, 0.0), Vec3::x());
        hand.sense(&world);
        hand.update_grip(&world, 1.0, false);
        let before = hand.locked_normal().unwrap();

        // Exactly on the face: anchor→hand is degenerate.
        hand.set_pose(Vec3::new(1.0, 1.4, 0.0), Vec3::x());
        hand.update_grip(&world, 1.0, false);
        assert!((hand.anchor() - Vec3::new(1.0, 1.4, 0.0)).norm() < 1.0e-5);
        assert_eq!(hand.locked_normal(), Some(before));
    }

    #[test]
    fn empty_query_falls_back_to_facing() {
        let world = StubWorld::empty();
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.0, 1.5, 0.0), Vec3::z());
        hand.update_contact(ContactEvent::Enter, true);
        hand.update_grip(&world, 1.0, false);
        assert!(hand.is_grabbing());
        assert_eq!(hand.locked_normal(), Some(-Vec3::z()));
        // Anchor falls back to the hand itself.
        assert_eq!(hand.anchor(), Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn force_release_clears_grab_and_normal() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.95, 1.5, 0.0), Vec3::x());
        hand.sense(&world);
        hand.update_grip(&world, 1.0, false);
        assert!(hand.locked_normal().is_some());

        hand.force_release();
        assert!(!hand.is_grabbing());
        assert_eq!(hand.locked_normal(), None);
        assert!(hand.has_contact());
    }

    #[test]
    fn hand_pushed_into_the_rock_keeps_its_outward_normal() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = hand();
        hand.set_pose(Vec3::new(0.97, 1.5, 0.0), Vec3::x());
        hand.sense(&world);
        hand.update_grip(&world, 1.0, false);

        hand.set_pose(Vec3::new(1.03, 1.5, 0.0), Vec3::x());
        assert_eq!(hand.sense(&world), None);
        assert_eq!(hand.update_grip(&world, 1.0, false), None);
        let n = hand.locked_normal().unwrap();
        assert!((n + Vec3::x()).norm() < 1.0e-5, "{n:?}");
        assert_eq!(hand.anchor(), Vec3::new(1.03, 1.5, 0.0));
    }

    #[test]
    fn sensing_counts_each_overlapping_surface() {
        let world = StubWorld::wall_facing_neg_x(1.0).with_climbable_top(1.0);
        let mut hand = hand();

        // In the corner between the wall and the ledge top.
        hand.set_pose(Vec3::new(0.97, 1.03, 0.0), Vec3::x());
        hand.sense(&world);
        assert_eq!(hand.contact_count(), 2);

        hand.set_pose(Vec3::new(0.97, 1.5, 0.0), Vec3::x());
        hand.sense(&world);
        assert_eq!(hand.contact_count(), 1);

        // Same tick twice does not double count.
        hand.sense(&world);
        assert_eq!(hand.contact_count(), 1);

        hand.set_pose(Vec3::new(0.5, 1.5, 0.0), Vec3::x());
        hand.sense(&world);
        assert_eq!(hand.contact_count(), 0);
        assert!(!hand.has_contact());
    }

    #[test]
    fn hand_position_strategy_uses_sensed_normal() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut hand = HandState::new(
            HandId::RIGHT,
            HandConfig {
                anchor_strategy: AnchorStrategy::HandPosition,
                ..HandConfig::default()
            },
        );
        hand.set_pose(Vec3::new(0.96, 1.0, 0.0), Vec3::x());
        hand.sense(&world);
        hand.update_grip(&world, 1.0, false);
        assert_eq!(hand.anchor(), Vec3::new(0.96, 1.0, 0.0));
        assert!((hand.locked_normal().unwrap() + Vec3::x()).norm() < 1.0e-5);
    }
}
