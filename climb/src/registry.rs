use crate::{
    config::HandConfig,
    hand::{Hand, HandId, HandState},
};

/// Hands currently known to the manager, in registration order.
#[derive(Clone, Debug, Default)]
pub struct HandRegistry {
    hands: Vec<HandState>,
}

impl HandRegistry {
    /// Add a hand. Registering an id twice is a no-op that returns `false`.
    pub fn register(&mut self, id: HandId, config: HandConfig) -> bool {
        if self.contains(id) {
            return false;
        }
        self.hands.push(HandState::new(id, config));
        true
    }

    /// Remove a hand, returning its last state. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: HandId) -> Option<HandState> {
        let index = self.hands.iter().position(|h| h.id() == id)?;
        Some(self.hands.remove(index))
    }

    pub fn contains(&self, id: HandId) -> bool {
        self.hands.iter().any(|h| h.id() == id)
    }

    pub fn get(&self, id: HandId) -> Option<&HandState> {
        self.hands.iter().find(|h| h.id() == id)
    }

    pub fn get_mut(&mut self, id: HandId) -> Option<&mut HandState> {
        self.hands.iter_mut().find(|h| h.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandState> {
        self.hands.iter()
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// First hand other than `excluding` that is grabbing with contact.
    pub fn fallback(&self, excluding: HandId) -> Option<HandId> {
        self.hands
            .iter()
            .find(|h| h.id() != excluding && h.is_grabbing() && h.has_contact())
            .map(HandState::id)
    }

    /// Whether any hand is gripping a surface right now.
    pub fn any_gripping(&self) -> bool {
        self.hands.iter().any(|h| h.is_grabbing() && h.has_contact())
    }

    /// Force-release every grabbing hand, returning the ids that let go.
    pub fn release_all(&mut self) -> Vec<HandId> {
        self.hands
            .iter_mut()
            .filter_map(|h| {
                let was_grabbing = h.is_grabbing();
                h.force_release();
                was_grabbing.then_some(h.id())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::Vec3;

    use crate::{hand::ContactEvent, testing::StubWorld};

    #[test]
    fn registration_is_idempotent() {
        let mut registry = HandRegistry::default();
        assert!(registry.register(HandId::LEFT, HandConfig::default()));
        assert!(!registry.register(HandId::LEFT, HandConfig::default()));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(HandId::RIGHT).is_none());
        assert!(registry.unregister(HandId::LEFT).is_some());
        assert!(registry.unregister(HandId::LEFT).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn fallback_skips_excluded_and_idle_hands() {
        let world = StubWorld::wall_facing_neg_x(1.0);
        let mut registry = HandRegistry::default();
        for id in [HandId::LEFT, HandId::RIGHT, HandId(2)] {
            registry.register(id, HandConfig::default());
        }
        for id in [HandId::LEFT, HandId(2)] {
            let hand = registry.get_mut(id).unwrap();
            hand.set_pose(Vec3::new(0.97, 1.5, 0.0), Vec3::x());
            hand.update_contact(ContactEvent::Enter, true);
            hand.update_grip(&world, 1.0, false);
        }

        assert_eq!(registry.fallback(HandId::LEFT), Some(HandId(2)));
        assert_eq!(registry.fallback(HandId(2)), Some(HandId::LEFT));
        assert!(registry.any_gripping());

        let released = registry.release_all();
        assert_eq!(released, vec![HandId::LEFT, HandId(2)]);
        assert_eq!(registry.fallback(HandId::RIGHT), None);
        assert!(!registry.any_gripping());
    }
}
