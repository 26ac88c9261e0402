use std::{cell::Cell, rc::Rc};

/// Shared switch for the avatar's ordinary locomotion (walking, turning,
/// gravity). Locomotion is enabled while no [`LocomotionLock`] is alive.
///
/// Clones share the same state; hand one to each system that must stand down
/// during a climb.
#[derive(Clone, Debug, Default)]
pub struct LocomotionGate {
    locks: Rc<Cell<u32>>,
}

impl LocomotionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.locks.get() == 0
    }

    /// Disable locomotion until the returned guard is dropped.
    #[must_use = "locomotion is re-enabled as soon as the lock is dropped"]
    pub fn lock(&self) -> LocomotionLock {
        self.locks.set(self.locks.get() + 1);
        LocomotionLock {
            locks: Rc::clone(&self.locks),
        }
    }
}

/// Scope during which upstream locomotion is disabled.
#[derive(Debug)]
pub struct LocomotionLock {
    locks: Rc<Cell<u32>>,
}

impl Drop for LocomotionLock {
    fn drop(&mut self) {
        self.locks.set(self.locks.get().saturating_sub(1));
    }
}
