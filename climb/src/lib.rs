//! Hand-anchored climbing locomotion for a room-scale avatar.
//!
//! Tracked hands grab climbable surfaces; the [`ClimbManager`] turns their
//! motion into collision-aware body motion through a [`ClimbWorld`], keeps the
//! body capsule sized and out of walls, and gates it all on stamina.

pub mod avatar;
pub mod capsule;
pub mod config;
pub mod executor;
pub mod hand;
pub mod locomotion;
pub mod mantle;
pub mod manager;
pub mod math;
pub mod motion;
pub mod penetration;
pub mod registry;
pub mod release;
pub mod stamina;
pub mod world;

#[cfg(test)]
mod testing;

pub use avatar::{Avatar, BodyCapsule};
pub use config::{AnchorStrategy, ClimbConfig, ComplianceMode, ConfigError};
pub use hand::{ContactEvent, GripEdge, Hand, HandId, HandInput, HandState};
pub use locomotion::{LocomotionGate, LocomotionLock};
pub use manager::{ClimbEvent, ClimbManager, ClimbState, TickInput, TickReport};
pub use mantle::MantleTarget;
pub use release::FallImpact;
pub use stamina::{EnergyPool, StaminaResource};
pub use world::{ClimbWorld, SceneWorld};
