pub mod constants;
pub mod mover;
pub mod query_world;
pub mod rapier;
pub mod surface;
pub mod types;

// Re-export Rapier so downstream crates can build definitions without
// depending on `rapier3d` directly.
pub use rapier3d;

pub use constants::{GRAVITY_MPS2, MAX_QUERY_HITS, TERMINAL_FALL_SPEED_MPS};
pub use mover::CapsuleMover;
pub use query_world::QueryWorld;
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
pub use surface::{Surface, SurfaceMask};
pub use types::{
    CapsulePose, CapsuleSpec, Iso, Penetration, Quat, QueryHits, SurfaceHit, SurfaceId, Sweep,
    Vec3,
};
