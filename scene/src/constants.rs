/*!
Query-world tolerances and physical constants.

These are properties of the simulation rather than per-avatar tuning, which
lives in the climbing controller's configuration.

Notes
- Distances are in meters, time in seconds.
- Favor practical world-space tolerances over machine epsilon.
*/

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Terminal fall speed (meters per second, negative = downward).
pub const TERMINAL_FALL_SPEED_MPS: f32 = -30.0;

/// Maximum number of results a single proximity/overlap query returns.
/// More candidates than this mark the result as overflowed.
pub const MAX_QUERY_HITS: usize = 16;

/// Gap the capsule mover keeps from surfaces, relative to the capsule size.
/// Too large creates visible gaps; too small risks jitter on contact.
pub const MOVER_OFFSET_RELATIVE: f32 = 0.01;

/// Minimum squared movement worth sweeping (m^2).
pub const MIN_MOVE_SQ: f32 = 1.0e-10;
