//! Climbing controller tuning, loadable from TOML.
//!
//! Every section has a `Default` holding the shipped tuning, so a config file
//! only needs the values it overrides:
//!
//! ```toml
//! [motion]
//! climb_strength = 1.5
//! compliance = "uphill_only"
//!
//! [stamina]
//! regen_requires_grounded = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How the normal-aligned part of a climb displacement is let through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceMode {
    /// Strict plane projection: nothing along the normal survives.
    Off,
    /// Both toward and away from the surface, scaled by how horizontal it is.
    #[default]
    Symmetric,
    /// Only the part that lifts the body (positive world-up), for rolling
    /// over ledges without ever pulling the body down into a shelf.
    UphillOnly,
}

/// How a grabbing hand resolves its anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// Closest point on nearby climbable geometry.
    #[default]
    ClosestPoint,
    /// The hand position itself; the normal comes from the contact sensor.
    HandPosition,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Grip intensity (0..1) at or above which a hand grabs.
    pub press_threshold: f32,
    /// Radius of the hand proxy used for contact sensing (meters).
    pub contact_radius: f32,
    /// Search radius for the grab anchor query (meters).
    pub anchor_probe_radius: f32,
    pub anchor_strategy: AnchorStrategy,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            press_threshold: 0.6,
            contact_radius: 0.06,
            anchor_probe_radius: 0.15,
            anchor_strategy: AnchorStrategy::ClosestPoint,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Body displacement per meter of hand displacement.
    pub climb_strength: f32,
    /// Hard cap on body speed while climbing (m/s).
    pub max_climb_speed: f32,
    /// Raw hand deltas shorter than this are treated as zero (meters).
    pub deadzone: f32,
    /// Time constant of the jitter low-pass (seconds). Zero disables it.
    pub jitter_time_constant: f32,
    /// Rate at which the smoothed wall normal follows the hand's normal (1/s).
    pub normal_smoothing: f32,
    /// Fraction of the normal-aligned displacement allowed on flat tops.
    pub normal_compliance: f32,
    pub compliance: ComplianceMode,
    /// Below this projected speed a corner slide takes over (m/s).
    pub min_slide_speed: f32,
    /// Corner slide length as a fraction of the blocked candidate.
    pub corner_slide_ratio: f32,
    /// Longest tick the controller integrates in one go (seconds).
    pub max_dt: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            climb_strength: 2.0,
            max_climb_speed: 4.0,
            deadzone: 0.0005,
            jitter_time_constant: 0.01,
            normal_smoothing: 12.0,
            normal_compliance: 0.25,
            compliance: ComplianceMode::Symmetric,
            min_slide_speed: 0.05,
            corner_slide_ratio: 0.5,
            max_dt: 0.125,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    /// Energy drained per second while any hand grips (units/s).
    pub drain_per_second: f32,
    /// Energy regenerated per second otherwise (units/s).
    pub regen_per_second: f32,
    /// Exhaustion clears once energy climbs back to this level.
    pub recover_threshold: f32,
    /// Only regenerate while standing on ground.
    pub regen_requires_grounded: bool,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            drain_per_second: 8.0,
            regen_per_second: 15.0,
            recover_threshold: 25.0,
            regen_requires_grounded: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    /// Resting body radius (meters).
    pub rest_radius: f32,
    /// Resting body height used until head tracking reports otherwise.
    pub rest_height: f32,
    /// Resting height follows the head, clamped to `[min_height, max_height]`.
    pub follow_head: bool,
    pub min_height: f32,
    pub max_height: f32,
    /// Climbing body shape.
    pub climb_radius: f32,
    pub climb_height: f32,
    /// Gap between the top of the climbing capsule and the head (meters).
    pub head_clearance: f32,
    /// Blend speed toward the climbing shape (1/s).
    pub shrink_rate: f32,
    /// Blend speed back toward the resting shape (1/s).
    pub expand_rate: f32,
    /// Hold after leaving the climb before expansion starts (seconds).
    pub expand_delay: f32,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            rest_radius: 0.25,
            rest_height: 1.7,
            follow_head: true,
            min_height: 1.0,
            max_height: 2.0,
            climb_radius: 0.18,
            climb_height: 0.7,
            head_clearance: 0.05,
            shrink_rate: 6.0,
            expand_rate: 2.5,
            expand_delay: 0.2,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PenetrationConfig {
    /// Resolve passes per tick.
    pub iterations: u32,
    /// Total push budget per tick (meters).
    pub max_push_per_tick: f32,
    /// Extra separation added to every push (meters).
    pub skin: f32,
    /// Flatten pushes onto the horizontal plane.
    pub horizontal_only: bool,
}

impl Default for PenetrationConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            max_push_per_tick: 0.05,
            skin: 0.001,
            horizontal_only: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Length of the gravity-driven fall after letting go (seconds).
    pub window: f32,
    pub gravity: f32,
    /// Applied-delta smoothing rate during the fall (1/s).
    pub smoothing: f32,
    /// Landing faster than this hurts (m/s).
    pub safe_impact_speed: f32,
    /// Landing at or above this deals `max_damage` (m/s).
    pub lethal_impact_speed: f32,
    pub max_damage: f32,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            window: 0.35,
            gravity: scene::GRAVITY_MPS2,
            smoothing: 20.0,
            safe_impact_speed: 6.5,
            lethal_impact_speed: 14.0,
            max_damage: 80.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MantleConfig {
    /// Time to reach the stand point (seconds).
    pub duration: f32,
    /// Radius around the head used to detect mantle zones (meters).
    pub probe_radius: f32,
    /// Applied-delta smoothing rate during the mantle (1/s).
    pub smoothing: f32,
}

impl Default for MantleConfig {
    fn default() -> Self {
        Self {
            duration: 0.6,
            probe_radius: 0.15,
            smoothing: 30.0,
        }
    }
}

/// Full controller configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClimbConfig {
    pub hand: HandConfig,
    pub motion: MotionConfig,
    pub stamina: StaminaConfig,
    pub capsule: CapsuleConfig,
    pub penetration: PenetrationConfig,
    pub release: ReleaseConfig,
    pub mantle: MantleConfig,
}

impl ClimbConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(bool, &str); 12] = [
            (
                (0.0..=1.0).contains(&self.hand.press_threshold),
                "hand.press_threshold must be within 0..=1",
            ),
            (self.hand.contact_radius > 0.0, "hand.contact_radius must be positive"),
            (
                self.hand.anchor_probe_radius > 0.0,
                "hand.anchor_probe_radius must be positive",
            ),
            (self.motion.max_climb_speed > 0.0, "motion.max_climb_speed must be positive"),
            (
                self.motion.jitter_time_constant >= 0.0,
                "motion.jitter_time_constant must not be negative",
            ),
            (self.motion.max_dt > 0.0, "motion.max_dt must be positive"),
            (
                self.stamina.recover_threshold > 0.0,
                "stamina.recover_threshold must be above zero",
            ),
            (
                self.capsule.climb_radius > 0.0 && self.capsule.rest_radius > 0.0,
                "capsule radii must be positive",
            ),
            (
                self.capsule.min_height <= self.capsule.max_height,
                "capsule.min_height must not exceed capsule.max_height",
            ),
            (
                self.capsule.shrink_rate > 0.0 && self.capsule.expand_rate > 0.0,
                "capsule blend rates must be positive",
            ),
            (
                self.release.lethal_impact_speed > self.release.safe_impact_speed,
                "release.lethal_impact_speed must exceed release.safe_impact_speed",
            ),
            (self.mantle.duration > 0.0, "mantle.duration must be positive"),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(ConfigError::Invalid(message.to_string())),
            None => Ok(()),
        }
    }
}

/// Errors that can occur when loading controller configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) if path.as_os_str().is_empty() => {
                write!(f, "Failed to parse climb config: {e}")
            }
            ConfigError::Parse(path, e) => write!(f, "Failed to parse {}: {}", path.display(), e),
            ConfigError::Invalid(message) => write!(f, "Invalid climb config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
