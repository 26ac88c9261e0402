use nalgebra::Unit;
use scene::Vec3;

/// Below this length a direction is considered degenerate.
pub const DIR_EPS: f32 = 1.0e-6;

/// World up (+Y).
#[inline]
pub fn up() -> Vec3 {
    Vec3::y()
}

/// Frame-rate independent blend factor for a first-order filter running at
/// `rate` (1/s) over `dt`.
#[inline]
pub fn exp_blend(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 {
        return 1.0;
    }
    1.0 - (-rate * dt.max(0.0)).exp()
}

/// Same as [`exp_blend`] but parameterized by a time constant. A zero time
/// constant passes the input straight through.
#[inline]
pub fn time_constant_blend(tau: f32, dt: f32) -> f32 {
    if tau <= 0.0 {
        return 1.0;
    }
    1.0 - (-dt.max(0.0) / tau).exp()
}

/// Remove the component of `v` along unit `n`.
#[inline]
pub fn project_on_plane(v: &Vec3, n: &Vec3) -> Vec3 {
    v - n * v.dot(n)
}

/// Scale `v` down so its length does not exceed `max_len`.
#[inline]
pub fn clamp_length(v: Vec3, max_len: f32) -> Vec3 {
    let len = v.norm();
    if len > max_len && len > 0.0 {
        v * (max_len.max(0.0) / len)
    } else {
        v
    }
}

/// Normalize `v`, or `None` when it is too short to carry a direction.
#[inline]
pub fn try_direction(v: &Vec3) -> Option<Vec3> {
    v.try_normalize(DIR_EPS)
}

/// Spherical interpolation between two unit directions.
///
/// Antipodal inputs have no unique great circle; the target wins outright.
pub fn slerp_direction(from: &Vec3, to: &Vec3, t: f32) -> Vec3 {
    let (Some(a), Some(b)) = (Unit::try_new(*from, DIR_EPS), Unit::try_new(*to, DIR_EPS)) else {
        return *to;
    };
    a.try_slerp(&b, t.clamp(0.0, 1.0), DIR_EPS)
        .map(Unit::into_inner)
        .unwrap_or_else(|| b.into_inner())
}

/// Classic smoothstep easing on `[0, 1]`.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_factors_stay_in_unit_range() {
        assert_eq!(exp_blend(0.0, 0.1), 1.0);
        assert_eq!(time_constant_blend(0.0, 0.1), 1.0);
        let a = time_constant_blend(0.01, 1.0 / 72.0);
        assert!(a > 0.7 && a < 0.8);
        assert_eq!(exp_blend(10.0, 0.0), 0.0);
    }

    #[test]
    fn slerp_halfway_between_axes() {
        let mid = slerp_direction(&Vec3::x(), &Vec3::z(), 0.5);
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((mid - expected).norm() < 1.0e-5);
    }

    #[test]
    fn slerp_of_opposites_snaps_to_target() {
        let out = slerp_direction(&Vec3::x(), &-Vec3::x(), 0.3);
        assert!((out + Vec3::x()).norm() < 1.0e-6);
    }

    #[test]
    fn clamp_length_preserves_direction() {
        let v = clamp_length(Vec3::new(3.0, 4.0, 0.0), 1.0);
        assert!((v - Vec3::new(0.6, 0.8, 0.0)).norm() < 1.0e-6);
        assert_eq!(clamp_length(Vec3::new(0.1, 0.0, 0.0), 1.0), Vec3::new(0.1, 0.0, 0.0));
    }
}
