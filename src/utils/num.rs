use num_traits::Float;

/// Clamps to [0, 1].
///
/// NaN maps to 0: `Float::max` returns the non-NaN operand.
#[inline(always)]
pub fn saturate<F: Float>(v: F) -> F {
    v.max(F::zero()).min(F::one())
}

/// `(1 - t) * a + t * b`, same operand order as GLSL/WGSL `mix`.
#[inline(always)]
pub fn lerp<F: Float>(a: F, b: F, t: F) -> F {
    (F::one() - t) * a + t * b
}

/// Converts a unit float to an 8 bit channel, clamping and rounding to nearest.
#[inline(always)]
pub fn unorm_to_u8(v: f32) -> u8 {
    (saturate(v) * 255.0).round() as u8
}

#[inline(always)]
pub fn u8_to_unorm(v: u8) -> f32 {
    v as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate_bounds() {
        assert_eq!(saturate(-0.5f32), 0.0);
        assert_eq!(saturate(1.5f32), 1.0);
        assert_eq!(saturate(0.25f64), 0.25);
        assert_eq!(saturate(f32::NAN), 0.0);
        assert_eq!(saturate(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0f32, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0f32, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0f32, 6.0, 0.5), 4.0);
    }

    #[test]
    fn test_unorm_round_trip_all_levels() {
        for v in 0..=255u8 {
            assert_eq!(unorm_to_u8(u8_to_unorm(v)), v);
        }
    }

    #[test]
    fn test_unorm_to_u8_clamps_and_rounds() {
        assert_eq!(unorm_to_u8(-3.0), 0);
        assert_eq!(unorm_to_u8(7.0), 255);
        assert_eq!(unorm_to_u8(0.5 / 255.0 + 1e-4), 1);
        assert_eq!(unorm_to_u8(f32::NAN), 0);
    }
}
