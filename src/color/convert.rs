use daltonlens_macros::simd_targets;

use super::consts::{
    LINEAR_RGB_FROM_LMS, LINEAR_RGB_FROM_XYZ, LMS_FROM_LINEAR_RGB, SRGB_DECODE_THRESHOLD,
    SRGB_ENCODE_THRESHOLD, SRGB_GAMMA, SRGB_LINEAR_SLOPE, SRGB_OFFSET, SRGB_SCALE,
    XYZ_FROM_LINEAR_RGB, mul_mat3,
};
use crate::{
    buffer::PixelBuffer,
    utils::{
        num::{saturate, u8_to_unorm, unorm_to_u8},
        pixel::{LinearRgb, Lms, Srgba8, Xyz},
    },
};

/// How 8 bit channels map to linear light.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transfer {
    /// `channel / 255` goes straight into the LMS matrix, no gamma curve.
    /// Matches the numeric output of the historical DaltonLens filters.
    #[default]
    Legacy,
    /// IEC 61966-2-1 piecewise sRGB curve on decode and encode.
    Srgb,
}

impl Transfer {
    pub const fn as_u32(self) -> u32 {
        match self {
            Transfer::Legacy => 0,
            Transfer::Srgb => 1,
        }
    }
}

/// sRGB electro-optical transfer, input clamped to [0, 1].
#[inline(always)]
pub fn srgb_to_linear(v: f32) -> f32 {
    let v = saturate(v);
    if v <= SRGB_DECODE_THRESHOLD {
        v / SRGB_LINEAR_SLOPE
    } else {
        ((v + SRGB_OFFSET) / SRGB_SCALE).powf(SRGB_GAMMA)
    }
}

#[inline(always)]
pub fn linear_to_srgb(v: f32) -> f32 {
    let v = saturate(v);
    if v <= SRGB_ENCODE_THRESHOLD {
        v * SRGB_LINEAR_SLOPE
    } else {
        SRGB_SCALE * v.powf(1.0 / SRGB_GAMMA) - SRGB_OFFSET
    }
}

#[inline(always)]
pub fn decode_srgb(p: Srgba8, transfer: Transfer) -> LinearRgb {
    let rgb = LinearRgb::new(u8_to_unorm(p.r), u8_to_unorm(p.g), u8_to_unorm(p.b));
    match transfer {
        Transfer::Legacy => rgb,
        Transfer::Srgb => LinearRgb::new(
            srgb_to_linear(rgb.r),
            srgb_to_linear(rgb.g),
            srgb_to_linear(rgb.b),
        ),
    }
}

/// Clamps, applies the transfer curve and rounds to the nearest level.
#[inline(always)]
pub fn encode_srgb(p: LinearRgb, alpha: u8, transfer: Transfer) -> Srgba8 {
    let encode = |v: f32| match transfer {
        Transfer::Legacy => unorm_to_u8(v),
        Transfer::Srgb => unorm_to_u8(linear_to_srgb(v)),
    };
    Srgba8::new(encode(p.r), encode(p.g), encode(p.b), alpha)
}

#[inline(always)]
pub fn lms_from_linear_rgb(p: LinearRgb) -> Lms {
    Lms::from_array(mul_mat3(&LMS_FROM_LINEAR_RGB, p.to_array()))
}

#[inline(always)]
pub fn linear_rgb_from_lms(p: Lms) -> LinearRgb {
    LinearRgb::from_array(mul_mat3(&LINEAR_RGB_FROM_LMS, p.to_array()))
}

#[inline(always)]
pub fn xyz_from_linear_rgb(p: LinearRgb) -> Xyz {
    Xyz::from_array(mul_mat3(&XYZ_FROM_LINEAR_RGB, p.to_array()))
}

#[inline(always)]
pub fn linear_rgb_from_xyz(p: Xyz) -> LinearRgb {
    LinearRgb::from_array(mul_mat3(&LINEAR_RGB_FROM_XYZ, p.to_array()))
}

#[simd_targets]
pub fn decode_srgb_row(input: &[Srgba8], output: &mut [LinearRgb], transfer: Transfer) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = decode_srgb(*src, transfer));
}

/// Alpha of the written pixels is opaque, callers restore it when needed.
#[simd_targets]
pub fn encode_srgb_row(input: &[LinearRgb], output: &mut [Srgba8], transfer: Transfer) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = encode_srgb(*src, u8::MAX, transfer));
}

#[simd_targets]
pub fn lms_row(input: &[LinearRgb], output: &mut [Lms]) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = lms_from_linear_rgb(*src));
}

#[simd_targets]
pub fn linear_rgb_row(input: &[Lms], output: &mut [LinearRgb]) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = linear_rgb_from_lms(*src));
}

/// Converts a whole image to LMS, `output` takes the input shape.
pub fn to_lms(input: &PixelBuffer<'_, LinearRgb>, output: &mut PixelBuffer<'_, Lms>) {
    output.ensure_shape(input.shape());
    output
        .rows_mut()
        .zip(input.rows())
        .for_each(|(dst, src)| lms_row(src, dst));
}

pub fn to_linear_rgb(input: &PixelBuffer<'_, Lms>, output: &mut PixelBuffer<'_, LinearRgb>) {
    output.ensure_shape(input.shape());
    output
        .rows_mut()
        .zip(input.rows())
        .for_each(|(dst, src)| linear_rgb_row(src, dst));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lms_round_trip_on_unit_cube() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for r in steps {
            for g in steps {
                for b in steps {
                    let rgb = LinearRgb::new(r, g, b);
                    let back = linear_rgb_from_lms(lms_from_linear_rgb(rgb));
                    assert!(
                        back.max_abs_diff(rgb) < 1e-3,
                        "{rgb:?} came back as {back:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_srgb_curve_known_values() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(0.5) - 0.21404).abs() < 1e-4);
        assert!((srgb_to_linear(0.04045) - 0.04045 / 12.92).abs() < 1e-7);
        assert!((linear_to_srgb(0.21404) - 0.5).abs() < 1e-4);
        assert_eq!(linear_to_srgb(-1.0), 0.0);
        assert!((linear_to_srgb(2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_round_trip_all_levels() {
        for transfer in [Transfer::Legacy, Transfer::Srgb] {
            for v in 0..=255u8 {
                let p = Srgba8::new(v, v, 255 - v, 17);
                assert_eq!(encode_srgb(decode_srgb(p, transfer), 17, transfer), p);
            }
        }
    }

    #[test]
    fn test_encode_clamps_out_of_gamut_and_nan() {
        let p = encode_srgb(LinearRgb::new(-0.3, 1.7, f32::NAN), 9, Transfer::Srgb);
        assert_eq!(p, Srgba8::new(0, 255, 0, 9));
    }

    #[test]
    fn test_non_finite_values_pass_matrix_conversion() {
        let lms = lms_from_linear_rgb(LinearRgb::new(f32::NAN, 0.0, 0.0));
        assert!(lms.l.is_nan());
        let lms = lms_from_linear_rgb(LinearRgb::new(f32::INFINITY, 0.0, 0.0));
        assert!(lms.l.is_infinite());
    }

    #[test]
    fn test_xyz_white_point() {
        let white = xyz_from_linear_rgb(LinearRgb::splat(1.0));
        assert!(white.max_abs_diff(Xyz::new(0.95047, 1.0, 1.08883)) < 1e-4);
        assert!(linear_rgb_from_xyz(white).max_abs_diff(LinearRgb::splat(1.0)) < 1e-4);
    }

    #[test]
    fn test_image_conversions_resize_output() {
        let input = PixelBuffer::from_fn(5, 3, |x, y| {
            LinearRgb::new(x as f32 / 4.0, y as f32 / 2.0, 0.5)
        });
        let mut lms = PixelBuffer::<Lms>::empty();
        let mut back = PixelBuffer::<LinearRgb>::new(1, 1);
        to_lms(&input, &mut lms);
        to_linear_rgb(&lms, &mut back);
        assert_eq!(back.shape(), (5, 3));
        input
            .to_vec()
            .iter()
            .zip(back.to_vec().iter())
            .for_each(|(a, b)| assert!(a.max_abs_diff(*b) < 1e-3));
    }
}
