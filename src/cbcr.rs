//! Chroma switching filters in an orthonormal opponent space.
//!
//! Luminance is kept and the red-green axis is moved onto the blue-yellow
//! axis, which dichromats on the red-green confusion line still perceive.

use daltonlens_macros::simd_targets;

use crate::{
    buffer::PixelBuffer,
    color::consts::{LINEAR_RGB_FROM_YCRCB, YCRCB_FROM_LINEAR_RGB, mul_mat3},
    utils::pixel::LinearRgb,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CbCrSwitch {
    /// Swap `cb` and `cr`.
    Switch,
    /// Swap, then negate the new `cb`.
    SwitchAndFlip,
}

/// Returns `[y, cr, cb]`.
#[inline(always)]
pub fn ycrcb_from_linear_rgb(p: LinearRgb) -> [f32; 3] {
    mul_mat3(&YCRCB_FROM_LINEAR_RGB, p.to_array())
}

#[inline(always)]
pub fn linear_rgb_from_ycrcb(ycrcb: [f32; 3]) -> LinearRgb {
    LinearRgb::from_array(mul_mat3(&LINEAR_RGB_FROM_YCRCB, ycrcb))
}

/// Result is unclamped, encoding clamps it.
#[inline(always)]
pub fn switch_pixel(p: LinearRgb, switch: CbCrSwitch) -> LinearRgb {
    let [y, cr, cb] = ycrcb_from_linear_rgb(p);
    let (cr, cb) = match switch {
        CbCrSwitch::Switch => (cb, cr),
        CbCrSwitch::SwitchAndFlip => (cb, -cr),
    };
    linear_rgb_from_ycrcb([y, cr, cb])
}

#[simd_targets]
pub fn switch_row(input: &[LinearRgb], output: &mut [LinearRgb], switch: CbCrSwitch) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = switch_pixel(*src, switch));
}

pub fn switch_cbcr(image: &mut PixelBuffer<'_, LinearRgb>, switch: CbCrSwitch) {
    image
        .rows_mut()
        .for_each(|row| row.iter_mut().for_each(|p| *p = switch_pixel(*p, switch)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_is_untouched() {
        for switch in [CbCrSwitch::Switch, CbCrSwitch::SwitchAndFlip] {
            for v in [0.0, 0.25, 0.5, 1.0] {
                let out = switch_pixel(LinearRgb::splat(v), switch);
                assert!(out.max_abs_diff(LinearRgb::splat(v)) < 1e-5, "{out:?}");
            }
        }
    }

    #[test]
    fn test_switch_moves_red_green_to_blue_yellow() {
        let red = LinearRgb::new(0.6, 0.2, 0.4);
        let [y, cr, cb] = ycrcb_from_linear_rgb(red);
        let [y2, cr2, cb2] = ycrcb_from_linear_rgb(switch_pixel(red, CbCrSwitch::Switch));
        assert!((y - y2).abs() < 1e-5);
        assert!((cr2 - cb).abs() < 1e-5);
        assert!((cb2 - cr).abs() < 1e-5);

        let [_, cr3, cb3] = ycrcb_from_linear_rgb(switch_pixel(red, CbCrSwitch::SwitchAndFlip));
        assert!((cr3 - cb).abs() < 1e-5);
        assert!((cb3 + cr).abs() < 1e-5);
    }

    #[test]
    fn test_switch_twice_is_identity() {
        let p = LinearRgb::new(0.1, 0.7, 0.3);
        let twice = switch_pixel(switch_pixel(p, CbCrSwitch::Switch), CbCrSwitch::Switch);
        assert!(twice.max_abs_diff(p) < 1e-5);
    }

    #[test]
    fn test_image_switch_matches_pixel() {
        let mut image = PixelBuffer::from_fn(4, 2, |x, y| {
            LinearRgb::new(x as f32 / 3.0, y as f32, 0.5)
        });
        let expected: Vec<LinearRgb> = image
            .to_vec()
            .into_iter()
            .map(|p| switch_pixel(p, CbCrSwitch::SwitchAndFlip))
            .collect();
        switch_cbcr(&mut image, CbCrSwitch::SwitchAndFlip);
        assert_eq!(image.to_vec(), expected);
    }
}
