//! Fidaner error-injection: what the dichromat loses is pushed into the
//! channels they still perceive.

use daltonlens_macros::simd_targets;
use itertools::izip;

use crate::{
    buffer::PixelBuffer,
    color::consts::{DALTONIZE_RED_SHIFT, DALTONIZE_SELF_SHIFT},
    utils::{num::saturate, pixel::LinearRgb},
};

/// `original - simulated`.
#[inline(always)]
pub fn perceptual_error(original: LinearRgb, simulated: LinearRgb) -> LinearRgb {
    original - simulated
}

/// Red stays, green and blue receive the red error plus their own, clamped
/// to [0, 1].
#[inline(always)]
pub fn daltonize_pixel(original: LinearRgb, simulated: LinearRgb) -> LinearRgb {
    let e = perceptual_error(original, simulated);
    LinearRgb::new(
        saturate(original.r),
        saturate(original.g + DALTONIZE_RED_SHIFT * e.r + DALTONIZE_SELF_SHIFT * e.g),
        saturate(original.b + DALTONIZE_RED_SHIFT * e.r + DALTONIZE_SELF_SHIFT * e.b),
    )
}

#[simd_targets]
pub fn daltonize_row(original: &[LinearRgb], simulated: &[LinearRgb], output: &mut [LinearRgb]) {
    for (dst, orig, sim) in izip!(output.iter_mut(), original.iter(), simulated.iter()) {
        *dst = daltonize_pixel(*orig, *sim);
    }
}

/// # Panics
/// If `original` and `simulated` differ in shape.
pub fn daltonize(
    original: &PixelBuffer<'_, LinearRgb>,
    simulated: &PixelBuffer<'_, LinearRgb>,
    output: &mut PixelBuffer<'_, LinearRgb>,
) {
    assert_eq!(
        original.shape(),
        simulated.shape(),
        "buffers don't match sizes"
    );
    output.ensure_shape(original.shape());
    for (dst, orig, sim) in izip!(output.rows_mut(), original.rows(), simulated.rows()) {
        daltonize_row(orig, sim, dst);
    }
}
