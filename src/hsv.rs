//! Hue rotation, saturation scaling and hue quantization.
//!
//! These work on the encoded sRGB values as they are stored, the
//! [Transfer](crate::color::Transfer) setting does not apply.

use daltonlens_macros::simd_targets;

use crate::{
    color::consts::{HSV_EPSILON, HUE_LEVEL1_STEPS, HUE_LEVEL2_STEPS},
    utils::{
        num::{saturate, u8_to_unorm, unorm_to_u8},
        pixel::Srgba8,
    },
};

/// Snaps hues onto a small set of easily named ones.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HueQuantization {
    #[default]
    None,
    /// Sixteen steps.
    Level1,
    /// Seven steps.
    Level2,
}

impl HueQuantization {
    pub fn as_u32(self) -> u32 {
        match self {
            HueQuantization::None => 0,
            HueQuantization::Level1 => 1,
            HueQuantization::Level2 => 2,
        }
    }

    pub fn from_level(level: u32) -> Option<Self> {
        match level {
            0 => Some(HueQuantization::None),
            1 => Some(HueQuantization::Level1),
            2 => Some(HueQuantization::Level2),
            _ => None,
        }
    }

    /// `(upper bound in degrees, hue in degrees)`, empty for [HueQuantization::None].
    pub fn steps(self) -> &'static [(u32, f32)] {
        match self {
            HueQuantization::None => &[],
            HueQuantization::Level1 => &HUE_LEVEL1_STEPS,
            HueQuantization::Level2 => &HUE_LEVEL2_STEPS,
        }
    }

    /// Maps a hue in [0, 1] to its step, also in [0, 1].
    #[inline(always)]
    pub fn quantize(self, hue: f32) -> f32 {
        if self == HueQuantization::None {
            return hue;
        }
        let degrees = (hue * 360.0) as u32;
        self.steps()
            .iter()
            .find(|(bound, _)| degrees < *bound)
            .map_or(0.0, |&(_, step)| step)
            / 360.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvParams {
    /// Added to the hue, in turns. Wraps, so 1 is a full turn.
    pub hue_shift: f32,
    /// Saturation multiplier, the result is capped at 1.
    pub saturation_scale: f32,
    pub hue_quantization: HueQuantization,
}

impl HsvParams {
    /// # Panics
    /// If `hue_shift` is not finite or `saturation_scale` is negative or not finite.
    pub fn new(hue_shift: f32, saturation_scale: f32, hue_quantization: HueQuantization) -> Self {
        assert!(hue_shift.is_finite(), "hue shift {hue_shift} is not finite");
        assert!(
            saturation_scale.is_finite() && saturation_scale >= 0.0,
            "saturation scale {saturation_scale} is not a finite non-negative number"
        );
        Self {
            hue_shift,
            saturation_scale,
            hue_quantization,
        }
    }

    /// Same as [HsvParams::new], a non-finite shift becomes 0 and the scale
    /// is clamped to `[0, f32::MAX]` with NaN mapping to 0.
    pub fn clamped(
        hue_shift: f32,
        saturation_scale: f32,
        hue_quantization: HueQuantization,
    ) -> Self {
        let hue_shift = if hue_shift.is_finite() {
            hue_shift
        } else {
            0.0
        };
        Self::new(
            hue_shift,
            saturation_scale.max(0.0).min(f32::MAX),
            hue_quantization,
        )
    }
}

impl Default for HsvParams {
    /// Leaves every pixel unchanged.
    fn default() -> Self {
        Self::new(0.0, 1.0, HueQuantization::None)
    }
}

/// `[h, s, v]`, all in [0, 1], from unit RGB.
///
/// Branch-light form: the largest channel and the hue sector come out of two
/// conditional swaps, the shader runs the same steps.
#[inline(always)]
pub fn hsv_from_rgb([r, g, b]: [f32; 3]) -> [f32; 3] {
    let p = if g < b {
        [b, g, -1.0, 2.0 / 3.0]
    } else {
        [g, b, 0.0, -1.0 / 3.0]
    };
    let q = if r < p[0] {
        [p[0], p[1], p[3], r]
    } else {
        [r, p[1], p[2], p[0]]
    };
    let chroma = q[0] - q[3].min(q[1]);
    let hue = ((q[3] - q[1]) / (6.0 * chroma + HSV_EPSILON) + q[2]).abs();
    [hue, chroma / (q[0] + HSV_EPSILON), q[0]]
}

/// Inverse of [hsv_from_rgb].
#[inline(always)]
pub fn rgb_from_hsv([h, s, v]: [f32; 3]) -> [f32; 3] {
    let hue = [
        saturate((6.0 * h - 3.0).abs() - 1.0),
        saturate(2.0 - (6.0 * h - 2.0).abs()),
        saturate(2.0 - (6.0 * h - 4.0).abs()),
    ];
    hue.map(|c| ((c - 1.0) * s + 1.0) * v)
}

/// `x - floor(x)`, which unlike [f32::fract] stays in [0, 1) for negative input.
#[inline(always)]
fn wrap_unit(x: f32) -> f32 {
    x - x.floor()
}

/// Alpha is kept.
#[inline(always)]
pub fn hsv_transform_pixel(p: Srgba8, params: &HsvParams) -> Srgba8 {
    let [h, s, v] = hsv_from_rgb([u8_to_unorm(p.r), u8_to_unorm(p.g), u8_to_unorm(p.b)]);
    let h = wrap_unit(h + params.hue_shift);
    let h = params.hue_quantization.quantize(h);
    let s = (s * params.saturation_scale).min(1.0);
    let [r, g, b] = rgb_from_hsv([h, s, v]);
    Srgba8::new(unorm_to_u8(r), unorm_to_u8(g), unorm_to_u8(b), p.a)
}

#[simd_targets]
pub fn hsv_row(input: &[Srgba8], output: &mut [Srgba8], params: HsvParams) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = hsv_transform_pixel(*src, &params));
}
