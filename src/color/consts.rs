//! Numeric constants shared by the CPU kernels and the generated WGSL.
//!
//! Matrices are row-major: `out[i] = sum_j M[i][j] * in[j]`.

pub type Mat3 = [[f32; 3]; 3];

/// Linear RGB to LMS cone responses (Smith & Pokorny 1975).
pub const LMS_FROM_LINEAR_RGB: Mat3 = [
    [0.17882, 0.43516, 0.04119],
    [0.03456, 0.27155, 0.03867],
    [0.00030, 0.00184, 0.01467],
];

pub const LINEAR_RGB_FROM_LMS: Mat3 = [
    [8.09444, -13.05043, 11.67206],
    [-1.02485, 5.40193, -11.36147],
    [-0.03653, -0.41216, 69.35132],
];

/// sRGB primaries, D65 white.
pub const XYZ_FROM_LINEAR_RGB: Mat3 = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

pub const LINEAR_RGB_FROM_XYZ: Mat3 = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

/// Protanope: `L = a * M + b * S`.
pub const PROTAN_L_FROM_MS: [f32; 2] = [2.02344, -2.52581];

/// Deuteranope: `M = a * L + b * S`.
pub const DEUTAN_M_FROM_LS: [f32; 2] = [0.494207, 1.24827];

/// Tritanope plane selector: `a * L + b * M`, the sign picks the half plane.
pub const TRITAN_DISCRIMINANT_LM: [f32; 2] = [0.34478, -0.65518];

/// Tritanope projection `S = a * L + b * M` when the discriminant is >= 0.
pub const TRITAN_S_FROM_LM_POSITIVE: [f32; 2] = [-0.00257, 0.05366];

/// Tritanope projection `S = a * L + b * M` when the discriminant is < 0.
pub const TRITAN_S_FROM_LM_NEGATIVE: [f32; 2] = [-0.06011, 0.16299];

/// Weight of the red error pushed into green and blue.
pub const DALTONIZE_RED_SHIFT: f32 = 0.7;

/// Weight of a channel's own error added back to it.
pub const DALTONIZE_SELF_SHIFT: f32 = 1.0;

pub const SRGB_DECODE_THRESHOLD: f32 = 0.04045;
pub const SRGB_ENCODE_THRESHOLD: f32 = 0.0031308;
pub const SRGB_LINEAR_SLOPE: f32 = 12.92;
pub const SRGB_SCALE: f32 = 1.055;
pub const SRGB_OFFSET: f32 = 0.055;
pub const SRGB_GAMMA: f32 = 2.4;

/// Orthonormal opponent transform, rows are `y`, `cr`, `cb`.
pub const YCRCB_FROM_LINEAR_RGB: Mat3 = [
    [0.57735027, 0.57735027, 0.57735027],
    [0.70710678, -0.70710678, 0.0],
    [-0.40824829, -0.40824829, 0.81649658],
];

/// Transpose of [YCRCB_FROM_LINEAR_RGB].
pub const LINEAR_RGB_FROM_YCRCB: Mat3 = [
    [0.57735027, 0.70710678, -0.40824829],
    [0.57735027, -0.70710678, -0.40824829],
    [0.57735027, 0.0, 0.81649658],
];

/// Keeps the hue and saturation divisions finite on black and gray.
pub const HSV_EPSILON: f32 = 1e-10;

/// Hue quantization steps, `(upper bound, hue)` in whole degrees. A hue at
/// or past the last bound wraps to red.
pub const HUE_LEVEL1_STEPS: [(u32, f32); 16] = [
    (10, 0.0),
    (20, 15.0),
    (40, 30.0),
    (50, 45.0),
    (60, 60.0),
    (80, 70.0),
    (140, 110.0),
    (170, 125.0),
    (200, 185.0),
    (220, 210.0),
    (240, 230.0),
    (280, 260.0),
    (320, 300.0),
    (330, 325.0),
    (345, 338.0),
    (355, 350.0),
];

/// Coarser variant of [HUE_LEVEL1_STEPS], seven named hues.
pub const HUE_LEVEL2_STEPS: [(u32, f32); 7] = [
    (22, 0.0),
    (45, 30.0),
    (70, 60.0),
    (155, 110.0),
    (186, 170.0),
    (278, 230.0),
    (330, 300.0),
];

#[inline(always)]
pub fn mul_mat3(m: &Mat3, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}
