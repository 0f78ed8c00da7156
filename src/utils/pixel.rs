use std::{
    fmt::{Debug, Display},
    ops::{Add, Mul, Sub},
};

use bytemuck::{Pod, Zeroable};

/// Marker for plain pixel structs that can be stored in a
/// [PixelBuffer](crate::buffer::PixelBuffer).
///
/// Every implementor is `repr(C)` and `Pod`, so rows of raw bytes can be
/// reinterpreted as rows of pixels without copies.
pub trait Pixel: Pod + Default + PartialEq + Debug + Send + Sync {
    /// Short name used in logs.
    const NAME: &'static str;
}

/// Gamma-encoded 8 bit sRGB with straight alpha.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Srgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Srgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn gray(v: u8) -> Self {
        Self::opaque(v, v, v)
    }

    pub const fn from_array(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Largest absolute per-channel difference, alpha included.
    pub fn max_channel_diff(self, other: Self) -> u8 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0)
    }

    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Display for Srgba8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl Pixel for Srgba8 {
    const NAME: &'static str = "srgba8";
}

/// Defines a three channel f32 pixel with component-wise arithmetic.
///
/// Each colour space gets its own type so a buffer can never be read under
/// the wrong unit interpretation.
macro_rules! float3_pixel {
    ($(#[$meta:meta])* $name:ident, $label:literal, $a:ident, $b:ident, $c:ident) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
        pub struct $name {
            pub $a: f32,
            pub $b: f32,
            pub $c: f32,
        }

        impl $name {
            pub const fn new($a: f32, $b: f32, $c: f32) -> Self {
                Self { $a, $b, $c }
            }

            pub const fn splat(v: f32) -> Self {
                Self::new(v, v, v)
            }

            pub const fn from_array(v: [f32; 3]) -> Self {
                Self::new(v[0], v[1], v[2])
            }

            pub const fn to_array(self) -> [f32; 3] {
                [self.$a, self.$b, self.$c]
            }

            /// Largest absolute per-channel difference.
            pub fn max_abs_diff(self, other: Self) -> f32 {
                (self.$a - other.$a)
                    .abs()
                    .max((self.$b - other.$b).abs())
                    .max((self.$c - other.$c).abs())
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self::new(self.$a + rhs.$a, self.$b + rhs.$b, self.$c + rhs.$c)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self::new(self.$a - rhs.$a, self.$b - rhs.$b, self.$c - rhs.$c)
            }
        }

        impl Mul<f32> for $name {
            type Output = Self;

            fn mul(self, rhs: f32) -> Self::Output {
                Self::new(self.$a * rhs, self.$b * rhs, self.$c * rhs)
            }
        }

        impl Pixel for $name {
            const NAME: &'static str = $label;
        }
    };
}

float3_pixel!(
    /// Linear-light RGB, nominally in [0, 1] but unclamped mid-pipeline.
    LinearRgb,
    "linear_rgb",
    r,
    g,
    b
);

float3_pixel!(
    /// Cone responses (long, medium, short wavelength).
    Lms,
    "lms",
    l,
    m,
    s
);

float3_pixel!(
    /// CIE 1931 XYZ tristimulus values, D65 white.
    Xyz,
    "xyz",
    x,
    y,
    z
);
