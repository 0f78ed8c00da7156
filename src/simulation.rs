//! Dichromat simulation in LMS space.
//!
//! Protanopes and deuteranopes lose one cone type and see colours on a single
//! plane through the origin (Viénot, Brettel & Mollon 1999). Tritanopes use
//! the two half-planes of Brettel, Viénot & Mollon 1997, selected by which
//! side of the separating plane the colour falls on.

use std::{fmt, str::FromStr};

use daltonlens_macros::simd_targets;

use crate::{
    buffer::PixelBuffer,
    color::consts::{
        DEUTAN_M_FROM_LS, PROTAN_L_FROM_MS, TRITAN_DISCRIMINANT_LM, TRITAN_S_FROM_LM_NEGATIVE,
        TRITAN_S_FROM_LM_POSITIVE,
    },
    utils::{num::lerp, pixel::Lms},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Deficiency {
    /// Missing L cones.
    #[default]
    Protanope = 0,
    /// Missing M cones.
    Deuteranope = 1,
    /// Missing S cones.
    Tritanope = 2,
}

impl Deficiency {
    pub const ALL: [Deficiency; 3] = [
        Deficiency::Protanope,
        Deficiency::Deuteranope,
        Deficiency::Tritanope,
    ];

    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Deficiency::Protanope => "protanope",
            Deficiency::Deuteranope => "deuteranope",
            Deficiency::Tritanope => "tritanope",
        }
    }
}

impl fmt::Display for Deficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Deficiency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protanope" | "protan" => Ok(Deficiency::Protanope),
            "deuteranope" | "deutan" => Ok(Deficiency::Deuteranope),
            "tritanope" | "tritan" => Ok(Deficiency::Tritanope),
            _ => Err(format!("unknown deficiency `{s}`")),
        }
    }
}

/// Half-plane used by the tritanope projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TritanPlane {
    /// Discriminant >= 0.
    Positive,
    Negative,
}

#[inline(always)]
pub fn tritan_plane(p: Lms) -> TritanPlane {
    let [a, b] = TRITAN_DISCRIMINANT_LM;
    if a * p.l + b * p.m >= 0.0 {
        TritanPlane::Positive
    } else {
        TritanPlane::Negative
    }
}

/// Projects `p` onto the dichromat's plane, only the missing cone changes.
#[inline(always)]
pub fn simulate_pixel(p: Lms, deficiency: Deficiency) -> Lms {
    match deficiency {
        Deficiency::Protanope => {
            let [a, b] = PROTAN_L_FROM_MS;
            Lms::new(a * p.m + b * p.s, p.m, p.s)
        }
        Deficiency::Deuteranope => {
            let [a, b] = DEUTAN_M_FROM_LS;
            Lms::new(p.l, a * p.l + b * p.s, p.s)
        }
        Deficiency::Tritanope => {
            let [a, b] = match tritan_plane(p) {
                TritanPlane::Positive => TRITAN_S_FROM_LM_POSITIVE,
                TritanPlane::Negative => TRITAN_S_FROM_LM_NEGATIVE,
            };
            Lms::new(p.l, p.m, a * p.l + b * p.m)
        }
    }
}

/// Anomalous trichromacy approximation: `(1 - severity) * p + severity * projected`.
#[inline(always)]
pub fn simulate_pixel_with_severity(p: Lms, deficiency: Deficiency, severity: f32) -> Lms {
    let projected = simulate_pixel(p, deficiency);
    Lms::new(
        lerp(p.l, projected.l, severity),
        lerp(p.m, projected.m, severity),
        lerp(p.s, projected.s, severity),
    )
}

#[simd_targets]
pub fn simulate_row(input: &[Lms], output: &mut [Lms], deficiency: Deficiency, severity: f32) {
    output
        .iter_mut()
        .zip(input.iter())
        .for_each(|(dst, src)| *dst = simulate_pixel_with_severity(*src, deficiency, severity));
}

/// In-place image simulation.
pub fn simulate(image: &mut PixelBuffer<'_, Lms>, deficiency: Deficiency, severity: f32) {
    image.rows_mut().for_each(|row| {
        row.iter_mut()
            .for_each(|p| *p = simulate_pixel_with_severity(*p, deficiency, severity))
    });
}
