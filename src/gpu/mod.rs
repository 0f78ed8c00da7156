//! Per-pixel GPU rendition of the filters.

#[cfg(feature = "gpu")]
mod context;
pub mod shader;

#[cfg(feature = "gpu")]
pub use context::GpuContext;

use bytemuck::{Pod, Zeroable};

use crate::{color::Transfer, filter::Filter};

pub const MODE_NORMAL: u32 = 0;
pub const MODE_DALTONIZE: u32 = 1;
pub const MODE_SWITCH_CBCR: u32 = 2;
pub const MODE_SWITCH_AND_FLIP_CBCR: u32 = 3;
pub const MODE_HSV_TRANSFORM: u32 = 4;

/// Uniform block at `@group(0) @binding(2)`, eight 32 bit words.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FilterUniforms {
    pub mode: u32,
    pub deficiency: u32,
    pub severity: f32,
    pub simulate_only: u32,
    pub transfer: u32,
    pub hue_shift: f32,
    pub saturation_scale: f32,
    pub hue_quantization: u32,
}

impl FilterUniforms {
    pub fn new(filter: &Filter, transfer: Transfer) -> Self {
        let mut uniforms = Self {
            transfer: transfer.as_u32(),
            ..Default::default()
        };
        match filter {
            Filter::Normal => uniforms.mode = MODE_NORMAL,
            Filter::Daltonize(params) => {
                uniforms.mode = MODE_DALTONIZE;
                uniforms.deficiency = params.deficiency.as_u32();
                uniforms.severity = params.severity;
                uniforms.simulate_only = params.simulate_only as u32;
            }
            Filter::SwitchCbCr => uniforms.mode = MODE_SWITCH_CBCR,
            Filter::SwitchAndFlipCbCr => uniforms.mode = MODE_SWITCH_AND_FLIP_CBCR,
            Filter::HsvTransform(params) => {
                uniforms.mode = MODE_HSV_TRANSFORM;
                uniforms.hue_shift = params.hue_shift;
                uniforms.saturation_scale = params.saturation_scale;
                uniforms.hue_quantization = params.hue_quantization.as_u32();
            }
        }
        uniforms
    }
}
