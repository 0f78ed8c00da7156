//! Colour spaces and the numeric constants they share with the GPU shader.

pub mod consts;
pub mod convert;

pub use convert::{
    Transfer, decode_srgb, encode_srgb, linear_rgb_from_lms, linear_rgb_from_xyz, linear_to_srgb,
    lms_from_linear_rgb, srgb_to_linear, to_linear_rgb, to_lms, xyz_from_linear_rgb,
};
