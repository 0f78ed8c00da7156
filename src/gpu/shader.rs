//! WGSL source of the filter shader.
//!
//! The shader body lives in `filter.wgsl`; every number it uses is emitted
//! here from [crate::color::consts] so both backends read the same values.

use std::fmt::Write;

use crate::{
    color::{
        Transfer,
        consts::{
            DALTONIZE_RED_SHIFT, DALTONIZE_SELF_SHIFT, DEUTAN_M_FROM_LS, HSV_EPSILON,
            LINEAR_RGB_FROM_LMS, LINEAR_RGB_FROM_YCRCB, LMS_FROM_LINEAR_RGB, Mat3, PROTAN_L_FROM_MS,
            SRGB_DECODE_THRESHOLD, SRGB_ENCODE_THRESHOLD, SRGB_GAMMA, SRGB_LINEAR_SLOPE,
            SRGB_OFFSET, SRGB_SCALE, TRITAN_DISCRIMINANT_LM, TRITAN_S_FROM_LM_NEGATIVE,
            TRITAN_S_FROM_LM_POSITIVE, YCRCB_FROM_LINEAR_RGB,
        },
    },
    gpu::{
        MODE_DALTONIZE, MODE_HSV_TRANSFORM, MODE_NORMAL, MODE_SWITCH_AND_FLIP_CBCR,
        MODE_SWITCH_CBCR,
    },
    hsv::HueQuantization,
    simulation::Deficiency,
};

const SHADER_BODY: &str = include_str!("filter.wgsl");

/// Must match `@workgroup_size` in `filter.wgsl`.
pub const WORKGROUP_SIZE: u32 = 16;

/// Full WGSL module: generated constants followed by the shader body.
pub fn shader_source() -> String {
    let mut src = String::with_capacity(SHADER_BODY.len() + 4096);
    src.push_str("// Generated by daltonlens::gpu::shader, do not edit.\n\n");

    let floats: [(&str, f32); 19] = [
        ("PROTAN_L_FROM_M", PROTAN_L_FROM_MS[0]),
        ("PROTAN_L_FROM_S", PROTAN_L_FROM_MS[1]),
        ("DEUTAN_M_FROM_L", DEUTAN_M_FROM_LS[0]),
        ("DEUTAN_M_FROM_S", DEUTAN_M_FROM_LS[1]),
        ("TRITAN_DISCRIMINANT_L", TRITAN_DISCRIMINANT_LM[0]),
        ("TRITAN_DISCRIMINANT_M", TRITAN_DISCRIMINANT_LM[1]),
        ("TRITAN_POSITIVE_S_FROM_L", TRITAN_S_FROM_LM_POSITIVE[0]),
        ("TRITAN_POSITIVE_S_FROM_M", TRITAN_S_FROM_LM_POSITIVE[1]),
        ("TRITAN_NEGATIVE_S_FROM_L", TRITAN_S_FROM_LM_NEGATIVE[0]),
        ("TRITAN_NEGATIVE_S_FROM_M", TRITAN_S_FROM_LM_NEGATIVE[1]),
        ("DALTONIZE_RED_SHIFT", DALTONIZE_RED_SHIFT),
        ("DALTONIZE_SELF_SHIFT", DALTONIZE_SELF_SHIFT),
        ("SRGB_DECODE_THRESHOLD", SRGB_DECODE_THRESHOLD),
        ("SRGB_ENCODE_THRESHOLD", SRGB_ENCODE_THRESHOLD),
        ("SRGB_LINEAR_SLOPE", SRGB_LINEAR_SLOPE),
        ("SRGB_SCALE", SRGB_SCALE),
        ("SRGB_OFFSET", SRGB_OFFSET),
        ("SRGB_GAMMA", SRGB_GAMMA),
        ("HSV_EPSILON", HSV_EPSILON),
    ];
    for (name, value) in floats {
        let _ = writeln!(src, "const {name}: f32 = {};", wgsl_f32(value));
    }

    let uints: [(&str, u32); 13] = [
        ("MODE_NORMAL", MODE_NORMAL),
        ("MODE_DALTONIZE", MODE_DALTONIZE),
        ("MODE_SWITCH_CBCR", MODE_SWITCH_CBCR),
        ("MODE_SWITCH_AND_FLIP_CBCR", MODE_SWITCH_AND_FLIP_CBCR),
        ("MODE_HSV_TRANSFORM", MODE_HSV_TRANSFORM),
        ("DEFICIENCY_PROTANOPE", Deficiency::Protanope.as_u32()),
        ("DEFICIENCY_DEUTERANOPE", Deficiency::Deuteranope.as_u32()),
        ("DEFICIENCY_TRITANOPE", Deficiency::Tritanope.as_u32()),
        ("TRANSFER_LEGACY", Transfer::Legacy.as_u32()),
        ("TRANSFER_SRGB", Transfer::Srgb.as_u32()),
        ("HUE_QUANTIZATION_NONE", HueQuantization::None.as_u32()),
        ("HUE_QUANTIZATION_LEVEL1", HueQuantization::Level1.as_u32()),
        ("HUE_QUANTIZATION_LEVEL2", HueQuantization::Level2.as_u32()),
    ];
    for (name, value) in uints {
        let _ = writeln!(src, "const {name}: u32 = {value}u;");
    }
    src.push('\n');

    for (name, matrix) in [
        ("lms_from_linear_rgb", &LMS_FROM_LINEAR_RGB),
        ("linear_rgb_from_lms", &LINEAR_RGB_FROM_LMS),
        ("ycrcb_from_linear_rgb", &YCRCB_FROM_LINEAR_RGB),
        ("linear_rgb_from_ycrcb", &LINEAR_RGB_FROM_YCRCB),
    ] {
        write_matrix_fn(&mut src, name, matrix);
    }
    for (name, quantization) in [
        ("quantize_hue_level1", HueQuantization::Level1),
        ("quantize_hue_level2", HueQuantization::Level2),
    ] {
        write_hue_steps_fn(&mut src, name, quantization.steps());
    }

    src.push_str(SHADER_BODY);
    src
}

/// Debug formatting always keeps a decimal point or an exponent, which WGSL
/// needs to type the literal as a float.
fn wgsl_f32(v: f32) -> String {
    format!("{v:?}")
}

/// WGSL matrices are column-major, [Mat3] is row-major.
fn write_matrix_fn(src: &mut String, name: &str, m: &Mat3) {
    let _ = writeln!(src, "fn {name}(v: vec3<f32>) -> vec3<f32> {{");
    let _ = writeln!(src, "    return mat3x3<f32>(");
    for col in 0..3 {
        let _ = writeln!(
            src,
            "        vec3<f32>({}, {}, {}),",
            wgsl_f32(m[0][col]),
            wgsl_f32(m[1][col]),
            wgsl_f32(m[2][col])
        );
    }
    let _ = writeln!(src, "    ) * v;");
    let _ = writeln!(src, "}}\n");
}

/// Hue in whole degrees to the quantized hue in degrees, falling through to 0.
fn write_hue_steps_fn(src: &mut String, name: &str, steps: &[(u32, f32)]) {
    let _ = writeln!(src, "fn {name}(degrees: u32) -> f32 {{");
    for (bound, hue) in steps {
        let _ = writeln!(
            src,
            "    if (degrees < {bound}u) {{ return {}; }}",
            wgsl_f32(*hue)
        );
    }
    let _ = writeln!(src, "    return 0.0;");
    let _ = writeln!(src, "}}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_carries_constants() {
        let src = shader_source();
        assert!(src.contains("const PROTAN_L_FROM_S: f32 = -2.52581;"));
        assert!(src.contains("const DEUTAN_M_FROM_L: f32 = 0.494207;"));
        assert!(src.contains("const TRITAN_NEGATIVE_S_FROM_M: f32 = 0.16299;"));
        assert!(src.contains("const SRGB_ENCODE_THRESHOLD: f32 = 0.0031308;"));
        assert!(src.contains("const MODE_SWITCH_AND_FLIP_CBCR: u32 = 3u;"));
        assert!(src.contains("@workgroup_size(16, 16, 1)"));
    }

    #[test]
    fn test_matrices_are_emitted_column_major() {
        let src = shader_source();
        // first column of LMS_FROM_LINEAR_RGB
        assert!(src.contains("vec3<f32>(0.17882, 0.03456, 0.0003),"));
        // first column of LINEAR_RGB_FROM_LMS
        assert!(src.contains("vec3<f32>(8.09444, -1.02485, -0.03653),"));
    }

    #[test]
    fn test_hue_steps_are_emitted_in_order() {
        let src = shader_source();
        let level2 = &src[src.find("fn quantize_hue_level2").unwrap()..];
        let first = level2.find("if (degrees < 22u) { return 0.0; }").unwrap();
        let last = level2.find("< 330u) { return 300.0; }").unwrap();
        assert!(first < last);
        assert!(src.contains("const MODE_HSV_TRANSFORM: u32 = 4u;"));
        assert!(src.contains("const HSV_EPSILON: f32 = 1e-10;"));
    }

    #[test]
    fn test_every_float_literal_is_typed() {
        for v in [1.0f32, 0.0, -2.0, 1e-7, 69.35132] {
            let lit = wgsl_f32(v);
            assert!(lit.contains('.') || lit.contains('e'), "{lit}");
        }
    }

    #[test]
    fn test_body_is_appended_once() {
        let src = shader_source();
        assert_eq!(src.matches("fn main(").count(), 1);
        assert!(src.find("const PROTAN_L_FROM_M").unwrap() < src.find("fn main(").unwrap());
    }

    #[test]
    fn test_shader_validates() {
        use naga::valid::{Capabilities, ValidationFlags, Validator};

        let src = shader_source();
        let module = naga::front::wgsl::parse_str(&src)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&src)));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&src)));

        let main = module
            .entry_points
            .iter()
            .find(|ep| ep.name == "main")
            .unwrap();
        assert_eq!(main.stage, naga::ShaderStage::Compute);
        assert_eq!(main.workgroup_size, [WORKGROUP_SIZE, WORKGROUP_SIZE, 1]);
    }
}
