//! Filter selection and routing to the CPU or GPU backend.
//!
//! No colour arithmetic happens here: the CPU path chains the stages of
//! [crate::transform::stages], the GPU path hands the same description to the
//! shader as uniforms.

use std::fmt;

#[cfg(feature = "gpu")]
use crate::gpu::{FilterUniforms, GpuContext};
use crate::{
    buffer::PixelBuffer,
    cbcr::CbCrSwitch,
    color::Transfer,
    error::{DaltonlensError, Result},
    hsv::HsvParams,
    simulation::Deficiency,
    transform::{
        CpuStrategy,
        prelude::*,
        stages::{Daltonize, HsvTransform, SrgbDecode, SrgbEncode, SwitchCbCr, simulation_pipeline},
    },
    utils::{num::saturate, pixel::Srgba8},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaltonizeParams {
    pub deficiency: Deficiency,
    /// 0 leaves the image untouched, 1 is full dichromacy.
    pub severity: f32,
    /// Stop after the simulation, no error redistribution.
    pub simulate_only: bool,
}

impl DaltonizeParams {
    /// # Panics
    /// If `severity` is outside [0, 1].
    pub fn new(deficiency: Deficiency, severity: f32, simulate_only: bool) -> Self {
        assert!(
            (0.0..=1.0).contains(&severity),
            "severity {severity} is outside [0, 1]"
        );
        Self {
            deficiency,
            severity,
            simulate_only,
        }
    }

    /// Same as [DaltonizeParams::new] with `severity` clamped, NaN becomes 0.
    pub fn clamped(deficiency: Deficiency, severity: f32, simulate_only: bool) -> Self {
        Self::new(deficiency, saturate(severity), simulate_only)
    }
}

impl Default for DaltonizeParams {
    fn default() -> Self {
        Self::new(Deficiency::Protanope, 1.0, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// Pass-through.
    Normal,
    Daltonize(DaltonizeParams),
    SwitchCbCr,
    SwitchAndFlipCbCr,
    /// Works on the encoded values, ignores the processor's [Transfer].
    HsvTransform(HsvParams),
}

impl Filter {
    pub fn simulate(deficiency: Deficiency, severity: f32) -> Self {
        Filter::Daltonize(DaltonizeParams::new(deficiency, severity, true))
    }

    pub fn daltonize(deficiency: Deficiency, severity: f32) -> Self {
        Filter::Daltonize(DaltonizeParams::new(deficiency, severity, false))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Normal => "normal",
            Filter::Daltonize(p) if p.simulate_only => "simulate",
            Filter::Daltonize(_) => "daltonize",
            Filter::SwitchCbCr => "switch_cbcr",
            Filter::SwitchAndFlipCbCr => "switch_and_flip_cbcr",
            Filter::HsvTransform(_) => "hsv_transform",
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Daltonize(DaltonizeParams::default())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Daltonize(p) => write!(
                f,
                "{} ({}, severity {})",
                self.name(),
                p.deficiency,
                p.severity
            ),
            Filter::HsvTransform(p) => write!(
                f,
                "{} (hue shift {}, saturation x{}, quantization {:?})",
                self.name(),
                p.hue_shift,
                p.saturation_scale,
                p.hue_quantization
            ),
            _ => f.write_str(self.name()),
        }
    }
}

/// Where a [FilterProcessor] runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Cpu(CpuStrategy),
    /// CPU, strategy picked per image with [CpuStrategy::auto].
    #[default]
    CpuAuto,
    /// GPU only, fails without an adapter.
    Gpu,
    /// GPU when an adapter exists, CPU otherwise.
    Auto,
}

#[cfg(feature = "gpu")]
enum GpuState {
    Untried,
    Ready(Box<GpuContext>),
    Unavailable,
}

/// Applies [Filter]s to sRGB buffers.
///
/// The GPU context is created on first use and kept for the processor's
/// lifetime.
pub struct FilterProcessor {
    backend: Backend,
    transfer: Transfer,
    #[cfg(feature = "gpu")]
    gpu: GpuState,
    fallback_reported: bool,
}

impl FilterProcessor {
    pub fn new(backend: Backend, transfer: Transfer) -> Self {
        Self {
            backend,
            transfer,
            #[cfg(feature = "gpu")]
            gpu: GpuState::Untried,
            fallback_reported: false,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn transfer(&self) -> Transfer {
        self.transfer
    }

    /// Filters `input` into `output`, which takes the input shape. Alpha is
    /// carried over unchanged.
    pub fn process(
        &mut self,
        filter: &Filter,
        input: &PixelBuffer<'_, Srgba8>,
        output: &mut PixelBuffer<'_, Srgba8>,
    ) -> Result {
        log::debug!(
            "{} on {}x{} with {:?}",
            filter,
            input.width(),
            input.height(),
            self.backend
        );
        match self.backend {
            Backend::Cpu(strategy) => {
                self.process_cpu(filter, strategy, input, output);
                Ok(())
            }
            Backend::CpuAuto => {
                self.process_cpu(filter, CpuStrategy::auto(input.shape()), input, output);
                Ok(())
            }
            Backend::Gpu => self.process_gpu(filter, input, output),
            Backend::Auto => match self.process_gpu(filter, input, output) {
                Ok(()) => Ok(()),
                Err(e) => {
                    if !self.fallback_reported {
                        log::warn!("GPU path unusable ({e}), falling back to the CPU");
                        self.fallback_reported = true;
                    }
                    self.process_cpu(filter, CpuStrategy::auto(input.shape()), input, output);
                    Ok(())
                }
            },
        }
    }

    pub fn process_in_place(
        &mut self,
        filter: &Filter,
        image: &mut PixelBuffer<'_, Srgba8>,
    ) -> Result {
        let input = image.to_owned_buffer();
        self.process(filter, &input, image)
    }

    fn process_cpu(
        &self,
        filter: &Filter,
        strategy: CpuStrategy,
        input: &PixelBuffer<'_, Srgba8>,
        output: &mut PixelBuffer<'_, Srgba8>,
    ) {
        let transfer = self.transfer;
        let decode = SrgbDecode { transfer, strategy };
        let encode = SrgbEncode { transfer, strategy };
        match filter {
            Filter::Normal => {
                output.ensure_shape(input.shape());
                output.copy_from(input);
                return;
            }
            Filter::Daltonize(p) if p.simulate_only => decode
                .pipe(simulation_pipeline(p.deficiency, p.severity, strategy))
                .pipe(encode)
                .once(input, output),
            Filter::Daltonize(p) => decode
                .pipe(Daltonize::new(p.deficiency, p.severity, strategy))
                .pipe(encode)
                .once(input, output),
            Filter::SwitchCbCr => decode
                .pipe(SwitchCbCr {
                    switch: CbCrSwitch::Switch,
                    strategy,
                })
                .pipe(encode)
                .once(input, output),
            Filter::SwitchAndFlipCbCr => decode
                .pipe(SwitchCbCr {
                    switch: CbCrSwitch::SwitchAndFlip,
                    strategy,
                })
                .pipe(encode)
                .once(input, output),
            Filter::HsvTransform(params) => HsvTransform {
                params: *params,
                strategy,
            }
            .once(input, output),
        }
        restore_alpha(input, output);
    }

    #[cfg(feature = "gpu")]
    fn process_gpu(
        &mut self,
        filter: &Filter,
        input: &PixelBuffer<'_, Srgba8>,
        output: &mut PixelBuffer<'_, Srgba8>,
    ) -> Result {
        let uniforms = FilterUniforms::new(filter, self.transfer);
        self.gpu()?.process(&uniforms, input, output)
    }

    #[cfg(not(feature = "gpu"))]
    fn process_gpu(
        &mut self,
        _: &Filter,
        _: &PixelBuffer<'_, Srgba8>,
        _: &mut PixelBuffer<'_, Srgba8>,
    ) -> Result {
        Err(DaltonlensError::GpuUnavailable)
    }

    #[cfg(feature = "gpu")]
    fn gpu(&mut self) -> Result<&GpuContext> {
        if let GpuState::Untried = self.gpu {
            match GpuContext::new() {
                Ok(ctx) => self.gpu = GpuState::Ready(Box::new(ctx)),
                Err(e) => {
                    self.gpu = GpuState::Unavailable;
                    return Err(e);
                }
            }
        }
        match &self.gpu {
            GpuState::Ready(ctx) => Ok(ctx.as_ref()),
            _ => Err(DaltonlensError::GpuUnavailable),
        }
    }
}

fn restore_alpha(input: &PixelBuffer<'_, Srgba8>, output: &mut PixelBuffer<'_, Srgba8>) {
    for (dst, src) in output.rows_mut().zip(input.rows()) {
        dst.iter_mut().zip(src).for_each(|(d, s)| d.a = s.a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hsv::HueQuantization;

    #[test]
    fn test_default_params() {
        let p = DaltonizeParams::default();
        assert_eq!(p.deficiency, Deficiency::Protanope);
        assert_eq!(p.severity, 1.0);
        assert!(!p.simulate_only);
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn test_severity_out_of_range_panics() {
        let _ = DaltonizeParams::new(Deficiency::Deuteranope, 1.5, false);
    }

    #[test]
    fn test_clamped_params() {
        for (severity, expected) in [(3.0, 1.0), (-1.0, 0.0), (f32::NAN, 0.0), (0.4, 0.4)] {
            let params = DaltonizeParams::clamped(Deficiency::Tritanope, severity, false);
            assert_eq!(params.severity, expected);
        }
    }

    #[test]
    fn test_filter_names() {
        let names = [
            (Filter::simulate(Deficiency::Protanope, 1.0), "simulate"),
            (Filter::default(), "daltonize"),
            (Filter::SwitchAndFlipCbCr, "switch_and_flip_cbcr"),
            (Filter::HsvTransform(HsvParams::default()), "hsv_transform"),
        ];
        for (filter, name) in names {
            assert_eq!(filter.name(), name);
        }
        assert_eq!(Filter::SwitchCbCr.to_string(), "switch_cbcr");
    }

    #[test]
    fn test_normal_filter_copies_input() {
        let input = PixelBuffer::from_fn(5, 4, |x, y| Srgba8::new(x as u8, y as u8, 3, 100));
        let mut output = PixelBuffer::empty();
        FilterProcessor::new(Backend::Cpu(CpuStrategy::Seq), Transfer::Srgb)
            .process(&Filter::Normal, &input, &mut output)
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_cpu_keeps_alpha_and_resizes_output() {
        let input = PixelBuffer::from_fn(6, 3, |x, _| Srgba8::new(200, 30, 90, x as u8 * 40));
        let mut output = PixelBuffer::<Srgba8>::new(1, 1);
        FilterProcessor::new(Backend::CpuAuto, Transfer::Legacy)
            .process(&Filter::default(), &input, &mut output)
            .unwrap();
        assert_eq!(output.shape(), (6, 3));
        for (a, b) in input.to_vec().iter().zip(output.to_vec().iter()) {
            assert_eq!(a.a, b.a);
        }
    }

    #[test]
    fn test_process_in_place_matches_process() {
        let input = PixelBuffer::from_fn(7, 5, |x, y| {
            Srgba8::opaque(x as u8 * 36, y as u8 * 60, 128)
        });
        let filter = Filter::daltonize(Deficiency::Deuteranope, 0.6);
        let mut processor = FilterProcessor::new(Backend::Cpu(CpuStrategy::Seq), Transfer::Legacy);

        let mut expected = PixelBuffer::empty();
        processor.process(&filter, &input, &mut expected).unwrap();
        let mut image = input.clone();
        processor.process_in_place(&filter, &mut image).unwrap();
        assert_eq!(image, expected);
    }

    #[test]
    fn test_in_place_on_wrapped_memory() {
        let mut memory = vec![128u8; 4 * 4 * 2];
        let mut view = PixelBuffer::<Srgba8>::wrap(&mut memory, 4, 2, 16);
        FilterProcessor::new(Backend::Cpu(CpuStrategy::Par), Transfer::Legacy)
            .process_in_place(&Filter::SwitchCbCr, &mut view)
            .unwrap();
        assert!(view.is_borrowed());
        drop(view);
        assert!(memory.iter().all(|v| v.abs_diff(128) <= 1));
    }

    #[test]
    fn test_hsv_filter_ignores_transfer() {
        let input = PixelBuffer::from_fn(5, 3, |x, y| {
            Srgba8::new(x as u8 * 50, 90, y as u8 * 70, 77)
        });
        let filter = Filter::HsvTransform(HsvParams::new(0.4, 0.7, HueQuantization::None));
        let outputs = [Transfer::Legacy, Transfer::Srgb].map(|transfer| {
            let mut output = PixelBuffer::empty();
            FilterProcessor::new(Backend::Cpu(CpuStrategy::Seq), transfer)
                .process(&filter, &input, &mut output)
                .unwrap();
            output
        });
        assert_eq!(outputs[0], outputs[1]);
        assert!(outputs[0].to_vec().iter().all(|p| p.a == 77));
        assert_ne!(outputs[0], input);
    }
}
