//! Per-stage transforms of the CPU path.
//!
//! Every stage keeps the shape of its input and runs the row kernels of the
//! colour modules, either sequentially or over the rayon pool.

use crate::{
    buffer::{OwnedPixelBuffer, PixelBuffer, Shape},
    cbcr::{CbCrSwitch, switch_row},
    color::{
        Transfer,
        convert::{decode_srgb_row, encode_srgb_row, linear_rgb_row, lms_row},
    },
    daltonize::daltonize_row,
    hsv::{HsvParams, hsv_row},
    simulation::{Deficiency, simulate_row},
    transform::{
        CpuStrategy,
        pipe::{PipeableTransform, Pipeline},
        traits::BufferTransform,
    },
    utils::pixel::{LinearRgb, Lms, Srgba8},
};

/// 8 bit sRGB to linear RGB.
pub struct SrgbDecode {
    pub transfer: Transfer,
    pub strategy: CpuStrategy,
}

impl BufferTransform for SrgbDecode {
    type Input = Srgba8;
    type Output = LinearRgb;

    fn apply(&mut self, input: &PixelBuffer<'_, Srgba8>, output: &mut PixelBuffer<'_, LinearRgb>) {
        let transfer = self.transfer;
        self.strategy.map_rows(input, output, |src, dst| {
            decode_srgb_row(src, dst, transfer)
        });
    }

    fn prepare(&mut self, _: Shape, _: Shape) {}
}

/// Linear RGB to 8 bit sRGB, written opaque.
pub struct SrgbEncode {
    pub transfer: Transfer,
    pub strategy: CpuStrategy,
}

impl BufferTransform for SrgbEncode {
    type Input = LinearRgb;
    type Output = Srgba8;

    fn apply(&mut self, input: &PixelBuffer<'_, LinearRgb>, output: &mut PixelBuffer<'_, Srgba8>) {
        let transfer = self.transfer;
        self.strategy.map_rows(input, output, |src, dst| {
            encode_srgb_row(src, dst, transfer)
        });
    }

    fn prepare(&mut self, _: Shape, _: Shape) {}
}

pub struct LmsFromLinear {
    pub strategy: CpuStrategy,
}

impl BufferTransform for LmsFromLinear {
    type Input = LinearRgb;
    type Output = Lms;

    fn apply(&mut self, input: &PixelBuffer<'_, LinearRgb>, output: &mut PixelBuffer<'_, Lms>) {
        self.strategy.map_rows(input, output, lms_row);
    }

    fn prepare(&mut self, _: Shape, _: Shape) {}
}

pub struct LinearFromLms {
    pub strategy: CpuStrategy,
}

impl BufferTransform for LinearFromLms {
    type Input = Lms;
    type Output = LinearRgb;

    fn apply(&mut self, input: &PixelBuffer<'_, Lms>, output: &mut PixelBuffer<'_, LinearRgb>) {
        self.strategy.map_rows(input, output, linear_rgb_row);
    }

    fn prepare(&mut self, _: Shape, _: Shape) {}
}

pub struct Simulate {
    pub deficiency: Deficiency,
    pub severity: f32,
    pub strategy: CpuStrategy,
}

impl BufferTransform for Simulate {
    type Input = Lms;
    type Output = Lms;

    fn apply(&mut self, input: &PixelBuffer<'_, Lms>, output: &mut PixelBuffer<'_, Lms>) {
        let (deficiency, severity) = (self.deficiency, self.severity);
        self.strategy.map_rows(input, output, |src, dst| {
            simulate_row(src, dst, deficiency, severity)
        });
    }

    fn prepare(&mut self, in_shape: Shape, _: Shape) {
        log::trace!(
            "simulating {} at severity {} on {:?}",
            self.deficiency,
            self.severity,
            in_shape
        );
    }
}

/// Linear RGB -> LMS -> dichromat LMS -> linear RGB.
pub type SimulationPipeline = Pipeline<Pipeline<LmsFromLinear, Simulate>, LinearFromLms>;

pub fn simulation_pipeline(
    deficiency: Deficiency,
    severity: f32,
    strategy: CpuStrategy,
) -> SimulationPipeline {
    LmsFromLinear { strategy }
        .pipe(Simulate {
            deficiency,
            severity,
            strategy,
        })
        .pipe(LinearFromLms { strategy })
}

/// Simulates the input and redistributes the error into the output.
pub struct Daltonize {
    simulation: SimulationPipeline,
    simulated: OwnedPixelBuffer<LinearRgb>,
    strategy: CpuStrategy,
}

impl Daltonize {
    pub fn new(deficiency: Deficiency, severity: f32, strategy: CpuStrategy) -> Self {
        Self {
            simulation: simulation_pipeline(deficiency, severity, strategy),
            simulated: OwnedPixelBuffer::empty(),
            strategy,
        }
    }
}

impl BufferTransform for Daltonize {
    type Input = LinearRgb;
    type Output = LinearRgb;

    fn apply(
        &mut self,
        input: &PixelBuffer<'_, LinearRgb>,
        output: &mut PixelBuffer<'_, LinearRgb>,
    ) {
        self.simulation.apply(input, &mut self.simulated);
        self.strategy.zip_rows(input, &self.simulated, output, daltonize_row);
    }

    fn prepare(&mut self, in_shape: Shape, _: Shape) {
        self.simulated.ensure_shape(in_shape);
        self.simulation.prepare(in_shape, in_shape);
    }
}

pub struct SwitchCbCr {
    pub switch: CbCrSwitch,
    pub strategy: CpuStrategy,
}

impl BufferTransform for SwitchCbCr {
    type Input = LinearRgb;
    type Output = LinearRgb;

    fn apply(
        &mut self,
        input: &PixelBuffer<'_, LinearRgb>,
        output: &mut PixelBuffer<'_, LinearRgb>,
    ) {
        let switch = self.switch;
        self.strategy.map_rows(input, output, |src, dst| switch_row(src, dst, switch));
    }

    fn prepare(&mut self, _: Shape, _: Shape) {}
}

/// Hue, saturation and hue quantization on the encoded values, alpha kept.
pub struct HsvTransform {
    pub params: HsvParams,
    pub strategy: CpuStrategy,
}

impl BufferTransform for HsvTransform {
    type Input = Srgba8;
    type Output = Srgba8;

    fn apply(&mut self, input: &PixelBuffer<'_, Srgba8>, output: &mut PixelBuffer<'_, Srgba8>) {
        let params = self.params;
        self.strategy.map_rows(input, output, |src, dst| hsv_row(src, dst, params));
    }

    fn prepare(&mut self, in_shape: Shape, _: Shape) {
        log::trace!("hsv transform {:?} on {:?}", self.params, in_shape);
    }
}
