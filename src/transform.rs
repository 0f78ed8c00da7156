//! Stage transforms that make up the CPU reference pipeline.

use rayon::prelude::*;

use crate::buffer::{PixelBuffer, Shape};
use crate::utils::pixel::Pixel;

pub mod pipe;
pub mod stages;
pub mod traits;

pub mod prelude {
    pub use super::CpuStrategy;
    pub use super::pipe::{PipeableTransform, Pipeline};
    pub use super::traits::BufferTransform;
}

/// How CPU stages walk the rows of an image.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuStrategy {
    /// Single thread, row after row. Reference implementation.
    #[default]
    Seq,
    /// Rows spread over the rayon pool.
    Par,
}

impl CpuStrategy {
    /// Small images are not worth the rayon overhead.
    pub fn auto(shape_hint: Shape) -> Self {
        let (width, height) = shape_hint;
        let count = width as u64 * height as u64;

        if width < 450 || count < 202500 {
            return CpuStrategy::Seq;
        }
        CpuStrategy::Par
    }

    /// Resizes `output` to the input shape and runs `kernel` on every pair of
    /// rows. Rows never alias, so both strategies write identical bits.
    pub fn map_rows<A, B, F>(
        self,
        input: &PixelBuffer<'_, A>,
        output: &mut PixelBuffer<'_, B>,
        kernel: F,
    ) where
        A: Pixel,
        B: Pixel,
        F: Fn(&[A], &mut [B]) + Send + Sync,
    {
        output.ensure_shape(input.shape());
        match self {
            CpuStrategy::Seq => output
                .rows_mut()
                .zip(input.rows())
                .for_each(|(dst, src)| kernel(src, dst)),
            CpuStrategy::Par => output
                .par_rows_mut()
                .zip(input.par_rows())
                .for_each(|(dst, src)| kernel(src, dst)),
        }
    }

    /// Same as [CpuStrategy::map_rows] with a second input of the same shape.
    pub fn zip_rows<A, B, C, F>(
        self,
        first: &PixelBuffer<'_, A>,
        second: &PixelBuffer<'_, B>,
        output: &mut PixelBuffer<'_, C>,
        kernel: F,
    ) where
        A: Pixel,
        B: Pixel,
        C: Pixel,
        F: Fn(&[A], &[B], &mut [C]) + Send + Sync,
    {
        assert_eq!(first.shape(), second.shape(), "buffers don't match sizes");
        output.ensure_shape(first.shape());
        match self {
            CpuStrategy::Seq => output
                .rows_mut()
                .zip(first.rows().zip(second.rows()))
                .for_each(|(dst, (a, b))| kernel(a, b, dst)),
            CpuStrategy::Par => output
                .par_rows_mut()
                .zip(first.par_rows().zip(second.par_rows()))
                .for_each(|(dst, (a, b))| kernel(a, b, dst)),
        }
    }
}
