use crate::buffer::{PixelBuffer, Shape};
use crate::utils::pixel::Pixel;

/// One step of the CPU pipeline, from a buffer of `Input` pixels to a buffer
/// of `Output` pixels.
///
/// Implementors resize `output` to whatever shape they produce, so callers
/// can hand in an empty buffer.
pub trait BufferTransform: Sized {
    type Input: Pixel;
    type Output: Pixel;

    fn apply(
        &mut self,
        input: &PixelBuffer<'_, Self::Input>,
        output: &mut PixelBuffer<'_, Self::Output>,
    );

    /// Called with the shapes of the next run before any pixel is touched.
    fn prepare(&mut self, in_shape: Shape, out_shape: Shape);

    /// [BufferTransform::prepare] then [BufferTransform::apply], consuming the stage.
    fn once(
        mut self,
        input: &PixelBuffer<'_, Self::Input>,
        output: &mut PixelBuffer<'_, Self::Output>,
    ) {
        self.prepare(input.shape(), output.shape());
        self.apply(input, output)
    }
}
