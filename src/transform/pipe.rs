use crate::buffer::{OwnedPixelBuffer, PixelBuffer, Shape};
use crate::transform::traits::BufferTransform;

/// `a.pipe(b)` for any pair of stages whose pixel types line up.
pub trait PipeableTransform: BufferTransform {
    /// The buffer between both stages is sized on the first `prepare` or
    /// `apply` and kept afterwards.
    ///
    /// ```ignore
    /// let mut round_trip = decode.pipe(encode);
    /// round_trip.once(&srgb, &mut out);
    /// ```
    fn pipe<T>(self, next: T) -> Pipeline<Self, T>
    where
        T: BufferTransform<Input = Self::Output>,
    {
        Pipeline::new(self, next)
    }

    /// Starts from a caller-provided intermediate buffer.
    fn pipe_with_buffer<T>(
        self,
        next: T,
        intermediate: OwnedPixelBuffer<Self::Output>,
    ) -> Pipeline<Self, T>
    where
        T: BufferTransform<Input = Self::Output>,
    {
        Pipeline::with_buffer(self, next, intermediate)
    }

    fn pipe_with_shape<T>(self, next: T, shape: Shape) -> Pipeline<Self, T>
    where
        T: BufferTransform<Input = Self::Output>,
    {
        Pipeline::with_buffer(self, next, OwnedPixelBuffer::with_shape(shape))
    }
}

impl<T: BufferTransform> PipeableTransform for T {}

/// Two stages run back to back, `T1::Input -> T2::Output`.
///
/// The intermediate pixels never leave the pipeline except through
/// [Pipeline::intermediate].
pub struct Pipeline<T1, T2>
where
    T1: BufferTransform,
    T2: BufferTransform<Input = T1::Output>,
{
    t1: T1,
    t2: T2,
    b: OwnedPixelBuffer<T1::Output>,
}

impl<T1, T2> Pipeline<T1, T2>
where
    T1: BufferTransform,
    T2: BufferTransform<Input = T1::Output>,
{
    pub fn new(t1: T1, t2: T2) -> Self {
        Self::with_buffer(t1, t2, OwnedPixelBuffer::empty())
    }

    pub fn with_buffer(t1: T1, t2: T2, intermediate: OwnedPixelBuffer<T1::Output>) -> Self {
        Self {
            t1,
            t2,
            b: intermediate,
        }
    }

    /// Intermediate result of the last run.
    pub fn intermediate(&self) -> &OwnedPixelBuffer<T1::Output> {
        &self.b
    }
}

impl<T1, T2> BufferTransform for Pipeline<T1, T2>
where
    T1: BufferTransform,
    T2: BufferTransform<Input = T1::Output>,
{
    type Input = T1::Input;
    type Output = T2::Output;

    #[inline(always)]
    fn apply(
        &mut self,
        input: &PixelBuffer<'_, Self::Input>,
        output: &mut PixelBuffer<'_, Self::Output>,
    ) {
        self.t1.apply(input, &mut self.b);
        self.t2.apply(&self.b, output);
    }

    #[inline(always)]
    fn prepare(&mut self, in_shape: Shape, out_shape: Shape) {
        if self.b.is_empty() {
            self.b.ensure_shape(in_shape);
        }
        let b_shape = self.b.shape();
        self.t1.prepare(in_shape, b_shape);
        self.t2.prepare(b_shape, out_shape);
    }
}
