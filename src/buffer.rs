use std::{fmt, marker::PhantomData};

use aligned_vec::{AVec, ConstAlign, avec};
use rayon::prelude::*;

use crate::utils::pixel::Pixel;

/// Every row of a buffer allocated by this crate starts on this boundary.
pub const ROW_ALIGNMENT: usize = 16;

/// `(width, height)` in pixels.
pub type Shape = (u32, u32);

type AlignedBytes = AVec<u8, ConstAlign<ROW_ALIGNMENT>>;

/// Callback run once when a buffer lets go of its memory.
pub type ReleaseFn<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Buffer that owns its memory.
pub type OwnedPixelBuffer<P> = PixelBuffer<'static, P>;

/// Row stride used for allocations: `width * size_of::<P>()` rounded up to
/// [ROW_ALIGNMENT].
#[inline]
pub fn aligned_bytes_per_row<P: Pixel>(width: u32) -> usize {
    (width as usize * size_of::<P>()).next_multiple_of(ROW_ALIGNMENT)
}

enum Storage<'a> {
    Empty,
    Owned(AlignedBytes),
    Borrowed(&'a mut [u8]),
}

/// Row-major 2D pixel buffer with padded rows.
///
/// The memory is either owned (16 byte aligned, zero initialised) or a
/// zero-copy view over memory owned by someone else, e.g. a screen grab or a
/// decoder output. Rows are addressed through `bytes_per_row`, which can be
/// larger than `width * size_of::<P>()`.
pub struct PixelBuffer<'a, P: Pixel> {
    width: u32,
    height: u32,
    bytes_per_row: usize,
    storage: Storage<'a>,
    release: Option<ReleaseFn<'a>>,
    _pixel: PhantomData<P>,
}

impl<'a, P: Pixel> PixelBuffer<'a, P> {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            bytes_per_row: 0,
            storage: Storage::Empty,
            release: None,
            _pixel: PhantomData,
        }
    }

    /// Owned, zero-filled buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = aligned_bytes_per_row::<P>(width);
        Self {
            width,
            height,
            bytes_per_row,
            storage: Storage::Owned(avec![[ROW_ALIGNMENT]| 0u8; bytes_per_row * height as usize]),
            release: None,
            _pixel: PhantomData,
        }
    }

    pub fn with_shape(shape: Shape) -> Self {
        Self::new(shape.0, shape.1)
    }

    /// Owned buffer filled from tightly packed pixels.
    ///
    /// # Panics
    /// If `pixels.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: &[P]) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "buffers don't match sizes"
        );
        let mut buffer = Self::new(width, height);
        if width > 0 {
            buffer
                .rows_mut()
                .zip(pixels.chunks_exact(width as usize))
                .for_each(|(dst, src)| dst.copy_from_slice(src));
        }
        buffer
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> P) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.apply(|x, y, p| *p = f(x, y));
        buffer
    }

    /// Zero-copy view over external memory. Dropping the buffer leaves the
    /// memory untouched.
    ///
    /// # Panics
    /// If `bytes_per_row < width * size_of::<P>()`, if `data` is shorter than
    /// `bytes_per_row * height`, or if rows are not aligned for `P`.
    pub fn wrap(data: &'a mut [u8], width: u32, height: u32, bytes_per_row: usize) -> Self {
        let row_len = width as usize * size_of::<P>();
        assert!(
            bytes_per_row >= row_len,
            "bytes_per_row {bytes_per_row} is smaller than a row of {width} {} pixels",
            P::NAME
        );
        assert!(
            data.len() >= bytes_per_row * height as usize,
            "wrapped memory holds {} bytes, {}x{} with stride {} needs {}",
            data.len(),
            width,
            height,
            bytes_per_row,
            bytes_per_row * height as usize
        );
        assert!(
            (data.as_ptr() as usize) % align_of::<P>() == 0 && bytes_per_row % align_of::<P>() == 0,
            "wrapped memory is not aligned for {}",
            P::NAME
        );
        Self {
            width,
            height,
            bytes_per_row,
            storage: Storage::Borrowed(data),
            release: None,
            _pixel: PhantomData,
        }
    }

    /// Same as [PixelBuffer::wrap], `release` runs when the buffer is dropped
    /// or stops using the memory after a reallocation.
    pub fn wrap_with_release(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        bytes_per_row: usize,
        release: impl FnOnce() + Send + 'a,
    ) -> Self {
        let mut buffer = Self::wrap(data, width, height, bytes_per_row);
        buffer.release = Some(Box::new(release));
        buffer
    }

    /// Zero-copy view over tightly packed pixels.
    pub fn wrap_pixels(pixels: &'a mut [P], width: u32, height: u32) -> Self {
        let bytes_per_row = width as usize * size_of::<P>();
        Self::wrap(
            bytemuck::cast_slice_mut(pixels),
            width,
            height,
            bytes_per_row,
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        (self.width, self.height)
    }

    #[inline]
    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.bytes_per_row * self.height as usize
    }

    /// No pixels, regardless of the storage behind it.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// Bytes allocated by this buffer itself, 0 for views.
    pub fn allocated_bytes(&self) -> usize {
        match &self.storage {
            Storage::Owned(bytes) => bytes.len(),
            _ => 0,
        }
    }

    /// Start of the pixel memory, null when empty.
    pub fn as_ptr(&self) -> *const u8 {
        match &self.storage {
            Storage::Empty => std::ptr::null(),
            Storage::Owned(bytes) => bytes.as_ptr(),
            Storage::Borrowed(data) => data.as_ptr(),
        }
    }

    /// Raw bytes, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        let size = self.size_in_bytes();
        match &self.storage {
            Storage::Empty => &[],
            Storage::Owned(bytes) => &bytes[..size],
            Storage::Borrowed(data) => &data[..size],
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size_in_bytes();
        match &mut self.storage {
            Storage::Empty => &mut [],
            Storage::Owned(bytes) => &mut bytes[..size],
            Storage::Borrowed(data) => &mut data[..size],
        }
    }

    #[inline]
    fn row_len(&self) -> usize {
        self.width as usize * size_of::<P>()
    }

    pub fn row(&self, y: u32) -> &[P] {
        assert!(y < self.height, "row {} out of {}", y, self.height);
        let start = y as usize * self.bytes_per_row;
        let row_len = self.row_len();
        cast_row(&self.as_bytes()[start..start + row_len])
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [P] {
        assert!(y < self.height, "row {} out of {}", y, self.height);
        let start = y as usize * self.bytes_per_row;
        let row_len = self.row_len();
        cast_row_mut(&mut self.as_bytes_mut()[start..start + row_len])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[P]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [P]> + '_ {
        let row_len = self.row_len();
        let stride = self.bytes_per_row.max(1);
        self.as_bytes_mut()
            .chunks_mut(stride)
            .map(move |row| cast_row_mut(&mut row[..row_len]))
    }

    pub fn par_rows(&self) -> impl IndexedParallelIterator<Item = &[P]> + '_ {
        let row_len = self.row_len();
        let stride = self.bytes_per_row.max(1);
        self.as_bytes()
            .par_chunks(stride)
            .map(move |row| cast_row(&row[..row_len]))
    }

    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [P]> + '_ {
        let row_len = self.row_len();
        let stride = self.bytes_per_row.max(1);
        self.as_bytes_mut()
            .par_chunks_mut(stride)
            .map(move |row| cast_row_mut(&mut row[..row_len]))
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> P {
        self.row(y)[x as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut P {
        &mut self.row_mut(y)[x as usize]
    }

    pub fn fill(&mut self, value: P) {
        self.rows_mut().for_each(|row| row.fill(value));
    }

    /// Visits every pixel with its `(x, y)` coordinates.
    pub fn apply(&mut self, mut f: impl FnMut(u32, u32, &mut P)) {
        self.rows_mut().enumerate().for_each(|(y, row)| {
            row.iter_mut()
                .enumerate()
                .for_each(|(x, p)| f(x as u32, y as u32, p));
        });
    }

    /// Tightly packed copy of the pixels.
    pub fn to_vec(&self) -> Vec<P> {
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        self.rows().for_each(|row| pixels.extend_from_slice(row));
        pixels
    }

    /// Row-wise copy from a buffer of the same shape, strides may differ.
    ///
    /// # Panics
    /// If the shapes differ.
    pub fn copy_from(&mut self, other: &PixelBuffer<'_, P>) {
        assert_eq!(self.shape(), other.shape(), "buffers don't match sizes");
        self.rows_mut()
            .zip(other.rows())
            .for_each(|(dst, src)| dst.copy_from_slice(src));
    }

    /// Makes the buffer `width x height`.
    ///
    /// An owned allocation that is large enough is reused, only the shape and
    /// the stride change. Views are never resized in place: they get replaced
    /// by a fresh owned allocation and their release callback runs. Pixel
    /// content is unspecified after a shape change.
    pub fn ensure_size(&mut self, width: u32, height: u32) {
        if self.shape() == (width, height) && !matches!(self.storage, Storage::Empty) {
            return;
        }

        let bytes_per_row = aligned_bytes_per_row::<P>(width);
        let required = bytes_per_row * height as usize;
        if let Storage::Owned(bytes) = &self.storage {
            if required <= bytes.len() {
                self.width = width;
                self.height = height;
                self.bytes_per_row = bytes_per_row;
                return;
            }
        }

        self.release_storage();
        *self = Self::new(width, height);
    }

    pub fn ensure_shape(&mut self, shape: Shape) {
        self.ensure_size(shape.0, shape.1);
    }

    /// Moves the content out, leaving an empty buffer behind.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::empty())
    }

    /// Owned deep copy with this crate's row padding.
    pub fn to_owned_buffer(&self) -> OwnedPixelBuffer<P> {
        let mut copy = OwnedPixelBuffer::new(self.width, self.height);
        copy.copy_from(self);
        copy
    }

    fn release_storage(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
        self.storage = Storage::Empty;
        self.width = 0;
        self.height = 0;
        self.bytes_per_row = 0;
    }
}

#[inline]
fn cast_row<P: Pixel>(bytes: &[u8]) -> &[P] {
    if bytes.is_empty() {
        return &[];
    }
    bytemuck::cast_slice(bytes)
}

#[inline]
fn cast_row_mut<P: Pixel>(bytes: &mut [u8]) -> &mut [P] {
    if bytes.is_empty() {
        return &mut [];
    }
    bytemuck::cast_slice_mut(bytes)
}

impl<P: Pixel> Default for PixelBuffer<'_, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P: Pixel> Clone for PixelBuffer<'_, P> {
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.width, self.height);
        copy.copy_from(self);
        copy
    }
}

impl<P: Pixel> Drop for PixelBuffer<'_, P> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<P: Pixel> fmt::Debug for PixelBuffer<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match self.storage {
            Storage::Empty => "empty",
            Storage::Owned(_) => "owned",
            Storage::Borrowed(_) => "borrowed",
        };
        f.debug_struct("PixelBuffer")
            .field("pixel", &P::NAME)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_per_row", &self.bytes_per_row)
            .field("storage", &storage)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

impl<P: Pixel> PartialEq for PixelBuffer<'_, P> {
    /// Pixel-wise equality, padding and storage are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::utils::pixel::{Lms, Srgba8, Xyz};

    #[test]
    fn test_rows_are_padded_to_alignment() {
        assert_eq!(aligned_bytes_per_row::<Srgba8>(1), 16);
        assert_eq!(aligned_bytes_per_row::<Srgba8>(4), 16);
        assert_eq!(aligned_bytes_per_row::<Srgba8>(5), 32);
        assert_eq!(aligned_bytes_per_row::<Lms>(1), 16);
        assert_eq!(aligned_bytes_per_row::<Lms>(4), 48);
        assert_eq!(aligned_bytes_per_row::<Lms>(5), 64);

        let buffer = PixelBuffer::<Xyz>::new(7, 3);
        assert_eq!(buffer.bytes_per_row(), 96);
        assert!(buffer.bytes_per_row() >= 7 * size_of::<Xyz>());
        assert_eq!(buffer.as_ptr() as usize % ROW_ALIGNMENT, 0);
    }

    #[test]
    fn test_basic_srgba_lifecycle() {
        let value = Srgba8::new(255, 127, 63, 31);
        let mut im1 = PixelBuffer::<Srgba8>::new(639, 479);
        im1.fill(value);
        assert_eq!(im1.get(320, 240), value);

        let im2 = im1.clone();
        assert_ne!(im1.as_ptr(), im2.as_ptr());
        assert_eq!(im2.get(320, 240), value);
        assert_eq!(im1, im2);

        let mut im2 = im2;
        let mut im3 = im2.take();
        assert!(im2.as_ptr().is_null());
        assert!(im2.is_empty());
        assert_eq!(im3.get(638, 478), value);

        let prev = im3.as_ptr();
        im3.ensure_size(320, 240);
        assert_eq!(im3.as_ptr(), prev);
        im3.ensure_size(639, 479);
        assert_eq!(im3.as_ptr(), prev);

        // does not fit the 639x479 allocation anymore
        im3.ensure_size(641, 480);
        assert_eq!(im3.shape(), (641, 480));
        assert!(im3.allocated_bytes() >= im3.size_in_bytes());
        *im3.get_mut(640, 479) = Srgba8::new(255, 255, 63, 31);
        assert_eq!(im3.get(640, 479), Srgba8::new(255, 255, 63, 31));
    }

    #[test]
    fn test_basic_xyz_lifecycle() {
        let mut im1 = PixelBuffer::<Xyz>::new(640, 480);
        im1.fill(Xyz::new(1.0, 2.0, 3.0));
        let im2 = im1.clone();
        assert_ne!(im1.as_ptr(), im2.as_ptr());
        assert_eq!(im2.get(320, 240), Xyz::new(1.0, 2.0, 3.0));

        let mut im2 = im2;
        let im3 = im2.take();
        assert!(im2.as_ptr().is_null());
        assert_eq!(im3.get(320, 240), Xyz::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_wrap_respects_external_stride() {
        // 3 pixels per row, stride of 5 pixels
        let mut memory = vec![0u8; 20 * 2];
        {
            let mut view = PixelBuffer::<Srgba8>::wrap(&mut memory, 3, 2, 20);
            assert!(view.is_borrowed());
            assert_eq!(view.allocated_bytes(), 0);
            view.apply(|x, y, p| *p = Srgba8::new(x as u8, y as u8, 7, 255));
        }
        assert_eq!(&memory[0..4], &[0, 0, 7, 255]);
        assert_eq!(&memory[8..12], &[2, 0, 7, 255]);
        // padding untouched
        assert_eq!(&memory[12..20], &[0; 8]);
        assert_eq!(&memory[24..28], &[1, 1, 7, 255]);
    }

    #[test]
    fn test_clone_of_view_uses_own_padding() {
        let mut memory = vec![9u8; 20 * 2];
        let view = PixelBuffer::<Srgba8>::wrap(&mut memory, 3, 2, 20);
        let copy = view.clone();
        assert!(!copy.is_borrowed());
        assert_eq!(copy.bytes_per_row(), 16);
        assert_eq!(copy, view);
        assert_eq!(copy.to_vec(), vec![Srgba8::new(9, 9, 9, 9); 6]);
    }

    #[test]
    fn test_wrap_float_pixels() {
        let mut lms = vec![Lms::new(1.0, 2.0, 3.0); 6];
        let view = PixelBuffer::wrap_pixels(&mut lms, 3, 2);
        assert_eq!(view.bytes_per_row(), 36);
        assert_eq!(view.get(2, 1), Lms::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_release_runs_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut memory = vec![0u8; 16];
        {
            let counter = released.clone();
            let _view = PixelBuffer::<Srgba8>::wrap_with_release(&mut memory, 2, 2, 8, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_runs_once_on_reallocation() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut memory = vec![0u8; 16];
        let counter = released.clone();
        let mut view = PixelBuffer::<Srgba8>::wrap_with_release(&mut memory, 2, 2, 8, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        view.ensure_size(4, 4);
        assert!(!view.is_borrowed());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        drop(view);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "bytes_per_row")]
    fn test_wrap_rejects_short_stride() {
        let mut memory = vec![0u8; 64];
        let _ = PixelBuffer::<Srgba8>::wrap(&mut memory, 4, 2, 8);
    }

    #[test]
    #[should_panic(expected = "buffers don't match sizes")]
    fn test_copy_from_rejects_other_shape() {
        let mut a = PixelBuffer::<Srgba8>::new(2, 2);
        let b = PixelBuffer::<Srgba8>::new(3, 2);
        a.copy_from(&b);
    }

    #[test]
    fn test_from_pixels_and_parallel_rows() {
        let pixels: Vec<Srgba8> = (0..12).map(|v| Srgba8::gray(v as u8)).collect();
        let buffer = PixelBuffer::from_pixels(4, 3, &pixels);
        assert_eq!(buffer.to_vec(), pixels);
        let sums: Vec<u32> = buffer
            .par_rows()
            .map(|row| row.iter().map(|p| p.r as u32).sum())
            .collect();
        assert_eq!(sums, vec![6, 22, 38]);
    }

    #[test]
    fn test_zero_sized_buffers() {
        let mut buffer = PixelBuffer::<Lms>::new(0, 4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.rows_mut().count(), 0);
        assert!(buffer.to_vec().is_empty());
        buffer.ensure_size(2, 2);
        assert_eq!(buffer.rows().count(), 2);
    }
}
