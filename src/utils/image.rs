use std::{fs::File, io::BufWriter, path::Path};

use image::{
    ImageReader, Rgba, RgbaImage,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::{
    buffer::{OwnedPixelBuffer, PixelBuffer},
    error::Result,
    utils::pixel::Srgba8,
};

/// Decodes any format the `image` crate knows into 8 bit sRGBA.
pub fn read_png(path: impl AsRef<Path>) -> Result<OwnedPixelBuffer<Srgba8>> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(buffer_from_rgba_image(&image.to_rgba8()))
}

pub fn write_png(buffer: &PixelBuffer<'_, Srgba8>, path: impl AsRef<Path>) -> Result {
    write_png_with(buffer, path, CompressionType::Default, FilterType::Adaptive)
}

/// From a PixelBuffer construct an ImageBuffer and write to file using png encoder.
pub fn write_png_with(
    buffer: &PixelBuffer<'_, Srgba8>,
    path: impl AsRef<Path>,
    compression: CompressionType,
    filtering: FilterType,
) -> Result {
    let image_buf = buffer_to_rgba_image(buffer);
    let file = &mut BufWriter::new(File::create(path)?);
    let encoder = PngEncoder::new_with_quality(file, compression, filtering);
    image_buf.write_with_encoder(encoder)?;
    Ok(())
}

pub fn buffer_from_rgba_image(image: &RgbaImage) -> OwnedPixelBuffer<Srgba8> {
    PixelBuffer::from_pixels(
        image.width(),
        image.height(),
        bytemuck::cast_slice(image.as_raw().as_slice()),
    )
}

/// Tightly packed copy, row padding is dropped.
pub fn buffer_to_rgba_image(buffer: &PixelBuffer<'_, Srgba8>) -> RgbaImage {
    RgbaImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        Rgba(buffer.get(x, y).to_array())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_image_conversions() {
        let buffer = PixelBuffer::from_fn(5, 3, |x, y| Srgba8::new(x as u8, y as u8, 9, 200));
        let image = buffer_to_rgba_image(&buffer);
        assert_eq!(image.dimensions(), (5, 3));
        assert_eq!(image.get_pixel(4, 2), &Rgba([4, 2, 9, 200]));
        assert_eq!(buffer_from_rgba_image(&image), buffer);
    }

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.png");
        let buffer = PixelBuffer::from_fn(17, 9, |x, y| {
            Srgba8::new(x as u8 * 15, y as u8 * 28, 77, 255 - x as u8)
        });
        write_png(&buffer, &path).unwrap();
        assert_eq!(read_png(&path).unwrap(), buffer);
    }

    #[test]
    fn test_missing_png_is_io_error() {
        let err = read_png("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, crate::error::DaltonlensError::Io(_)));
    }
}
