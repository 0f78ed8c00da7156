use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    buffer::{OwnedPixelBuffer, PixelBuffer},
    utils::pixel::Srgba8,
};

/// Odd sizes so rows end inside a padding block and workgroups are partial.
pub const TEST_WIDTH: u32 = 97;
pub const TEST_HEIGHT: u32 = 61;

pub fn rand_srgba(rng: &mut impl Rng) -> Srgba8 {
    Srgba8::from_array(rng.random::<[u8; 4]>())
}

pub fn gen_random_image(width: u32, height: u32, seed: u64) -> OwnedPixelBuffer<Srgba8> {
    let mut rng = StdRng::seed_from_u64(seed);
    PixelBuffer::from_fn(width, height, |_, _| rand_srgba(&mut rng))
}

/// Every 8 bit gray level plus the primaries and secondaries, opaque.
pub fn gen_reference_image() -> OwnedPixelBuffer<Srgba8> {
    let mut pixels: Vec<Srgba8> = (0..=255u8).map(Srgba8::gray).collect();
    pixels.extend([
        Srgba8::opaque(255, 0, 0),
        Srgba8::opaque(0, 255, 0),
        Srgba8::opaque(0, 0, 255),
        Srgba8::opaque(255, 255, 0),
        Srgba8::opaque(0, 255, 255),
        Srgba8::opaque(255, 0, 255),
        Srgba8::opaque(0, 0, 0),
        Srgba8::opaque(255, 255, 255),
    ]);
    // 264 pixels
    PixelBuffer::from_pixels(24, pixels.len() as u32 / 24, &pixels)
}

/// Assert that two images match pixel by pixel
pub fn assert_images_match(
    a: &PixelBuffer<'_, Srgba8>,
    b: &PixelBuffer<'_, Srgba8>,
    label_a: &str,
    label_b: &str,
) {
    assert_images_close(a, b, 0, label_a, label_b);
}

/// Assert that every channel of two images is within `tolerance` levels
pub fn assert_images_close(
    a: &PixelBuffer<'_, Srgba8>,
    b: &PixelBuffer<'_, Srgba8>,
    tolerance: u8,
    label_a: &str,
    label_b: &str,
) {
    assert_eq!(a.shape(), b.shape(), "image shapes don't match");
    for y in 0..a.height() {
        for (x, (pa, pb)) in a.row(y).iter().zip(b.row(y).iter()).enumerate() {
            assert!(
                pa.max_channel_diff(*pb) <= tolerance,
                "Pixel mismatch at x={}, y={}: {}={:?}, {}={:?}",
                x,
                y,
                label_a,
                pa,
                label_b,
                pb
            );
        }
    }
}
