pub mod image;
pub mod num;
pub mod pixel;

pub mod prelude {
    pub use super::pixel::{LinearRgb, Lms, Pixel, Srgba8, Xyz};
}
