//! Colour vision deficiency simulation and daltonization.
//!
//! Images go sRGB -> linear RGB -> LMS, get projected onto a dichromat's
//! cone plane and come back, optionally with the lost contrast pushed into
//! the channels the viewer still perceives. The same pipeline runs on the
//! CPU (sequential or rayon rows) and as a wgpu compute shader.
//!
//! ```no_run
//! use daltonlens::prelude::*;
//!
//! let input = daltonlens::utils::image::read_png("in.png")?;
//! let mut output = PixelBuffer::empty();
//! let mut processor = FilterProcessor::new(Backend::Auto, Transfer::Legacy);
//! processor.process(&Filter::daltonize(Deficiency::Deuteranope, 1.0), &input, &mut output)?;
//! daltonlens::utils::image::write_png(&output, "out.png")?;
//! # Ok::<(), daltonlens::error::DaltonlensError>(())
//! ```

pub mod buffer;
pub mod cbcr;
pub mod color;
pub mod config;
pub mod daltonize;
pub mod error;
pub mod filter;
pub mod gpu;
pub mod hsv;
pub mod simulation;
pub mod transform;
pub mod utils;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::buffer::{OwnedPixelBuffer, PixelBuffer};
    pub use crate::color::Transfer;
    pub use crate::config::ProcessConfig;
    pub use crate::error::{DaltonlensError, Result};
    pub use crate::filter::{Backend, DaltonizeParams, Filter, FilterProcessor};
    pub use crate::hsv::{HsvParams, HueQuantization};
    pub use crate::simulation::Deficiency;
    pub use crate::transform::CpuStrategy;
    pub use crate::utils::prelude::*;
}
