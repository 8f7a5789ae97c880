//! Gabor Texture Analysis Library
//!
//! Multi-orientation, multi-frequency texture analysis of grayscale images with
//! banks of complex Gabor filters, applied through FFT-based circular convolution,
//! plus an edge-preserving bilateral filter working on the same data model.
//!
//! ## Pipeline
//!
//! 1. **Load** an image as a `ComplexField` (grey intensity in the real part).
//! 2. **Generate** a `FilterBank` of `(freq, angle, sigma)` rows
//!    (`FilterBank::default_bank` or `FilterBank::exhaustive`).
//! 3. **Synthesize** each filter in the spatial domain (`image::gabor::synthesize`).
//! 4. **Convolve** it with the image in the frequency domain
//!    (`image::fft::FrequencyConvolver`), after phase-aligning the filter centre
//!    to the transform origin.
//! 5. **Collect** one response channel per filter in a `ResponseBank`, which can
//!    be reconstructed, dumped to disk, or exported as images.
//!
//! `image::bilateral::bilateral_filter` is an independent spatial-domain smoother.
//!
//! ## Boundaries
//!
//! All convolutions are circular: taps falling outside the field wrap to the
//! opposite edge.

pub mod error;
pub mod field;
pub mod image;

pub use crate::error::{GaborError, Result};
pub use crate::field::{ComplexField, Component};
pub use crate::image::bank::{BankPolicy, FilterBank};
pub use crate::image::bilateral::bilateral_filter;
pub use crate::image::fft::{convolve_spatial, shift_filter, FrequencyConvolver};
pub use crate::image::gabor::{synthesize, GaborParams};
pub use crate::image::response::{AnalysisConfig, ResponseBank};
pub use crate::image::{
    component_to_luma, save_component, save_response_bank, ExportConfig, Scaling,
};
