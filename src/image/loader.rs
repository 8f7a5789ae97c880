use crate::error::Result;
use crate::field::ComplexField;
use image::{DynamicImage, GenericImageView, GrayImage};
use log::debug;
use rustfft::num_complex::Complex64;
use std::path::Path;

/// Scale factor mapping 16-bit grey levels onto the 8-bit range
const LUMA16_TO_LUMA8: f64 = 257.0;

impl ComplexField {
    /// Load an image from file as a grayscale complex field.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path.as_ref())?;
        debug!("Loaded {} ({}x{})", path.as_ref().display(), img.width(), img.height());
        Self::from_dynamic_image(img)
    }

    /// Convert a decoded image into a field: grey intensity in the real part, zero imaginary.
    ///
    /// 8-bit grey levels are kept as-is (0..=255). 16-bit grey is rescaled onto the
    /// same range, and colour images are converted to luma first.
    pub fn from_dynamic_image(img: DynamicImage) -> Result<Self> {
        let (width, height) = img.dimensions();

        match img {
            DynamicImage::ImageLuma8(img) => Self::from_luma(&img),
            DynamicImage::ImageLuma16(img) => {
                let values: Vec<f64> = img
                    .pixels()
                    .map(|pixel| pixel[0] as f64 / LUMA16_TO_LUMA8)
                    .collect();
                Self::from_real(height, width, &values)
            }
            other => Self::from_luma(&other.to_luma8()),
        }
    }

    pub fn from_luma(img: &GrayImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let mut field = ComplexField::zeros(height, width)?;
        for (sample, pixel) in field.samples_mut().iter_mut().zip(img.pixels()) {
            *sample = Complex64::new(pixel[0] as f64, 0.0);
        }
        Ok(field)
    }
}
