//! Edge-preserving bilateral smoothing
//!
//! Each output sample is a normalised average of its neighbourhood weighted by
//! a spatial Gaussian (distance from the centre pixel) times a range Gaussian
//! (difference in magnitude from the centre pixel). The range term depends on
//! the signal, so the operator is not shift-invariant and is evaluated directly
//! in the spatial domain rather than through the FFT engine.
//!
//! Neighbourhoods wrap around the field edges, consistent with the circular
//! convolution used elsewhere in the crate.

use crate::error::{GaborError, Result};
use crate::field::ComplexField;
use log::debug;
use rustfft::num_complex::Complex64;

/// Window side length: `6·sigma_spatial + 1` truncated, i.e. about ±3σ.
pub fn window_size(sigma_spatial: f64) -> Result<u32> {
    if !(sigma_spatial.is_finite() && sigma_spatial > 0.0) {
        return Err(GaborError::InvalidParameter(format!(
            "bilateral sigma_spatial must be positive and finite, got {}",
            sigma_spatial
        )));
    }
    let size = 6.0 * sigma_spatial + 1.0;
    if size >= u32::MAX as f64 {
        return Err(GaborError::InvalidParameter(format!(
            "bilateral sigma_spatial {} gives an unrepresentable window",
            sigma_spatial
        )));
    }
    Ok(size as u32)
}

/// Apply a bilateral filter to `input`.
///
/// `sigma_range` may be `f64::INFINITY`, which removes the range term and
/// leaves a plain circular Gaussian blur.
pub fn bilateral_filter(
    input: &ComplexField,
    sigma_spatial: f64,
    sigma_range: f64,
) -> Result<ComplexField> {
    let size = window_size(sigma_spatial)?;
    if sigma_range.is_nan() || sigma_range <= 0.0 {
        return Err(GaborError::InvalidParameter(format!(
            "bilateral sigma_range must be positive, got {}",
            sigma_range
        )));
    }

    let (height, width) = input.dims();
    debug!(
        "Bilateral filter on {}x{} field, window {}x{}, sigma_spatial {}, sigma_range {}",
        height, width, size, size, sigma_spatial, sigma_range
    );

    let centre = (size / 2) as i64;
    let h = height as i64;
    let w = width as i64;

    // Spatial weights only depend on the window offset
    let spatial_weights: Vec<f64> = (0..size as i64)
        .flat_map(|m| (0..size as i64).map(move |n| (m - centre, n - centre)))
        .map(|(dy, dx)| {
            let u = dx as f64 / sigma_spatial;
            let v = dy as f64 / sigma_spatial;
            (-0.5 * (u * u + v * v)).exp()
        })
        .collect();

    let magnitudes = input.magnitude();
    let mut output = ComplexField::zeros(height, width)?;

    for i in 0..h {
        for j in 0..w {
            let centre_magnitude = magnitudes[(i * w + j) as usize];
            let mut normaliser = 0.0;
            let mut acc = Complex64::new(0.0, 0.0);

            for (k, &spatial_weight) in spatial_weights.iter().enumerate() {
                let dy = (k as i64) / size as i64 - centre;
                let dx = (k as i64) % size as i64 - centre;
                let img_y = (i + dy).rem_euclid(h);
                let img_x = (j + dx).rem_euclid(w);
                let idx = (img_y * w + img_x) as usize;

                let range_diff = (magnitudes[idx] - centre_magnitude) / sigma_range;
                let weight = spatial_weight * (-0.5 * range_diff * range_diff).exp();

                normaliser += weight;
                acc += input.samples()[idx] * weight;
            }

            // The centre tap always contributes weight 1, so the normaliser is >= 1
            output[(i as usize, j as usize)] = acc / normaliser;
        }
    }

    Ok(output)
}
