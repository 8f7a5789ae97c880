//! Spatial-domain Gabor filter synthesis
//!
//! A Gabor filter here is a Gaussian envelope of standard deviation `sigma`
//! multiplying a complex sinusoid of `freq` cycles/pixel along the axis rotated
//! by `angle`:
//!
//! ```text
//! g(x, y) = (1 / sigma²) · exp(-(x² + y²) / (2 sigma²)) · exp(i 2π freq x)
//! ```
//!
//! with `(x, y)` the pixel offset from the field centre rotated into the filter's
//! principal axis.

use crate::error::{GaborError, Result};
use crate::field::ComplexField;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Number of envelope standard deviations kept on each side by `support_size`
pub const SUPPORT_SIGMAS: f64 = 3.0;

/// One row of a filter bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaborParams {
    /// Centre frequency in cycles/pixel
    pub freq: f64,
    /// Orientation in radians
    pub angle: f64,
    /// Spatial envelope standard deviation in pixels
    pub sigma: f64,
}

impl GaborParams {
    pub fn new(freq: f64, angle: f64, sigma: f64) -> Self {
        Self { freq, angle, sigma }
    }

    /// Reject parameters that would produce NaN/Inf samples.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(GaborError::InvalidParameter(format!(
                "Gabor sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        if !(1.0 / (self.sigma * self.sigma)).is_finite() {
            return Err(GaborError::InvalidParameter(format!(
                "Gabor sigma {} is too small for a finite 1/sigma² gain",
                self.sigma
            )));
        }
        if !(self.freq.is_finite() && self.freq >= 0.0) {
            return Err(GaborError::InvalidParameter(format!(
                "Gabor frequency must be non-negative and finite, got {}",
                self.freq
            )));
        }
        if !self.angle.is_finite() {
            return Err(GaborError::InvalidParameter(format!(
                "Gabor angle must be finite, got {}",
                self.angle
            )));
        }
        Ok(())
    }

    /// Complex filter value at offset `(x_shift, y_shift)` from the filter centre.
    #[inline]
    pub fn evaluate(&self, x_shift: f64, y_shift: f64) -> Complex64 {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let x = x_shift * cos_a + y_shift * sin_a;
        let y = y_shift * cos_a - x_shift * sin_a;

        let u = x / self.sigma;
        let v = y / self.sigma;
        let envelope = (-0.5 * (u * u + v * v)).exp() / (self.sigma * self.sigma);
        Complex64::from_polar(envelope, 2.0 * PI * self.freq * x)
    }
}

/// Side length covering ±3σ of the envelope; always odd so the centre is a pixel.
pub fn support_size(sigma: f64) -> Result<u32> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(GaborError::InvalidParameter(format!(
            "support sigma must be positive and finite, got {}",
            sigma
        )));
    }
    let half = (SUPPORT_SIGMAS * sigma).ceil();
    if half >= (u32::MAX / 2) as f64 {
        return Err(GaborError::InvalidParameter(format!(
            "sigma {} gives an unrepresentable filter support",
            sigma
        )));
    }
    Ok(2 * half as u32 + 1)
}

/// Evaluate a Gabor filter on a `height` x `width` grid centred at `(height/2, width/2)`.
pub fn synthesize(params: GaborParams, height: u32, width: u32) -> Result<ComplexField> {
    params.validate()?;

    let centre_x = (width / 2) as f64;
    let centre_y = (height / 2) as f64;

    ComplexField::from_fn(height, width, |i, j| {
        params.evaluate(j as f64 - centre_x, i as f64 - centre_y)
    })
}

/// Synthesize a square filter sized from the envelope's effective support.
pub fn synthesize_with_support(params: GaborParams) -> Result<ComplexField> {
    params.validate()?;
    let size = support_size(params.sigma)?;
    synthesize(params, size, size)
}
