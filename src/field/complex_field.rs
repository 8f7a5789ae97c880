use crate::error::{GaborError, Result};
use rustfft::num_complex::Complex64;
use std::ops::{Index, IndexMut};

/// Scalar view of a complex sample, used for accessors and visual export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Magnitude,
    Phase,
    Real,
    Imaginary,
}

impl Component {
    pub fn of(self, sample: Complex64) -> f64 {
        match self {
            Component::Magnitude => sample.norm(),
            Component::Phase => sample.arg(),
            Component::Real => sample.re,
            Component::Imaginary => sample.im,
        }
    }

    /// Short lowercase name, used in exported file names
    pub fn name(self) -> &'static str {
        match self {
            Component::Magnitude => "magnitude",
            Component::Phase => "phase",
            Component::Real => "real",
            Component::Imaginary => "imag",
        }
    }
}

/// A 2D grid of complex samples stored row-major in one contiguous buffer.
///
/// The same type carries images, Gabor filters and convolution responses.
/// Sample `(row, col)` always lives at `samples[row * width + col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexField {
    samples: Vec<Complex64>,
    width: u32,
    height: u32,
}

impl ComplexField {
    /// Create a zero-filled field.
    ///
    /// Zero dimensions are rejected, and a failed reservation of the sample
    /// buffer is reported as `AllocationFailed` rather than aborting.
    pub fn zeros(height: u32, width: u32) -> Result<Self> {
        let len = Self::checked_len(height, width)?;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| GaborError::AllocationFailed { samples: len })?;
        samples.resize(len, Complex64::new(0.0, 0.0));

        Ok(Self {
            samples,
            width,
            height,
        })
    }

    /// Wrap an existing row-major sample buffer.
    pub fn from_samples(height: u32, width: u32, samples: Vec<Complex64>) -> Result<Self> {
        let len = Self::checked_len(height, width)?;
        if samples.len() != len {
            return Err(GaborError::InvalidParameter(format!(
                "expected {} samples for a {}x{} field, got {}",
                len,
                height,
                width,
                samples.len()
            )));
        }

        Ok(Self {
            samples,
            width,
            height,
        })
    }

    /// Build a field by evaluating `f(row, col)` for every sample.
    pub fn from_fn<F>(height: u32, width: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Complex64,
    {
        let mut field = Self::zeros(height, width)?;
        let w = width as usize;
        for (idx, sample) in field.samples.iter_mut().enumerate() {
            *sample = f(idx / w, idx % w);
        }
        Ok(field)
    }

    /// Build a field from real intensities; imaginary parts are zero.
    pub fn from_real(height: u32, width: u32, values: &[f64]) -> Result<Self> {
        let samples = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        Self::from_samples(height, width, samples)
    }

    fn checked_len(height: u32, width: u32) -> Result<usize> {
        if height == 0 || width == 0 {
            return Err(GaborError::EmptyField { height, width });
        }
        (height as usize)
            .checked_mul(width as usize)
            .ok_or(GaborError::AllocationFailed { samples: usize::MAX })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(height, width)`, the order used throughout the crate
    pub fn dims(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Complex64] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<Complex64> {
        self.samples
    }

    /// Sample at `(row, col)`, or `None` outside the field.
    pub fn get(&self, row: usize, col: usize) -> Option<&Complex64> {
        if row < self.height as usize && col < self.width as usize {
            Some(&self.samples[row * self.width as usize + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[Complex64] {
        let w = self.width as usize;
        &self.samples[row * w..(row + 1) * w]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, Complex64> {
        self.samples.chunks_exact(self.width as usize)
    }

    /// One scalar component of every sample, row-major.
    pub fn component(&self, component: Component) -> Vec<f64> {
        self.samples.iter().map(|&s| component.of(s)).collect()
    }

    pub fn magnitude(&self) -> Vec<f64> {
        self.component(Component::Magnitude)
    }

    pub fn phase(&self) -> Vec<f64> {
        self.component(Component::Phase)
    }

    pub fn real(&self) -> Vec<f64> {
        self.component(Component::Real)
    }

    pub fn imag(&self) -> Vec<f64> {
        self.component(Component::Imaginary)
    }

    /// Sum of squared magnitudes.
    pub fn energy(&self) -> f64 {
        self.samples.iter().map(|s| s.norm_sqr()).sum()
    }

    /// Fail with `DimensionMismatch` unless this field is `expected` = `(height, width)`.
    pub fn ensure_dims(&self, expected: (u32, u32), context: &'static str) -> Result<()> {
        if self.dims() != expected {
            return Err(GaborError::DimensionMismatch {
                context,
                expected,
                found: self.dims(),
            });
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for ComplexField {
    type Output = Complex64;

    fn index(&self, (row, col): (usize, usize)) -> &Complex64 {
        assert!(
            row < self.height as usize && col < self.width as usize,
            "index ({}, {}) out of bounds for {}x{} field",
            row,
            col,
            self.height,
            self.width
        );
        &self.samples[row * self.width as usize + col]
    }
}

impl IndexMut<(usize, usize)> for ComplexField {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Complex64 {
        assert!(
            row < self.height as usize && col < self.width as usize,
            "index ({}, {}) out of bounds for {}x{} field",
            row,
            col,
            self.height,
            self.width
        );
        &mut self.samples[row * self.width as usize + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_is_zero_filled() {
        let field = ComplexField::zeros(3, 5).unwrap();
        assert_eq!(field.dims(), (3, 5));
        assert_eq!(field.len(), 15);
        assert!(field.samples().iter().all(|s| *s == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            ComplexField::zeros(0, 4),
            Err(GaborError::EmptyField { height: 0, width: 4 })
        ));
        assert!(matches!(
            ComplexField::zeros(4, 0),
            Err(GaborError::EmptyField { .. })
        ));
    }

    #[test]
    fn test_row_major_indexing() {
        let field = ComplexField::from_fn(4, 6, |r, c| Complex64::new(r as f64, c as f64)).unwrap();
        for r in 0..4 {
            for c in 0..6 {
                assert_eq!(field[(r, c)], field.samples()[r * 6 + c]);
                assert_eq!(field[(r, c)], Complex64::new(r as f64, c as f64));
            }
        }
        assert_eq!(field.row(2)[5], Complex64::new(2.0, 5.0));
        assert_eq!(field.rows().count(), 4);
        assert!(field.get(4, 0).is_none());
        assert!(field.get(0, 6).is_none());
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds_panics() {
        let field = ComplexField::zeros(2, 2).unwrap();
        let _ = field[(0, 2)];
    }

    #[test]
    fn test_from_samples_length_checked() {
        let result = ComplexField::from_samples(2, 2, vec![Complex64::new(1.0, 0.0); 3]);
        assert!(matches!(result, Err(GaborError::InvalidParameter(_))));
    }

    #[test]
    fn test_components() {
        let samples = vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, -2.0)];
        let field = ComplexField::from_samples(1, 2, samples).unwrap();
        assert_eq!(field.magnitude(), vec![5.0, 2.0]);
        assert_eq!(field.real(), vec![3.0, 0.0]);
        assert_eq!(field.imag(), vec![4.0, -2.0]);
        assert_eq!(field.phase()[1], -std::f64::consts::FRAC_PI_2);
        assert_eq!(field.energy(), 29.0);
    }

    #[test]
    fn test_ensure_dims() {
        let field = ComplexField::zeros(2, 3).unwrap();
        assert!(field.ensure_dims((2, 3), "test").is_ok());
        assert!(matches!(
            field.ensure_dims((3, 2), "test"),
            Err(GaborError::DimensionMismatch { expected: (3, 2), found: (2, 3), .. })
        ));
    }
}
