//! FFT-based circular convolution of complex fields
//!
//! Both operands are forward-transformed, multiplied pointwise and inverse
//! transformed. Filters are phase-aligned first: the transform treats index
//! `(0, 0)` as the origin, so a spatially centred complex filter would otherwise
//! pick up a linear phase ramp that corrupts the complex response.
//!
//! Planning is the expensive step, so a `FrequencyConvolver` plans once for one
//! `(height, width)` and is reused for every filter applied at that size.

use crate::error::{GaborError, Result};
use crate::field::ComplexField;
use log::{debug, info};
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Forward and inverse plans for one field size.
///
/// rustfft plans are immutable and `Sync`, so clones share them across threads;
/// only scratch buffers must stay private to a worker.
#[derive(Clone)]
struct FftPlans {
    height: u32,
    width: u32,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl FftPlans {
    fn new(height: u32, width: u32) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            row_forward: planner.plan_fft_forward(width as usize),
            row_inverse: planner.plan_fft_inverse(width as usize),
            col_forward: planner.plan_fft_forward(height as usize),
            col_inverse: planner.plan_fft_inverse(height as usize),
        }
    }

    fn scratch_len(&self) -> usize {
        [
            &self.row_forward,
            &self.row_inverse,
            &self.col_forward,
            &self.col_inverse,
        ]
        .iter()
        .map(|fft| fft.get_inplace_scratch_len())
        .max()
        .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

/// Reusable frequency-domain convolution engine for one field size.
pub struct FrequencyConvolver {
    plans: Option<FftPlans>,
    image_buf: ComplexField,
    filter_buf: ComplexField,
    transposed: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FrequencyConvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyConvolver")
            .field("dims", &self.image_buf.dims())
            .field("planned", &self.plans.is_some())
            .finish()
    }
}

impl FrequencyConvolver {
    /// Plan transforms for `height` x `width` fields and allocate scratch buffers.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        let image_buf = ComplexField::zeros(height, width)?;
        let filter_buf = ComplexField::zeros(height, width)?;

        info!("Planning 2D FFT for {}x{} fields…", height, width);
        let plans = FftPlans::new(height, width);
        Ok(Self::with_plans(plans, image_buf, filter_buf))
    }

    fn with_plans(plans: FftPlans, image_buf: ComplexField, filter_buf: ComplexField) -> Self {
        let scratch = vec![Complex64::new(0.0, 0.0); plans.scratch_len()];
        let transposed = vec![Complex64::new(0.0, 0.0); image_buf.len()];
        Self {
            plans: Some(plans),
            image_buf,
            filter_buf,
            transposed,
            scratch,
        }
    }

    /// `(height, width)` the convolver was planned for
    pub fn dims(&self) -> (u32, u32) {
        self.image_buf.dims()
    }

    pub fn is_planned(&self) -> bool {
        self.plans.is_some()
    }

    /// A convolver for another worker thread: shares the plans, owns fresh scratch.
    pub fn fork(&self) -> Self {
        let (height, width) = self.dims();
        Self {
            plans: self.plans.clone(),
            image_buf: self.image_buf.clone(),
            filter_buf: self.filter_buf.clone(),
            transposed: vec![Complex64::new(0.0, 0.0); (height as usize) * (width as usize)],
            scratch: vec![Complex64::new(0.0, 0.0); self.scratch.len()],
        }
    }

    /// Discard the cached plans and plan again for a new size.
    pub fn replan(&mut self, height: u32, width: u32) -> Result<()> {
        if self.plans.is_some() && self.dims() == (height, width) {
            return Ok(());
        }
        *self = Self::new(height, width)?;
        Ok(())
    }

    /// Free the cached plans; later convolutions fail with `PlansReleased`.
    pub fn release_plans(&mut self) {
        if self.plans.take().is_some() {
            let (height, width) = self.dims();
            debug!("Released FFT plans for {}x{}", height, width);
            self.scratch = Vec::new();
            self.transposed = Vec::new();
        }
    }

    /// Circularly convolve `image` with `filter` into a new field.
    pub fn convolve(
        &mut self,
        image: &ComplexField,
        filter: &ComplexField,
    ) -> Result<ComplexField> {
        let (height, width) = self.dims();
        let mut output = ComplexField::zeros(height, width)?;
        self.convolve_into(image, &mut output, filter)?;
        Ok(output)
    }

    /// Circularly convolve `image` with `filter`, writing the normalised result into `output`.
    ///
    /// `image` and `output` must match the planned size. `filter` may be smaller;
    /// its centre `(fh/2, fw/2)` is placed on the field centre before shifting.
    pub fn convolve_into(
        &mut self,
        image: &ComplexField,
        output: &mut ComplexField,
        filter: &ComplexField,
    ) -> Result<()> {
        let plans = self.plans.clone().ok_or(GaborError::PlansReleased)?;
        let dims = (plans.height, plans.width);
        image.ensure_dims(dims, "convolution input vs. FFT plan")?;
        output.ensure_dims(dims, "convolution output vs. FFT plan")?;

        self.image_buf.samples_mut().copy_from_slice(image.samples());
        self.load_filter(filter)?;

        transform_2d(
            &plans,
            &mut self.image_buf,
            &mut self.transposed,
            &mut self.scratch,
            Direction::Forward,
        );
        transform_2d(
            &plans,
            &mut self.filter_buf,
            &mut self.transposed,
            &mut self.scratch,
            Direction::Forward,
        );

        for (img, filt) in self
            .image_buf
            .samples_mut()
            .iter_mut()
            .zip(self.filter_buf.samples())
        {
            *img *= *filt;
        }

        transform_2d(
            &plans,
            &mut self.image_buf,
            &mut self.transposed,
            &mut self.scratch,
            Direction::Inverse,
        );

        let normalisation = (plans.height as f64) * (plans.width as f64);
        for (out, value) in output.samples_mut().iter_mut().zip(self.image_buf.samples()) {
            *out = *value / normalisation;
        }

        Ok(())
    }

    /// Unnormalised forward transform of a phase-aligned filter.
    pub fn spectrum(&mut self, filter: &ComplexField) -> Result<ComplexField> {
        let plans = self.plans.clone().ok_or(GaborError::PlansReleased)?;
        self.load_filter(filter)?;
        transform_2d(
            &plans,
            &mut self.filter_buf,
            &mut self.transposed,
            &mut self.scratch,
            Direction::Forward,
        );
        Ok(self.filter_buf.clone())
    }

    /// Copy `filter` centred into the plan-sized buffer and move its centre to the origin.
    fn load_filter(&mut self, filter: &ComplexField) -> Result<()> {
        let (height, width) = self.dims();
        let (fh, fw) = filter.dims();
        if fh > height || fw > width {
            return Err(GaborError::DimensionMismatch {
                context: "filter larger than FFT plan",
                expected: (height, width),
                found: (fh, fw),
            });
        }

        if (fh, fw) == (height, width) {
            self.filter_buf.samples_mut().copy_from_slice(filter.samples());
        } else {
            self.filter_buf
                .samples_mut()
                .fill(Complex64::new(0.0, 0.0));
            let row_offset = (height / 2 - fh / 2) as usize;
            let col_offset = (width / 2 - fw / 2) as usize;
            let w = width as usize;
            for (r, src) in filter.rows().enumerate() {
                let start = (r + row_offset) * w + col_offset;
                self.filter_buf.samples_mut()[start..start + fw as usize].copy_from_slice(src);
            }
        }

        shift_filter(&mut self.filter_buf);
        Ok(())
    }
}

/// In-place 2D transform: rows, transpose, columns, transpose back.
fn transform_2d(
    plans: &FftPlans,
    field: &mut ComplexField,
    transposed: &mut [Complex64],
    scratch: &mut [Complex64],
    direction: Direction,
) {
    let (row_fft, col_fft) = match direction {
        Direction::Forward => (&plans.row_forward, &plans.col_forward),
        Direction::Inverse => (&plans.row_inverse, &plans.col_inverse),
    };
    let width = plans.width as usize;
    let height = plans.height as usize;
    let data = field.samples_mut();

    // rustfft processes every length-`width` chunk of the buffer
    row_fft.process_with_scratch(data, scratch);

    for (y, row) in data.chunks_exact(width).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            transposed[x * height + y] = value;
        }
    }

    col_fft.process_with_scratch(transposed, scratch);

    for (x, col) in transposed.chunks_exact(height).enumerate() {
        for (y, &value) in col.iter().enumerate() {
            data[y * width + x] = value;
        }
    }
}

/// Circularly shift `field` in place so that sample `(height/2, width/2)` lands at `(0, 0)`.
///
/// For even dimensions this is the quadrant swap (top-left with bottom-right,
/// top-right with bottom-left), and applying it twice restores the field.
/// This mutates the caller's field.
pub fn shift_filter(field: &mut ComplexField) {
    let (height, width) = field.dims();
    let centre_x = (width / 2) as usize;
    let centre_y = (height / 2) as usize;
    let w = width as usize;

    let samples = field.samples_mut();
    for row in samples.chunks_exact_mut(w) {
        row.rotate_left(centre_x);
    }
    samples.rotate_left(centre_y * w);
}

/// Direct O(H·W·Fh·Fw) circular convolution.
///
/// Produces the same result as `FrequencyConvolver::convolve` up to rounding and
/// serves as an independent check on the frequency path.
pub fn convolve_spatial(image: &ComplexField, filter: &ComplexField) -> Result<ComplexField> {
    let (height, width) = image.dims();
    let (fh, fw) = filter.dims();
    let centre_y = (fh / 2) as i64;
    let centre_x = (fw / 2) as i64;
    let h = height as i64;
    let w = width as i64;

    let mut output = ComplexField::zeros(height, width)?;
    for i in 0..height as usize {
        for j in 0..width as usize {
            let mut acc = Complex64::new(0.0, 0.0);
            for (m, filter_row) in filter.rows().enumerate() {
                let img_y = (i as i64 - (m as i64 - centre_y)).rem_euclid(h) as usize;
                let image_row = image.row(img_y);
                for (n, &tap) in filter_row.iter().enumerate() {
                    let img_x = (j as i64 - (n as i64 - centre_x)).rem_euclid(w) as usize;
                    acc += image_row[img_x] * tap;
                }
            }
            output[(i, j)] = acc;
        }
    }

    Ok(output)
}
