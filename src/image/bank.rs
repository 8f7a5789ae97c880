//! Gabor filter bank generation
//!
//! Two policies build the `(freq, angle, sigma)` rows of a bank:
//!
//! - **Default**: 4 orientations × 4 octave-spaced frequencies, each with a
//!   one-octave bandwidth envelope.
//! - **Exhaustive**: a lattice of equal-width frequency lobes tiling the
//!   non-negative half of the frequency plane up to Nyquist at FWHM spacing.
//!
//! Both are sized to an explicit `(height, width)` the filters will be
//! synthesized at.

use crate::error::{GaborError, Result};
use crate::field::ComplexField;
use crate::image::fft::FrequencyConvolver;
use crate::image::gabor::{synthesize, GaborParams};
use log::{debug, info, warn};
use rustfft::num_complex::Complex64;
use std::f64::consts::{LN_2, PI, SQRT_2};

/// Orientations of the default bank, in radians
pub const DEFAULT_ANGLES: [f64; 4] = [0.0, PI / 4.0, PI / 2.0, 3.0 * PI / 4.0];

/// Centre frequencies of the default bank (2⁻² … 2⁻⁵ cycles/pixel)
pub const DEFAULT_FREQS: [f64; 4] = [0.25, 0.125, 0.0625, 0.03125];

/// Exhaustive lobes have a full width at half maximum of this many cycles per image width
pub const EXHAUSTIVE_BANDWIDTH_CYCLES: f64 = 16.0;

/// Nyquist frequency in cycles/pixel
pub const NYQUIST: f64 = 0.5;

/// Which generator to build a bank with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BankPolicy {
    #[default]
    Default,
    Exhaustive,
}

impl std::str::FromStr for BankPolicy {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(BankPolicy::Default),
            "exhaustive" => Ok(BankPolicy::Exhaustive),
            other => Err(GaborError::InvalidParameter(format!(
                "unknown bank policy '{}', expected 'default' or 'exhaustive'",
                other
            ))),
        }
    }
}

/// Spatial sigma giving a one-octave bandwidth at `freq`.
pub fn octave_sigma(freq: f64) -> f64 {
    3.0 * LN_2.sqrt() / (SQRT_2 * PI * freq)
}

/// FWHM factor of a Gaussian: FWHM = 2·sqrt(2 ln 2)·σ
fn fwhm_factor() -> f64 {
    2.0 * (2.0 * LN_2).sqrt()
}

/// Frequency-domain sigma whose lobe FWHM is `EXHAUSTIVE_BANDWIDTH_CYCLES / width`.
pub fn exhaustive_sigma_freq(width: u32) -> f64 {
    EXHAUSTIVE_BANDWIDTH_CYCLES / (width as f64 * fwhm_factor())
}

/// Number of FWHM-spaced lobes fitting between 0 and Nyquist:
/// `floor(0.5 / (2·sigma_freq·sqrt(2 ln 2)))`.
///
/// Fails when the `2·count²` lattice would not fit in a bank.
pub fn exhaustive_filter_count(sigma_freq: f64) -> Result<u32> {
    let lobes = NYQUIST / (sigma_freq * fwhm_factor());
    // absorb rounding when the ratio is an exact integer, e.g. width = 64
    let count = (lobes * (1.0 + 1e-12)).floor() as u64;
    count
        .checked_mul(count)
        .and_then(|sq| sq.checked_mul(2))
        .filter(|&total| total <= u32::MAX as u64)
        .map(|_| count as u32)
        .ok_or_else(|| {
            GaborError::InvalidParameter(format!(
                "frequency resolution {} needs a {}-lobe lattice, too many filters",
                sigma_freq, count
            ))
        })
}

/// Copy one parameter column out of `params`, reporting allocation failure.
fn collect_column(
    params: &[GaborParams],
    column: impl Fn(&GaborParams) -> f64,
) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(params.len())
        .map_err(|_| GaborError::AllocationFailed { samples: params.len() })?;
    values.extend(params.iter().map(column));
    Ok(values)
}

/// A set of Gabor parameters sharing one target field size.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    height: u32,
    width: u32,
    angles: Vec<f64>,
    freqs: Vec<f64>,
    sigmas: Vec<f64>,
}

impl FilterBank {
    /// Build a bank from explicit rows; an empty bank is allowed.
    pub fn from_params(height: u32, width: u32, params: &[GaborParams]) -> Result<Self> {
        let angles = collect_column(params, |p| p.angle)?;
        let freqs = collect_column(params, |p| p.freq)?;
        let sigmas = collect_column(params, |p| p.sigma)?;
        Self::from_arrays(height, width, angles, freqs, sigmas)
    }

    /// Build a bank from parallel parameter arrays, which must have equal length.
    pub fn from_arrays(
        height: u32,
        width: u32,
        angles: Vec<f64>,
        freqs: Vec<f64>,
        sigmas: Vec<f64>,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(GaborError::EmptyField { height, width });
        }
        if angles.len() != freqs.len() || freqs.len() != sigmas.len() {
            return Err(GaborError::InvalidParameter(format!(
                "filter bank arrays differ in length: {} angles, {} freqs, {} sigmas",
                angles.len(),
                freqs.len(),
                sigmas.len()
            )));
        }
        if u32::try_from(angles.len()).is_err() {
            return Err(GaborError::InvalidParameter(format!(
                "filter bank with {} filters is too large",
                angles.len()
            )));
        }

        let bank = Self {
            height,
            width,
            angles,
            freqs,
            sigmas,
        };
        for params in bank.iter() {
            params.validate()?;
            if params.freq <= 0.0 {
                return Err(GaborError::InvalidParameter(format!(
                    "filter bank frequencies must be positive, got {}",
                    params.freq
                )));
            }
        }
        Ok(bank)
    }

    /// 16 filters: every angle in `DEFAULT_ANGLES` with every frequency in
    /// `DEFAULT_FREQS` (angle-major order), sigma from `octave_sigma`.
    pub fn default_bank(height: u32, width: u32) -> Result<Self> {
        let params: Vec<GaborParams> = DEFAULT_ANGLES
            .iter()
            .flat_map(|&angle| {
                DEFAULT_FREQS
                    .iter()
                    .map(move |&freq| GaborParams::new(freq, angle, octave_sigma(freq)))
            })
            .collect();

        let bank = Self::from_params(height, width, &params)?;
        info!("Built default Gabor bank: {} filters for {}x{}", bank.num_filters(), height, width);
        Ok(bank)
    }

    /// Exhaustive bank with lobe FWHM of `EXHAUSTIVE_BANDWIDTH_CYCLES / width`.
    pub fn exhaustive(height: u32, width: u32) -> Result<Self> {
        if width == 0 {
            return Err(GaborError::EmptyField { height, width });
        }
        Self::exhaustive_with_resolution(height, width, exhaustive_sigma_freq(width))
    }

    /// Exhaustive bank for an explicit frequency-domain sigma.
    ///
    /// Lattice points `(n, m)` with `n ∈ [-count, count)` and `m ∈ [0, count)`
    /// sit at odd multiples of the half-FWHM, so only the `y >= 0` half-plane is
    /// sampled. A real image's spectrum is Hermitian, but the filters are complex
    /// and are not symmetrised, so this asymmetry is kept on purpose.
    pub fn exhaustive_with_resolution(height: u32, width: u32, sigma_freq: f64) -> Result<Self> {
        if !(sigma_freq.is_finite() && sigma_freq > 0.0) {
            return Err(GaborError::InvalidParameter(format!(
                "frequency resolution must be positive and finite, got {}",
                sigma_freq
            )));
        }

        let count = exhaustive_filter_count(sigma_freq)? as i64;
        if count == 0 {
            warn!(
                "Frequency resolution {} is too coarse for any lobe below Nyquist; bank is empty",
                sigma_freq
            );
        }

        let step = sigma_freq * (2.0 * LN_2).sqrt();
        let sigma = 1.0 / (2.0 * PI * sigma_freq);

        let total = (2 * count * count) as usize;
        let mut params: Vec<GaborParams> = Vec::new();
        params
            .try_reserve_exact(total)
            .map_err(|_| GaborError::AllocationFailed { samples: total })?;
        params.extend(
            (-count..count)
                .flat_map(|n| (0..count).map(move |m| (n, m)))
                .map(|(n, m)| {
                    let xfreq = (2 * n + 1) as f64 * step;
                    let yfreq = (2 * m + 1) as f64 * step;
                    GaborParams::new(xfreq.hypot(yfreq), yfreq.atan2(xfreq), sigma)
                }),
        );

        let bank = Self::from_params(height, width, &params)?;
        info!(
            "Built exhaustive Gabor bank: {} filters ({}x{} lattice) for {}x{}",
            bank.num_filters(),
            2 * count,
            count,
            height,
            width
        );
        Ok(bank)
    }

    pub fn from_policy(policy: BankPolicy, height: u32, width: u32) -> Result<Self> {
        match policy {
            BankPolicy::Default => Self::default_bank(height, width),
            BankPolicy::Exhaustive => Self::exhaustive(height, width),
        }
    }

    pub fn num_filters(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn sigmas(&self) -> &[f64] {
        &self.sigmas
    }

    pub fn params(&self, index: usize) -> Option<GaborParams> {
        if index < self.num_filters() {
            Some(GaborParams::new(self.freqs[index], self.angles[index], self.sigmas[index]))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = GaborParams> + '_ {
        (0..self.num_filters())
            .map(move |i| GaborParams::new(self.freqs[i], self.angles[i], self.sigmas[i]))
    }

    /// Synthesize filter `index` at the bank's target size.
    pub fn synthesize_filter(&self, index: usize) -> Result<ComplexField> {
        let params = self.params(index).ok_or_else(|| {
            GaborError::InvalidParameter(format!(
                "filter index {} out of range for a bank of {}",
                index,
                self.num_filters()
            ))
        })?;
        synthesize(params, self.height, self.width)
    }

    /// Sum of every filter's spectrum magnitude, with DC moved to the centre for viewing.
    pub fn frequency_coverage(&self) -> Result<ComplexField> {
        let mut convolver = FrequencyConvolver::new(self.height, self.width)?;
        let mut coverage = ComplexField::zeros(self.height, self.width)?;

        for index in 0..self.num_filters() {
            let filter = self.synthesize_filter(index)?;
            let spectrum = convolver.spectrum(&filter)?;
            for (acc, value) in coverage.samples_mut().iter_mut().zip(spectrum.samples()) {
                *acc += Complex64::new(value.norm(), 0.0);
            }
            debug!("Accumulated coverage of filter {}/{}", index + 1, self.num_filters());
        }

        centre_spectrum(&mut coverage);
        Ok(coverage)
    }
}

/// Move the DC sample at `(0, 0)` to `(height/2, width/2)`, undoing `shift_filter`.
fn centre_spectrum(field: &mut ComplexField) {
    let (height, width) = field.dims();
    let w = width as usize;
    let samples = field.samples_mut();
    for row in samples.chunks_exact_mut(w) {
        row.rotate_right((width / 2) as usize);
    }
    samples.rotate_right((height / 2) as usize * w);
}
