//! Filter-bank responses of one image
//!
//! Applying a `FilterBank` to a field yields one complex response channel per
//! filter. Channels can be summed back into an approximation of the input, and
//! persisted in a raw binary dump:
//!
//! ```text
//! u32 height | u32 width | u32 num_channels | channel 0 samples | channel 1 samples | …
//! ```
//!
//! Header words are native-endian; each channel is `height * width` complex
//! doubles stored row-major as `(re, im)` pairs.

use crate::error::{GaborError, Result};
use crate::field::ComplexField;
use crate::image::bank::{BankPolicy, FilterBank};
use crate::image::fft::FrequencyConvolver;
use bytemuck::{Pod, Zeroable};
use log::{debug, info};
use rustfft::num_complex::Complex64;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Settings for a full analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Generator used to build the filter bank
    pub policy: BankPolicy,
    /// Spread filters over worker threads (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            policy: BankPolicy::Default,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
struct DumpHeader {
    height: u32,
    width: u32,
    num_channels: u32,
}

/// One response field per filter, all sharing the analysed image's size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBank {
    height: u32,
    width: u32,
    channels: Vec<ComplexField>,
}

impl ResponseBank {
    /// Collect existing channels, which must all be `height` x `width`.
    pub fn from_channels(height: u32, width: u32, channels: Vec<ComplexField>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(GaborError::EmptyField { height, width });
        }
        for channel in &channels {
            channel.ensure_dims((height, width), "response channel vs. bank")?;
        }
        Ok(Self {
            height,
            width,
            channels,
        })
    }

    /// Convolve `image` with every filter of `bank`, one after the other.
    pub fn apply(image: &ComplexField, bank: &FilterBank) -> Result<Self> {
        image.ensure_dims(bank.dims(), "image vs. filter bank")?;
        let (height, width) = image.dims();
        info!("Applying {} Gabor filters to {}x{} image", bank.num_filters(), height, width);

        let mut convolver = FrequencyConvolver::new(height, width)?;
        let mut channels = Vec::with_capacity(bank.num_filters());
        for index in 0..bank.num_filters() {
            let filter = bank.synthesize_filter(index)?;
            channels.push(convolver.convolve(image, &filter)?);
            debug!("Filter {}/{} applied", index + 1, bank.num_filters());
        }
        convolver.release_plans();

        Self::from_channels(height, width, channels)
    }

    /// Same result as `apply`, with filters spread over rayon workers.
    ///
    /// Each worker forks its own convolver: the FFT plans are shared, scratch
    /// buffers are not.
    #[cfg(feature = "parallel")]
    pub fn apply_parallel(image: &ComplexField, bank: &FilterBank) -> Result<Self> {
        use rayon::prelude::*;

        image.ensure_dims(bank.dims(), "image vs. filter bank")?;
        let (height, width) = image.dims();
        info!(
            "Applying {} Gabor filters to {}x{} image on {} threads",
            bank.num_filters(),
            height,
            width,
            rayon::current_num_threads()
        );

        let template = FrequencyConvolver::new(height, width)?;
        let channels = (0..bank.num_filters())
            .into_par_iter()
            .map_init(
                || template.fork(),
                |convolver, index| -> Result<ComplexField> {
                    let filter = bank.synthesize_filter(index)?;
                    let response = convolver.convolve(image, &filter)?;
                    debug!("Filter {}/{} applied", index + 1, bank.num_filters());
                    Ok(response)
                },
            )
            .collect::<Result<Vec<_>>>()?;

        Self::from_channels(height, width, channels)
    }

    /// Build the bank selected by `config` for `image` and apply it.
    pub fn analyse(image: &ComplexField, config: &AnalysisConfig) -> Result<Self> {
        let (height, width) = image.dims();
        let bank = FilterBank::from_policy(config.policy, height, width)?;

        #[cfg(feature = "parallel")]
        {
            if config.parallel {
                return Self::apply_parallel(image, &bank);
            }
        }

        Self::apply(image, &bank)
    }

    /// Sum the real parts of all channels.
    ///
    /// This only approximates the input: the bank does not tile the spectrum
    /// exactly and the filters' `1/sigma²` normalisation gives a passband gain
    /// well above one. An empty bank reconstructs to zeros.
    pub fn reconstruct(&self) -> Result<ComplexField> {
        let mut output = ComplexField::zeros(self.height, self.width)?;
        for channel in &self.channels {
            for (acc, value) in output.samples_mut().iter_mut().zip(channel.samples()) {
                acc.re += value.re;
            }
        }
        Ok(output)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
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

    pub fn channel(&self, index: usize) -> Option<&ComplexField> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[ComplexField] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<ComplexField> {
        self.channels
    }

    /// Write the binary channel dump.
    pub fn write_dump<W: Write>(&self, writer: &mut W) -> Result<()> {
        let num_channels = u32::try_from(self.channels.len()).map_err(|_| {
            GaborError::DumpFormat(format!(
                "{} channels exceed the u32 header",
                self.channels.len()
            ))
        })?;
        let header = DumpHeader {
            height: self.height,
            width: self.width,
            num_channels,
        };

        writer.write_all(bytemuck::bytes_of(&header))?;
        for channel in &self.channels {
            writer.write_all(bytemuck::cast_slice::<Complex64, u8>(channel.samples()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a binary channel dump written by `write_dump`.
    pub fn read_dump<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = DumpHeader::zeroed();
        reader
            .read_exact(bytemuck::bytes_of_mut(&mut header))
            .map_err(|e| GaborError::DumpFormat(format!("truncated header: {}", e)))?;

        if header.height == 0 || header.width == 0 {
            return Err(GaborError::DumpFormat(format!(
                "zero dimension in header: {}x{}",
                header.height, header.width
            )));
        }

        let mut channels = Vec::new();
        for index in 0..header.num_channels {
            let mut channel = ComplexField::zeros(header.height, header.width)?;
            reader
                .read_exact(bytemuck::cast_slice_mut::<Complex64, u8>(channel.samples_mut()))
                .map_err(|e| {
                    GaborError::DumpFormat(format!("channel {} truncated: {}", index, e))
                })?;
            channels.push(channel);
        }

        let mut probe = [0u8; 1];
        if reader.read(&mut probe)? != 0 {
            return Err(GaborError::DumpFormat(format!(
                "trailing data after {} channels",
                header.num_channels
            )));
        }

        Self::from_channels(header.height, header.width, channels)
    }

    pub fn save_dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_dump(&mut writer)?;
        info!(
            "Saved {} channels ({}x{}) to {}",
            self.num_channels(),
            self.height,
            self.width,
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load_dump<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let bank = Self::read_dump(&mut reader)?;
        info!(
            "Loaded {} channels ({}x{}) from {}",
            bank.num_channels(),
            bank.height,
            bank.width,
            path.as_ref().display()
        );
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_field(height: u32, width: u32) -> ComplexField {
        ComplexField::from_fn(height, width, |r, c| {
            Complex64::new((r as f64 * 0.7).sin() + c as f64, r as f64)
        })
        .unwrap()
    }

    #[test]
    fn test_apply_rejects_mismatched_bank() {
        let image = sample_field(16, 16);
        let bank = FilterBank::default_bank(16, 32).unwrap();
        assert!(matches!(
            ResponseBank::apply(&image, &bank),
            Err(GaborError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_one_channel_per_filter() {
        let image = sample_field(16, 12);
        let bank = FilterBank::default_bank(16, 12).unwrap();
        let responses = ResponseBank::apply(&image, &bank).unwrap();
        assert_eq!(responses.num_channels(), 16);
        assert!(responses.channels().iter().all(|c| c.dims() == (16, 12)));
    }

    #[test]
    fn test_empty_bank_reconstructs_to_zero() {
        let image = sample_field(8, 8);
        let bank = FilterBank::from_params(8, 8, &[]).unwrap();
        let responses = ResponseBank::apply(&image, &bank).unwrap();
        assert_eq!(responses.num_channels(), 0);
        assert_eq!(responses.reconstruct().unwrap().energy(), 0.0);
    }

    #[test]
    fn test_reconstruct_sums_real_parts() {
        let a = vec![Complex64::new(1.0, 5.0), Complex64::new(2.0, 0.0)];
        let b = vec![Complex64::new(-3.0, 1.0), Complex64::new(0.5, -9.0)];
        let a = ComplexField::from_samples(1, 2, a).unwrap();
        let b = ComplexField::from_samples(1, 2, b).unwrap();
        let responses = ResponseBank::from_channels(1, 2, vec![a, b]).unwrap();
        let sum = responses.reconstruct().unwrap();
        assert_eq!(sum.samples(), &[Complex64::new(-2.0, 0.0), Complex64::new(2.5, 0.0)]);
    }

    #[test]
    fn test_from_channels_checks_dims() {
        let channels = vec![sample_field(4, 4), sample_field(4, 5)];
        let result = ResponseBank::from_channels(4, 4, channels);
        assert!(matches!(result, Err(GaborError::DimensionMismatch { .. })));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        use crate::image::gabor::GaborParams;

        let image = sample_field(16, 20);
        let bank = FilterBank::from_params(
            16,
            20,
            &[
                GaborParams::new(0.25, 0.0, 2.0),
                GaborParams::new(0.125, 1.0, 3.0),
                GaborParams::new(0.3, 2.5, 1.5),
            ],
        )
        .unwrap();

        let sequential = ResponseBank::apply(&image, &bank).unwrap();
        let parallel = ResponseBank::apply_parallel(&image, &bank).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_dump_rejects_truncated_and_trailing_data() {
        let responses = ResponseBank::from_channels(2, 3, vec![sample_field(2, 3)]).unwrap();
        let mut bytes = Vec::new();
        responses.write_dump(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 12 + 2 * 3 * 16);

        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            ResponseBank::read_dump(&mut &truncated[..]),
            Err(GaborError::DumpFormat(_))
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            ResponseBank::read_dump(&mut &trailing[..]),
            Err(GaborError::DumpFormat(_))
        ));

        assert_eq!(ResponseBank::read_dump(&mut &bytes[..]).unwrap(), responses);
    }
}
