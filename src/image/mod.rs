pub mod bank;
pub mod bilateral;
pub mod fft;
pub mod gabor;
pub mod loader;
pub mod response;

use crate::error::{GaborError, Result};
use crate::field::{ComplexField, Component};
use crate::image::response::ResponseBank;
use image::GrayImage;
use log::info;
use std::path::{Path, PathBuf};

/// How component values map onto 0..=255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Stretch the field's own min..max onto the full range
    Auto,
    /// Map `min..max` linearly, clamping outside values
    Fixed { min: f64, max: f64 },
}

impl Scaling {
    /// Raw intensities, no rescaling
    pub const NONE: Scaling = Scaling::Fixed { min: 0.0, max: 255.0 };
}

/// Configuration for visual export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Whether images should be written at all
    pub enabled: bool,
    /// Base directory for written images
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: None,
        }
    }
}

impl ExportConfig {
    fn resolve<P: AsRef<Path>>(&self, filename: P) -> PathBuf {
        match self.output_dir {
            Some(ref dir) => dir.join(filename.as_ref()),
            None => filename.as_ref().to_path_buf(),
        }
    }
}

/// Render one component of `field` as an 8-bit grey image.
pub fn component_to_luma(
    field: &ComplexField,
    component: Component,
    scaling: Scaling,
) -> Result<GrayImage> {
    let values = field.component(component);

    let (min_val, max_val) = match scaling {
        Scaling::Auto => values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        Scaling::Fixed { min, max } => (min, max),
    };
    let range = max_val - min_val;

    let pixels: Vec<u8> = values
        .iter()
        .map(|&v| {
            if range > 0.0 {
                ((v - min_val) / range * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(field.width(), field.height(), pixels)
        .ok_or_else(|| GaborError::Other("Failed to build export image buffer".to_string()))
}

/// Save one component of `field` as an 8-bit image; a disabled config writes nothing.
///
/// Returns the written path, if any.
pub fn save_component<P: AsRef<Path>>(
    field: &ComplexField,
    component: Component,
    scaling: Scaling,
    filename: P,
    config: Option<&ExportConfig>,
) -> Result<Option<PathBuf>> {
    let default_config = ExportConfig::default();
    let config = config.unwrap_or(&default_config);
    if !config.enabled {
        return Ok(None);
    }

    let path = config.resolve(filename);
    component_to_luma(field, component, scaling)?.save(&path)?;
    info!("Saved {} component to {}", component.name(), path.display());
    Ok(Some(path))
}

/// Save every channel of `bank` as `{prefix}_{channel:02}_{component}.png`, autoscaled.
pub fn save_response_bank(
    bank: &ResponseBank,
    prefix: &str,
    component: Component,
    config: Option<&ExportConfig>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (index, channel) in bank.channels().iter().enumerate() {
        let filename = format!("{}_{:02}_{}.png", prefix, index, component.name());
        if let Some(path) = save_component(channel, component, Scaling::Auto, filename, config)? {
            written.push(path);
        }
    }
    Ok(written)
}
