//! Gabor texture analysis driver
//!
//! Usage: `cargo run --example texture_analysis -- <input> <output_prefix> [default|exhaustive]`
//!
//! Writes the raw channel dump to `<output_prefix>.bin`, one autoscaled magnitude
//! PNG per channel, the filter bank's frequency coverage and the reconstruction.

use gabor_texture::{
    save_component, save_response_bank, AnalysisConfig, BankPolicy, ComplexField, Component,
    ExportConfig, FilterBank, ResponseBank, Scaling,
};
use log::info;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <input> <output_prefix> [default|exhaustive]", args[0]);
        std::process::exit(2);
    }
    let input_path = &args[1];
    let prefix = &args[2];
    let policy: BankPolicy = match args.get(3) {
        Some(name) => name.parse()?,
        None => BankPolicy::Default,
    };

    let image = ComplexField::from_file(input_path)?;
    let config = AnalysisConfig {
        policy,
        ..AnalysisConfig::default()
    };

    let start_time = Instant::now();
    let responses = ResponseBank::analyse(&image, &config)?;
    let elapsed_time = start_time.elapsed();
    info!(
        "Analysed {}x{} image with {} filters in {:.3}ms",
        image.height(),
        image.width(),
        responses.num_channels(),
        elapsed_time.as_secs_f64() * 1e3
    );

    responses.save_dump(format!("{}.bin", prefix))?;

    let export = ExportConfig::default();
    save_response_bank(&responses, prefix, Component::Magnitude, Some(&export))?;

    let bank = FilterBank::from_policy(policy, image.height(), image.width())?;
    let coverage = bank.frequency_coverage()?;
    let coverage_path = format!("{}_coverage.png", prefix);
    save_component(&coverage, Component::Magnitude, Scaling::Auto, coverage_path, Some(&export))?;

    let reconstruction = responses.reconstruct()?;
    save_component(
        &reconstruction,
        Component::Real,
        Scaling::Auto,
        format!("{}_reconstruction.png", prefix),
        Some(&export),
    )?;

    Ok(())
}
