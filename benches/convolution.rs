//! Benchmarks for frequency-domain vs. direct convolution and the bilateral filter

use criterion::{criterion_group, criterion_main, Criterion};
use gabor_texture::{
    bilateral_filter, convolve_spatial, ComplexField, FilterBank, FrequencyConvolver, ResponseBank,
};
use rustfft::num_complex::Complex64;

fn test_image(size: u32) -> ComplexField {
    ComplexField::from_fn(size, size, |r, c| Complex64::new(((r * 7 + c * 13) % 256) as f64, 0.0))
        .expect("Failed to build test image")
}

fn benchmark_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("gabor_convolution");
    group.sample_size(10);

    let image = test_image(64);
    let bank = FilterBank::default_bank(64, 64).expect("Failed to build bank");
    let filter = bank.synthesize_filter(0).expect("Failed to synthesize filter");

    let mut convolver = FrequencyConvolver::new(64, 64).expect("Failed to plan FFT");
    group.bench_function("frequency_64x64", |b| {
        b.iter(|| convolver.convolve(&image, &filter).expect("Convolution failed"))
    });

    group.bench_function("spatial_64x64", |b| {
        b.iter(|| convolve_spatial(&image, &filter).expect("Convolution failed"))
    });

    let large = test_image(256);
    let large_bank = FilterBank::default_bank(256, 256).expect("Failed to build bank");
    group.bench_function("default_bank_256x256", |b| {
        b.iter(|| ResponseBank::apply(&large, &large_bank).expect("Apply failed"))
    });

    group.finish();
}

fn benchmark_bilateral(c: &mut Criterion) {
    let mut group = c.benchmark_group("bilateral");
    group.sample_size(10);

    let image = test_image(64);
    group.bench_function("bilateral_64x64_sigma2", |b| {
        b.iter(|| bilateral_filter(&image, 2.0, 20.0).expect("Bilateral failed"))
    });

    group.finish();
}

criterion_group!(benches, benchmark_convolution, benchmark_bilateral);
criterion_main!(benches);
