use approx::assert_abs_diff_eq;
use gabor_texture::image::bilateral::window_size;
use gabor_texture::{bilateral_filter, convolve_spatial, ComplexField};
use rustfft::num_complex::Complex64;

fn noisy_steps(height: u32, width: u32) -> ComplexField {
    ComplexField::from_fn(height, width, |r, c| {
        let level = if (r / 4 + c / 5) % 2 == 0 { 40.0 } else { 180.0 };
        Complex64::new(level + ((r * 31 + c * 17) % 7) as f64, ((r + c) % 3) as f64)
    })
    .unwrap()
}

/// Normalised circular Gaussian kernel on the bilateral window
fn gaussian_kernel(sigma: f64) -> ComplexField {
    let size = window_size(sigma).unwrap();
    let centre = (size / 2) as f64;
    let mut kernel = ComplexField::from_fn(size, size, |r, c| {
        let d2 = (r as f64 - centre).powi(2) + (c as f64 - centre).powi(2);
        Complex64::new((-d2 / (2.0 * sigma * sigma)).exp(), 0.0)
    })
    .unwrap();
    let total: f64 = kernel.samples().iter().map(|s| s.re).sum();
    for s in kernel.samples_mut() {
        *s /= total;
    }
    kernel
}

#[test]
fn test_tiny_spatial_sigma_is_identity() {
    let field = noisy_steps(12, 15);
    let out = bilateral_filter(&field, 0.1, 10.0).unwrap();
    assert_eq!(out, field);
}

#[test]
fn test_infinite_range_sigma_is_gaussian_blur() {
    let field = noisy_steps(16, 16);
    let expected = convolve_spatial(&field, &gaussian_kernel(1.0)).unwrap();

    for sigma_range in [f64::INFINITY, 1e12] {
        let out = bilateral_filter(&field, 1.0, sigma_range).unwrap();
        for (a, e) in out.samples().iter().zip(expected.samples()) {
            assert_abs_diff_eq!(a.re, e.re, epsilon = 1e-6);
            assert_abs_diff_eq!(a.im, e.im, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_large_range_sigma_converges_towards_blur() {
    let field = noisy_steps(16, 16);
    let blur = convolve_spatial(&field, &gaussian_kernel(1.0)).unwrap();

    let distance = |sigma_range: f64| -> f64 {
        let out = bilateral_filter(&field, 1.0, sigma_range).unwrap();
        out.samples()
            .iter()
            .zip(blur.samples())
            .map(|(a, b)| (a - b).norm_sqr())
            .sum()
    };

    let d_small = distance(10.0);
    let d_medium = distance(100.0);
    let d_large = distance(10000.0);
    assert!(d_small > d_medium);
    assert!(d_medium > d_large);
}

#[test]
fn test_normaliser_never_underflows() {
    // neighbours differ by far more than sigma_range: only the centre tap survives
    let field = ComplexField::from_fn(6, 6, |r, c| {
        Complex64::new(((r * 6 + c) as f64) * 1e6, 0.0)
    })
    .unwrap();
    let out = bilateral_filter(&field, 1.0, 1e-3).unwrap();
    for (a, b) in out.samples().iter().zip(field.samples()) {
        assert!(a.re.is_finite() && a.im.is_finite());
        assert_eq!(a, b);
    }
}
