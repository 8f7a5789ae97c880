use gabor_texture::{ComplexField, FilterBank, GaborError, ResponseBank};
use rustfft::num_complex::Complex64;
use std::io::Write;

fn ramp(height: u32, width: u32) -> ComplexField {
    ComplexField::from_fn(height, width, |r, c| {
        Complex64::new(r as f64 * 3.5 - c as f64, (r * c) as f64 / 7.0)
    })
    .unwrap()
}

#[test]
fn test_dump_round_trip_is_bit_exact() {
    let image = ramp(12, 20);
    let bank = FilterBank::default_bank(12, 20).unwrap();
    let responses = ResponseBank::apply(&image, &bank).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.bin");
    responses.save_dump(&path).unwrap();

    let expected_len = 12 + 16 * 12 * 20 * 16;
    assert_eq!(std::fs::metadata(&path).unwrap().len(), expected_len as u64);

    let loaded = ResponseBank::load_dump(&path).unwrap();
    assert_eq!(loaded.dims(), (12, 20));
    assert_eq!(loaded.num_channels(), 16);
    for (a, b) in loaded.channels().iter().zip(responses.channels()) {
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert_eq!(x.re.to_bits(), y.re.to_bits());
            assert_eq!(x.im.to_bits(), y.im.to_bits());
        }
    }
}

#[test]
fn test_dump_header_field_order() {
    let responses = ResponseBank::from_channels(3, 5, vec![ramp(3, 5), ramp(3, 5)]).unwrap();
    let mut bytes = Vec::new();
    responses.write_dump(&mut bytes).unwrap();

    let word = |i: usize| {
        u32::from_ne_bytes([bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]])
    };
    assert_eq!((word(0), word(1), word(2)), (3, 5, 2));

    // first sample of the first channel follows the header as (re, im)
    let re = f64::from_ne_bytes(bytes[12..20].try_into().unwrap());
    let im = f64::from_ne_bytes(bytes[20..28].try_into().unwrap());
    assert_eq!(Complex64::new(re, im), responses.channels()[0][(0, 0)]);
}

#[test]
fn test_empty_bank_round_trip() {
    let responses = ResponseBank::from_channels(4, 4, Vec::new()).unwrap();
    let mut bytes = Vec::new();
    responses.write_dump(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 12);

    let loaded = ResponseBank::read_dump(&mut bytes.as_slice()).unwrap();
    assert_eq!(loaded.dims(), (4, 4));
    assert_eq!(loaded.num_channels(), 0);
}

#[test]
fn test_zero_dimension_header_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    for word in [0u32, 4, 1] {
        file.write_all(&word.to_ne_bytes()).unwrap();
    }
    drop(file);

    assert!(matches!(ResponseBank::load_dump(&path), Err(GaborError::DumpFormat(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ResponseBank::load_dump(dir.path().join("absent.bin")),
        Err(GaborError::IoError(_))
    ));
}
