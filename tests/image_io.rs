#![cfg(feature = "image-io")]

use scrollstitch::io::{load_raster, save_raster, validate_inputs};
use scrollstitch::{Channels, RasterBuffer, StitchError, Stitcher};
use std::fs;

fn gradient(width: usize, height: usize, seed: usize) -> RasterBuffer {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 13) ^ (y * 7) ^ (seed * 31)) & 0xFF;
            data.extend_from_slice(&[v as u8, (v as u8).wrapping_mul(3), 255 - v as u8]);
        }
    }
    RasterBuffer::rgb(data, width, height).unwrap()
}

#[test]
fn png_round_trip_preserves_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.png");
    let raster = gradient(40, 30, 1);

    save_raster(&raster, &path).unwrap();
    let loaded = load_raster(&path).unwrap();
    assert_eq!(loaded, raster);

    let gray = raster.to_gray();
    let gray_path = dir.path().join("gray.png");
    save_raster(&gray, &gray_path).unwrap();
    let loaded = load_raster(&gray_path).unwrap();
    assert_eq!(loaded.channels(), Channels::Gray);
    assert_eq!(loaded, gray);
}

#[test]
fn validation_reports_missing_and_non_file_paths() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.png");
    save_raster(&gradient(8, 8, 0), &file).unwrap();

    assert_eq!(validate_inputs(&[&file]).unwrap(), vec![file.clone()]);

    let missing = dir.path().join("missing.png");
    let err = validate_inputs(&[&file, &missing]).unwrap_err();
    assert_eq!(err, StitchError::InputNotFound { path: missing });

    let err = validate_inputs(&[dir.path()]).unwrap_err();
    assert_eq!(
        err,
        StitchError::InputNotAFile {
            path: dir.path().to_path_buf(),
        }
    );
}

#[test]
fn garbage_file_fails_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    fs::write(&path, b"definitely not a png").unwrap();

    let err = load_raster(&path).unwrap_err();
    assert!(matches!(err, StitchError::Decode { .. }));
}

#[test]
fn stitch_all_skips_corrupt_middle_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("1.png");
    let middle = dir.path().join("2.png");
    let last = dir.path().join("3.png");
    save_raster(&gradient(32, 40, 1), &first).unwrap();
    fs::write(&middle, b"truncated").unwrap();
    save_raster(&gradient(32, 50, 2), &last).unwrap();

    let stitcher = Stitcher::default();
    let composite = stitcher.stitch_all(&[&first, &middle, &last]).unwrap();
    let expected = stitcher.stitch_all(&[&first, &last]).unwrap();

    assert_eq!(composite.image, expected.image);
    assert_eq!(composite.report.skipped.len(), 1);
    assert_eq!(composite.report.skipped[0].index, 1);
    assert!(matches!(
        composite.report.skipped[0].error,
        StitchError::Decode { .. }
    ));
}

#[test]
fn missing_first_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.png");
    let err = Stitcher::default().stitch_all(&[&missing]).unwrap_err();
    assert_eq!(err, StitchError::InputNotFound { path: missing });
}
