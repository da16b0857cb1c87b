use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scrollstitch::{
    Channels, OverlapResult, RasterBuffer, StitchConfig, StitchError, StitchResult, Stitcher,
};

const WIDTH: usize = 64;

fn document(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random::<u8>()).collect()
}

fn capture(doc: &[u8], width: usize, start: usize, rows: usize) -> RasterBuffer {
    let data = doc[start * width..(start + rows) * width].to_vec();
    RasterBuffer::gray(data, width, rows).unwrap()
}

fn loaded(raster: &RasterBuffer) -> StitchResult<RasterBuffer> {
    Ok(raster.clone())
}

/// Three 200-row captures of a 440-row page, each overlapping the next by 80.
fn scrolled_page(seed: u64) -> (Vec<u8>, Vec<RasterBuffer>) {
    let doc = document(WIDTH, 440, seed);
    let captures = [0, 120, 240]
        .iter()
        .map(|&start| capture(&doc, WIDTH, start, 200))
        .collect();
    (doc, captures)
}

#[test]
fn scrolled_captures_rebuild_the_page() {
    let (doc, captures) = scrolled_page(42);
    let stitcher = Stitcher::default();
    let composite = stitcher.stitch_sequence(&captures, loaded).unwrap();

    assert_eq!(composite.image, RasterBuffer::gray(doc, WIDTH, 440).unwrap());
    let report = &composite.report;
    assert_eq!(report.inputs, 3);
    assert!(report.skipped.is_empty());
    let offsets: Vec<Option<usize>> = report.merges.iter().map(|m| m.overlap.offset()).collect();
    assert_eq!(offsets, [Some(120), Some(240)]);
    let heights: Vec<usize> = report.merges.iter().map(|m| m.height).collect();
    assert_eq!(heights, [320, 440]);
}

#[test]
fn overlap_between_sweep_sizes_rebuilds_the_page() {
    let doc = document(WIDTH, 323, 31);
    let captures = [capture(&doc, WIDTH, 0, 200), capture(&doc, WIDTH, 123, 200)];

    let composite = Stitcher::default().stitch_sequence(&captures, loaded).unwrap();
    assert_eq!(composite.image, RasterBuffer::gray(doc, WIDTH, 323).unwrap());
    assert_eq!(composite.report.merges[0].overlap.offset(), Some(123));
}

#[test]
fn composite_height_is_bounded_by_inputs() {
    let (_, captures) = scrolled_page(8);
    let unrelated = capture(&document(WIDTH, 150, 9), WIDTH, 0, 150);
    let inputs = vec![captures[0].clone(), unrelated, captures[1].clone()];

    let composite = Stitcher::default().stitch_sequence(&inputs, loaded).unwrap();
    let tallest = inputs.iter().map(RasterBuffer::height).max().unwrap();
    let total: usize = inputs.iter().map(RasterBuffer::height).sum();
    let height = composite.image.height();
    assert!(tallest <= height && height <= total);

    let mut previous = inputs[0].height();
    for merge in &composite.report.merges {
        assert!(merge.height >= previous);
        previous = merge.height;
    }
}

#[test]
fn strict_threshold_concatenates_unrelated_images() {
    let upper = capture(&document(48, 150, 1), 48, 0, 150);
    let lower = capture(&document(80, 120, 2), 80, 0, 120);
    let stitcher = Stitcher::new(StitchConfig::default().with_threshold(1.0)).unwrap();

    let composite = stitcher
        .stitch_sequence(&[upper, lower], loaded)
        .unwrap();
    assert_eq!(composite.image.width(), 80);
    assert_eq!(composite.image.height(), 270);
    assert_eq!(composite.report.merges[0].overlap, OverlapResult::NotFound);
}

#[test]
fn differing_widths_and_channels_are_normalized() {
    let (_, captures) = scrolled_page(5);
    let upper = captures[0].resize_width(50).unwrap();
    let lower = captures[1].with_channels(Channels::Rgb);

    let pair = Stitcher::default().stitch_pair(&upper, &lower).unwrap();
    assert_eq!(pair.image.width(), WIDTH);
    assert_eq!(pair.image.channels(), Channels::Rgb);
    let expected = match pair.overlap.offset() {
        Some(offset) => offset + lower.height(),
        None => upper.height() + lower.height(),
    };
    assert_eq!(pair.image.height(), expected);
}

#[test]
fn single_input_passes_through() {
    let (_, captures) = scrolled_page(3);
    let composite = Stitcher::default()
        .stitch_sequence(&captures[..1], loaded)
        .unwrap();
    assert_eq!(composite.image, captures[0]);
    assert!(composite.report.merges.is_empty());
}

#[test]
fn unreadable_middle_input_is_skipped() {
    let (_, captures) = scrolled_page(77);
    let stitcher = Stitcher::default();
    let broken = StitchError::Decode {
        path: "second.png".into(),
        reason: "corrupt".to_string(),
    };

    let inputs = [Some(&captures[0]), None, Some(&captures[2])];
    let composite = stitcher
        .stitch_sequence(&inputs, |input| match input {
            Some(raster) => Ok((*raster).clone()),
            None => Err(broken.clone()),
        })
        .unwrap();

    let expected = stitcher
        .stitch_sequence(&[captures[0].clone(), captures[2].clone()], loaded)
        .unwrap();
    assert_eq!(composite.image, expected.image);
    assert_eq!(composite.report.skipped.len(), 1);
    assert_eq!(composite.report.skipped[0].index, 1);
    assert_eq!(composite.report.skipped[0].error, broken);
    assert_eq!(composite.report.merges[0].index, 2);
}

#[test]
fn first_input_failure_is_fatal() {
    let (_, captures) = scrolled_page(4);
    let inputs = [None, Some(&captures[1])];
    let err = Stitcher::default()
        .stitch_sequence(&inputs, |input| match input {
            Some(raster) => Ok((*raster).clone()),
            None => Err(StitchError::InputNotFound {
                path: "missing.png".into(),
            }),
        })
        .unwrap_err();
    assert!(matches!(err, StitchError::InputNotFound { .. }));
}

#[test]
fn empty_input_is_rejected() {
    let inputs: [RasterBuffer; 0] = [];
    let err = Stitcher::default()
        .stitch_sequence(&inputs, loaded)
        .unwrap_err();
    assert_eq!(err, StitchError::EmptyInput);
}
