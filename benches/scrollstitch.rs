use criterion::{criterion_group, criterion_main, Criterion};
use scrollstitch::{locate, RasterBuffer, StitchConfig, Stitcher};
use std::hint::black_box;

fn make_page(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn capture(page: &[u8], width: usize, start: usize, rows: usize) -> RasterBuffer {
    RasterBuffer::gray(page[start * width..(start + rows) * width].to_vec(), width, rows).unwrap()
}

fn bench_stitch(c: &mut Criterion) {
    let width = 360;
    let rows = 640;
    let page = make_page(width, 1600);
    let upper = capture(&page, width, 0, rows);
    let lower = capture(&page, width, 400, rows);
    let captures: Vec<RasterBuffer> = [0, 400, 800, 960]
        .iter()
        .map(|&start| capture(&page, width, start, rows))
        .collect();

    let cfg = StitchConfig::default();
    c.bench_function("locate_overlap_360x640", |b| {
        b.iter(|| black_box(locate(&upper, &lower, &cfg).unwrap()))
    });

    let stitcher = Stitcher::default();
    c.bench_function("stitch_sequence_4x360x640", |b| {
        b.iter(|| {
            black_box(
                stitcher
                    .stitch_sequence(&captures, |r| Ok(r.clone()))
                    .unwrap(),
            )
        })
    });

    #[cfg(feature = "rayon")]
    {
        let cfg_par = StitchConfig {
            parallel: true,
            ..StitchConfig::default()
        };
        c.bench_function("locate_overlap_360x640_par", |b| {
            b.iter(|| black_box(locate(&upper, &lower, &cfg_par).unwrap()))
        });
    }
}

criterion_group!(benches, bench_stitch);
criterion_main!(benches);
