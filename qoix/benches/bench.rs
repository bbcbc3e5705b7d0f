use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nanorand::{Rng, WyRand};
use qoix::{Format, Pixel, PixelLayout, PixelSource, PixelTarget, QoiDecodeContext, QoiEncodeContext};

const SIZE: u32 = 512;

/// Smooth gradients with a sprinkling of noise, closer to a photo than to pure noise.
fn gradient(rng: &mut WyRand) -> Vec<u8> {
    let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let noise = if rng.generate_range(0..8u8) == 0 {
                rng.generate_range(0..16u8)
            } else {
                0
            };
            data.extend_from_slice(&[
                (x / 2) as u8 ^ noise,
                (y / 2) as u8,
                ((x + y) / 4) as u8,
                255 - (y / 4) as u8,
            ]);
        }
    }
    data
}

/// Large flat regions, the best case for runs and the color table.
fn flat(rng: &mut WyRand) -> Vec<u8> {
    let palette = (0..16)
        .map(|_| rng.generate::<u32>().to_le_bytes())
        .collect::<Vec<_>>();

    let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            data.extend_from_slice(&palette[((x / 32 + y / 32) % 16) as usize]);
        }
    }
    data
}

fn images() -> Vec<(&'static str, Vec<u8>)> {
    let mut rng = WyRand::new_seed(42);
    vec![("gradient", gradient(&mut rng)), ("flat", flat(&mut rng))]
}

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("generated decode");
    let pixel_count = (SIZE * SIZE) as usize;

    for (image_name, data) in images() {
        let source = PixelSource::from_bytes(SIZE, SIZE, PixelLayout::RGBA, &data).unwrap();

        for format in [Format::QOI, Format::QOI2] {
            let encoded = QoiEncodeContext::encode_to_vec(format, &source).unwrap();
            let id = format!("{}/{image_name}", format.name());

            group.throughput(criterion::Throughput::Elements(pixel_count as u64));
            group.bench_with_input(BenchmarkId::new("rgba bytes", &id), &encoded, |b, input| {
                let mut output = vec![0u8; pixel_count * 4];
                b.iter(|| {
                    let target = PixelTarget::from_bytes(PixelLayout::RGBA, &mut output).unwrap();
                    QoiDecodeContext::decode(format, &input[..], target)
                })
            });
            group.bench_with_input(BenchmarkId::new("pixel vec", &id), &encoded, |b, input| {
                let mut output: Vec<Pixel> = Vec::with_capacity(pixel_count);
                b.iter(|| {
                    output.clear();
                    QoiDecodeContext::decode(format, &input[..], &mut output)
                })
            });
        }
    }
}

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("generated encode");
    let pixel_count = (SIZE * SIZE) as usize;

    for (image_name, data) in images() {
        let source = PixelSource::from_bytes(SIZE, SIZE, PixelLayout::RGBA, &data).unwrap();

        for format in [Format::QOI, Format::QOI2] {
            let id = format!("{}/{image_name}", format.name());

            group.throughput(criterion::Throughput::Elements(pixel_count as u64));
            group.bench_with_input(BenchmarkId::new("encode_to_vec", &id), &source, |b, source| {
                b.iter(|| QoiEncodeContext::encode_to_vec(format, source))
            });
            group.bench_with_input(BenchmarkId::new("encode", &id), &source, |b, source| {
                let mut encoded = Vec::with_capacity(pixel_count * 5);
                b.iter(|| {
                    encoded.clear();
                    QoiEncodeContext::encode(format, source, &mut encoded)
                })
            });
        }
    }
}

criterion_group!(benches, decode, encode);
criterion_main!(benches);
