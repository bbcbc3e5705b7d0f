use qoix::{
    consts::{QOI2_END_MARKER, QOI_HEADER_SIZE, QOI_OP_RUN},
    Format, Pixel, PixelLayout, PixelSource, QoiDecodeContext, QoiEncodeContext,
};

const RUN_LENGTHS: [u32; 6] = [1, 61, 62, 63, 3720, 3721];

fn solid(width: u32, color: [u8; 3]) -> Vec<u8> {
    color.repeat(width as usize)
}

fn body(format: Format, encoded: &[u8]) -> &[u8] {
    let end = encoded.len() - format.end_marker.map_or(0, |m| m.len());
    &encoded[QOI_HEADER_SIZE..end]
}

#[test]
fn solid_rows_roundtrip() {
    for format in [Format::QOI, Format::QOI2] {
        for width in RUN_LENGTHS {
            for color in [[0, 0, 0], [12, 200, 7]] {
                let data = solid(width, color);
                let source = PixelSource::from_bytes(width, 1, PixelLayout::RGB, &data).unwrap();
                let encoded = QoiEncodeContext::encode_to_vec(format, &source).unwrap();

                let mut decoded: Vec<Pixel> = Vec::new();
                QoiDecodeContext::decode(format, &encoded[..], &mut decoded)
                    .unwrap()
                    .complete()
                    .unwrap();

                assert_eq!(decoded.len(), width as usize);
                assert!(
                    decoded.iter().all(|&p| p == Pixel::rgb(color[0], color[1], color[2])),
                    "{} run of {width} x {color:?}",
                    format.name()
                );
            }
        }
    }
}

#[test]
fn qoi_splits_runs_at_62() {
    let data = solid(63, [0, 0, 0]);
    let source = PixelSource::from_bytes(63, 1, PixelLayout::RGB, &data).unwrap();
    let encoded = QoiEncodeContext::encode_to_vec(Format::QOI, &source).unwrap();

    assert_eq!(body(Format::QOI, &encoded), [QOI_OP_RUN | 61, QOI_OP_RUN]);
}

#[test]
fn qoi_run_count() {
    for (width, runs) in [(1, 1), (61, 1), (62, 1), (63, 2), (3720, 60), (3721, 61)] {
        let data = solid(width, [0, 0, 0]);
        let source = PixelSource::from_bytes(width, 1, PixelLayout::RGB, &data).unwrap();
        let encoded = QoiEncodeContext::encode_to_vec(Format::QOI, &source).unwrap();

        let body = body(Format::QOI, &encoded);
        assert_eq!(body.len(), runs, "{width} pixels");
        assert!(body.iter().all(|&op| op & 0b1100_0000 == QOI_OP_RUN));
    }
}

#[test]
fn qoi2_chains_runs() {
    for (width, ops) in [
        (1, vec![0]),
        (60, vec![59]),
        (61, vec![0, 0]),
        (3660, vec![59, 59]),
        (3661, vec![0, 0, 0]),
        (3721, vec![0, 1, 0]),
    ] {
        let data = solid(width, [0, 0, 0]);
        let source = PixelSource::from_bytes(width, 1, PixelLayout::RGB, &data).unwrap();
        let encoded = QoiEncodeContext::encode_to_vec(Format::QOI2, &source).unwrap();

        let expected = ops.iter().map(|&v| QOI_OP_RUN | v).collect::<Vec<_>>();
        assert_eq!(body(Format::QOI2, &encoded), expected, "{width} pixels");
        assert!(encoded.ends_with(&QOI2_END_MARKER));
    }
}

#[test]
fn runs_are_clamped_to_image() {
    // 2x1 image followed by a single run of 62
    let mut stream = b"qoif".to_vec();
    stream.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 1, 3, 0, QOI_OP_RUN | 61]);

    let mut decoded: Vec<Pixel> = Vec::new();
    let result = QoiDecodeContext::decode(Format::QOI, &stream[..], &mut decoded)
        .unwrap()
        .complete()
        .unwrap();

    assert_eq!(result.pixels, 2);
    assert_eq!(decoded, [Pixel::OPAQUE_BLACK; 2]);
}

#[test]
fn qoi2_run_multiplier_resets() {
    // run, RGB, run: the second run must not inherit the multiplier of the first
    let mut stream = b"qoi2".to_vec();
    stream.extend_from_slice(&[0, 0, 0, 70, 0, 0, 0, 1, 3, 0]);
    stream.extend_from_slice(&[QOI_OP_RUN, 0xFE, 10, 20, 30, QOI_OP_RUN]);

    let mut decoded: Vec<Pixel> = Vec::new();
    let result = QoiDecodeContext::decode(Format::QOI2, &stream[..], &mut decoded).unwrap();

    assert_eq!(result.pixels, 3);
    assert_eq!(
        decoded,
        [Pixel::OPAQUE_BLACK, Pixel::rgb(10, 20, 30), Pixel::rgb(10, 20, 30)]
    );
}
