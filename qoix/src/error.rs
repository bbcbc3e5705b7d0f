use snafu::Snafu;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "Bad signature: expected {:?}, found {:?}",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(found)
    ))]
    BadSignature { expected: [u8; 4], found: [u8; 4] },

    #[snafu(display(
        "Invalid image dimensions {width}x{height}: both must be non-zero, at most {} each, and \
         {} pixels in total",
        i32::MAX,
        crate::header::MAX_PIXELS
    ))]
    InvalidDimension { width: u32, height: u32 },

    #[snafu(display("Invalid channel count {channels}: {reason}"))]
    InvalidChannelCount { channels: u8, reason: &'static str },

    #[snafu(display("Invalid color space {color_space}, expected 0 (sRGB) or 1 (linear)"))]
    InvalidColorSpace { color_space: u8 },

    #[snafu(display("Unsupported pixel layout: {reason}"))]
    UnsupportedLayout { reason: String },

    #[snafu(display(
        "Output buffer too small: {required} pixels required, room for {available}"
    ))]
    OutputTooSmall { required: usize, available: usize },

    #[snafu(display("Stream ended after {decoded} of {expected} pixels"))]
    TruncatedStream { decoded: usize, expected: usize },

    #[snafu(display("Failed to read from the input stream"))]
    ReadIo { source: std::io::Error },

    #[snafu(display("Failed to write to the output stream"))]
    WriteIo { source: std::io::Error },
}
