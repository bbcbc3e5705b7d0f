//! Lossless pixel-stream codec for the QOI image format and its QOI2 variant.
//!
//! Both formats compress 8-bit RGB/RGBA pixels into a byte-oriented opcode stream made of literal
//! color escapes, small deltas from the previous pixel, back-references into a 64-entry table of
//! recently seen colors, and run-length encoding of repeated pixels. A single engine implements
//! both; the differences are captured by a [`Format`] value.
//!
//! # Stream layout
//!
//! - 4-byte magic: `qoif` ([`Format::QOI`]) or `qoi2` ([`Format::QOI2`])
//! - u32be width (non-zero)
//! - u32be height (non-zero)
//! - u8 channels: 3 (RGB) or 4 (RGBA)
//! - u8 color space: 0 (sRGB with linear alpha) or 1 (all channels linear)
//! - opcode stream, see [consts]
//! - QOI2 only: 8-byte end marker `00 00 00 00 00 00 00 01`
//!
//! The previous pixel starts as opaque black `(0, 0, 0, 255)` and every color table slot starts as
//! transparent black `(0, 0, 0, 0)`.
//!
//! # Differences between QOI and QOI2
//!
//! ## Color table
//!
//! QOI stores each pixel at slot `(r * 3 + g * 5 + b * 7 + a * 11) % 64`, overwriting whatever was
//! there. QOI2 instead appends colors to a 64-entry ring in insertion order and looks them up by
//! scanning all slots. Pixels produced by [`QOI_OP_INDEX`](consts::QOI_OP_INDEX) are not appended
//! again, and neither are pixels produced by [`QOI_OP_RUN`](consts::QOI_OP_RUN) unless the run
//! starts at the very first pixel of the image.
//!
//! ## Opcodes
//!
//! QOI2 adds [`QOI2_OP_A`](consts::QOI2_OP_A) and [`QOI2_OP_DELTA`](consts::QOI2_OP_DELTA). They
//! occupy the two topmost run-length values, so QOI2 runs are limited to 1..60 per opcode.
//!
//! ## Run chaining
//!
//! In QOI2, consecutive `QOI_OP_RUN` opcodes scale their run-length by a multiplier that starts at
//! 1 and grows by a factor of 60 with every chained run opcode. Any other opcode resets it.
//!
//! # Integrity
//!
//! Neither format carries a checksum. A decoder cannot tell a corrupted but well-formed opcode
//! sequence apart from a valid image; decoding such input simply yields different pixels.
#![forbid(unsafe_code)]

pub mod cache;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod header;
pub mod pixel;
pub mod progress;
pub mod utils;

pub use cache::{CachePolicy, ColorCache};
pub use decode::{DecodeStatus, Decoded, QoiDecodeContext};
pub use encode::{EncodeStatus, QoiEncodeContext};
pub use error::{Error, Result};
pub use format::Format;
pub use header::{Channels, ColorSpace, Header};
pub use pixel::{DecodeOutput, PixelLayout, PixelSource, PixelTarget, Samples};
pub use progress::{NoProgress, Progress};

/// A single RGBA pixel with 8 bits per component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// The previous pixel both encoder and decoder start from.
    pub const OPAQUE_BLACK: Pixel = Pixel::new(0, 0, 0, 255);
    /// The value of every color table slot before it is first written.
    pub const TRANSPARENT_BLACK: Pixel = Pixel::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn same_rgb(self, other: Pixel) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

impl From<[u8; 4]> for Pixel {
    #[inline]
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

pub mod consts {
    /// Length of the fixed stream header in bytes.
    pub const QOI_HEADER_SIZE: usize = 14;

    /// The end marker appended to QOI2 streams.
    pub const QOI2_END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

    /// Number of color table slots in both formats.
    pub const QOI_CACHE_SIZE: usize = 64;

    /// Mask selecting the 2-bit tag of the short opcodes.
    pub const QOI_MASK_2: u8 = 0b1100_0000;

    /// Re-emit a pixel from the color table.
    ///
    /// ```plain
    /// .- QOI_OP_INDEX ----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  0  0 |     index       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b00
    /// - 6-bit index into the color table: 0..63
    pub const QOI_OP_INDEX: u8 = 0b0000_0000;

    /// Calculate a pixel based on a 2-bit difference from the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_DIFF -----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----+-----+-----|
    /// |  0  1 |  dr |  dg |  db |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b01
    /// - 2-bit red, green and blue channel differences from the previous pixel between -2..1,
    ///   each stored with a bias of 2
    /// - alpha is unchanged
    ///
    /// Differences wrap around, so `1 - 2` is `255` and `255 + 1` is `0`.
    pub const QOI_OP_DIFF: u8 = 0b0100_0000;

    /// Calculate a pixel based on a 6-bit green-channel difference from the previous pixel, and
    /// differences to the green-channel difference for red and blue.
    ///
    ///  ```plain
    /// .- QOI_OP_LUMA -------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------+-------------+-----------|
    /// |  1  0 |  green diff     |   dr - dg   |  db - dg  |
    /// `---------------------------------------------------`
    /// ```
    ///
    /// - 2-bit tag b10
    /// - 6-bit green channel difference from the previous pixel (`-32..31`), stored with a bias of
    ///   32
    /// - 4-bit red channel difference minus green channel difference (`-8..7`), stored with a bias
    ///   of 8
    /// - 4-bit blue channel difference minus green channel difference (`-8..7`), stored with a bias
    ///   of 8
    /// - alpha is unchanged
    pub const QOI_OP_LUMA: u8 = 0b1000_0000;

    /// Repeats the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RUN ------------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  1  1 |       run       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b11
    /// - 6-bit run-length stored with a bias of -1
    /// - QOI: run-lengths 1..62. 63 and 64 are occupied by the RGB and RGBA tags.
    /// - QOI2: run-lengths 1..60, additionally scaled by the run multiplier. 61..64 are occupied
    ///   by the DELTA, A, RGB and RGBA tags.
    pub const QOI_OP_RUN: u8 = 0b1100_0000;

    /// Emits the color channels of a pixel, alpha is unchanged.
    ///
    /// ```plain
    /// .- QOI_OP_RGB ------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  0 |   red   |  green  |  blue   |
    /// `-------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGB: u8 = 0b1111_1110;

    /// Emits a full raw pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RGBA ---------------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] | Byte[4] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  1 |   red   |  green  |  blue   |  alpha  |
    /// `-----------------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGBA: u8 = 0b1111_1111;

    /// QOI2 only: replaces the alpha channel of the previous pixel.
    ///
    /// ```plain
    /// .- QOI2_OP_A -----------------------.
    /// |         Byte[0]         | Byte[1] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  |
    /// |-------------------------+---------|
    /// |  1  1  1  1  1  1  0  1 |  alpha  |
    /// `-----------------------------------`
    /// ```
    pub const QOI2_OP_A: u8 = 0b1111_1101;

    /// QOI2 only: calculate a pixel based on 4-bit differences of all four channels.
    ///
    /// ```plain
    /// .- QOI2_OP_DELTA ---------------------------------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |         Byte[2]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |-------------------------+------------+------------+------------+------------|
    /// |  1  1  1  1  1  1  0  0 |     dr     |     dg     |     db     |     da     |
    /// `-----------------------------------------------------------------------------`
    /// ```
    ///
    /// - 8-bit tag b11111100
    /// - 4-bit red, green, blue and alpha channel differences from the previous pixel between
    ///   -8..7, each stored with a bias of 8
    pub const QOI2_OP_DELTA: u8 = 0b1111_1100;
}
