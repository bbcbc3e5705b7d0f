//! Mapping between caller-owned pixel buffers and the codec's RGBA pixels.
//!
//! The encoder reads from a [`PixelSource`], which may hold interleaved 8-bit samples with 1 to 4
//! channels or packed 32-bit words. The decoder writes into any [`DecodeOutput`], usually a
//! [`PixelTarget`] with 3 or 4 channels in either representation.

use crate::{
    error::{InvalidChannelCountSnafu, UnsupportedLayoutSnafu},
    header::validate_dimensions,
    Channels, ColorSpace, Header, Pixel, Result,
};
use core::slice::{ChunksExact, Iter};
use snafu::ensure;

/// Where the samples of each channel are found.
///
/// Channels are listed in the order red, green, blue, alpha. Grayscale layouts use the first
/// entry for the gray sample and, with alpha, the second entry for alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Samples {
    /// One byte per channel. Every pixel occupies `channels` consecutive bytes and each channel
    /// sits at its band offset within those.
    Interleaved { band_offsets: [u8; 4] },
    /// One `u32` per pixel. Each channel is the byte found at its bit offset.
    Packed { bit_offsets: [u8; 4] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub channels: u8,
    pub has_alpha: bool,
    pub samples: Samples,
}

impl PixelLayout {
    pub const GRAY: PixelLayout = PixelLayout::interleaved(1, false, [0, 0, 0, 0]);
    pub const GRAY_ALPHA: PixelLayout = PixelLayout::interleaved(2, true, [0, 1, 0, 0]);
    pub const RGB: PixelLayout = PixelLayout::interleaved(3, false, [0, 1, 2, 0]);
    pub const BGR: PixelLayout = PixelLayout::interleaved(3, false, [2, 1, 0, 0]);
    pub const RGBA: PixelLayout = PixelLayout::interleaved(4, true, [0, 1, 2, 3]);
    pub const ABGR: PixelLayout = PixelLayout::interleaved(4, true, [3, 2, 1, 0]);
    /// `0x00RRGGBB`
    pub const INT_RGB: PixelLayout = PixelLayout::packed(false, [16, 8, 0, 0]);
    /// `0xAARRGGBB`
    pub const INT_ARGB: PixelLayout = PixelLayout::packed(true, [16, 8, 0, 24]);

    pub const fn interleaved(channels: u8, has_alpha: bool, band_offsets: [u8; 4]) -> Self {
        Self {
            channels,
            has_alpha,
            samples: Samples::Interleaved { band_offsets },
        }
    }

    pub const fn packed(has_alpha: bool, bit_offsets: [u8; 4]) -> Self {
        Self {
            channels: if has_alpha { 4 } else { 3 },
            has_alpha,
            samples: Samples::Packed { bit_offsets },
        }
    }

    /// The channel count written to the stream for images in this layout.
    #[inline]
    pub const fn stream_channels(&self) -> Channels {
        if self.has_alpha {
            Channels::Rgba
        } else {
            Channels::Rgb
        }
    }

    /// Number of buffer elements (bytes or words) per pixel.
    #[inline]
    pub const fn elements_per_pixel(&self) -> usize {
        match self.samples {
            Samples::Interleaved { .. } => self.channels as usize,
            Samples::Packed { .. } => 1,
        }
    }

    fn validate_source(&self) -> Result<()> {
        let supported = match self.samples {
            Samples::Interleaved { .. } => matches!(
                (self.channels, self.has_alpha),
                (1, false) | (2, true) | (3, false) | (4, true)
            ),
            Samples::Packed { .. } => {
                matches!((self.channels, self.has_alpha), (3, false) | (4, true))
            }
        };
        ensure!(
            supported,
            InvalidChannelCountSnafu {
                channels: self.channels,
                reason: if self.has_alpha {
                    "sources with alpha must have 2 or 4 channels (4 when packed)"
                } else {
                    "sources without alpha must have 1 or 3 channels (3 when packed)"
                },
            }
        );

        self.validate_offsets()
    }

    fn validate_target(&self) -> Result<()> {
        ensure!(
            matches!((self.channels, self.has_alpha), (3, false) | (4, true)),
            InvalidChannelCountSnafu {
                channels: self.channels,
                reason: "destinations must have 3 channels, or 4 channels including alpha",
            }
        );

        self.validate_offsets()
    }

    fn validate_offsets(&self) -> Result<()> {
        let used = usize::from(self.channels);
        match self.samples {
            Samples::Interleaved { band_offsets } => {
                let offsets = &band_offsets[..used];
                ensure!(
                    offsets.iter().all(|&o| o < self.channels) && all_distinct(offsets),
                    UnsupportedLayoutSnafu {
                        reason: format!(
                            "band offsets {offsets:?} must be distinct and below {}",
                            self.channels
                        )
                    }
                );
            }
            Samples::Packed { bit_offsets } => {
                let offsets = &bit_offsets[..used];
                ensure!(
                    offsets.iter().all(|&o| o % 8 == 0 && o <= 24) && all_distinct(offsets),
                    UnsupportedLayoutSnafu {
                        reason: format!(
                            "bit offsets {offsets:?} must be distinct multiples of 8 up to 24"
                        )
                    }
                );
            }
        }

        Ok(())
    }

    #[inline]
    fn read_interleaved(&self, band_offsets: &[u8; 4], samples: &[u8]) -> Pixel {
        let sample = |band: usize| samples[usize::from(band_offsets[band])];
        match self.channels {
            1 => {
                let y = sample(0);
                Pixel::rgb(y, y, y)
            }
            2 => {
                let y = sample(0);
                Pixel::new(y, y, y, sample(1))
            }
            3 => Pixel::rgb(sample(0), sample(1), sample(2)),
            _ => Pixel::new(sample(0), sample(1), sample(2), sample(3)),
        }
    }

    #[inline]
    fn read_packed(&self, bit_offsets: &[u8; 4], word: u32) -> Pixel {
        let sample = |band: usize| (word >> bit_offsets[band]) as u8;
        let a = if self.has_alpha { sample(3) } else { 255 };
        Pixel::new(sample(0), sample(1), sample(2), a)
    }
}

fn all_distinct(offsets: &[u8]) -> bool {
    offsets
        .iter()
        .enumerate()
        .all(|(i, o)| !offsets[..i].contains(o))
}

#[derive(Debug, Clone, Copy)]
enum SourceData<'a> {
    Bytes(&'a [u8]),
    Words(&'a [u32]),
}

/// A borrowed image to be encoded.
#[derive(Debug, Clone, Copy)]
pub struct PixelSource<'a> {
    width: u32,
    height: u32,
    layout: PixelLayout,
    color_space: ColorSpace,
    data: SourceData<'a>,
}

impl<'a> PixelSource<'a> {
    /// Wraps interleaved 8-bit samples, `width * height * layout.channels` of them.
    pub fn from_bytes(width: u32, height: u32, layout: PixelLayout, data: &'a [u8]) -> Result<Self> {
        ensure!(
            matches!(layout.samples, Samples::Interleaved { .. }),
            UnsupportedLayoutSnafu {
                reason: "byte buffers need an interleaved layout"
            }
        );
        Self::new(width, height, layout, SourceData::Bytes(data), data.len())
    }

    /// Wraps packed pixels, one `u32` per pixel.
    pub fn from_words(width: u32, height: u32, layout: PixelLayout, data: &'a [u32]) -> Result<Self> {
        ensure!(
            matches!(layout.samples, Samples::Packed { .. }),
            UnsupportedLayoutSnafu {
                reason: "word buffers need a packed layout"
            }
        );
        Self::new(width, height, layout, SourceData::Words(data), data.len())
    }

    fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: SourceData<'a>,
        len: usize,
    ) -> Result<Self> {
        validate_dimensions(width, height)?;
        layout.validate_source()?;

        let expected = width as usize * height as usize * layout.elements_per_pixel();
        ensure!(
            len == expected,
            UnsupportedLayoutSnafu {
                reason: format!(
                    "{width}x{height} image needs {expected} buffer elements, found {len}"
                )
            }
        );

        Ok(Self {
            width,
            height,
            layout,
            color_space: ColorSpace::Srgb,
            data,
        })
    }

    /// Sets the color space recorded in the header. It does not affect the pixels.
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn header(&self) -> Header {
        Header {
            width: self.width,
            height: self.height,
            channels: self.layout.stream_channels(),
            color_space: self.color_space,
        }
    }

    /// The pixels in row-major order.
    pub fn pixels(&self) -> Pixels<'a> {
        let inner = match self.data {
            SourceData::Bytes(bytes) => {
                PixelsInner::Bytes(bytes.chunks_exact(usize::from(self.layout.channels)))
            }
            SourceData::Words(words) => PixelsInner::Words(words.iter()),
        };

        Pixels {
            layout: self.layout,
            inner,
        }
    }
}

#[derive(Debug, Clone)]
enum PixelsInner<'a> {
    Bytes(ChunksExact<'a, u8>),
    Words(Iter<'a, u32>),
}

/// Iterator over the pixels of a [`PixelSource`].
#[derive(Debug, Clone)]
pub struct Pixels<'a> {
    layout: PixelLayout,
    inner: PixelsInner<'a>,
}

impl Iterator for Pixels<'_> {
    type Item = Pixel;

    #[inline]
    fn next(&mut self) -> Option<Pixel> {
        match (&mut self.inner, self.layout.samples) {
            (PixelsInner::Bytes(chunks), Samples::Interleaved { band_offsets }) => chunks
                .next()
                .map(|samples| self.layout.read_interleaved(&band_offsets, samples)),
            (PixelsInner::Words(words), Samples::Packed { bit_offsets }) => words
                .next()
                .map(|&word| self.layout.read_packed(&bit_offsets, word)),
            // rejected when the source was created
            _ => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            PixelsInner::Bytes(chunks) => chunks.size_hint(),
            PixelsInner::Words(words) => words.size_hint(),
        }
    }
}

impl ExactSizeIterator for Pixels<'_> {}

/// Receives decoded pixels in row-major order.
///
/// The decoder never writes more pixels than the image holds, and checks [`max_len`] against the
/// image size before writing anything.
///
/// [`max_len`]: DecodeOutput::max_len
pub trait DecodeOutput {
    fn write_pixel(&mut self, pixel: Pixel);
    fn write_many_pixels(&mut self, pixel: Pixel, count: usize);

    /// Returns the maximum number of pixels that can still be written to the output buffer.
    ///
    /// `None` if the output buffer is unbounded.
    fn max_len(&self) -> Option<usize>;

    /// Number of pixels written so far, including any written before the current decode call.
    fn current_output_position(&self) -> usize;
}

impl<T: DecodeOutput + ?Sized> DecodeOutput for &mut T {
    #[inline]
    fn write_pixel(&mut self, pixel: Pixel) {
        (**self).write_pixel(pixel)
    }

    #[inline]
    fn write_many_pixels(&mut self, pixel: Pixel, count: usize) {
        (**self).write_many_pixels(pixel, count)
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        (**self).max_len()
    }

    #[inline]
    fn current_output_position(&self) -> usize {
        (**self).current_output_position()
    }
}

impl DecodeOutput for Vec<Pixel> {
    #[inline]
    fn write_pixel(&mut self, pixel: Pixel) {
        self.push(pixel);
    }

    #[inline]
    fn write_many_pixels(&mut self, pixel: Pixel, count: usize) {
        self.extend(core::iter::repeat(pixel).take(count));
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn current_output_position(&self) -> usize {
        self.len()
    }
}

#[derive(Debug)]
enum TargetData<'a> {
    Bytes(&'a mut [u8]),
    Words(&'a mut [u32]),
}

/// A borrowed destination buffer with 3 or 4 channels.
///
/// Three channel targets drop alpha. Targets without alpha still receive opaque pixels, since the
/// decoder reconstructs an alpha of 255 for RGB streams.
#[derive(Debug)]
pub struct PixelTarget<'a> {
    layout: PixelLayout,
    data: TargetData<'a>,
    position: usize,
}

impl<'a> PixelTarget<'a> {
    pub fn from_bytes(layout: PixelLayout, data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            matches!(layout.samples, Samples::Interleaved { .. }),
            UnsupportedLayoutSnafu {
                reason: "byte buffers need an interleaved layout"
            }
        );
        layout.validate_target()?;

        Ok(Self {
            layout,
            data: TargetData::Bytes(data),
            position: 0,
        })
    }

    pub fn from_words(layout: PixelLayout, data: &'a mut [u32]) -> Result<Self> {
        ensure!(
            matches!(layout.samples, Samples::Packed { .. }),
            UnsupportedLayoutSnafu {
                reason: "word buffers need a packed layout"
            }
        );
        layout.validate_target()?;

        Ok(Self {
            layout,
            data: TargetData::Words(data),
            position: 0,
        })
    }

    #[inline]
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Number of pixels the buffer has room for.
    pub fn capacity(&self) -> usize {
        match &self.data {
            TargetData::Bytes(bytes) => bytes.len() / usize::from(self.layout.channels),
            TargetData::Words(words) => words.len(),
        }
    }

    fn write_at(&mut self, index: usize, pixel: Pixel) {
        let channels = usize::from(self.layout.channels);
        let components = pixel.to_array();

        match (&mut self.data, self.layout.samples) {
            (TargetData::Bytes(bytes), Samples::Interleaved { band_offsets }) => {
                let samples = &mut bytes[index * channels..][..channels];
                for (band, &offset) in band_offsets[..channels].iter().enumerate() {
                    samples[usize::from(offset)] = components[band];
                }
            }
            (TargetData::Words(words), Samples::Packed { bit_offsets }) => {
                words[index] = bit_offsets[..channels]
                    .iter()
                    .zip(components)
                    .fold(0, |word, (&offset, c)| word | u32::from(c) << offset);
            }
            // rejected when the target was created
            _ => {}
        }
    }
}

impl DecodeOutput for PixelTarget<'_> {
    #[inline]
    fn write_pixel(&mut self, pixel: Pixel) {
        self.write_at(self.position, pixel);
        self.position += 1;
    }

    fn write_many_pixels(&mut self, pixel: Pixel, count: usize) {
        for index in self.position..self.position + count {
            self.write_at(index, pixel);
        }
        self.position += count;
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        Some(self.capacity().saturating_sub(self.position))
    }

    #[inline]
    fn current_output_position(&self) -> usize {
        self.position
    }
}
