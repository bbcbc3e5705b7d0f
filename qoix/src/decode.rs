use crate::{
    cache::{CachePolicy, ColorCache},
    consts::*,
    error::{OutputTooSmallSnafu, ReadIoSnafu, TruncatedStreamSnafu},
    Format, Header, NoProgress, Pixel, PixelLayout, PixelTarget, Progress, Result,
};
use byteorder::ReadBytesExt;
use snafu::{ensure, ResultExt};
use std::io::{ErrorKind, Read};

pub use crate::pixel::DecodeOutput;

mod ops;

/// Per-image decoder state.
#[derive(Debug, Clone)]
pub struct QoiDecodeContext {
    format: Format,
    prev: Pixel,
    cache: ColorCache,
    /// Scale of the next run opcode, see [`Format::run_multiplier`].
    run_multiplier: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every pixel of the image was decoded.
    Complete,
    /// The input ended early. Pixels after [`Decoded::pixels`] were not written.
    Truncated,
    /// [`Progress`] requested an abort.
    Aborted,
}

/// Outcome of decoding one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub header: Header,
    /// Number of pixels written to the output.
    pub pixels: usize,
    pub status: DecodeStatus,
}

impl Decoded {
    /// Turns a truncated result into [`Error::TruncatedStream`](crate::Error::TruncatedStream).
    pub fn complete(self) -> Result<Self> {
        ensure!(
            self.status != DecodeStatus::Truncated,
            TruncatedStreamSnafu {
                decoded: self.pixels,
                expected: self.header.pixel_count(),
            }
        );

        Ok(self)
    }
}

impl QoiDecodeContext {
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            prev: Pixel::OPAQUE_BLACK,
            cache: ColorCache::new(format.cache),
            run_multiplier: 1,
        }
    }

    #[inline]
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Decodes a whole stream into `output`.
    ///
    /// `output` must have room for the image declared by the header. Reads are done one byte at a
    /// time, so unbuffered readers should be wrapped in a [`BufReader`](std::io::BufReader).
    pub fn decode<R: Read>(format: Format, mut r: R, output: impl DecodeOutput) -> Result<Decoded> {
        let header = Header::read(&format, &mut r)?;

        let mut state = QoiDecodeContext::new(format);
        state.decode_pixels(&header, r, output, NoProgress)
    }

    /// Decodes a whole stream into a newly allocated RGB or RGBA buffer, whichever the header
    /// declares.
    pub fn decode_to_vec<R: Read>(format: Format, mut r: R) -> Result<(Decoded, Vec<u8>)> {
        let header = Header::read(&format, &mut r)?;
        let layout = if header.channels.has_alpha() {
            PixelLayout::RGBA
        } else {
            PixelLayout::RGB
        };

        let mut buffer = vec![0u8; header.pixel_count() * header.channels.count()];
        let target = PixelTarget::from_bytes(layout, &mut buffer)?;

        let mut state = QoiDecodeContext::new(format);
        let decoded = state.decode_pixels(&header, r, target, NoProgress)?;

        Ok((decoded, buffer))
    }

    /// Decodes the opcode stream following `header`.
    ///
    /// The end of the input before the last pixel is not an error: the result reports
    /// [`DecodeStatus::Truncated`] and the remaining pixels are left untouched. Bytes after the
    /// last pixel, including the QOI2 end marker, are not consumed.
    pub fn decode_pixels<R, O, P>(
        &mut self,
        header: &Header,
        mut r: R,
        mut output: O,
        mut progress: P,
    ) -> Result<Decoded>
    where
        R: Read,
        O: DecodeOutput,
        P: Progress,
    {
        let total = header.pixel_count();
        let width = header.width as usize;

        if let Some(available) = output.max_len() {
            ensure!(
                available >= total,
                OutputTooSmallSnafu {
                    required: total,
                    available,
                }
            );
        }

        // outputs may already hold pixels from earlier images
        let start = output.current_output_position();
        let mut next_row_at = 0;

        let status = loop {
            let written = output.current_output_position() - start;
            if written >= total {
                break DecodeStatus::Complete;
            }

            if written >= next_row_at {
                let row = written / width;
                if progress.row_started(row as u32, header.height).is_break() {
                    log::debug!("decoding aborted at row {row}");
                    break DecodeStatus::Aborted;
                }
                next_row_at = (row + 1) * width;
            }

            let Some((pixel, count)) = self.read_op(&mut r, written, total - written)? else {
                log::warn!("stream ended after {written} of {total} pixels");
                break DecodeStatus::Truncated;
            };

            if count == 1 {
                output.write_pixel(pixel);
            } else {
                output.write_many_pixels(pixel, count);
            }
        };

        Ok(Decoded {
            header: *header,
            pixels: output.current_output_position() - start,
            status,
        })
    }

    /// Reads one opcode and returns the pixel it produces and how often to repeat it, at most
    /// `remaining` times. `None` if the input ends first.
    fn read_op<R: Read>(
        &mut self,
        r: &mut R,
        position: usize,
        remaining: usize,
    ) -> Result<Option<(Pixel, usize)>> {
        macro_rules! next {
            () => {
                match read_byte(r)? {
                    Some(byte) => byte,
                    None => return Ok(None),
                }
            };
        }

        let byte = next!();
        let extended = self.format.extended_ops;

        let mut count = 1;
        let mut record = true;
        let mut chained = false;

        let pixel = match byte {
            QOI_OP_RGBA => Pixel::new(next!(), next!(), next!(), next!()),
            QOI_OP_RGB => Pixel::new(next!(), next!(), next!(), self.prev.a),
            QOI2_OP_A if extended => Pixel {
                a: next!(),
                ..self.prev
            },
            QOI2_OP_DELTA if extended => {
                let rg_diffs = next!();
                ops::delta(self.prev, rg_diffs, next!())
            }
            _ => match byte & QOI_MASK_2 {
                QOI_OP_INDEX => {
                    record = false;
                    self.cache.get(byte)
                }
                QOI_OP_DIFF => ops::small_diff(self.prev, byte),
                QOI_OP_LUMA => ops::luma(self.prev, byte, next!()),
                _ => {
                    let run = u64::from(byte & 0b0011_1111) + 1;
                    count = run
                        .saturating_mul(self.run_multiplier)
                        .min(remaining as u64) as usize;

                    if let Some(factor) = self.format.run_multiplier {
                        self.run_multiplier = self.run_multiplier.saturating_mul(u64::from(factor));
                        chained = true;
                    }

                    // QOI2 keeps the color table untouched on runs, except when the image starts
                    // with one
                    record = self.cache.policy() == CachePolicy::Recent && position == 0;
                    self.prev
                }
            },
        };

        if !chained {
            self.run_multiplier = 1;
        }
        if record {
            self.cache.observe(pixel);
        }
        self.prev = pixel;

        Ok(Some((pixel, count)))
    }
}

fn read_byte<R: Read>(r: &mut R) -> Result<Option<u8>> {
    match r.read_u8() {
        Ok(byte) => Ok(Some(byte)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e).context(ReadIoSnafu),
    }
}
