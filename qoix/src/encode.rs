use crate::{
    cache::{CachePolicy, ColorCache},
    consts::*,
    error::WriteIoSnafu,
    utils::{chained_run_digits, pixel_diff},
    Format, NoProgress, Pixel, PixelSource, Progress, Result,
};
use itertools::Itertools;
use snafu::ResultExt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStatus {
    Complete,
    /// [`Progress`] requested an abort. The output holds an incomplete stream.
    Aborted,
}

/// Per-image encoder state.
#[derive(Debug, Clone)]
pub struct QoiEncodeContext {
    format: Format,
    prev: Pixel,
    cache: ColorCache,
    /// Pending repetitions of `prev` not yet written.
    run: u32,
    pixels_seen: usize,
}

impl QoiEncodeContext {
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            prev: Pixel::OPAQUE_BLACK,
            cache: ColorCache::new(format.cache),
            run: 0,
            pixels_seen: 0,
        }
    }

    #[inline]
    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn encode<W: Write>(format: Format, source: &PixelSource, w: W) -> Result<()> {
        let mut ctx = QoiEncodeContext::new(format);
        ctx.encode_with_progress(source, w, NoProgress)?;

        Ok(())
    }

    pub fn encode_to_vec(format: Format, source: &PixelSource) -> Result<Vec<u8>> {
        let pixel_count = source.width() as usize * source.height() as usize;
        let mut w = Vec::with_capacity(QOI_HEADER_SIZE + pixel_count + QOI2_END_MARKER.len());
        QoiEncodeContext::encode(format, source, &mut w)?;

        Ok(w)
    }

    /// Writes the header, all pixels and the trailer of `source`.
    ///
    /// `progress` is consulted before each row. If it aborts, nothing more is written, not even
    /// a pending run.
    pub fn encode_with_progress<W, P>(
        &mut self,
        source: &PixelSource,
        mut w: W,
        mut progress: P,
    ) -> Result<EncodeStatus>
    where
        W: Write,
        P: Progress,
    {
        source.header().write(&self.format, &mut w)?;

        let rows = source.pixels().chunks(source.width() as usize);
        for (row, pixels) in (&rows).into_iter().enumerate() {
            if progress.row_started(row as u32, source.height()).is_break() {
                log::debug!("encoding aborted at row {row}");
                return Ok(EncodeStatus::Aborted);
            }

            for pixel in pixels {
                self.encode_pixel(pixel, &mut w)?;
            }
        }

        self.finish(w)?;

        Ok(EncodeStatus::Complete)
    }

    /// Encodes one pixel. Repeated pixels are held back until the run ends or [`finish`] is
    /// called.
    ///
    /// [`finish`]: Self::finish
    pub fn encode_pixel<W: Write>(&mut self, pixel: Pixel, mut w: W) -> Result<()> {
        macro_rules! w {
            ($bytes:expr) => {
                w.write_all($bytes).context(WriteIoSnafu)
            };
        }

        let first = self.pixels_seen == 0;
        self.pixels_seen += 1;

        if pixel == self.prev {
            self.run += 1;
            if self.format.run_multiplier.is_none() && self.run == u32::from(self.format.max_run) {
                self.flush_run(&mut w)?;
            }

            // QOI2 only records a repeated pixel if it is the very first one
            if first && self.cache.policy() == CachePolicy::Recent {
                self.cache.observe(pixel);
            }
            return Ok(());
        }

        self.flush_run(&mut w)?;
        let prev = core::mem::replace(&mut self.prev, pixel);

        if let Some(slot) = self.cache.find(pixel) {
            // already in the color table
            return w!(&[QOI_OP_INDEX | slot]);
        }

        let [r_diff, g_diff, b_diff, a_diff] = pixel_diff(pixel, prev);
        let Pixel { r, g, b, a } = pixel;

        if !self.format.extended_ops {
            if a_diff != 0 {
                w!(&[QOI_OP_RGBA, r, g, b, a])?;
            } else if let Some(byte) = small_diff(r_diff, g_diff, b_diff) {
                w!(&[byte])?;
            } else if let Some(bytes) = luma(r_diff, g_diff, b_diff) {
                w!(&bytes)?;
            } else {
                w!(&[QOI_OP_RGB, r, g, b])?;
            }
        } else if a_diff == 0 {
            if let Some(byte) = small_diff(r_diff, g_diff, b_diff) {
                w!(&[byte])?;
            } else if let Some(bytes) = luma(r_diff, g_diff, b_diff) {
                w!(&bytes)?;
            } else if let Some(bytes) = delta(r_diff, g_diff, b_diff, 0) {
                w!(&bytes)?;
            } else {
                w!(&[QOI_OP_RGB, r, g, b])?;
            }
        } else if pixel.same_rgb(prev) {
            w!(&[QOI2_OP_A, a])?;
        } else if let Some(bytes) = delta(r_diff, g_diff, b_diff, a_diff) {
            w!(&bytes)?;
        } else {
            w!(&[QOI_OP_RGBA, r, g, b, a])?;
        }

        self.cache.observe(pixel);

        Ok(())
    }

    /// Writes any pending run and the end marker.
    pub fn finish<W: Write>(&mut self, mut w: W) -> Result<()> {
        self.flush_run(&mut w)?;

        if let Some(marker) = self.format.end_marker {
            w.write_all(&marker).context(WriteIoSnafu)?;
        }

        Ok(())
    }

    fn flush_run<W: Write>(&mut self, mut w: W) -> Result<()> {
        if self.run == 0 {
            return Ok(());
        }

        match self.format.run_multiplier {
            None => {
                w.write_all(&[QOI_OP_RUN | (self.run - 1) as u8])
                    .context(WriteIoSnafu)?;
            }
            Some(_) => {
                for value in chained_run_digits(self.run, u32::from(self.format.max_run)) {
                    w.write_all(&[QOI_OP_RUN | value]).context(WriteIoSnafu)?;
                }
            }
        }

        log::trace!("run of {} pixels", self.run);
        self.run = 0;

        Ok(())
    }
}

#[inline]
const fn small_diff(r_diff: i8, g_diff: i8, b_diff: i8) -> Option<u8> {
    if matches!((r_diff, g_diff, b_diff), (-2..=1, -2..=1, -2..=1)) {
        Some(
            QOI_OP_DIFF
                | ((r_diff + 2) as u8) << 4
                | ((g_diff + 2) as u8) << 2
                | (b_diff + 2) as u8,
        )
    } else {
        None
    }
}

#[inline]
const fn luma(r_diff: i8, g_diff: i8, b_diff: i8) -> Option<[u8; 2]> {
    let rg_diff = r_diff.wrapping_sub(g_diff);
    let bg_diff = b_diff.wrapping_sub(g_diff);

    if matches!((rg_diff, g_diff, bg_diff), (-8..=7, -32..=31, -8..=7)) {
        Some([
            QOI_OP_LUMA | (g_diff + 32) as u8,
            ((rg_diff + 8) as u8) << 4 | (bg_diff + 8) as u8,
        ])
    } else {
        None
    }
}

#[inline]
const fn delta(r_diff: i8, g_diff: i8, b_diff: i8, a_diff: i8) -> Option<[u8; 3]> {
    if matches!(
        (r_diff, g_diff, b_diff, a_diff),
        (-8..=7, -8..=7, -8..=7, -8..=7)
    ) {
        Some([
            QOI2_OP_DELTA,
            ((r_diff + 8) as u8) << 4 | (g_diff + 8) as u8,
            ((b_diff + 8) as u8) << 4 | (a_diff + 8) as u8,
        ])
    } else {
        None
    }
}
