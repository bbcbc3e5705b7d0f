use crate::{
    error::{
        BadSignatureSnafu, InvalidChannelCountSnafu, InvalidColorSpaceSnafu, InvalidDimensionSnafu,
        ReadIoSnafu, WriteIoSnafu,
    },
    Format, Result,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use snafu::{ensure, ResultExt};
use std::io::{Read, Write};

/// Largest supported number of pixels in an image.
pub const MAX_PIXELS: u64 = i32::MAX as u64 - 2;

/// Number of channels stored in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    #[inline]
    pub const fn count(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }
}

impl TryFrom<u8> for Channels {
    type Error = crate::Error;

    fn try_from(channels: u8) -> Result<Self> {
        match channels {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            _ => InvalidChannelCountSnafu {
                channels,
                reason: "the stream must hold 3 or 4 channels",
            }
            .fail(),
        }
    }
}

/// Informative only, the codec never converts between color spaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorSpace {
    /// sRGB color channels with linear alpha.
    #[default]
    Srgb = 0,
    /// All channels linear.
    Linear = 1,
}

impl TryFrom<u8> for ColorSpace {
    type Error = crate::Error;

    fn try_from(color_space: u8) -> Result<Self> {
        match color_space {
            0 => Ok(ColorSpace::Srgb),
            1 => Ok(ColorSpace::Linear),
            _ => InvalidColorSpaceSnafu { color_space }.fail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub color_space: ColorSpace,
}

impl Header {
    /// Creates a header, checking the dimensions.
    pub fn new(width: u32, height: u32, channels: Channels, color_space: ColorSpace) -> Result<Self> {
        validate_dimensions(width, height)?;

        Ok(Self {
            width,
            height,
            channels,
            color_space,
        })
    }

    #[inline]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reads and validates a header in the given format.
    pub fn read<R: Read>(format: &Format, mut r: R) -> Result<Self> {
        let mut magic = [0; 4];
        r.read_exact(&mut magic).context(ReadIoSnafu)?;
        ensure!(
            magic == format.magic,
            BadSignatureSnafu {
                expected: format.magic,
                found: magic
            }
        );

        let width = r.read_u32::<BigEndian>().context(ReadIoSnafu)?;
        let height = r.read_u32::<BigEndian>().context(ReadIoSnafu)?;
        let channels = r.read_u8().context(ReadIoSnafu)?;
        let color_space = r.read_u8().context(ReadIoSnafu)?;

        validate_dimensions(width, height)?;
        let header = Self {
            width,
            height,
            channels: Channels::try_from(channels)?,
            color_space: ColorSpace::try_from(color_space)?,
        };

        log::debug!(
            "read {} header: {}x{}, {:?}, {:?}",
            format.name(),
            header.width,
            header.height,
            header.channels,
            header.color_space
        );

        Ok(header)
    }

    pub fn write<W: Write>(&self, format: &Format, mut w: W) -> Result<()> {
        w.write_all(&format.magic).context(WriteIoSnafu)?;
        w.write_u32::<BigEndian>(self.width).context(WriteIoSnafu)?;
        w.write_u32::<BigEndian>(self.height).context(WriteIoSnafu)?;
        w.write_u8(self.channels as u8).context(WriteIoSnafu)?;
        w.write_u8(self.color_space as u8).context(WriteIoSnafu)?;

        log::debug!(
            "wrote {} header: {}x{}, {:?}",
            format.name(),
            self.width,
            self.height,
            self.channels
        );

        Ok(())
    }
}

/// Both dimensions must be positive as 32-bit signed integers and the pixel count must stay
/// below [`MAX_PIXELS`].
pub(crate) fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    let limit = i32::MAX as u32;
    ensure!(
        (1..=limit).contains(&width)
            && (1..=limit).contains(&height)
            && u64::from(width) * u64::from(height) <= MAX_PIXELS,
        InvalidDimensionSnafu { width, height }
    );

    Ok(())
}
