use crate::{cache::CachePolicy, consts::QOI2_END_MARKER};

/// Selects one of the two bitstream variants.
///
/// Everything that differs between QOI and QOI2 is described here; the encoder and decoder are
/// otherwise shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// The 4-byte magic at the start of every stream.
    pub magic: [u8; 4],
    /// How the 64-entry color table is indexed.
    pub cache: CachePolicy,
    /// Largest run-length a single `QOI_OP_RUN` can express. With chained runs, this is also the
    /// radix the encoder splits long runs in, so it must equal `run_multiplier`.
    pub max_run: u8,
    /// Growth factor of the run multiplier across chained run opcodes, `None` if runs don't chain.
    pub run_multiplier: Option<u32>,
    /// Whether the `QOI2_OP_A` and `QOI2_OP_DELTA` opcodes exist.
    pub extended_ops: bool,
    /// Fixed trailer written after the opcode stream.
    pub end_marker: Option<[u8; 8]>,
}

impl Format {
    /// The QOI format, magic `qoif`.
    pub const QOI: Format = Format {
        magic: *b"qoif",
        cache: CachePolicy::Hashed,
        max_run: 62,
        run_multiplier: None,
        extended_ops: false,
        end_marker: None,
    };

    /// The QOI2 format, magic `qoi2`.
    pub const QOI2: Format = Format {
        magic: *b"qoi2",
        cache: CachePolicy::Recent,
        max_run: 60,
        run_multiplier: Some(60),
        extended_ops: true,
        end_marker: Some(QOI2_END_MARKER),
    };

    /// Picks the format whose magic matches the start of `data`.
    pub fn detect(data: &[u8]) -> Option<Format> {
        let magic = data.get(..4)?;
        [Format::QOI, Format::QOI2]
            .into_iter()
            .find(|format| format.magic == magic)
    }

    /// The magic as a big-endian integer.
    #[inline]
    pub const fn magic_u32(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Human readable name, the magic as text.
    pub fn name(&self) -> &'static str {
        if self.magic == Format::QOI2.magic {
            "qoi2"
        } else {
            "qoif"
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::QOI
    }
}
