//! The 64-entry table of recently seen colors.

use crate::{consts::QOI_CACHE_SIZE, utils::hash, Pixel};

/// How colors are assigned to color table slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// QOI: one slot per hash value, last write wins.
    Hashed,
    /// QOI2: slots are filled round-robin in insertion order and searched linearly.
    Recent,
}

#[derive(Debug, Clone)]
pub struct ColorCache {
    policy: CachePolicy,
    slots: [Pixel; QOI_CACHE_SIZE],
    /// Next slot `observe` writes to under [`CachePolicy::Recent`].
    cursor: u8,
}

impl ColorCache {
    pub const fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            slots: [Pixel::TRANSPARENT_BLACK; QOI_CACHE_SIZE],
            cursor: 0,
        }
    }

    #[inline]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Records `pixel` and returns the slot it was stored in.
    #[inline]
    pub fn observe(&mut self, pixel: Pixel) -> u8 {
        let slot = match self.policy {
            CachePolicy::Hashed => hash(pixel),
            CachePolicy::Recent => {
                let slot = self.cursor;
                self.cursor = (self.cursor + 1) & 0b11_1111;
                slot
            }
        };

        self.slots[usize::from(slot)] = pixel;
        slot
    }

    /// Returns a slot currently holding exactly `pixel`.
    ///
    /// Under [`CachePolicy::Hashed`] only the pixel's own hash slot is considered, so a color
    /// displaced by a hash collision is not found. Under [`CachePolicy::Recent`] the lowest
    /// matching slot is returned.
    #[inline]
    pub fn find(&self, pixel: Pixel) -> Option<u8> {
        match self.policy {
            CachePolicy::Hashed => {
                let slot = hash(pixel);
                (self.slots[usize::from(slot)] == pixel).then_some(slot)
            }
            CachePolicy::Recent => self
                .slots
                .iter()
                .position(|&p| p == pixel)
                .map(|slot| slot as u8),
        }
    }

    /// The pixel stored in `slot`. Only the lower 6 bits of `slot` are used.
    #[inline]
    pub fn get(&self, slot: u8) -> Pixel {
        self.slots[usize::from(slot & 0b11_1111)]
    }
}
