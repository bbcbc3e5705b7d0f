use crate::{utils::sum, Pixel};

// OP: 0b01
#[inline(always)]
pub(crate) const fn small_diff(prev: Pixel, byte: u8) -> Pixel {
    let (r_diff, g_diff, b_diff) = (
        ((byte >> 4) & 0b11) as i8 - 2,
        ((byte >> 2) & 0b11) as i8 - 2,
        (byte & 0b11) as i8 - 2,
    );

    apply_diff(prev, r_diff, g_diff, b_diff, 0)
}

// OP: 0b10
#[inline(always)]
pub(crate) const fn luma(prev: Pixel, byte: u8, rg_bg_diffs: u8) -> Pixel {
    let g_diff = (byte & 0b0011_1111) as i8 - 32;
    let (rg_diff, bg_diff) = (
        (rg_bg_diffs >> 4) as i8 - 8,
        (rg_bg_diffs & 0b1111) as i8 - 8,
    );
    let (r_diff, b_diff) = (rg_diff + g_diff, bg_diff + g_diff);

    apply_diff(prev, r_diff, g_diff, b_diff, 0)
}

// OP: 0b11111100
#[inline(always)]
pub(crate) const fn delta(prev: Pixel, rg_diffs: u8, ba_diffs: u8) -> Pixel {
    apply_diff(
        prev,
        (rg_diffs >> 4) as i8 - 8,
        (rg_diffs & 0b1111) as i8 - 8,
        (ba_diffs >> 4) as i8 - 8,
        (ba_diffs & 0b1111) as i8 - 8,
    )
}

#[inline]
pub(crate) const fn apply_diff(prev: Pixel, r_diff: i8, g_diff: i8, b_diff: i8, a_diff: i8) -> Pixel {
    Pixel::new(
        sum(prev.r, r_diff),
        sum(prev.g, g_diff),
        sum(prev.b, b_diff),
        sum(prev.a, a_diff),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_diff_wraps() {
        // dr = -2, dg = 1, db = 0
        let pixel = small_diff(Pixel::new(1, 255, 7, 9), 0b01_00_11_10);
        assert_eq!(pixel, Pixel::new(255, 0, 7, 9));
    }

    #[test]
    fn luma_is_relative_to_green() {
        // dg = 31, dr - dg = -8, db - dg = 7
        let pixel = luma(Pixel::rgb(100, 100, 100), 0b10_111111, 0b0000_1111);
        assert_eq!(pixel, Pixel::rgb(123, 131, 138));
    }

    #[test]
    fn delta_touches_alpha() {
        let pixel = delta(Pixel::new(10, 10, 10, 10), 0x0F, 0x80);
        assert_eq!(pixel, Pixel::new(2, 17, 10, 2));
    }
}
