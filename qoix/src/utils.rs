use crate::Pixel;

/// Color table slot of a pixel under the QOI hashing policy.
///
/// The multiplications are done on wrapping bytes. Dropping multiples of 256 does not change the
/// result modulo 64, so this agrees with implementations that sign-extend the components first.
#[inline]
pub const fn hash(pixel: Pixel) -> u8 {
    let Pixel { r, g, b, a } = pixel;
    r.wrapping_mul(3)
        .wrapping_add(g.wrapping_mul(5))
        .wrapping_add(b.wrapping_mul(7))
        .wrapping_add(a.wrapping_mul(11))
        & 0b11_1111 // % 64
}

/// Computes the signed 8-bit wrapping difference `a - b`.
#[inline]
pub const fn diff(a: u8, b: u8) -> i8 {
    a.wrapping_sub(b) as i8
}

/// Applies a signed difference to a component, wrapping around at 8 bits.
#[inline]
pub const fn sum(a: u8, d: i8) -> u8 {
    a.wrapping_add(d as u8)
}

/// Per-channel differences of `pixel` relative to `prev`, as `[dr, dg, db, da]`.
#[inline]
pub const fn pixel_diff(pixel: Pixel, prev: Pixel) -> [i8; 4] {
    [
        diff(pixel.r, prev.r),
        diff(pixel.g, prev.g),
        diff(pixel.b, prev.b),
        diff(pixel.a, prev.a),
    ]
}

/// Splits a run of `count` pixels into the raw 6-bit values of chained run opcodes.
///
/// Chained runs are weighted `1, radix, radix^2, ...` and every raw value stands for a digit in
/// `1..=radix`, so the result is the bijective base-`radix` representation of `count`, least
/// significant digit first.
pub fn chained_run_digits(count: u32, radix: u32) -> impl Iterator<Item = u8> {
    debug_assert!((2..=64).contains(&radix));

    let mut rest = count;
    core::iter::from_fn(move || {
        if rest == 0 {
            return None;
        }

        let digit = (rest - 1) % radix + 1;
        rest = (rest - digit) / radix;
        Some((digit - 1) as u8)
    })
}
