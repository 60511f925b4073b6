//! Pixel colour conversion helpers.
//!
//! All fingerprints operate in YCbCr. The `image` crate hands decoded pixels
//! over as 8-bit RGB, so the conversion below uses the JPEG integer form
//! with 16-bit fixed-point coefficients. Grayscale pixels map to their exact
//! luma value, which the wavelet tests rely on.

use image::Rgb;

/// Converts an 8-bit RGB triple to YCbCr.
pub(crate) fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = (19595 * r + 38470 * g + 7471 * b + (1 << 15)) >> 16;
    let cb = (-11056 * r - 21712 * g + 32768 * b + (257 << 15)) >> 16;
    let cr = (32768 * r - 27440 * g - 5328 * b + (257 << 15)) >> 16;
    (y as u8, cb.clamp(0, 255) as u8, cr.clamp(0, 255) as u8)
}

/// Converts an `image` RGB pixel to YCbCr.
pub(crate) fn ycbcr(pixel: &Rgb<u8>) -> (u8, u8, u8) {
    rgb_to_ycbcr(pixel.0[0], pixel.0[1], pixel.0[2])
}
