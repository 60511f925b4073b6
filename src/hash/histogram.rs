//! Coarse YCbCr histogram fingerprint.
//!
//! Every pixel of the original image feeds three histograms sharing one flat
//! 64-slot counter array: 32 luma bins at offset 0, 16 Cb bins at offset 32,
//! 16 Cr bins at offset 48. A bin whose count exceeds its channel's median
//! sets a bit in the output vector. Luma and Cb bits land at their flat slot
//! index; Cr bits land at `index - 32` and therefore fold into positions
//! [16, 31]. The folding is anomalous but persisted; keep it bit-exact.

use image::RgbImage;

use crate::util::pixel::ycbcr;

const SLOTS: usize = 64;
const CHANNEL_RANGES: [(usize, usize); 3] = [(0, 32), (32, 16), (48, 16)];

/// Computes the histogram bit vector and the per-channel maximum bin
/// proportion of the image.
pub(crate) fn histogram(img: &RgbImage) -> (u64, [f32; 3]) {
    let (width, height) = img.dimensions();
    let mut counts = [0u32; SLOTS];
    for pixel in img.pixels() {
        let (y, cb, cr) = ycbcr(pixel);
        counts[(y >> 3) as usize] += 1;
        counts[32 + (cb >> 4) as usize] += 1;
        counts[48 + (cr >> 4) as usize] += 1;
    }

    let total = (width * height) as f32;
    let mut bits = 0u64;
    let mut histo_max = [0f32; 3];
    for (channel, (offset, size)) in CHANNEL_RANGES.into_iter().enumerate() {
        let slice = &counts[offset..offset + size];
        let mut sorted = slice.to_vec();
        sorted.sort_unstable();
        let median = sorted[size / 2];
        let max = sorted[size - 1];
        histo_max[channel] = max as f32 / total;
        for (bin, &count) in slice.iter().enumerate() {
            if count > median {
                let index = offset + bin;
                if channel == 2 {
                    bits |= 1 << (index - 32);
                } else {
                    bits |= 1 << index;
                }
            }
        }
    }

    (bits, histo_max)
}

/// Hamming distance between two histogram bit vectors.
pub(crate) fn distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}
