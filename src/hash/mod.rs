//! Visual hash construction.
//!
//! A [`Hash`] packages everything a store needs to index or look up one
//! image: the full wavelet coefficient matrix of a bicubic S×S resample,
//! the per-channel significance thresholds, the aspect ratio, and two
//! auxiliary fingerprints that help separate true duplicates from images
//! that are merely similar.

mod dhash;
mod histogram;
mod threshold;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::config;
use crate::haar::{self, Coef, Matrix};

pub(crate) use dhash::distance as dhash_distance;
pub(crate) use histogram::distance as histogram_distance;
pub(crate) use threshold::coef_thresholds;

/// The visual hash of an image.
#[derive(Clone, Debug, PartialEq)]
pub struct Hash {
    /// Wavelet coefficients of the resampled image.
    pub matrix: Matrix,
    /// Per-channel magnitude thresholds. Discarding all coefficients with
    /// `|c| < thresholds[channel]` keeps the configured top count in that
    /// channel.
    pub thresholds: Coef,
    /// Width over height of the original image, 0 if the height is 0.
    pub ratio: f64,
    /// Difference hash; 64 luma bits in lane 0, chroma bits in lane 1.
    pub dhash: [u64; 2],
    /// Histogram bit vector; bins busier than their channel median set a bit.
    pub histogram: u64,
    /// Largest histogram bin of each channel as a proportion of the pixel
    /// count.
    pub histo_max: [f32; 3],
}

impl Hash {
    /// Hamming distance between the difference hashes of two images.
    pub fn dhash_distance(&self, other: &Hash) -> u32 {
        dhash::distance(&self.dhash, &other.dhash)
    }

    /// Hamming distance between the histogram vectors of two images.
    pub fn histogram_distance(&self, other: &Hash) -> u32 {
        histogram::distance(self.histogram, other.histogram)
    }
}

/// Calculates the visual hash of the provided image.
///
/// Also returns the resampled square image the wavelet coefficients were
/// computed from; callers that have no use for it may drop it.
pub fn create_hash(img: &DynamicImage) -> (Hash, RgbImage) {
    let (width, height) = (img.width(), img.height());
    let ratio = if height > 0 {
        f64::from(width) / f64::from(height)
    } else {
        0.0
    };

    let rgb = img.to_rgb8();

    // Resample for the wavelet transform.
    let scale = config::image_scale() as u32;
    let scaled = imageops::resize(&rgb, scale, scale, FilterType::CatmullRom);

    let matrix = haar::transform(&scaled);
    let thresholds = coef_thresholds(&matrix.coefs, config::top_coefs());

    // The auxiliary fingerprints read the original pixels, not the resample.
    let dhash = dhash::dhash(&rgb);
    let (histogram, histo_max) = histogram::histogram(&rgb);

    (
        Hash {
            matrix,
            thresholds,
            ratio,
            dhash,
            histogram,
            histo_max,
        },
        scaled,
    )
}

#[cfg(test)]
mod tests {
    use super::create_hash;
    use crate::config;
    use image::{DynamicImage, Rgb, RgbImage};

    fn pattern_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8;
            Rgb([v, v.wrapping_add(40), v / 2])
        }))
    }

    #[test]
    fn hash_has_the_configured_shape() {
        let scale = config::image_scale();
        let (hash, scaled) = create_hash(&pattern_image(200, 100));
        assert_eq!(hash.matrix.width, scale);
        assert_eq!(hash.matrix.height, scale);
        assert_eq!(hash.matrix.coefs.len(), scale * scale);
        assert_eq!(scaled.dimensions(), (scale as u32, scale as u32));
        assert!((hash.ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn thresholds_are_the_kth_order_statistic() {
        let (hash, _) = create_hash(&pattern_image(160, 160));
        let k = config::top_coefs();
        for channel in 0..3 {
            let mut magnitudes: Vec<f64> = hash
                .matrix
                .coefs
                .iter()
                .map(|c| c[channel].abs())
                .collect();
            magnitudes.sort_by(|a, b| b.total_cmp(a));
            assert_eq!(hash.thresholds[channel], magnitudes[k - 1]);
        }
    }

    #[test]
    fn identical_images_have_identical_hashes() {
        let img = pattern_image(96, 96);
        let (a, _) = create_hash(&img);
        let (b, _) = create_hash(&img);
        assert_eq!(a, b);
        assert_eq!(a.dhash_distance(&b), 0);
        assert_eq!(a.histogram_distance(&b), 0);
    }
}
