//! Per-channel top-k coefficient thresholds via randomized QuickSelect.

use rand::Rng;

use crate::haar::{Coef, CHANNELS};

/// Returns, for the given coefficients, the kth largest absolute value per
/// colour channel. Discarding all values `v` with `|v| < threshold` keeps
/// `k` values in each channel.
pub(crate) fn coef_thresholds(coefs: &[Coef], k: usize) -> Coef {
    // No data, no thresholds.
    if coefs.is_empty() {
        return Coef::default();
    }

    let k = k.min(coefs.len());
    let mut thresholds = Coef::default();
    let mut rng = rand::thread_rng();
    for channel in 0..CHANNELS {
        thresholds[channel] = coef_threshold(coefs, k, channel, &mut rng);
    }
    thresholds
}

/// Returns the kth largest `|coefs[.][channel]|`.
///
/// Partitions around a random pivot by absolute value; values equal to the
/// pivot form the band that terminates the recursion when `k` lands inside
/// it.
fn coef_threshold<R: Rng>(coefs: &[Coef], k: usize, channel: usize, rng: &mut R) -> f64 {
    let pivot = coefs[rng.gen_range(0..coefs.len())][channel].abs();
    let mut left = Vec::with_capacity(coefs.len());
    let mut right = Vec::with_capacity(coefs.len());

    for coef in coefs {
        let value = coef[channel].abs();
        if value > pivot {
            left.push(*coef);
        } else if value < pivot {
            right.push(*coef);
        }
    }

    if k <= left.len() {
        coef_threshold(&left, k, channel, rng)
    } else if k > coefs.len() - right.len() {
        coef_threshold(&right, k - (coefs.len() - right.len()), channel, rng)
    } else {
        pivot
    }
}
