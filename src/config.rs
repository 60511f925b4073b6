//! Process-wide tuning knobs.
//!
//! Both values are read whenever a hash or a store is created. Set them once
//! during initialization, before the first [`Hash`](crate::Hash) is built or
//! the first [`Store`](crate::Store) is allocated; changing them afterwards
//! leaves existing stores addressed for the old scale.

use std::sync::atomic::{AtomicUsize, Ordering};

static IMAGE_SCALE: AtomicUsize = AtomicUsize::new(128);
static TOP_COEFS: AtomicUsize = AtomicUsize::new(40);

/// Returns the side length of the square every image is resampled to before
/// the wavelet transform.
pub fn image_scale() -> usize {
    IMAGE_SCALE.load(Ordering::Relaxed)
}

/// Sets the resample side length. Call once at startup.
pub fn set_image_scale(scale: usize) {
    IMAGE_SCALE.store(scale, Ordering::Relaxed);
}

/// Returns the number of top coefficients, ordered by absolute value, kept
/// per colour channel. Coefficients ranking lower are discarded.
pub fn top_coefs() -> usize {
    TOP_COEFS.load(Ordering::Relaxed)
}

/// Sets the per-channel top coefficient count. Call once at startup.
pub fn set_top_coefs(count: usize) {
    TOP_COEFS.store(count, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::{image_scale, top_coefs};

    #[test]
    fn defaults_match_the_documented_values() {
        assert_eq!(image_scale(), 128);
        assert_eq!(top_coefs(), 40);
    }
}
