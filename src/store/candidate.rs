//! Per-image records held by the store.

use serde::{Deserialize, Serialize};

use crate::haar::Coef;

/// An image in the store or, rather, a candidate to be selected as a winner
/// in a similarity query.
///
/// Only the DC coefficient survives here; the detail coefficients live on
/// solely as postings in the inverted index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Candidate<I> {
    /// The unique id the image was added under. `None` marks a tombstoned
    /// slot whose index postings have been cleared.
    pub(crate) id: Option<I>,
    /// The scaling function coefficient, position (0, 0) of the wavelet
    /// matrix.
    pub(crate) scale_coef: Coef,
    /// Width over height of the original image.
    pub(crate) ratio: f64,
    /// Difference hash copied from the image's hash.
    pub(crate) dhash: [u64; 2],
    /// Histogram bit vector copied from the image's hash.
    pub(crate) histogram: u64,
    /// Per-channel maximum histogram bin proportion.
    pub(crate) histo_max: [f32; 3],
}
