//! Candidate store and inverted coefficient index.
//!
//! The store keeps one [`Candidate`] record per added image plus an inverted
//! index from signed significant wavelet coefficients to candidate slots.
//! Slots are append-only and never renumbered; deletion tombstones a slot
//! and clears its postings so the remaining slot ids stay stable. All
//! methods are safe for concurrent use: mutation takes the exclusive side of
//! a reader/writer lock, lookups and queries share the read side.

mod candidate;
mod codec;

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config;
use crate::haar::CHANNELS;
use crate::hash::{dhash_distance, histogram_distance, Hash};
use crate::matches::Match;
use crate::trace::{op_event, op_span};
use crate::util::{HaarMatchError, HaarMatchResult};

pub(crate) use candidate::Candidate;

/// Weights for the scoring function, per channel and wavelet scale bin.
/// Derived for YIQ but reused for YCbCr.
const WEIGHTS: [[f64; 6]; CHANNELS] = [
    [5.00, 0.83, 1.01, 0.52, 0.47, 0.30],
    [19.21, 1.26, 0.44, 0.53, 0.28, 0.14],
    [34.37, 0.36, 0.45, 0.14, 0.18, 0.27],
];

/// Per-bin weight totals across the channels. Column 0 is only ever used for
/// the DC initialization term, so it never appears here in deductions.
const WEIGHT_SUMS: [f64; 6] = [58.58, 2.45, 1.90, 1.19, 0.93, 0.71];

/// Types usable as image ids.
///
/// Ids need equality and hashing for the id map, cloning for snapshots and
/// query results, a debug rendering for error messages, and serde support
/// for the persistence codec.
pub trait ImageId:
    Eq + std::hash::Hash + Clone + fmt::Debug + Serialize + DeserializeOwned
{
}

impl<T> ImageId for T where
    T: Eq + std::hash::Hash + Clone + fmt::Debug + Serialize + DeserializeOwned
{
}

struct Inner<I> {
    /// Image scale captured when the store was allocated; fixes the index
    /// geometry.
    scale: usize,
    /// All images in the store or, rather, the candidates for a query.
    /// Indexed by slot id; tombstoned slots have a cleared id.
    candidates: Vec<Candidate<I>>,
    /// Live ids and the slots they occupy.
    ids: HashMap<I, u32>,
    /// Flat bucket array addressed by sign, coefficient position and
    /// channel. Each bucket lists the slots whose image has that signed
    /// coefficient among its significant ones.
    indices: Vec<Vec<u32>>,
    /// Whether this store was mutated since it was loaded or created.
    modified: bool,
}

/// Locates the bucket for a signed coefficient.
fn bucket_at(sign: usize, coef_index: usize, channel: usize, scale: usize) -> usize {
    sign * scale * scale * CHANNELS + coef_index * CHANNELS + channel
}

/// A data structure that holds references to images, addressable by visual
/// similarity. Image contents are never stored, only fingerprints and the
/// caller's ids.
pub struct Store<I> {
    inner: RwLock<Inner<I>>,
}

impl<I: ImageId> Store<I> {
    /// Returns a new, empty store sized for the configured image scale.
    pub fn new() -> Self {
        let scale = config::image_scale();
        Self {
            inner: RwLock::new(Inner {
                scale,
                candidates: Vec::new(),
                ids: HashMap::new(),
                indices: vec![Vec::new(); 2 * scale * scale * CHANNELS],
                modified: false,
            }),
        }
    }

    /// Returns whether an image was added under this id.
    pub fn has(&self, id: &I) -> bool {
        self.inner.read().ids.contains_key(id)
    }

    /// Adds an image, via its hash, under the given id.
    ///
    /// The id is what queries later return for this image. Adding an id that
    /// is already present leaves the store unchanged.
    pub fn add(&self, id: I, hash: &Hash) {
        let mut inner = self.inner.write();
        if inner.ids.contains_key(&id) {
            return;
        }

        let slot = inner.candidates.len() as u32;
        inner.ids.insert(id.clone(), slot);
        inner.candidates.push(Candidate {
            id: Some(id),
            scale_coef: hash.matrix.coefs[0],
            ratio: hash.ratio,
            dhash: hash.dhash,
            histogram: hash.histogram,
            histo_max: hash.histo_max,
        });

        // Post the slot under every significant detail coefficient. The DC
        // term is excluded; it lives on the candidate itself.
        let scale = inner.scale;
        let mut postings = 0usize;
        for (coef_index, coef) in hash.matrix.coefs.iter().enumerate().skip(1) {
            for channel in 0..CHANNELS {
                let value = coef[channel];
                if value.abs() < hash.thresholds[channel] {
                    continue;
                }
                let sign = usize::from(value < 0.0);
                inner.indices[bucket_at(sign, coef_index, channel, scale)].push(slot);
                postings += 1;
            }
        }

        inner.modified = true;
        op_event!("store_add", slot = slot as usize, postings = postings);
    }

    /// Returns a snapshot of all live ids. The caller owns the list.
    pub fn ids(&self) -> Vec<I> {
        self.inner.read().ids.keys().cloned().collect()
    }

    /// Removes an image from the store. Unknown ids are ignored.
    ///
    /// The candidate slot is retained as a tombstone so the slot ids held by
    /// other buckets stay valid; its own postings are cleared.
    pub fn delete(&self, id: &I) {
        let mut inner = self.inner.write();
        let Some(slot) = inner.ids.remove(id) else {
            return;
        };
        inner.candidates[slot as usize].id = None;
        for bucket in &mut inner.indices {
            if let Some(position) = bucket.iter().position(|&entry| entry == slot) {
                bucket.remove(position);
            }
        }
        inner.modified = true;
        op_event!("store_delete", slot = slot as usize);
    }

    /// Renames an image from one id to another without touching its
    /// postings.
    ///
    /// Fails if the new id is already taken. A missing old id is a
    /// successful no-op.
    pub fn exchange(&self, old_id: &I, new_id: I) -> HaarMatchResult<()> {
        let mut inner = self.inner.write();
        if inner.ids.contains_key(&new_id) {
            return Err(HaarMatchError::IdCollision {
                id: format!("{new_id:?}"),
            });
        }
        let Some(slot) = inner.ids.remove(old_id) else {
            return Ok(());
        };
        inner.candidates[slot as usize].id = Some(new_id.clone());
        inner.ids.insert(new_id, slot);
        inner.modified = true;
        Ok(())
    }

    /// Returns the number of candidate slots, tombstones included.
    pub fn size(&self) -> usize {
        self.inner.read().candidates.len()
    }

    /// Returns whether the store was mutated since it was loaded or created.
    pub fn modified(&self) -> bool {
        self.inner.read().modified
    }

    /// Performs a similarity search and returns all candidates touched by
    /// the index probe, unsorted.
    ///
    /// Lower scores are better matches; use
    /// [`sort_matches`](crate::sort_matches) to rank the result. Querying an
    /// empty store returns an empty list.
    pub fn query(&self, hash: &Hash) -> Vec<Match<I>> {
        let inner = self.inner.read();
        if inner.candidates.is_empty() {
            return Vec::new();
        }

        let _op = op_span!("store_query", candidates = inner.candidates.len());

        // One slot per candidate; None marks a slot no bucket has touched.
        let mut scores: Vec<Option<f64>> = vec![None; inner.candidates.len()];
        let scale = inner.scale;
        let width = hash.matrix.width;
        let dc = hash.matrix.coefs[0];

        for (coef_index, coef) in hash.matrix.coefs.iter().enumerate().skip(1) {
            // Wavelet scale bin of this position, capped at the last column
            // of the weight table.
            let bin = (coef_index % width).max(coef_index / width).min(5);
            for channel in 0..CHANNELS {
                let value = coef[channel];
                if value.abs() < hash.thresholds[channel] {
                    continue;
                }
                let sign = usize::from(value < 0.0);
                for &slot in &inner.indices[bucket_at(sign, coef_index, channel, scale)] {
                    let slot = slot as usize;
                    let score = scores[slot].get_or_insert_with(|| {
                        let candidate = &inner.candidates[slot];
                        (0..CHANNELS)
                            .map(|ch| WEIGHTS[ch][0] * (candidate.scale_coef[ch] - dc[ch]).abs())
                            .sum()
                    });
                    // One deduction per posting; the weight row is already
                    // summed over the channels.
                    *score -= WEIGHT_SUMS[bin];
                }
            }
        }

        let mut result = Vec::new();
        for (slot, score) in scores.iter().enumerate() {
            let Some(score) = *score else {
                continue;
            };
            let candidate = &inner.candidates[slot];
            let Some(id) = &candidate.id else {
                continue;
            };
            result.push(Match {
                id: id.clone(),
                score,
                ratio_diff: (candidate.ratio.ln() - hash.ratio.ln()).abs(),
                dhash_distance: dhash_distance(&candidate.dhash, &hash.dhash),
                histogram_distance: histogram_distance(candidate.histogram, hash.histogram),
            });
        }

        op_event!("query_matches", count = result.len());
        result
    }
}

impl<I: ImageId> Default for Store<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same candidates in the same slots, same id map, and
/// the same bucket contents in the same order. The modification flag is
/// transient state and not part of the comparison.
impl<I: ImageId> PartialEq for Store<I> {
    fn eq(&self, other: &Self) -> bool {
        let a = self.inner.read();
        let b = other.inner.read();
        a.candidates == b.candidates && a.ids == b.ids && a.indices == b.indices
    }
}

impl<I: ImageId> fmt::Debug for Store<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Store")
            .field("slots", &inner.candidates.len())
            .field("live", &inner.ids.len())
            .field("modified", &inner.modified)
            .finish_non_exhaustive()
    }
}

/// Builds a hash with hand-picked luma coefficients for index tests.
///
/// Every unnamed position is zero and therefore below the unit thresholds,
/// so only the listed positions produce postings, all in channel 0.
#[cfg(test)]
pub(crate) fn test_hash(dc: f64, significant: &[(usize, f64)]) -> Hash {
    use crate::haar::{Coef, Matrix};

    let scale = config::image_scale();
    let mut coefs = vec![Coef::default(); scale * scale];
    coefs[0] = Coef::new([dc, 0.0, 0.0]);
    for &(position, value) in significant {
        coefs[position] = Coef::new([value, 0.0, 0.0]);
    }
    Hash {
        matrix: Matrix {
            coefs,
            width: scale,
            height: scale,
        },
        thresholds: Coef::new([1.0, 1.0, 1.0]),
        ratio: 1.5,
        dhash: [0b1010, 1 << 40],
        histogram: 0b1100,
        histo_max: [0.25, 0.5, 0.75],
    }
}
