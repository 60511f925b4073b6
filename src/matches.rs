//! Query results and their ordering.

use serde::{Deserialize, Serialize};

/// Ratio difference (on a log scale) below which two images usually share an
/// aspect ratio. Guidance only, nothing in the core enforces it.
pub const RATIO_DIFF_THRESHOLD: f64 = 0.1;

/// Difference-hash Hamming distance at or below which two images are usually
/// true duplicates.
pub const DHASH_DISTANCE_THRESHOLD: u32 = 6;

/// Histogram Hamming distance at or below which two images are usually true
/// duplicates.
pub const HISTOGRAM_DISTANCE_THRESHOLD: u32 = 7;

/// Largest per-channel difference in histogram maxima usually seen between
/// true duplicates.
pub const HISTO_MAX_DIFF_THRESHOLD: f32 = 0.13;

/// Scores below this usually indicate a duplicate rather than a merely
/// similar image.
pub const SCORE_THRESHOLD: f64 = 1200.0;

/// An image selected by a similarity query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match<I> {
    /// The id the image was added under.
    pub id: I,
    /// Similarity score; lower is a better match.
    pub score: f64,
    /// Absolute difference of the log aspect ratios.
    pub ratio_diff: f64,
    /// Hamming distance between the difference hashes.
    pub dhash_distance: u32,
    /// Hamming distance between the histogram bit vectors.
    pub histogram_distance: u32,
}

/// Sorts matches by ascending score, best match first.
///
/// Queries return their matches unsorted. Equal scores fall back to the
/// auxiliary distances so the order is deterministic.
pub fn sort_matches<I>(matches: &mut [Match<I>]) {
    matches.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.dhash_distance.cmp(&b.dhash_distance))
            .then_with(|| a.histogram_distance.cmp(&b.histogram_distance))
            .then_with(|| a.ratio_diff.total_cmp(&b.ratio_diff))
    });
}

#[cfg(test)]
mod tests {
    use super::{sort_matches, Match};

    fn entry(id: &str, score: f64, dhash_distance: u32) -> Match<String> {
        Match {
            id: id.to_string(),
            score,
            ratio_diff: 0.0,
            dhash_distance,
            histogram_distance: 0,
        }
    }

    #[test]
    fn lower_scores_sort_first() {
        let mut matches = vec![
            entry("c", 14.5, 0),
            entry("a", -120.0, 0),
            entry("b", 3.25, 0),
        ];
        sort_matches(&mut matches);
        let order: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn equal_scores_fall_back_to_distances() {
        let mut matches = vec![entry("far", -4.0, 9), entry("near", -4.0, 2)];
        sort_matches(&mut matches);
        assert_eq!(matches[0].id, "near");
    }

    #[test]
    fn nan_scores_sort_last() {
        let mut matches = vec![entry("undefined", f64::NAN, 0), entry("real", 900.0, 0)];
        sort_matches(&mut matches);
        assert_eq!(matches[0].id, "real");
    }
}
