//! haarmatch is a content-based near-duplicate image search library.
//!
//! Images are fingerprinted with a 2D Haar wavelet transform over a bicubic
//! resample, following Jacobs, Finkelstein and Salesin's "Fast
//! Multiresolution Image Querying", and indexed by their strongest signed
//! coefficients. Auxiliary difference-hash and histogram fingerprints plus
//! the aspect ratio let callers separate true duplicates from images that
//! are merely similar.
//!
//! Build a [`Hash`] per image with [`create_hash`], register it in a
//! [`Store`] under any serializable id, and query by example:
//!
//! ```
//! use haarmatch::{create_hash, sort_matches, Store};
//!
//! let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(64, 64));
//! let (hash, _scaled) = create_hash(&img);
//!
//! let store: Store<String> = Store::new();
//! store.add("sunset.jpg".to_string(), &hash);
//!
//! let mut matches = store.query(&hash);
//! sort_matches(&mut matches);
//! assert_eq!(matches[0].id, "sunset.jpg");
//! ```
//!
//! Stores are safe for concurrent use and persist through
//! [`Store::encode`] / [`Store::decode`]. Image decoding and resampling are
//! delegated to the `image` crate; only fingerprints and caller ids are ever
//! stored.

pub mod config;
pub mod haar;
pub mod util;

mod hash;
mod matches;
mod store;
mod trace;

pub use hash::{create_hash, Hash};
pub use matches::{
    sort_matches, Match, DHASH_DISTANCE_THRESHOLD, HISTOGRAM_DISTANCE_THRESHOLD,
    HISTO_MAX_DIFF_THRESHOLD, RATIO_DIFF_THRESHOLD, SCORE_THRESHOLD,
};
pub use store::{ImageId, Store};
pub use util::{HaarMatchError, HaarMatchResult};
