//! Error types for haarmatch.

use thiserror::Error;

/// Result alias for haarmatch operations.
pub type HaarMatchResult<T> = std::result::Result<T, HaarMatchError>;

/// Errors that can occur when persisting a store or renaming its entries.
///
/// Hashing and querying are total and never produce an error.
#[derive(Debug, Error)]
pub enum HaarMatchError {
    /// A field could not be written to the binary representation.
    #[error("unable to encode {field}: {source}")]
    Encode {
        /// The field that failed to encode.
        field: &'static str,
        /// The underlying codec error.
        source: bincode::Error,
    },
    /// A field could not be read back from the binary representation.
    #[error("unable to decode {field}: {source}")]
    Decode {
        /// The field that failed to decode.
        field: &'static str,
        /// The underlying codec error.
        source: bincode::Error,
    },
    /// The compressed stream could not be produced or finished.
    #[error("unable to complete compressed stream: {0}")]
    Io(#[from] std::io::Error),
    /// The binary representation was written by an unknown format version.
    #[error("unsupported store version {version}")]
    UnsupportedVersion {
        /// The version tag found in the stream.
        version: u32,
    },
    /// The decoded index table does not match the configured image scale.
    #[error("index table has {got} buckets, expected {expected}")]
    IndexShape {
        /// Bucket count implied by the current image scale.
        expected: usize,
        /// Bucket count found in the stream.
        got: usize,
    },
    /// An exchange would rename an entry onto an id that is already taken.
    #[error("id already in store: {id}")]
    IdCollision {
        /// Debug rendering of the offending id.
        id: String,
    },
}
