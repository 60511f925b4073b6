//! Versioned binary persistence for the store.
//!
//! The representation is a gzip frame around a bincode stream written field
//! by field, so a truncated or corrupt stream reports exactly which field
//! failed. The stream opens with a version tag; the current layout is
//! version 3 with the flat bucket array. Versions 1 and 2 used a nested
//! four-dimensional index and wider slot ints and are converted on decode.

use std::collections::HashMap;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Candidate, ImageId, Inner, Store};
use crate::config;
use crate::haar::{Coef, CHANNELS};
use crate::trace::op_event;
use crate::util::{HaarMatchError, HaarMatchResult};

/// Format version written by [`Store::encode`].
const STORE_VERSION: u32 = 3;

/// Index layout of format versions 1 and 2, addressed
/// `[sign][position][channel]`.
type NestedIndex = Vec<Vec<Vec<Vec<i64>>>>;

impl<I: ImageId> Store<I> {
    /// Encodes the store into its compressed binary representation.
    pub fn encode(&self) -> HaarMatchResult<Vec<u8>> {
        let inner = self.inner.read();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());

        write_field(&mut encoder, "store version", &STORE_VERSION)?;
        write_field(
            &mut encoder,
            "candidate count",
            &(inner.candidates.len() as u64),
        )?;
        for candidate in &inner.candidates {
            write_field(&mut encoder, "candidate id", &candidate.id)?;
            write_field(
                &mut encoder,
                "candidate scaling coefficient",
                &candidate.scale_coef,
            )?;
            write_field(&mut encoder, "candidate ratio", &candidate.ratio)?;
            write_field(&mut encoder, "candidate dHash", &candidate.dhash)?;
            write_field(&mut encoder, "candidate histogram", &candidate.histogram)?;
            write_field(
                &mut encoder,
                "candidate histogram maxima",
                &candidate.histo_max,
            )?;
        }
        write_field(&mut encoder, "id map", &inner.ids)?;
        write_field(&mut encoder, "index table", &inner.indices)?;

        let bytes = encoder.finish()?;
        op_event!("store_encode", bytes = bytes.len());
        Ok(bytes)
    }

    /// Reconstructs a store from bytes produced by [`Store::encode`].
    ///
    /// Streams written by format versions 1 and 2 are converted to the
    /// current layout; a converted store reports itself as modified so
    /// callers know to persist it again.
    pub fn decode(bytes: &[u8]) -> HaarMatchResult<Self> {
        let mut reader = GzDecoder::new(bytes);
        let version: u32 = read_field(&mut reader, "store version")?;
        let inner = match version {
            1 => decode_v1(&mut reader)?,
            2 => decode_v2(&mut reader)?,
            STORE_VERSION => decode_v3(&mut reader)?,
            version => return Err(HaarMatchError::UnsupportedVersion { version }),
        };
        op_event!(
            "store_decode",
            version = version as usize,
            slots = inner.candidates.len()
        );
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}

fn decode_v3<R: Read, I: ImageId>(reader: &mut R) -> HaarMatchResult<Inner<I>> {
    let count: u64 = read_field(reader, "candidate count")?;
    let mut candidates = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        candidates.push(read_candidate(reader)?);
    }

    let ids: HashMap<I, u32> = read_field(reader, "id map")?;
    let indices: Vec<Vec<u32>> = read_field(reader, "index table")?;
    let scale = config::image_scale();
    check_bucket_count(indices.len(), scale)?;

    Ok(Inner {
        scale,
        candidates,
        ids,
        indices,
        modified: false,
    })
}

fn decode_v2<R: Read, I: ImageId>(reader: &mut R) -> HaarMatchResult<Inner<I>> {
    let count: u64 = read_field(reader, "candidate count")?;
    let mut candidates = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        candidates.push(read_candidate(reader)?);
    }

    let wide_ids: HashMap<I, i64> = read_field(reader, "id map")?;
    let nested: NestedIndex = read_field(reader, "index table")?;
    let scale = config::image_scale();

    Ok(Inner {
        scale,
        candidates,
        ids: narrow_ids(wide_ids),
        indices: flatten_index(nested, scale)?,
        modified: true,
    })
}

fn decode_v1<R: Read, I: ImageId>(reader: &mut R) -> HaarMatchResult<Inner<I>> {
    // Version 1 recorded the channel count; the layout is fixed now, so the
    // value only documents how long the stored coefficients are.
    let _coef_size: u32 = read_field(reader, "coefficient size")?;

    let count: u64 = read_field(reader, "candidate count")?;
    let mut candidates = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        let id: Option<I> = read_field(reader, "candidate id")?;
        let raw: Vec<f64> = read_field(reader, "candidate scaling coefficient")?;
        let ratio: f64 = read_field(reader, "candidate ratio")?;

        let mut scale_coef = Coef::default();
        for (channel, value) in raw.into_iter().take(CHANNELS).enumerate() {
            scale_coef[channel] = value;
        }
        candidates.push(Candidate {
            id,
            scale_coef,
            ratio,
            dhash: [0; 2],
            histogram: 0,
            histo_max: [0.0; 3],
        });
    }

    let wide_ids: HashMap<I, i64> = read_field(reader, "id map")?;
    let nested: NestedIndex = read_field(reader, "index table")?;
    let scale = config::image_scale();

    Ok(Inner {
        scale,
        candidates,
        ids: narrow_ids(wide_ids),
        indices: flatten_index(nested, scale)?,
        modified: true,
    })
}

fn read_candidate<R: Read, I: ImageId>(reader: &mut R) -> HaarMatchResult<Candidate<I>> {
    Ok(Candidate {
        id: read_field(reader, "candidate id")?,
        scale_coef: read_field(reader, "candidate scaling coefficient")?,
        ratio: read_field(reader, "candidate ratio")?,
        dhash: read_field(reader, "candidate dHash")?,
        histogram: read_field(reader, "candidate histogram")?,
        histo_max: read_field(reader, "candidate histogram maxima")?,
    })
}

fn narrow_ids<I: ImageId>(wide: HashMap<I, i64>) -> HashMap<I, u32> {
    wide.into_iter().map(|(id, slot)| (id, slot as u32)).collect()
}

/// Rewrites the nested legacy index into the flat bucket array.
fn flatten_index(nested: NestedIndex, scale: usize) -> HaarMatchResult<Vec<Vec<u32>>> {
    let expected = 2 * scale * scale * CHANNELS;
    let well_formed = nested.len() == 2
        && nested.iter().all(|sign| {
            sign.len() == scale * scale
                && sign.iter().all(|channels| channels.len() == CHANNELS)
        });
    if !well_formed {
        let got = nested
            .iter()
            .map(|sign| sign.iter().map(Vec::len).sum::<usize>())
            .sum();
        return Err(HaarMatchError::IndexShape { expected, got });
    }

    let mut flat = vec![Vec::new(); expected];
    for (sign, positions) in nested.into_iter().enumerate() {
        for (coef_index, channels) in positions.into_iter().enumerate() {
            for (channel, bucket) in channels.into_iter().enumerate() {
                flat[sign * scale * scale * CHANNELS + coef_index * CHANNELS + channel] =
                    bucket.into_iter().map(|slot| slot as u32).collect();
            }
        }
    }
    Ok(flat)
}

fn check_bucket_count(got: usize, scale: usize) -> HaarMatchResult<()> {
    let expected = 2 * scale * scale * CHANNELS;
    if got != expected {
        return Err(HaarMatchError::IndexShape { expected, got });
    }
    Ok(())
}

fn write_field<W: Write, T: Serialize>(
    writer: &mut W,
    field: &'static str,
    value: &T,
) -> HaarMatchResult<()> {
    bincode::serialize_into(writer, value).map_err(|source| HaarMatchError::Encode { field, source })
}

fn read_field<R: Read, T: DeserializeOwned>(
    reader: &mut R,
    field: &'static str,
) -> HaarMatchResult<T> {
    bincode::deserialize_from(reader).map_err(|source| HaarMatchError::Decode { field, source })
}
