//! Binary remap-table blob (`.rrt`).
//!
//! Little-endian, 4-byte aligned records laid out back to back after a fixed
//! header: translation channels, rotation channels, translation offsets,
//! rotation offsets. Quaternions are stored as `[x, y, z, w]`.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::error::BlobError;
use crate::math::Quat;
use crate::retarget::{ChannelMap, RemapTable, RotationOffset, TranslationOffset};

/// `RRTB` in little-endian byte order
pub const BLOB_MAGIC: u32 = u32::from_le_bytes(*b"RRTB");
pub const BLOB_VERSION: u32 = 1;
pub const BLOB_EXTENSION: &str = "rrt";

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
struct BlobHeader {
    magic: u32,
    version: u32,
    translation_channels: u32,
    rotation_channels: u32,
    translation_offsets: u32,
    rotation_offsets: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ChannelMapRecord {
    source: u32,
    destination: u32,
    offset_index: i32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TranslationOffsetRecord {
    scale: f32,
    rotation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RotationOffsetRecord {
    pre_rotation: [f32; 4],
    post_rotation: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<BlobHeader>(), 24);
const_assert_eq!(std::mem::size_of::<ChannelMapRecord>(), 12);
const_assert_eq!(std::mem::size_of::<TranslationOffsetRecord>(), 20);
const_assert_eq!(std::mem::size_of::<RotationOffsetRecord>(), 32);

impl From<&ChannelMap> for ChannelMapRecord {
    fn from(c: &ChannelMap) -> Self {
        Self {
            source: c.source,
            destination: c.destination,
            offset_index: c.offset_index,
        }
    }
}

impl From<ChannelMapRecord> for ChannelMap {
    fn from(r: ChannelMapRecord) -> Self {
        Self {
            source: r.source,
            destination: r.destination,
            offset_index: r.offset_index,
        }
    }
}

impl From<&TranslationOffset> for TranslationOffsetRecord {
    fn from(t: &TranslationOffset) -> Self {
        Self {
            scale: t.scale,
            rotation: t.rotation.to_array(),
        }
    }
}

impl From<TranslationOffsetRecord> for TranslationOffset {
    fn from(r: TranslationOffsetRecord) -> Self {
        Self {
            scale: r.scale,
            rotation: Quat::from_array(r.rotation),
        }
    }
}

impl From<&RotationOffset> for RotationOffsetRecord {
    fn from(o: &RotationOffset) -> Self {
        Self {
            pre_rotation: o.pre_rotation.to_array(),
            post_rotation: o.post_rotation.to_array(),
        }
    }
}

impl From<RotationOffsetRecord> for RotationOffset {
    fn from(r: RotationOffsetRecord) -> Self {
        Self {
            pre_rotation: Quat::from_array(r.pre_rotation),
            post_rotation: Quat::from_array(r.post_rotation),
        }
    }
}

fn push_records<R: Pod>(out: &mut Vec<u8>, records: &[R]) {
    out.extend_from_slice(bytemuck::cast_slice(records));
}

/// Encode a table as a blob
pub fn to_blob(table: &RemapTable) -> Vec<u8> {
    let header = BlobHeader {
        magic: BLOB_MAGIC,
        version: BLOB_VERSION,
        translation_channels: table.translation_channels.len() as u32,
        rotation_channels: table.rotation_channels.len() as u32,
        translation_offsets: table.translation_offsets.len() as u32,
        rotation_offsets: table.rotation_offsets.len() as u32,
    };

    let mut out = Vec::with_capacity(blob_size(&header));
    out.extend_from_slice(bytemuck::bytes_of(&header));

    let channels = |list: &[ChannelMap]| -> Vec<ChannelMapRecord> {
        list.iter().map(ChannelMapRecord::from).collect()
    };
    push_records(&mut out, &channels(&table.translation_channels));
    push_records(&mut out, &channels(&table.rotation_channels));
    push_records(
        &mut out,
        &table
            .translation_offsets
            .iter()
            .map(TranslationOffsetRecord::from)
            .collect::<Vec<_>>(),
    );
    push_records(
        &mut out,
        &table
            .rotation_offsets
            .iter()
            .map(RotationOffsetRecord::from)
            .collect::<Vec<_>>(),
    );
    out
}

fn blob_size(header: &BlobHeader) -> usize {
    use std::mem::size_of;
    size_of::<BlobHeader>()
        + (header.translation_channels as usize + header.rotation_channels as usize)
            * size_of::<ChannelMapRecord>()
        + header.translation_offsets as usize * size_of::<TranslationOffsetRecord>()
        + header.rotation_offsets as usize * size_of::<RotationOffsetRecord>()
}

/// Sequential reader over an unaligned byte slice
struct Reader<'a> {
    bytes: &'a [u8],
}

impl Reader<'_> {
    fn take<R: Pod, T: From<R>>(&mut self, count: u32) -> Vec<T> {
        let size = std::mem::size_of::<R>();
        let (head, rest) = self.bytes.split_at(count as usize * size);
        self.bytes = rest;
        head.chunks_exact(size)
            .map(|chunk| T::from(bytemuck::pod_read_unaligned::<R>(chunk)))
            .collect()
    }
}

/// Decode a blob produced by [`to_blob`]
pub fn from_blob(bytes: &[u8]) -> Result<RemapTable, BlobError> {
    let header_len = std::mem::size_of::<BlobHeader>();
    if bytes.len() < header_len {
        return Err(BlobError::Truncated {
            needed: header_len,
            actual: bytes.len(),
        });
    }

    let header: BlobHeader = bytemuck::pod_read_unaligned(&bytes[..header_len]);
    if header.magic != BLOB_MAGIC {
        return Err(BlobError::BadMagic(header.magic));
    }
    if header.version != BLOB_VERSION {
        return Err(BlobError::UnsupportedVersion(header.version));
    }
    let needed = blob_size(&header);
    if bytes.len() < needed {
        return Err(BlobError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }

    let mut reader = Reader {
        bytes: &bytes[header_len..needed],
    };
    Ok(RemapTable {
        translation_channels: reader.take::<ChannelMapRecord, _>(header.translation_channels),
        rotation_channels: reader.take::<ChannelMapRecord, _>(header.rotation_channels),
        translation_offsets: reader
            .take::<TranslationOffsetRecord, _>(header.translation_offsets),
        rotation_offsets: reader.take::<RotationOffsetRecord, _>(header.rotation_offsets),
    })
}
