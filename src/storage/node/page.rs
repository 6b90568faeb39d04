//! Byte layout of the internal-node page and its bounds-checked accessors.
//!
//! ```text
//! offset 0          : u8      leaf flag (0 for an internal node)
//! offset 1..3       : u16 BE  blob count
//! offset 3..5       : u16 BE  free-space watermark
//! offset 5..5+2n    : u16 BE  offset directory, sorted by separator order
//! [watermark..len)  : blob region, growing from the page tail
//! ```
//!
//! Each blob is `child (u64 BE) | key_len (u8) | key bytes`. The gap
//! between the directory and the watermark is the node's free space.

use std::convert::TryFrom;

use super::key::Separator;
use crate::types::{PageId, Result, TesseraError};

/// Bytes occupied by the fixed page header (leaf flag, count, watermark).
pub const HEADER_LEN: usize = 5;
/// Bytes per offset-directory entry.
pub const DIR_ENTRY_LEN: usize = 2;
/// Bytes of a blob before its key: child pointer plus key-length byte.
pub const BLOB_HEADER_LEN: usize = 9;

const LEAF_FLAG_OFFSET: usize = 0;
const BLOB_COUNT_OFFSET: usize = 1;
const WATERMARK_OFFSET: usize = 3;
const DIRECTORY_OFFSET: usize = HEADER_LEN;

/// Decoded view of one blob: a child pointer and the separator routed
/// through it.
#[derive(Clone, Copy, Debug)]
pub struct BlobRef<'a> {
    /// Child page routed through this slot.
    pub child: PageId,
    /// Separator stored alongside the child pointer.
    pub separator: Separator<'a>,
}

/// Header fields of an internal-node page.
#[derive(Clone, Copy, Debug)]
pub struct Header {
    /// Number of directory entries (and blobs).
    pub blob_count: u16,
    /// Lowest byte offset occupied by the blob region.
    pub watermark: u16,
}

impl Header {
    /// Decode and structurally validate the header.
    pub fn parse(page: &[u8]) -> Result<Self> {
        check_page_len(page)?;
        if page[LEAF_FLAG_OFFSET] != 0 {
            return Err(TesseraError::Corruption("leaf flag set on internal page"));
        }
        let blob_count = read_u16(page, BLOB_COUNT_OFFSET);
        let watermark = read_u16(page, WATERMARK_OFFSET);
        if watermark as usize > page.len() {
            return Err(TesseraError::Corruption("watermark beyond page end"));
        }
        let dir_end = DIRECTORY_OFFSET + blob_count as usize * DIR_ENTRY_LEN;
        if dir_end > watermark as usize {
            return Err(TesseraError::Corruption(
                "offset directory overlaps blob region",
            ));
        }
        Ok(Self {
            blob_count,
            watermark,
        })
    }

    /// Free bytes between the end of the directory and the watermark.
    pub fn free_space(&self) -> usize {
        self.watermark as usize - (DIRECTORY_OFFSET + self.blob_count as usize * DIR_ENTRY_LEN)
    }
}

/// Validate the buffer length and return it as a `u16`.
///
/// The watermark field must be able to address one past the last byte, so
/// pages are capped at `u16::MAX` bytes.
pub fn check_page_len(page: &[u8]) -> Result<u16> {
    if page.len() < HEADER_LEN {
        return Err(TesseraError::Invalid("page shorter than node header"));
    }
    u16::try_from(page.len()).map_err(|_| TesseraError::Invalid("page larger than u16 range"))
}

/// Encoded size of a blob holding `separator`.
pub fn blob_len(separator: Separator<'_>) -> usize {
    BLOB_HEADER_LEN + separator.stored_bytes().len()
}

/// Encoded size of the blob stored at `offset`.
pub fn blob_len_at(page: &[u8], offset: u16) -> Result<usize> {
    let blob = decode_blob(page, offset)?;
    Ok(blob_len(blob.separator))
}

/// Decode the blob at `offset`, validating that it lies inside the page
/// and past the header.
pub fn decode_blob(page: &[u8], offset: u16) -> Result<BlobRef<'_>> {
    let start = offset as usize;
    if start < HEADER_LEN {
        return Err(TesseraError::Corruption("blob offset inside page header"));
    }
    if start + BLOB_HEADER_LEN > page.len() {
        return Err(TesseraError::Corruption("blob header beyond page end"));
    }
    let child = PageId(u64::from_be_bytes(
        page[start..start + 8].try_into().expect("eight-byte slice"),
    ));
    let key_len = page[start + 8] as usize;
    let end = start + BLOB_HEADER_LEN + key_len;
    if end > page.len() {
        return Err(TesseraError::Corruption("blob key beyond page end"));
    }
    let separator = Separator::from_stored(&page[start + BLOB_HEADER_LEN..end]);
    Ok(BlobRef { child, separator })
}

/// Write a blob at `offset`. The caller must have reserved the bytes.
pub fn encode_blob(page: &mut [u8], offset: u16, child: PageId, separator: Separator<'_>) {
    let start = offset as usize;
    let key = separator.stored_bytes();
    page[start..start + 8].copy_from_slice(&child.0.to_be_bytes());
    page[start + 8] = key.len() as u8;
    page[start + BLOB_HEADER_LEN..start + BLOB_HEADER_LEN + key.len()].copy_from_slice(key);
}

/// Rewrite the child pointer of the blob at `offset`.
pub fn set_child(page: &mut [u8], offset: u16, child: PageId) {
    let start = offset as usize;
    page[start..start + 8].copy_from_slice(&child.0.to_be_bytes());
}

/// Clear the stored key of the blob at `offset` to sentinel form. The old
/// key bytes become slack until reclaimed.
pub fn clear_key(page: &mut [u8], offset: u16) {
    page[offset as usize + 8] = 0;
}

/// Directory entry (raw blob offset) at `index`.
pub fn dir_entry(page: &[u8], header: &Header, index: usize) -> Result<u16> {
    if index >= header.blob_count as usize {
        return Err(TesseraError::Invalid("directory index out of range"));
    }
    Ok(read_u16(page, DIRECTORY_OFFSET + index * DIR_ENTRY_LEN))
}

/// Overwrite the directory entry at `index`.
pub fn write_dir_entry(page: &mut [u8], index: usize, offset: u16) {
    write_u16(page, DIRECTORY_OFFSET + index * DIR_ENTRY_LEN, offset);
}

/// Byte range of directory entries `[from, to)`, for splicing.
pub fn dir_range(from: usize, to: usize) -> std::ops::Range<usize> {
    (DIRECTORY_OFFSET + from * DIR_ENTRY_LEN)..(DIRECTORY_OFFSET + to * DIR_ENTRY_LEN)
}

/// Set the leaf flag. Internal nodes always store `false`.
pub fn set_leaf_flag(page: &mut [u8], leaf: bool) {
    page[LEAF_FLAG_OFFSET] = u8::from(leaf);
}

/// Set the blob count in the page header.
pub fn set_blob_count(page: &mut [u8], value: u16) {
    write_u16(page, BLOB_COUNT_OFFSET, value);
}

/// Set the free-space watermark in the page header.
pub fn set_watermark(page: &mut [u8], value: u16) {
    write_u16(page, WATERMARK_OFFSET, value);
}

fn read_u16(page: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes(page[offset..offset + 2].try_into().expect("two-byte slice"))
}

fn write_u16(page: &mut [u8], offset: usize, value: u16) {
    page[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}
