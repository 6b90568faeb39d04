//! Operations over a page interpreted as an internal B+-tree node.
//!
//! All functions take the raw page buffer; the caller already holds page
//! access for the duration of the call (exclusive for mutations, at least
//! shared for [`lookup`]). Mutating operations are all-or-nothing: any
//! error leaves the page byte-for-byte unchanged. Split-then-retry
//! orchestration belongs to the enclosing tree, not this module.

use std::cmp::Ordering;

use smallvec::SmallVec;

use super::key::{Separator, MAX_KEY_LEN};
use super::page::{self, Header, BLOB_HEADER_LEN, DIR_ENTRY_LEN};
use crate::types::{PageId, Result, TesseraError};

/// Hard ceiling on directory entries, independent of free space.
pub const MAX_BLOB_COUNT: u16 = 1024;

const INLINE_OFFSETS: usize = 32;
type OffsetScratch = SmallVec<[u16; INLINE_OFFSETS]>;

/// Reset `page` to an empty internal node: no blobs, all space free.
///
/// The node is not yet valid for routing; the caller must insert at least
/// one separator before linking it into a live tree.
pub fn init(page: &mut [u8]) -> Result<()> {
    let len = page::check_page_len(page)?;
    page::set_leaf_flag(page, false);
    page::set_blob_count(page, 0);
    page::set_watermark(page, len);
    Ok(())
}

/// Build a fresh node in `dst` from the blobs at `offsets` in `src`.
///
/// Blob bytes are preserved exactly; the directory is rebuilt contiguously
/// in the order given, and the watermark is recomputed. `offsets` must
/// already be in separator order for the resulting node to satisfy the
/// directory invariant.
pub fn init_from_offsets(dst: &mut [u8], src: &[u8], offsets: &[u16]) -> Result<()> {
    Header::parse(src)?;
    init(dst)?;
    for (index, &offset) in offsets.iter().enumerate() {
        let blob = page::decode_blob(src, offset)?;
        let new_offset = insert_blob(dst, blob.child, blob.separator)?;
        insert_offset(dst, index, new_offset)?;
    }
    Ok(())
}

/// Whether inserting one more directory entry plus a blob for a key of
/// `key_len` bytes would overlap the directory with the blob region, or
/// hit the record ceiling.
///
/// Callers consult this before [`insert`] and split first when it returns
/// true.
pub fn is_full(page: &[u8], key_len: usize) -> Result<bool> {
    let header = Header::parse(page)?;
    if header.blob_count >= MAX_BLOB_COUNT {
        return Ok(true);
    }
    Ok(DIR_ENTRY_LEN + BLOB_HEADER_LEN + key_len > header.free_space())
}

/// Insert separator `key` routing to `left`, rewiring the following slot's
/// child to `right`.
///
/// The slot that previously routed past `key` must now route through the
/// right child produced by the split that motivated this insertion. On an
/// empty node both the separator blob and the sentinel blob
/// `{sentinel, right}` are materialized. Fails with
/// [`TesseraError::OutOfSpace`] (page untouched) when the allocation does
/// not fit; the caller must split and retry.
pub fn insert(page: &mut [u8], key: &[u8], left: PageId, right: PageId) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(TesseraError::InvalidKeySize(key.len()));
    }
    let header = Header::parse(page)?;
    let empty = header.blob_count == 0;
    let mut needed = DIR_ENTRY_LEN + BLOB_HEADER_LEN + key.len();
    if empty {
        // the sentinel pair is allocated together with the first separator
        needed += DIR_ENTRY_LEN + BLOB_HEADER_LEN;
    }
    if header.blob_count >= MAX_BLOB_COUNT || needed > header.free_space() {
        return Err(TesseraError::OutOfSpace);
    }

    let (index, _) = get_offset_index(page, &header, Separator::Key(key))?;
    if !empty && index == header.blob_count as usize {
        return Err(TesseraError::Corruption("node missing sentinel slot"));
    }
    let offset = insert_blob(page, left, Separator::Key(key))?;
    insert_offset(page, index, offset)?;
    if empty {
        let sentinel_offset = insert_blob(page, right, Separator::Sentinel)?;
        insert_offset(page, 1, sentinel_offset)?;
    } else {
        let header = Header::parse(page)?;
        let next = page::dir_entry(page, &header, index + 1)?;
        page::set_child(page, next, right);
    }
    tracing::trace!(
        target: "tessera::node",
        key_len = key.len(),
        index,
        "inserted separator"
    );
    Ok(())
}

/// Child pointer of the first slot whose separator is not less than `key`.
///
/// The sentinel slot satisfies this for keys greater than every stored
/// separator, so lookup on a well-formed non-empty node always succeeds.
pub fn lookup(page: &[u8], key: &[u8]) -> Result<PageId> {
    let header = Header::parse(page)?;
    if header.blob_count == 0 {
        return Err(TesseraError::Invalid("lookup on empty internal node"));
    }
    let (index, _) = get_offset_index(page, &header, Separator::Key(key))?;
    if index >= header.blob_count as usize {
        return Err(TesseraError::Corruption("node missing sentinel slot"));
    }
    let offset = page::dir_entry(page, &header, index)?;
    Ok(page::decode_blob(page, offset)?.child)
}

/// Split `page` at the directory midpoint, materializing the upper half in
/// `right_page` and returning the promoted median separator.
///
/// The lower half (keys `< median`) stays in `page`; the upper half (keys
/// `>= median`) is copied into `right_page` via subset-init; the median is
/// promoted to the caller, which must insert it into the parent with the
/// pointer pair `{page, right_page}`. The trailing-sentinel invariant is
/// node-local, so whichever half now ends on an explicit key has that key
/// cleared to sentinel form.
pub fn split(page: &mut [u8], right_page: &mut [u8]) -> Result<Vec<u8>> {
    let header = Header::parse(page)?;
    let count = header.blob_count as usize;
    if count < 3 {
        return Err(TesseraError::Invalid(
            "cannot split a node with fewer than three blobs",
        ));
    }
    let mid = count / 2;

    let median_offset = page::dir_entry(page, &header, mid)?;
    let median = match page::decode_blob(page, median_offset)?.separator {
        Separator::Key(key) => key.to_vec(),
        Separator::Sentinel => {
            return Err(TesseraError::Corruption("sentinel blob at split midpoint"))
        }
    };

    let mut upper: OffsetScratch = SmallVec::new();
    for index in mid..count {
        upper.push(page::dir_entry(page, &header, index)?);
    }
    init_from_offsets(right_page, page, &upper)?;

    // truncate the retained half in place, reclaiming the copied-out bytes
    for index in (mid..count).rev() {
        let header = Header::parse(page)?;
        let offset = page::dir_entry(page, &header, index)?;
        let len = page::blob_len_at(page, offset)?;
        delete_offset(page, index)?;
        reclaim(page, offset, len as u16)?;
    }
    make_last_blob_special(page)?;
    make_last_blob_special(right_page)?;

    tracing::trace!(
        target: "tessera::node",
        retained = mid,
        moved = count - mid,
        "split internal node"
    );
    Ok(median)
}

/// Remove the slot matching `separator`, compacting the blob region.
///
/// Fails with [`TesseraError::NotFound`] (no mutation) when no slot
/// matches. Removing the last-by-order slot promotes the newly-last entry
/// to sentinel, keeping the rightmost child a catch-all.
pub fn remove(page: &mut [u8], separator: Separator<'_>) -> Result<()> {
    if let Separator::Key(key) = separator {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(TesseraError::InvalidKeySize(key.len()));
        }
    }
    let header = Header::parse(page)?;
    let count = header.blob_count as usize;
    let (index, exact) = get_offset_index(page, &header, separator)?;
    if !exact {
        return Err(TesseraError::NotFound);
    }
    let was_last = index == count - 1;
    let offset = page::dir_entry(page, &header, index)?;
    let len = page::blob_len_at(page, offset)?;
    delete_offset(page, index)?;
    reclaim(page, offset, len as u16)?;
    if was_last && count > 1 {
        make_last_blob_special(page)?;
    }
    tracing::trace!(target: "tessera::node", index, "removed separator");
    Ok(())
}

/// Comparator-ordered binary search over the directory.
///
/// Returns the first index whose separator is not less than `probe`,
/// together with whether the separator there compares equal. This closure
/// over the probe replaces the original layout's "offset zero means an
/// external key" convention.
fn get_offset_index(page: &[u8], header: &Header, probe: Separator<'_>) -> Result<(usize, bool)> {
    let mut lo = 0usize;
    let mut hi = header.blob_count as usize;
    while lo < hi {
        let mid = (lo + hi) / 2;
        let offset = page::dir_entry(page, header, mid)?;
        let blob = page::decode_blob(page, offset)?;
        if blob.separator.cmp(&probe) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo < header.blob_count as usize {
        let offset = page::dir_entry(page, header, lo)?;
        let blob = page::decode_blob(page, offset)?;
        Ok((lo, blob.separator == probe))
    } else {
        Ok((lo, false))
    }
}

/// Splice `offset` into the directory at `index`, shifting later entries
/// one slot toward the page tail.
fn insert_offset(page: &mut [u8], index: usize, offset: u16) -> Result<()> {
    let header = Header::parse(page)?;
    let count = header.blob_count as usize;
    debug_assert!(index <= count);
    if header.free_space() < DIR_ENTRY_LEN {
        return Err(TesseraError::OutOfSpace);
    }
    let range = page::dir_range(index, count);
    let dest = page::dir_range(index + 1, index + 2).start;
    page.copy_within(range, dest);
    page::write_dir_entry(page, index, offset);
    page::set_blob_count(page, header.blob_count + 1);
    Ok(())
}

/// Splice the directory entry at `index` out, shifting later entries one
/// slot toward the page head.
fn delete_offset(page: &mut [u8], index: usize) -> Result<()> {
    let header = Header::parse(page)?;
    let count = header.blob_count as usize;
    if index >= count {
        return Err(TesseraError::Invalid("directory index out of range"));
    }
    let range = page::dir_range(index + 1, count);
    let dest = page::dir_range(index, index + 1).start;
    page.copy_within(range, dest);
    page::set_blob_count(page, header.blob_count - 1);
    Ok(())
}

/// Allocate a blob at the low end of the blob region, returning its
/// offset.
fn insert_blob(page: &mut [u8], child: PageId, separator: Separator<'_>) -> Result<u16> {
    let header = Header::parse(page)?;
    let len = page::blob_len(separator);
    if header.free_space() < len {
        return Err(TesseraError::OutOfSpace);
    }
    let offset = header.watermark - len as u16;
    page::encode_blob(page, offset, child, separator);
    page::set_watermark(page, offset);
    Ok(offset)
}

/// Close the byte gap `[gap_start, gap_start + gap_len)` inside the blob
/// region: bytes below the gap slide toward the tail, directory entries
/// that pointed below `gap_start` are rebased, and the watermark advances.
///
/// The single compaction subroutine shared by [`remove`], [`split`], and
/// [`make_last_blob_special`]; the freed bytes must no longer be
/// referenced by the directory when it runs.
fn reclaim(page: &mut [u8], gap_start: u16, gap_len: u16) -> Result<()> {
    if gap_len == 0 {
        return Ok(());
    }
    let header = Header::parse(page)?;
    let watermark = header.watermark;
    debug_assert!(watermark <= gap_start);
    page.copy_within(
        watermark as usize..gap_start as usize,
        (watermark + gap_len) as usize,
    );
    for index in 0..header.blob_count as usize {
        let offset = page::dir_entry(page, &header, index)?;
        if offset < gap_start {
            page::write_dir_entry(page, index, offset + gap_len);
        }
    }
    page::set_watermark(page, watermark + gap_len);
    tracing::trace!(target: "tessera::node", gap_start, gap_len, "reclaimed blob bytes");
    Ok(())
}

/// Clear the key of the directory's last-by-order blob to sentinel form,
/// reclaiming the freed key bytes immediately.
///
/// A no-op when the last blob is already the sentinel.
fn make_last_blob_special(page: &mut [u8]) -> Result<()> {
    let header = Header::parse(page)?;
    let count = header.blob_count as usize;
    if count == 0 {
        return Err(TesseraError::Invalid("empty node has no last blob"));
    }
    let offset = page::dir_entry(page, &header, count - 1)?;
    let key_len = page::blob_len_at(page, offset)? - BLOB_HEADER_LEN;
    if key_len == 0 {
        return Ok(());
    }
    page::clear_key(page, offset);
    reclaim(page, offset + BLOB_HEADER_LEN as u16, key_len as u16)
}
