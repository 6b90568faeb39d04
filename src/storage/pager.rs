//! Minimal in-memory stand-in for the external page/buffer pool.
//!
//! The node manager never owns page lifetime; tests and benchmarks use
//! [`MemPager`] to play the enclosing engine's role when orchestrating
//! split-then-promote sequences. No file I/O, WAL, or locking lives here.

use crate::types::{PageId, Result, TesseraError, DEFAULT_PAGE_SIZE};

/// Allocator handing out fixed-size page buffers addressed by [`PageId`].
pub trait PageStore {
    /// Size in bytes of every buffer handed out by this store.
    fn page_size(&self) -> usize;

    /// Allocate a zeroed page and return its address.
    fn allocate(&mut self) -> PageId;

    /// Shared view of the page at `id`.
    fn page(&self, id: PageId) -> Result<&[u8]>;

    /// Exclusive view of the page at `id`.
    fn page_mut(&mut self, id: PageId) -> Result<&mut [u8]>;

    /// Exclusive views of two distinct pages at once, as split
    /// orchestration needs.
    fn page_pair_mut(&mut self, a: PageId, b: PageId) -> Result<(&mut [u8], &mut [u8])>;
}

/// Vec-backed [`PageStore`] for tests, benchmarks, and ephemeral trees.
/// Page ids start at 1; 0 is never handed out.
pub struct MemPager {
    page_size: usize,
    pages: Vec<Vec<u8>>,
}

impl MemPager {
    /// Create a pager producing pages of `page_size` bytes.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
        }
    }

    /// Number of pages allocated so far.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when no pages have been allocated.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn index(id: PageId) -> Result<usize> {
        let raw = id
            .0
            .checked_sub(1)
            .ok_or(TesseraError::Invalid("page id zero"))?;
        usize::try_from(raw).map_err(|_| TesseraError::Invalid("page id out of range"))
    }
}

impl Default for MemPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageStore for MemPager {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn allocate(&mut self) -> PageId {
        self.pages.push(vec![0u8; self.page_size]);
        PageId(self.pages.len() as u64)
    }

    fn page(&self, id: PageId) -> Result<&[u8]> {
        self.pages
            .get(Self::index(id)?)
            .map(Vec::as_slice)
            .ok_or(TesseraError::Invalid("page id out of range"))
    }

    fn page_mut(&mut self, id: PageId) -> Result<&mut [u8]> {
        self.pages
            .get_mut(Self::index(id)?)
            .map(Vec::as_mut_slice)
            .ok_or(TesseraError::Invalid("page id out of range"))
    }

    fn page_pair_mut(&mut self, a: PageId, b: PageId) -> Result<(&mut [u8], &mut [u8])> {
        let first = Self::index(a)?;
        let second = Self::index(b)?;
        if first == second {
            return Err(TesseraError::Invalid("page pair must be distinct"));
        }
        if first.max(second) >= self.pages.len() {
            return Err(TesseraError::Invalid("page id out of range"));
        }
        let pivot = first.max(second);
        let (low, high) = self.pages.split_at_mut(pivot);
        if first < second {
            Ok((low[first].as_mut_slice(), high[0].as_mut_slice()))
        } else {
            Ok((high[0].as_mut_slice(), low[second].as_mut_slice()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_zeroed_pages_with_one_based_ids() -> Result<()> {
        let mut pager = MemPager::new(128);
        assert!(pager.is_empty());
        let first = pager.allocate();
        let second = pager.allocate();
        assert_eq!(first, PageId(1));
        assert_eq!(second, PageId(2));
        assert_eq!(pager.len(), 2);
        assert!(pager.page(first)?.iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn page_pair_mut_hands_out_distinct_buffers() -> Result<()> {
        let mut pager = MemPager::new(64);
        let a = pager.allocate();
        let b = pager.allocate();
        let (left, right) = pager.page_pair_mut(b, a)?;
        left[0] = 7;
        right[0] = 9;
        assert_eq!(pager.page(b)?[0], 7);
        assert_eq!(pager.page(a)?[0], 9);
        assert!(pager.page_pair_mut(a, a).is_err());
        Ok(())
    }

    #[test]
    fn rejects_unknown_and_zero_page_ids() {
        let pager = MemPager::default();
        assert!(pager.page(PageId(0)).is_err());
        assert!(pager.page(PageId(3)).is_err());
    }
}
