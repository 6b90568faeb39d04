//! Shared identifiers and the crate-wide error type.

use thiserror::Error;

/// Logical address of a page managed by the external buffer pool.
///
/// The value `0` is never handed out; stores use it as "no page".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageId(pub u64);

/// Page size used by the default pager geometry.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TesseraError>;

/// Errors surfaced by page and node operations.
///
/// Every mutating node operation is all-or-nothing: when an error is
/// returned the page bytes are exactly as they were before the call.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// The requested allocation would overlap the offset directory with the
    /// blob region. The caller must split the node and retry.
    #[error("internal node out of space")]
    OutOfSpace,
    /// The separator is not present in the node.
    #[error("separator not found in node")]
    NotFound,
    /// A key outside the accepted length range was supplied.
    #[error("invalid key size: {0}")]
    InvalidKeySize(usize),
    /// On-page state failed a structural check.
    #[error("corruption detected: {0}")]
    Corruption(&'static str),
    /// A caller-supplied argument is unusable.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}
