#![forbid(unsafe_code)]

//! The internal B+-tree node: a slotted page of separator keys and child
//! pointers.
//!
//! [`page`] owns the byte layout and bounds-checked accessors, [`key`] the
//! separator type and its total order, and [`internal`] the node manager
//! (init, lookup, insert, split, remove). The caller holds page access for
//! the duration of every call: exclusive for mutations, at least shared
//! for lookups.

pub mod internal;
pub mod key;
pub mod page;

pub use internal::MAX_BLOB_COUNT;
pub use key::{Separator, MAX_KEY_LEN};
