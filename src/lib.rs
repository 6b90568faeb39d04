//! Slotted-page index primitives for a key-value storage engine.
//!
//! The core of the crate is the internal (interior) B+-tree node: a
//! fixed-size page holding a sorted offset directory of separator keys and
//! child pointers, mutated in place by the operations in
//! [`storage::node::internal`]. Page lifetime belongs to the enclosing
//! engine; this crate only manages page *contents*.

#![warn(missing_docs)]

pub mod storage;
pub mod types;
