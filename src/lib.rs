//! An in-memory ordered index for Rust.
//!
//! This crate provides [`BPlusIndex`], a B+Tree over fixed-width [`Key`]
//! values with multiset semantics: point insertion, point removal and exact
//! lookup, plus ascending iteration over the linked leaf chain.
//!
//! # Example
//!
//! ```
//! use bplus_index::BPlusIndex;
//!
//! let mut index = BPlusIndex::new();
//! for key in [30, 10, 20, 10] {
//!     index.insert(key)?;
//! }
//!
//! assert!(index.contains(20));
//! assert_eq!(index.len(), 4);
//!
//! index.remove(10);
//! let keys: Vec<_> = index.iter().collect();
//! assert_eq!(keys, [10, 20, 30]);
//! # Ok::<(), bplus_index::Error>(())
//! ```
//!
//! # Features
//!
//! - **Multiset keys** - duplicates are stored and removed one copy at a time
//! - **Fallible allocation** - [`insert`](BPlusIndex::insert) reserves all the
//!   nodes a rebalance could need up front and reports [`Error::OutOfMemory`]
//!   with the index unchanged
//! - **Cache-efficient** - B+tree structure with contiguous node storage
//!
//! # Implementation
//!
//! The index is a B+tree: keys live only in leaves, internal nodes carry
//! routing separators, and leaves form a singly-linked ascending chain. Nodes
//! are stored in a slot arena addressed by compact handles; freed nodes are
//! recycled through a free list as soon as a merge discards them.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod raw;

pub mod bplus_index;

pub use bplus_index::{BPlusIndex, Iter};
pub use error::{Error, Result};

/// The key type stored by [`BPlusIndex`].
pub type Key = i64;
