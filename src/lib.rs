//! intrusive-hashtable: chained hash tables that index elements living in
//! caller-owned storage.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1)-amortized keyed lookup for caches, object stores and
//!   in-memory indices without the index owning, copying or allocating the
//!   elements it indexes.
//! - Layers:
//!   - Node<K>: link embedded in every element (next key, cached hash,
//!     back-reference). Elements implement `Linked<K>` to expose it.
//!   - NodeStore: the caller's storage (`SlotMap` family or `Vec`), where
//!     stable keys stand in for pointers into caller memory.
//!   - chain: singly linked bucket chains threaded through the store.
//!   - FixedTable / DynamicTable / IncrementalTable: three resize
//!     strategies behind one `HashIndex` trait.
//!
//! Constraints
//! - Single-threaded: no locks, no atomics. Mutation needs `&mut` to both
//!   the table and the store, so the borrow checker rules out mutation
//!   during iteration.
//! - The caller computes a 32-bit hash per element; tables never hash.
//! - Tables allocate only bucket storage, lazily on first insert.
//! - Insertion order within a chain is LIFO: among equal elements the most
//!   recently inserted one is found first. Resizes preserve that order.
//!
//! Resize strategies
//! - FixedTable: `2^bits` buckets forever.
//! - DynamicTable: doubles when the element count is above half the bucket
//!   count and halves when it drops below an eighth, relinking everything in
//!   one pass. The relink happens inside the triggering call.
//! - IncrementalTable: linear hashing. Splits or merges one bucket per step
//!   using a split index, so no call relinks more than a few chains. Bucket
//!   storage is a list of blocks of 1, 1, 2, 4, ... slots.
//! - Thresholds are a `ResizePolicy`; the defaults are 1/2 and 1/8 with a
//!   minimum of 16 buckets.
//!
//! Failure model
//! - Not-found is `None`.
//! - Allocation failure during implicit growth aborts, like any `Vec`
//!   growth. `reserve` on the resizable tables pre-sizes through fallible
//!   allocation and reports `TableError::Alloc` instead.
//! - Inserting an element that is already linked is a caller bug caught by
//!   a debug assertion. `remove_existing` on an element that is not linked
//!   here returns `None`.
//!
//! Notes and non-goals
//! - Chains have no back pointers, so `remove_existing` scans the
//!   element's bucket for its predecessor: O(chain length), not O(1).
//! - No concurrent access, no iterator invalidation protection beyond what
//!   borrows give.
//! - Dropping a table frees bucket storage only. Elements stay in the store
//!   with stale links; call `clear` first to detach them.

mod bucket;
mod chain;
mod dynamic;
mod error;
mod fixed;
mod incremental;
mod node;
pub mod policy;
mod table;
mod table_proptest;

// Public surface
pub use chain::Chain;
pub use dynamic::DynamicTable;
pub use error::{Result, TableError};
pub use fixed::FixedTable;
pub use incremental::IncrementalTable;
pub use node::{Linked, Node, NodeStore};
pub use policy::{LoadFactor, ResizePolicy};
pub use table::HashIndex;
