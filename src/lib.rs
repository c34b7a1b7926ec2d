//! displace_mph — hash-and-displace minimal perfect hash table.
//!
//! - Build once on a set of **distinct** 64-bit fingerprints.
//! - O(1) lookups: fingerprint -> unique ordinal in `[0..n)`.
//! - Deterministic: the same input always yields the same table, bit for bit.
//! - Colliding home slots get a per-bucket displacement seed; singletons are parked directly.

mod builder;
mod hash;
mod keyed;
mod table;
mod util;

pub use builder::{BuildConfig, Builder, MAX_KEYS, MphError, SEED_LIMIT};
pub use hash::{Fingerprinter, KeyHasher, displaced_slot, mix};
pub use keyed::KeyedTable;
pub use table::{PAYLOAD_MASK, SINGLETON_BIT, Table};

/// Build a table with the default configuration.
pub fn build(fingerprints: &[u64]) -> Result<Table, MphError> {
    Builder::new().build(fingerprints)
}
