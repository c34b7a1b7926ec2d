use crate::hash::{Fingerprinter, displaced_slot};
use crate::keyed::KeyedTable;
use crate::table::{SINGLETON_BIT, Table};
use crate::util::{BitSet, table_size};
use std::borrow::Borrow;
use std::cmp::Reverse;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Exclusive upper bound for displacement seeds: the top bit of a seed word is the singleton flag.
pub const SEED_LIMIT: u32 = SINGLETON_BIT;
/// Largest key set a table can index.
pub const MAX_KEYS: usize = 1 << 31;

/// Build parameters.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Seeds `1..max_seed` are tried per bucket before the build fails. Clamped to `SEED_LIMIT`.
    pub max_seed: u32,
    /// Byte key -> fingerprint, only used by [`Builder::build_keys`].
    pub fingerprinter: Fingerprinter,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_seed: SEED_LIMIT,
            fingerprinter: Fingerprinter::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MphError {
    #[error("duplicate fingerprint {fingerprint:#018x} in key set")]
    DuplicateKey { fingerprint: u64 },
    #[error("too many keys: {count} exceeds the 2^31 limit")]
    TooManyKeys { count: usize },
    #[error("no valid seed found for bucket at home slot {home} ({bucket_len} keys, seeds below {limit})")]
    ConstructionFailure {
        home: usize,
        bucket_len: usize,
        limit: u32,
    },
    #[error("invalid table: {0}")]
    InvalidTable(String),
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] Box<bincode::ErrorKind>),
}

pub struct Builder {
    cfg: BuildConfig,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            cfg: BuildConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: BuildConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the table. Ordinal `i` is assigned to `fingerprints[i]`; fingerprints must be distinct.
    pub fn build(self, fingerprints: &[u64]) -> Result<Table, MphError> {
        build_table(fingerprints, self.cfg.max_seed.min(SEED_LIMIT))
    }

    /// Fingerprint byte keys with the configured hasher, then build. Keys must be unique.
    /// Only the key handles are collected; the bytes themselves are never copied.
    pub fn build_keys<K, I>(self, keys: I) -> Result<KeyedTable, MphError>
    where
        K: Borrow<[u8]> + Sync,
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        let fingerprinter = self.cfg.fingerprinter;
        let fingerprints = fingerprinter.fingerprint_all(&keys);
        let table = self.build(&fingerprints)?;
        Ok(KeyedTable::new(fingerprinter, table))
    }
}

/// A key as seen during construction. `ordinal` is 1-based so that 0 can mark a free slot.
#[derive(Clone, Copy, Debug, Default)]
struct Entry {
    ordinal: u32,
    fingerprint: u64,
}

/// Keys grouped by home slot (`fingerprint & mask`), CSR layout:
/// members of home `h` are `entries[offsets[h]..offsets[h + 1]]`, in input order.
struct Buckets {
    offsets: Vec<usize>,
    entries: Vec<Entry>,
}

impl Buckets {
    fn new(fingerprints: &[u64], size: usize) -> Self {
        let mask = (size - 1) as u64;

        let mut offsets = vec![0usize; size + 1];
        for &fp in fingerprints {
            offsets[(fp & mask) as usize + 1] += 1;
        }
        for h in 0..size {
            offsets[h + 1] += offsets[h];
        }

        let mut cur = offsets.clone();
        let mut entries = vec![Entry::default(); fingerprints.len()];
        for (idx, &fp) in fingerprints.iter().enumerate() {
            let h = (fp & mask) as usize;
            entries[cur[h]] = Entry {
                ordinal: idx as u32 + 1,
                fingerprint: fp,
            };
            cur[h] += 1;
        }

        Self { offsets, entries }
    }

    #[inline]
    fn members(&self, home: usize) -> &[Entry] {
        &self.entries[self.offsets[home]..self.offsets[home + 1]]
    }

    #[inline]
    fn len(&self, home: usize) -> usize {
        self.offsets[home + 1] - self.offsets[home]
    }

    fn homes(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Homes of multi-key buckets, largest first; equal sizes keep ascending home order.
    fn solve_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.homes()).filter(|&h| self.len(h) > 1).collect();
        // stable: ties stay in ascending home order
        order.sort_by_key(|&h| Reverse(self.len(h)));
        order
    }
}

/// Per-bucket seed search. `claimed` and `scratch` are reused across attempts and buckets.
struct SeedSolver {
    mask: u64,
    limit: u32,
    claimed: BitSet,
    scratch: Vec<(usize, u32)>,
}

impl SeedSolver {
    fn new(size: usize, limit: u32) -> Self {
        Self {
            mask: (size - 1) as u64,
            limit,
            claimed: BitSet::new(size),
            scratch: Vec::new(),
        }
    }

    /// Find the first seed that sends every member to a distinct free slot and commit it.
    fn solve(&mut self, members: &[Entry], slots: &mut [u32]) -> Option<u32> {
        for seed in 1..self.limit {
            if self.try_seed(members, seed, slots) {
                for &(slot, ordinal) in &self.scratch {
                    slots[slot] = ordinal;
                    self.claimed.unset(slot);
                }
                return Some(seed);
            }
        }
        None
    }

    /// Tentatively place all members with `seed`. On failure every claim is released.
    fn try_seed(&mut self, members: &[Entry], seed: u32, slots: &[u32]) -> bool {
        self.scratch.clear();
        for e in members {
            let slot = displaced_slot(e.fingerprint, seed as u64, self.mask);
            if slots[slot] != 0 || self.claimed.test(slot) {
                for &(s, _) in &self.scratch {
                    self.claimed.unset(s);
                }
                return false;
            }
            self.claimed.set(slot);
            self.scratch.push((slot, e.ordinal));
        }
        true
    }
}

fn check_key_count(count: usize) -> Result<(), MphError> {
    if count > MAX_KEYS {
        return Err(MphError::TooManyKeys { count });
    }
    Ok(())
}

/// Sorted-copy duplicate scan; the caller's order is left untouched.
fn reject_duplicates(fingerprints: &[u64]) -> Result<(), MphError> {
    let mut sorted = fingerprints.to_vec();
    sorted.sort_unstable();
    match sorted.windows(2).find(|w| w[0] == w[1]) {
        Some(w) => Err(MphError::DuplicateKey { fingerprint: w[0] }),
        None => Ok(()),
    }
}

/// One deterministic build:
/// 1) validate and bucket by home slot
/// 2) solve multi-key buckets, largest first
/// 3) park singletons in the remaining free slots, ascending
/// 4) turn 1-based slot contents into final 0-based ordinals
fn build_table(fingerprints: &[u64], seed_limit: u32) -> Result<Table, MphError> {
    let n = fingerprints.len();
    check_key_count(n)?;
    if n == 0 {
        debug!("empty key set, building empty table");
        return Ok(Table::default());
    }
    reject_duplicates(fingerprints)?;

    let size = table_size(n);
    let mask = (size - 1) as u64;
    debug!(keys = n, size, "building table");

    let buckets = Buckets::new(fingerprints, size);
    let order = buckets.solve_order();
    debug!(
        multi_key_buckets = order.len(),
        largest_bucket = order.first().map_or(1, |&h| buckets.len(h)),
        "buckets grouped"
    );

    let mut slots = vec![0u32; size];
    let mut seeds = vec![0u32; size];

    let mut solver = SeedSolver::new(size, seed_limit);
    let mut max_seed = 0u32;
    for &home in &order {
        let members = buckets.members(home);
        let Some(seed) = solver.solve(members, &mut slots) else {
            warn!(home, bucket_len = members.len(), limit = seed_limit, "seed search exhausted");
            return Err(MphError::ConstructionFailure {
                home,
                bucket_len: members.len(),
                limit: seed_limit,
            });
        };
        trace!(home, bucket_len = members.len(), seed, "bucket placed");
        seeds[home] = seed;
        max_seed = max_seed.max(seed);
    }

    let free: Vec<usize> = (0..size).filter(|&s| slots[s] == 0).collect();
    let singles: Vec<usize> = (0..size).filter(|&h| buckets.len(h) == 1).collect();
    // every slot not taken by a multi-key bucket is either a singleton's or unused
    debug_assert!(free.len() >= singles.len());
    for (&home, &dst) in singles.iter().zip(&free) {
        slots[dst] = buckets.members(home)[0].ordinal;
        seeds[home] = SINGLETON_BIT | dst as u32;
    }
    debug!(singletons = singles.len(), max_seed, "table built");

    for v in &mut slots {
        *v = v.saturating_sub(1);
    }

    Ok(Table::from_build(slots, seeds, mask))
}
