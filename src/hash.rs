#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Odd multiplier applied after the xor-shift rounds of [`mix`].
pub const MIX_MULTIPLIER: u64 = 2_685_821_657_736_338_717;

/// Xorshift-multiply avalanche: the only source of randomness in build and query.
#[inline]
pub fn mix(mut x: u64) -> u64 {
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    x.wrapping_mul(MIX_MULTIPLIER)
}

/// Slot a bucket member lands in for a given displacement seed:
/// slot = mix(fp + seed) & mask
#[inline]
pub fn displaced_slot(fingerprint: u64, seed: u64, mask: u64) -> usize {
    (mix(fingerprint.wrapping_add(seed)) & mask) as usize
}

/// Hash function used to turn byte keys into 64-bit fingerprints.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyHasher {
    #[default]
    Xxh3,
    WyHash,
}

/// Byte key -> fingerprint. The table never sees the key itself, only this output.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fingerprinter {
    pub hasher: KeyHasher,
    pub seed: u64,
}

impl Fingerprinter {
    pub fn new(hasher: KeyHasher, seed: u64) -> Self {
        Self { hasher, seed }
    }

    #[inline]
    pub fn fingerprint(&self, bytes: &[u8]) -> u64 {
        match self.hasher {
            KeyHasher::Xxh3 => xxh3_64_with_seed(bytes, self.seed),
            KeyHasher::WyHash => wyhash::wyhash(bytes, self.seed),
        }
    }

    #[inline]
    pub fn fingerprint_str(&self, s: &str) -> u64 {
        self.fingerprint(s.as_bytes())
    }

    /// Fingerprint a batch of keys, preserving order (in parallel with the "parallel" feature).
    pub fn fingerprint_all<K>(&self, keys: &[K]) -> Vec<u64>
    where
        K: Borrow<[u8]> + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            keys.par_iter().map(|k| self.fingerprint(k.borrow())).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            keys.iter().map(|k| self.fingerprint(k.borrow())).collect()
        }
    }
}
