use crate::builder::MphError;
use crate::hash::displaced_slot;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Set in a seed word when the bucket homed there was a singleton.
pub const SINGLETON_BIT: u32 = 1 << 31;
/// Low 31 bits: displacement seed, or the slot a singleton was parked in.
pub const PAYLOAD_MASK: u32 = !SINGLETON_BIT;

/// Immutable minimal perfect hash table over 64-bit fingerprints.
///
/// - `values[slot]`: 0-based ordinal stored in that slot (unused slots hold 0)
/// - `seeds[home]`: for the home slot of every bucket, either
///   `SINGLETON_BIT | slot` or a displacement seed in `[1, 2^31)`
/// - `mask`: `size - 1`, selects the home-slot bits of a fingerprint
///
/// Query:
///   s = seeds[fp & mask]
///   singleton => values[s & PAYLOAD_MASK]
///   otherwise => values[mix(fp + s) & mask]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TableParts"))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    values: Vec<u32>,
    seeds: Vec<u32>,
    mask: u64,
}

/// Raw persisted triple, checked by [`Table::from_parts`] before it becomes a `Table`.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TableParts {
    values: Vec<u32>,
    seeds: Vec<u32>,
    mask: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<TableParts> for Table {
    type Error = MphError;

    fn try_from(p: TableParts) -> Result<Self, Self::Error> {
        Table::from_parts(p.values, p.seeds, p.mask)
    }
}

impl Table {
    /// Assembled by the builder, which upholds every invariant itself.
    pub(crate) fn from_build(values: Vec<u32>, seeds: Vec<u32>, mask: u64) -> Self {
        debug_assert_eq!(values.len(), seeds.len());
        Self { values, seeds, mask }
    }

    /// Rebuild a table from its three arrays, rejecting anything a query could index out of.
    pub fn from_parts(values: Vec<u32>, seeds: Vec<u32>, mask: u64) -> Result<Self, MphError> {
        let size = values.len();
        if seeds.len() != size {
            return Err(MphError::InvalidTable(format!(
                "values has {size} slots but seeds has {}",
                seeds.len()
            )));
        }
        if size == 0 {
            if mask != 0 {
                return Err(MphError::InvalidTable(format!("empty table with mask {mask:#x}")));
            }
            return Ok(Self::default());
        }
        if !size.is_power_of_two() || size > SINGLETON_BIT as usize {
            return Err(MphError::InvalidTable(format!("size {size} is not a power of two <= 2^31")));
        }
        if mask != (size - 1) as u64 {
            return Err(MphError::InvalidTable(format!(
                "mask {mask:#x} does not match size {size}"
            )));
        }
        if let Some(home) = seeds
            .iter()
            .position(|&s| s & SINGLETON_BIT != 0 && (s & PAYLOAD_MASK) as usize >= size)
        {
            return Err(MphError::InvalidTable(format!(
                "singleton at home slot {home} points past the table"
            )));
        }
        if let Some(slot) = values.iter().position(|&v| v as usize >= size) {
            return Err(MphError::InvalidTable(format!(
                "slot {slot} holds ordinal {} outside [0, {size})",
                values[slot]
            )));
        }
        Ok(Self { values, seeds, mask })
    }

    /// Ordinal of `fingerprint`, or -1 when the table was built from zero keys.
    ///
    /// Only meaningful for fingerprints from the build set; anything else still
    /// yields some in-range ordinal that the caller has to verify.
    #[inline]
    pub fn query(&self, fingerprint: u64) -> i32 {
        match self.lookup(fingerprint) {
            Some(ordinal) => ordinal as i32,
            None => -1,
        }
    }

    /// Same as [`Table::query`], with `None` for the empty table.
    #[inline]
    pub fn lookup(&self, fingerprint: u64) -> Option<u32> {
        if self.values.is_empty() {
            return None;
        }
        let home = (fingerprint & self.mask) as usize;
        let s = self.seed_at(home);
        let slot = if s & SINGLETON_BIT != 0 {
            (s & PAYLOAD_MASK) as usize
        } else {
            displaced_slot(fingerprint, s as u64, self.mask)
        };
        Some(self.value_at(slot))
    }

    #[cfg(feature = "unsafe_optimizations")]
    #[inline(always)]
    fn seed_at(&self, home: usize) -> u32 {
        // SAFETY: home = fp & mask < size == seeds.len()
        unsafe { *self.seeds.get_unchecked(home) }
    }

    #[cfg(not(feature = "unsafe_optimizations"))]
    #[inline(always)]
    fn seed_at(&self, home: usize) -> u32 {
        self.seeds[home]
    }

    #[cfg(feature = "unsafe_optimizations")]
    #[inline(always)]
    fn value_at(&self, slot: usize) -> u32 {
        // SAFETY: slot is either masked or a singleton payload checked < size in from_parts
        unsafe { *self.values.get_unchecked(slot) }
    }

    #[cfg(not(feature = "unsafe_optimizations"))]
    #[inline(always)]
    fn value_at(&self, slot: usize) -> u32 {
        self.values[slot]
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn seeds(&self) -> &[u32] {
        &self.seeds
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of slots (a power of two, or 0).
    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Heap footprint of the two slot arrays.
    pub fn memory_usage_bytes(&self) -> usize {
        (self.values.len() + self.seeds.len()) * std::mem::size_of::<u32>()
    }

    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, MphError> {
        Ok(bincode::serialize(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MphError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
