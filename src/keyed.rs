#[cfg(feature = "serde")]
use crate::builder::MphError;
use crate::hash::Fingerprinter;
use crate::table::Table;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A [`Table`] bundled with the fingerprinter its keys went through,
/// so lookups can take the original byte keys.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedTable {
    fingerprinter: Fingerprinter,
    table: Table,
}

impl KeyedTable {
    pub fn new(fingerprinter: Fingerprinter, table: Table) -> Self {
        Self { fingerprinter, table }
    }

    /// Ordinal of `key`, -1 for a table built from no keys. Keys outside the build set give an arbitrary ordinal.
    #[inline]
    pub fn index(&self, key: &[u8]) -> i32 {
        self.table.query(self.fingerprinter.fingerprint(key))
    }

    #[inline]
    pub fn index_str(&self, s: &str) -> i32 {
        self.index(s.as_bytes())
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn fingerprinter(&self) -> Fingerprinter {
        self.fingerprinter
    }

    pub fn into_table(self) -> Table {
        self.table
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildConfig, Builder, MphError};
    use crate::hash::KeyHasher;

    const WORDS: [&str; 8] = ["foo", "bar", "baz", "qux", "zot", "frob", "zork", "zeek"];

    #[test]
    fn indexes_words_in_input_order() {
        let kt = Builder::new()
            .build_keys(WORDS.iter().map(|w| w.as_bytes()))
            .unwrap();
        assert_eq!(kt.table().size(), 8);
        for (i, w) in WORDS.iter().enumerate() {
            assert_eq!(kt.index_str(w), i as i32);
        }
    }

    #[test]
    fn wyhash_fingerprinter_is_carried_along() {
        let cfg = BuildConfig {
            fingerprinter: Fingerprinter::new(KeyHasher::WyHash, 99),
            ..Default::default()
        };
        let kt = Builder::new()
            .with_config(cfg)
            .build_keys(WORDS.iter().map(|w| w.as_bytes()))
            .unwrap();
        assert_eq!(kt.fingerprinter().hasher, KeyHasher::WyHash);
        for (i, w) in WORDS.iter().enumerate() {
            assert_eq!(kt.index(w.as_bytes()), i as i32);
        }
    }

    #[test]
    fn owned_and_borrowed_keys_build_the_same_table() {
        let owned: Vec<Vec<u8>> = WORDS.iter().map(|w| w.as_bytes().to_vec()).collect();
        let from_borrowed = Builder::new()
            .build_keys(owned.iter().map(|k| k.as_slice()))
            .unwrap();
        let from_owned = Builder::new().build_keys(owned).unwrap();
        assert_eq!(from_borrowed, from_owned);
        assert_eq!(from_owned.index_str("qux"), 3);
    }

    #[test]
    fn repeated_key_is_a_duplicate() {
        let err = Builder::new()
            .build_keys(["a", "b", "a"].iter().map(|w| w.as_bytes()))
            .unwrap_err();
        assert!(matches!(err, MphError::DuplicateKey { .. }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn survives_bytes_round_trip() {
        let kt = Builder::new()
            .build_keys(WORDS.iter().map(|w| w.as_bytes()))
            .unwrap();
        let back = KeyedTable::from_bytes(&kt.to_bytes().unwrap()).unwrap();
        assert_eq!(back, kt);
        assert_eq!(back.index_str("zeek"), 7);
    }
}
