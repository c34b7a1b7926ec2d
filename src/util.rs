#[derive(Debug)]
pub struct BitSet {
    bits: Vec<u64>,
    n: usize,
}
impl BitSet {
    pub fn new(n: usize) -> Self {
        let words = n.div_ceil(64);
        Self { bits: vec![0; words], n }
    }
    #[inline]
    pub fn test(&self, idx: usize) -> bool {
        debug_assert!(idx < self.n);
        let (w, b) = (idx / 64, idx % 64);
        (self.bits[w] >> b) & 1 == 1
    }
    #[inline]
    pub fn set(&mut self, idx: usize) {
        debug_assert!(idx < self.n);
        let (w, b) = (idx / 64, idx % 64);
        self.bits[w] |= 1u64 << b;
    }
    #[inline]
    pub fn unset(&mut self, idx: usize) {
        debug_assert!(idx < self.n);
        let (w, b) = (idx / 64, idx % 64);
        self.bits[w] &= !(1u64 << b);
    }
}

/// Smallest power of two >= n (0 stays 0: the empty table has no slots).
#[inline]
pub fn table_size(n: usize) -> usize {
    if n == 0 { 0 } else { n.next_power_of_two() }
}
