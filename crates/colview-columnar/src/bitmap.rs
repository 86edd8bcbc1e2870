#![forbid(unsafe_code)]

/// A compact bit vector used for validity and row-selection storage.
///
/// Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 63 is the MSB of word 0
///
/// Bits past `len` in the last word are always zero, which keeps `count_ones`
/// and the word-wise combinators exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

fn word_count(bits: usize) -> usize {
    (bits + 63) / 64
}

/// Mask selecting the valid bits of the trailing word (all ones when the
/// length is a multiple of 64).
fn tail_mask(len: usize) -> u64 {
    match len % 64 {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

impl BitVec {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        let mut words = vec![u64::MAX; word_count(bits)];
        if let Some(last) = words.last_mut() {
            *last &= tail_mask(bits);
        }
        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn with_len_all_false(bits: usize) -> Self {
        Self {
            words: vec![0u64; word_count(bits)],
            len: bits,
            ones: 0,
        }
    }

    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut out = Self::new();
        for bit in bits {
            out.push(bit);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }
        if value {
            let word = self.len / 64;
            self.words[word] |= 1u64 << bit;
            self.ones += 1;
        }
        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "BitVec index {index} out of bounds for length {}", self.len);
        let word = self.words[index / 64];
        ((word >> (index % 64)) & 1) == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len, "BitVec index {index} out of bounds for length {}", self.len);
        let word = &mut self.words[index / 64];
        let mask = 1u64 << (index % 64);
        let was_set = (*word & mask) != 0;
        match (was_set, value) {
            (true, false) => {
                *word &= !mask;
                self.ones -= 1;
            }
            (false, true) => {
                *word |= mask;
                self.ones += 1;
            }
            _ => {}
        }
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    /// Indices of set bits, in increasing order.
    pub fn iter_ones(&self) -> IterOnes<'_> {
        IterOnes {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    pub fn and_inplace(&mut self, other: &BitVec) {
        self.zip_words(other, |a, b| a & b);
    }

    pub fn or_inplace(&mut self, other: &BitVec) {
        self.zip_words(other, |a, b| a | b);
    }

    pub fn not_inplace(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        if let Some(last) = self.words.last_mut() {
            *last &= tail_mask(self.len);
        }
        self.ones = self.len - self.ones;
    }

    fn zip_words(&mut self, other: &BitVec, op: impl Fn(u64, u64) -> u64) {
        debug_assert_eq!(self.len, other.len, "BitVec length mismatch");
        let mut ones = 0usize;
        for (idx, w) in self.words.iter_mut().enumerate() {
            *w = op(*w, other.words.get(idx).copied().unwrap_or(0));
            ones += w.count_ones() as usize;
        }
        if let Some(last) = self.words.last_mut() {
            let trimmed = *last & tail_mask(self.len);
            ones -= (*last ^ trimmed).count_ones() as usize;
            *last = trimmed;
        }
        self.ones = ones;
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::from_bools(iter)
    }
}

/// Iterator over the set bits of a [`BitVec`].
#[derive(Clone, Debug)]
pub struct IterOnes<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for IterOnes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}
