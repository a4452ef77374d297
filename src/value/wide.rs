// Copyright (c) 2017-2021 Fabian Schuiki

//! Wide integer values
//!
//! This module implements integers of arbitrary bit width, stored as a
//! sequence of machine words with the least significant word first.

use num::{BigUint, Zero};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
};

/// The number of bits in one word of a `WideValue`.
pub const WORD_BITS: usize = 64;

/// Number of words needed to hold `width` bits.
pub fn words_for_width(width: usize) -> usize {
    (width + WORD_BITS - 1) / WORD_BITS
}

/// An unsigned integer of arbitrary width.
///
/// The width is tracked separately from the word count, since it need not be
/// a multiple of the word size. Bits above the width are always zero.
/// Equality, ordering, and hashing consider the numeric value only.
#[derive(Clone, Default)]
pub struct WideValue {
    width: usize,
    words: Vec<u64>,
}

impl WideValue {
    /// Create a zero value of the given width.
    pub fn zero(width: usize) -> Self {
        Self {
            width,
            words: vec![0; words_for_width(width)],
        }
    }

    /// Create a value from a single word, truncated to `width` bits.
    pub fn from_u64(width: usize, value: u64) -> Self {
        Self::from_words(width, &[value])
    }

    /// Create a value from a word sequence, least significant word first.
    ///
    /// Words beyond the width are dropped, missing words are zero, and the
    /// top word is masked to the width.
    pub fn from_words(width: usize, words: &[u64]) -> Self {
        let mut v = Self::zero(width);
        for (dst, src) in v.words.iter_mut().zip(words) {
            *dst = *src;
        }
        v.mask_top();
        v
    }

    /// Create a value wide enough to hold all given words.
    pub fn from_words_exact(words: &[u64]) -> Self {
        Self {
            width: words.len() * WORD_BITS,
            words: words.to_vec(),
        }
    }

    /// Create a value from a `BigUint`, truncated to `width` bits.
    pub fn from_biguint(width: usize, value: &BigUint) -> Self {
        let bytes = value.to_bytes_le();
        let words: Vec<u64> = bytes
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (8 * i))
            })
            .collect();
        Self::from_words(width, &words)
    }

    /// Convert the value to a `BigUint`.
    pub fn to_biguint(&self) -> BigUint {
        self.words
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, &w| (acc << WORD_BITS) + BigUint::from(w))
    }

    /// The width of the value in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The words of the value, least significant first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Access a word, reading zero past the end.
    pub fn word(&self, index: usize) -> u64 {
        self.words.get(index).cloned().unwrap_or(0)
    }

    /// Access a single bit, reading zero past the width.
    pub fn bit(&self, index: usize) -> bool {
        (self.word(index / WORD_BITS) >> (index % WORD_BITS)) & 1 == 1
    }

    /// Check if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Convert the value to a single word, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.words.iter().skip(1).any(|&w| w != 0) {
            None
        } else {
            Some(self.word(0))
        }
    }

    /// Number of words that carry non-zero bits.
    pub fn significant_words(&self) -> usize {
        self.words
            .iter()
            .rposition(|&w| w != 0)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Change the width of the value, truncating or zero-extending it.
    pub fn resize(&self, width: usize) -> Self {
        Self::from_words(width, &self.words)
    }

    /// Compute `self + other` with carry propagation from word to word.
    ///
    /// The result has the larger of the two widths. Returns the result and
    /// whether a carry was lost at the top.
    pub fn overflowing_add(&self, other: &Self) -> (Self, bool) {
        let width = self.width.max(other.width);
        let len = words_for_width(width);
        let mut words = Vec::with_capacity(len + 1);
        let mut carry = false;
        for i in 0..len {
            let (s, c0) = self.word(i).overflowing_add(other.word(i));
            let (s, c1) = s.overflowing_add(carry as u64);
            words.push(s);
            carry = c0 || c1;
        }
        if carry {
            words.push(1);
        }
        let full = Self::from_words_exact(&words);
        let lost = full.significant_bits() > width;
        (full.resize(width), lost)
    }

    /// Compute `self + value` with carry propagation.
    pub fn overflowing_add_u64(&self, value: u64) -> (Self, bool) {
        self.overflowing_add(&Self::from_u64(WORD_BITS, value))
    }

    /// Compute `self - value`, or `None` if the result would be negative.
    pub fn checked_sub_u64(&self, value: u64) -> Option<Self> {
        let mut words = self.words.clone();
        let mut borrow = value;
        for w in words.iter_mut() {
            if borrow == 0 {
                break;
            }
            let (d, b) = w.overflowing_sub(borrow);
            *w = d;
            borrow = b as u64;
        }
        if borrow != 0 {
            return None;
        }
        Some(Self {
            width: self.width,
            words,
        })
    }

    /// Number of bits up to and including the most significant set bit.
    pub fn significant_bits(&self) -> usize {
        match self.significant_words() {
            0 => 0,
            n => (n - 1) * WORD_BITS + (WORD_BITS - self.words[n - 1].leading_zeros() as usize),
        }
    }

    fn mask_top(&mut self) {
        let rem = self.width % WORD_BITS;
        if rem != 0 {
            if let Some(top) = self.words.last_mut() {
                *top &= (1u64 << rem) - 1;
            }
        }
    }
}

impl PartialEq for WideValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WideValue {}

impl PartialOrd for WideValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WideValue {
    /// Compare word by word, starting at the most significant word.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.words.len().max(other.words.len());
        for i in (0..len).rev() {
            match self.word(i).cmp(&other.word(i)) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl Hash for WideValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words[..self.significant_words()].hash(state);
    }
}

impl Display for WideValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl Debug for WideValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "u{} {}", self.width, self)
    }
}

impl fmt::Binary for WideValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", if self.bit(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl From<u64> for WideValue {
    fn from(v: u64) -> Self {
        WideValue::from_u64(WORD_BITS, v)
    }
}

impl From<(usize, u64)> for WideValue {
    fn from(v: (usize, u64)) -> Self {
        WideValue::from_u64(v.0, v.1)
    }
}

impl From<(usize, &[u64])> for WideValue {
    fn from(v: (usize, &[u64])) -> Self {
        WideValue::from_words(v.0, v.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count() {
        assert_eq!(words_for_width(0), 0);
        assert_eq!(words_for_width(1), 1);
        assert_eq!(words_for_width(64), 1);
        assert_eq!(words_for_width(65), 2);
        assert_eq!(words_for_width(130), 3);
    }

    #[test]
    fn truncates_to_width() {
        let v = WideValue::from_u64(4, 0xff);
        assert_eq!(v.to_u64(), Some(0xf));
        let v = WideValue::from_words(70, &[1, 0xff, 7]);
        assert_eq!(v.words(), &[1, 0x3f]);
    }

    #[test]
    fn carry_crosses_words() {
        let v = WideValue::from_words(128, &[u64::MAX, 0]);
        let (sum, lost) = v.overflowing_add_u64(1);
        assert!(!lost);
        assert_eq!(sum.words(), &[0, 1]);

        let v = WideValue::from_words(128, &[u64::MAX, u64::MAX]);
        let (sum, lost) = v.overflowing_add_u64(2);
        assert!(lost);
        assert_eq!(sum.words(), &[1, 0]);
    }

    #[test]
    fn carry_lost_at_partial_width() {
        let v = WideValue::from_u64(3, 6);
        let (sum, lost) = v.overflowing_add_u64(3);
        assert!(lost);
        assert_eq!(sum.to_u64(), Some(1));
    }

    #[test]
    fn borrow_crosses_words() {
        let v = WideValue::from_words(128, &[1, 1]);
        let d = v.checked_sub_u64(2).unwrap();
        assert_eq!(d.words(), &[u64::MAX, 0]);
        assert!(WideValue::from_u64(8, 1).checked_sub_u64(2).is_none());
    }

    #[test]
    fn compare_ignores_width() {
        let a = WideValue::from_u64(8, 5);
        let b = WideValue::from_words(200, &[5]);
        assert_eq!(a, b);
        assert!(WideValue::from_words(128, &[0, 1]) > WideValue::from_u64(64, u64::MAX));
    }

    #[test]
    fn biguint_conversion() {
        let v = WideValue::from_words(128, &[0x0123_4567_89ab_cdef, 0x42]);
        let big = v.to_biguint();
        assert_eq!(WideValue::from_biguint(128, &big), v);
        assert_eq!(format!("{}", WideValue::from_words(128, &[0, 1])), "18446744073709551616");
    }

    #[test]
    fn binary_formatting() {
        assert_eq!(format!("{:b}", WideValue::from_u64(4, 10)), "1010");
        assert_eq!(format!("{:b}", WideValue::from_u64(6, 3)), "000011");
    }
}
