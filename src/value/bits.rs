// Copyright (c) 2017-2021 Fabian Schuiki

//! Bit-string rendering
//!
//! Text-based formats print digital values most significant bit first. The
//! rendering goes through a scratch buffer owned by the caller, so repeated
//! changes reuse one allocation.

use crate::{error::Result, value::WideValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four states of a single-bit signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolValue {
    False = 0,
    True = 1,
    /// Unknown.
    X = 2,
    /// High impedance.
    Z = 3,
}

impl BoolValue {
    /// Decode the digital representation of a boolean.
    pub fn from_u64(v: u64) -> Option<BoolValue> {
        match v {
            0 => Some(BoolValue::False),
            1 => Some(BoolValue::True),
            2 => Some(BoolValue::X),
            3 => Some(BoolValue::Z),
            _ => None,
        }
    }

    /// Parse a single character of a bit string.
    pub fn from_char(c: char) -> Option<BoolValue> {
        match c {
            '0' => Some(BoolValue::False),
            '1' => Some(BoolValue::True),
            'x' | 'X' => Some(BoolValue::X),
            'z' | 'Z' => Some(BoolValue::Z),
            _ => None,
        }
    }

    /// The character this state is printed as.
    pub fn to_char(self) -> char {
        match self {
            BoolValue::False => '0',
            BoolValue::True => '1',
            BoolValue::X => 'x',
            BoolValue::Z => 'z',
        }
    }
}

impl From<bool> for BoolValue {
    fn from(v: bool) -> Self {
        if v {
            BoolValue::True
        } else {
            BoolValue::False
        }
    }
}

impl fmt::Display for BoolValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A growable scratch buffer for bit strings.
#[derive(Debug, Default)]
pub struct BitBuffer {
    buf: String,
}

impl BitBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Default::default()
    }

    /// The most recently rendered bit string.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Make room for `len` characters, reporting allocation failure instead
    /// of aborting.
    fn prepare(&mut self, len: usize) -> Result<()> {
        self.buf.clear();
        self.buf.try_reserve(len)?;
        Ok(())
    }

    /// Render a value of at most one word.
    ///
    /// Single-bit values are interpreted as `BoolValue`, so 2 and 3 print as
    /// `x` and `z`.
    pub fn render_u64(&mut self, width: usize, v: u64) -> Result<&str> {
        self.prepare(width.max(1))?;
        if width == 1 {
            let c = match BoolValue::from_u64(v) {
                Some(b) => b.to_char(),
                None => BoolValue::from(v & 1 == 1).to_char(),
            };
            self.buf.push(c);
        } else {
            for i in (0..width).rev() {
                let bit = i < 64 && (v >> i) & 1 == 1;
                self.buf.push(if bit { '1' } else { '0' });
            }
        }
        Ok(self.buf.as_str())
    }

    /// Render a wide value at the given width, truncating or zero-extending.
    pub fn render_wide(&mut self, width: usize, v: &WideValue) -> Result<&str> {
        self.prepare(width)?;
        for i in (0..width).rev() {
            self.buf.push(if v.bit(i) { '1' } else { '0' });
        }
        Ok(self.buf.as_str())
    }

    /// Render a fixed pattern, left-padded with `fill` to `width` characters.
    pub fn render_padded(&mut self, width: usize, fill: char, pattern: &str) -> Result<&str> {
        let len = width.max(pattern.len());
        self.prepare(len)?;
        for _ in pattern.len()..len {
            self.buf.push(fill);
        }
        self.buf.push_str(pattern);
        Ok(self.buf.as_str())
    }
}

/// Render a wide value into a freshly allocated bit string.
pub fn bit_string(width: usize, v: &WideValue) -> Result<String> {
    let mut buf = BitBuffer::new();
    Ok(buf.render_wide(width, v)?.to_owned())
}

/// Parse a bit string into a wide value.
///
/// Unknown and high-impedance bits read as zero. Returns `None` if the string
/// contains anything but bit characters.
pub fn parse_bit_string(width: usize, s: &str) -> Option<WideValue> {
    let mut words = vec![0u64; crate::value::words_for_width(width.max(s.len()))];
    for (i, c) in s.chars().rev().enumerate() {
        if BoolValue::from_char(c)? == BoolValue::True {
            words[i / 64] |= 1 << (i % 64);
        }
    }
    Some(WideValue::from_words(width, &words))
}
