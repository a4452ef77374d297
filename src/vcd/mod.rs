// Copyright (c) 2017-2021 Fabian Schuiki

//! Value Change Dump
//!
//! This module implements the reference text format. Traces are written by
//! `VcdWriter` and can be read back with `VcdReader`. Signal declarations are
//! buffered until the init block starts, at which point they are emitted in
//! natural order (see `natural_cmp`). Each signal is addressed by a short
//! identifier derived from its declaration index (see `identifier`).

use crate::{
    backend::{Operations, TraceFormat, TraceReader, TraceWriter},
    config::TraceConfig,
    error::Result,
    value::TimeMode,
};
use std::{
    cmp::Ordering,
    fs::File,
    io::{BufReader, BufWriter},
};

mod reader;
mod writer;

pub use self::reader::*;
pub use self::writer::*;

/// The VCD trace format.
#[derive(Clone, Copy, Debug, Default)]
pub struct VcdFormat;

impl TraceFormat for VcdFormat {
    fn operations(&self) -> Operations {
        Operations::all()
    }

    fn create(&self, config: &TraceConfig) -> Result<Box<dyn TraceWriter>> {
        let file = File::create(&config.name).map_err(|e| {
            error!("Cannot create `{}`: {}", config.name, e);
            e
        })?;
        Ok(Box::new(VcdWriter::new(BufWriter::new(file), config)?))
    }

    fn open(&self, name: &str, mode: TimeMode) -> Result<Box<dyn TraceReader>> {
        let file = File::open(name).map_err(|e| {
            error!("Cannot open `{}`: {}", name, e);
            e
        })?;
        Ok(Box::new(VcdReader::from_reader(BufReader::new(file), mode)?))
    }
}

/// First printable character used in identifiers.
const IDENT_FIRST: usize = 33;
/// Number of printable characters used in identifiers.
const IDENT_RADIX: usize = 94;

/// Map a declaration index to its short identifier.
///
/// The index is written in base 94 over the printable ASCII characters `!`
/// to `~`, least significant digit first.
pub fn identifier(index: usize) -> String {
    let mut idx = index;
    let mut abbrev = String::new();
    loop {
        abbrev.push((IDENT_FIRST + idx % IDENT_RADIX) as u8 as char);
        idx /= IDENT_RADIX;
        if idx == 0 {
            break;
        }
    }
    abbrev
}

/// Compare two signal names in natural order.
///
/// Names compare byte by byte. After a `[` that both names share, digit runs
/// compare by their numeric value, such that `x[2]` sorts before `x[10]`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut in_index = false;
    let (mut ia, mut ib) = (0u64, 0u64);
    let mut k = 0;
    while k < a.len() && k < b.len() {
        let (ca, cb) = (a[k], b[k]);
        if !in_index {
            if ca != cb {
                return ca.cmp(&cb);
            }
            if ca == b'[' {
                in_index = true;
                ia = 0;
                ib = 0;
            }
        } else if ca != cb {
            let ia = accumulate(ia, &a[k..]);
            let ib = accumulate(ib, &b[k..]);
            return ia.cmp(&ib).then(ca.cmp(&cb));
        } else if ca.is_ascii_digit() {
            ia = accumulate(ia, &a[k..=k]);
            ib = accumulate(ib, &b[k..=k]);
        } else {
            in_index = false;
        }
        k += 1;
    }
    a.len().cmp(&b.len())
}

/// Append the leading digits of `s` to `acc`.
fn accumulate(acc: u64, s: &[u8]) -> u64 {
    s.iter()
        .take_while(|c| c.is_ascii_digit())
        .fold(acc, |acc, c| {
            acc.saturating_mul(10).saturating_add((c - b'0') as u64)
        })
}

/// Format a real number like C's `%.<precision>g`.
pub fn format_real(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.find('e') {
        Some(pos) => (&sci[..pos], sci[pos + 1..].parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if exp < -4 || exp >= precision as i32 {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_owned()
    }
}

/// Format a real number with the fewest digits that still read back as the
/// same value.
///
/// Magnitudes outside `[1e-4, 1e16)` use exponent notation.
pub fn format_exact(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-4..1e16).contains(&magnitude) {
        format!("{}", value)
    } else {
        format!("{:e}", value)
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn identifiers() {
        assert_eq!(identifier(0), "!");
        assert_eq!(identifier(1), "\"");
        assert_eq!(identifier(93), "~");
        assert_eq!(identifier(94), "!\"");
        assert_eq!(identifier(95), "\"\"");
        assert_eq!(identifier(94 * 94), "!!\"");
    }

    #[test]
    fn identifiers_increase() {
        let ids: Vec<_> = (0..94).map(identifier).collect();
        assert!(ids.iter().all(|id| id.len() == 1));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(identifier(94).len(), 2);
    }

    #[test]
    fn natural_order() {
        let names = vec!["sig[2]", "sig[10]", "sig[1]"];
        let sorted: Vec<_> = names.into_iter().sorted_by(|a, b| natural_cmp(a, b)).collect();
        assert_eq!(sorted, vec!["sig[1]", "sig[2]", "sig[10]"]);
    }

    #[test]
    fn natural_order_outside_brackets() {
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_cmp("x10", "x2"), Ordering::Less);
        assert_eq!(natural_cmp("ab", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("a[3].x", "a[3].x"), Ordering::Equal);
        assert_eq!(natural_cmp("a[3].y", "a[3].x"), Ordering::Greater);
        assert_eq!(natural_cmp("m[2][10]", "m[2][9]"), Ordering::Greater);
    }

    #[test]
    fn real_formatting() {
        assert_eq!(format_real(0.0, 16), "0");
        assert_eq!(format_real(1.5, 16), "1.5");
        assert_eq!(format_real(0.1, 16), "0.1");
        assert_eq!(format_real(-2.0, 16), "-2");
        assert_eq!(format_real(1e-9, 16), "1e-09");
        assert_eq!(format_real(3.7e-9, 6), "3.7e-09");
        assert_eq!(format_real(123456.0, 6), "123456");
        assert_eq!(format_real(1234567.0, 6), "1.23457e+06");
        assert_eq!(format_real(1e20, 16), "1e+20");
    }

    #[test]
    fn exact_formatting() {
        assert_eq!(format_exact(0.5), "0.5");
        assert_eq!(format_exact(-1.25), "-1.25");
        assert_eq!(format_exact(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_exact(1e-9), "1e-9");
        assert_eq!(format_exact(6.02214076e23), "6.02214076e23");
        for &v in &[0.1 + 0.2, 1.0 / 3.0, -2.5e-300, 1.7976931348623157e308, 1e16, 9999.5] {
            assert_eq!(format_exact(v).parse::<f64>().unwrap(), v);
        }
    }
}
