// Copyright (c) 2017-2021 Fabian Schuiki

//! Time values
//!
//! This module implements the two ways a trace can measure time, and the
//! quantization of a tick duration onto the decade ladder text formats use.

use crate::value::WideValue;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// How time stamps of a trace are expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeMode {
    /// Real-valued simulation time in seconds.
    Real,
    /// Arbitrary-precision integer ticks.
    Tick,
}

impl Display for TimeMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeMode::Real => write!(f, "real"),
            TimeMode::Tick => write!(f, "tick"),
        }
    }
}

impl Default for TimeMode {
    fn default() -> Self {
        TimeMode::Real
    }
}

/// A point in simulated time.
#[derive(Clone, PartialEq)]
pub enum Timestamp {
    /// Seconds.
    Real(f64),
    /// A tick count.
    Tick(WideValue),
}

impl Timestamp {
    /// The time mode this time stamp belongs to.
    pub fn mode(&self) -> TimeMode {
        match self {
            Timestamp::Real(_) => TimeMode::Real,
            Timestamp::Tick(_) => TimeMode::Tick,
        }
    }

    /// The zero time of a mode.
    pub fn zero(mode: TimeMode) -> Self {
        match mode {
            TimeMode::Real => Timestamp::Real(0.0),
            TimeMode::Tick => Timestamp::Tick(WideValue::from(0u64)),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Timestamp::Real(t) => write!(f, "{}s", t),
            Timestamp::Tick(t) => write!(f, "{}t", t),
        }
    }
}

impl Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<f64> for Timestamp {
    fn from(t: f64) -> Self {
        Timestamp::Real(t)
    }
}

impl From<WideValue> for Timestamp {
    fn from(t: WideValue) -> Self {
        Timestamp::Tick(t)
    }
}

impl From<u64> for Timestamp {
    fn from(t: u64) -> Self {
        Timestamp::Tick(t.into())
    }
}

/// The SI unit of a timescale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Fs,
    Ps,
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Parse a unit suffix.
    pub fn parse(s: &str) -> Option<TimeUnit> {
        Some(match s {
            "fs" => TimeUnit::Fs,
            "ps" => TimeUnit::Ps,
            "ns" => TimeUnit::Ns,
            "us" => TimeUnit::Us,
            "ms" => TimeUnit::Ms,
            "s" => TimeUnit::S,
            _ => return None,
        })
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        };
        write!(f, "{}", s)
    }
}

/// The decade ladder, from 1 fs up to 1 s. Each entry carries the exact
/// duration in seconds.
static LADDER: [(u32, TimeUnit, f64); 16] = [
    (1, TimeUnit::Fs, 1e-15),
    (10, TimeUnit::Fs, 1e-14),
    (100, TimeUnit::Fs, 1e-13),
    (1, TimeUnit::Ps, 1e-12),
    (10, TimeUnit::Ps, 1e-11),
    (100, TimeUnit::Ps, 1e-10),
    (1, TimeUnit::Ns, 1e-9),
    (10, TimeUnit::Ns, 1e-8),
    (100, TimeUnit::Ns, 1e-7),
    (1, TimeUnit::Us, 1e-6),
    (10, TimeUnit::Us, 1e-5),
    (100, TimeUnit::Us, 1e-4),
    (1, TimeUnit::Ms, 1e-3),
    (10, TimeUnit::Ms, 1e-2),
    (100, TimeUnit::Ms, 1e-1),
    (1, TimeUnit::S, 1.0),
];

/// A timescale of the form `{1,10,100} {fs,ps,ns,us,ms,s}`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timescale {
    /// One of 1, 10, or 100.
    pub magnitude: u32,
    /// The unit the magnitude is expressed in.
    pub unit: TimeUnit,
    seconds: f64,
}

impl Timescale {
    /// Pick the ladder entry nearest to `seconds_per_tick` on a logarithmic
    /// scale.
    ///
    /// Values below 1 fs map to 1 fs, values above 1 s map to 1 s.
    pub fn quantize(seconds_per_tick: f64) -> Timescale {
        let l10 = seconds_per_tick.log10();
        let exp = if l10.is_nan() {
            0.0
        } else {
            l10.round().max(-15.0).min(0.0)
        };
        Self::from_ladder((exp as i32 + 15) as usize)
    }

    /// Parse a timescale such as `10 ns` or `1ps`.
    pub fn parse(s: &str) -> Option<Timescale> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit())?;
        let magnitude: u32 = s[..split].parse().ok()?;
        let unit = TimeUnit::parse(s[split..].trim())?;
        LADDER
            .iter()
            .position(|&(m, u, _)| m == magnitude && u == unit)
            .map(Self::from_ladder)
    }

    fn from_ladder(index: usize) -> Timescale {
        let (magnitude, unit, seconds) = LADDER[index];
        Timescale {
            magnitude,
            unit,
            seconds,
        }
    }

    /// The exact duration of one tick in seconds.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Convert a real time into ticks of this timescale, rounding to the
    /// nearest tick. Negative times clamp to zero.
    pub fn ticks(&self, time: f64) -> u64 {
        let t = (time / self.seconds).round();
        if t > 0.0 {
            t as u64
        } else {
            0
        }
    }
}

impl Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
