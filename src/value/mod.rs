// Copyright (c) 2017-2021 Fabian Schuiki

//! Value representation
//!
//! This module implements the backend-neutral representation of signal values
//! and time stamps, and their conversion into the digital and textual forms
//! trace formats consume.

mod bits;
mod chan;
mod time;
mod wide;

pub use self::bits::*;
pub use self::chan::*;
pub use self::time::*;
pub use self::wide::*;

use crate::signal::SignalKind;
use std::fmt::{Debug, Display};

/// The value of a signal at one point in time.
///
/// Each variant carries exactly the payload its signal kind requires.
#[derive(Clone, PartialEq)]
pub enum SignalValue {
    /// A single-bit value of a boolean signal.
    Bool(BoolValue),
    /// An integer value, of an integer or a boolean vector signal.
    Int(WideValue),
    /// A channel state.
    Chan(ChannelState),
    /// A real value of an analog signal.
    Analog(f64),
}

impl SignalValue {
    /// Create an integer value from a single word.
    pub fn int(v: u64) -> Self {
        SignalValue::Int(v.into())
    }

    /// Check whether this value can be recorded on a signal of `kind`.
    pub fn fits(&self, kind: &SignalKind) -> bool {
        match (self, kind) {
            (SignalValue::Bool(_), SignalKind::Bool) => true,
            (SignalValue::Int(_), SignalKind::Bool) => true,
            (SignalValue::Int(_), SignalKind::Int(_)) => true,
            (SignalValue::Chan(_), SignalKind::Chan(_)) => true,
            (SignalValue::Analog(_), SignalKind::Analog) => true,
            _ => false,
        }
    }

    /// If this value is an integer, access it.
    pub fn get_int(&self) -> Option<&WideValue> {
        match self {
            SignalValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a channel state, access it.
    pub fn get_chan(&self) -> Option<&ChannelState> {
        match self {
            SignalValue::Chan(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is an analog value, access it.
    pub fn get_analog(&self) -> Option<f64> {
        match self {
            SignalValue::Analog(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a boolean, access it.
    pub fn get_bool(&self) -> Option<BoolValue> {
        match self {
            SignalValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SignalValue::Bool(v) => write!(f, "{}", v),
            SignalValue::Int(v) => write!(f, "{}", v),
            SignalValue::Chan(v) => write!(f, "{}", v),
            SignalValue::Analog(v) => write!(f, "{}", v),
        }
    }
}

impl Debug for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<BoolValue> for SignalValue {
    fn from(v: BoolValue) -> Self {
        SignalValue::Bool(v)
    }
}

impl From<bool> for SignalValue {
    fn from(v: bool) -> Self {
        SignalValue::Bool(v.into())
    }
}

impl From<WideValue> for SignalValue {
    fn from(v: WideValue) -> Self {
        SignalValue::Int(v)
    }
}

impl From<ChannelState> for SignalValue {
    fn from(v: ChannelState) -> Self {
        SignalValue::Chan(v)
    }
}

impl From<f64> for SignalValue {
    fn from(v: f64) -> Self {
        SignalValue::Analog(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let b = SignalValue::from(true);
        assert_eq!(b.get_bool(), Some(BoolValue::True));
        assert_eq!(b.get_int(), None);

        let i = SignalValue::int(10);
        assert_eq!(i.get_int(), Some(&WideValue::from_u64(4, 10)));
        assert_eq!(i.get_analog(), None);

        let c = SignalValue::from(ChannelState::Idle);
        assert_eq!(c.get_chan(), Some(&ChannelState::Idle));
        assert_eq!(c.get_bool(), None);

        let a = SignalValue::from(0.25);
        assert_eq!(a.get_analog(), Some(0.25));
        assert_eq!(a.get_chan(), None);
    }

    #[test]
    fn values_fit_their_kinds() {
        assert!(SignalValue::from(true).fits(&SignalKind::Bool));
        assert!(SignalValue::int(1).fits(&SignalKind::Bool));
        assert!(SignalValue::int(1).fits(&SignalKind::Int(8)));
        assert!(!SignalValue::int(1).fits(&SignalKind::Chan(8)));
        assert!(SignalValue::from(ChannelState::value(1)).fits(&SignalKind::Chan(8)));
        assert!(!SignalValue::from(0.5).fits(&SignalKind::Int(8)));
    }
}
