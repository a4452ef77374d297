// Copyright (c) 2017-2021 Fabian Schuiki

//! Channel values
//!
//! A channel signal is either blocked on one of its ends, idle, or carries a
//! data value. All four cases share the channel's digital representation: the
//! three non-data states occupy a small reserved range at the bottom, and data
//! values are biased upwards past that range.

use crate::{
    error::{Result, TraceError},
    value::{WideValue, WORD_BITS},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// The receiver is waiting for a sender.
    RecvBlocked,
    /// The sender is waiting for a receiver.
    SendBlocked,
    /// Neither end is active.
    Idle,
    /// A value is being communicated.
    Value(WideValue),
}

impl ChannelState {
    /// Create a data state from a single word.
    pub fn value(v: u64) -> Self {
        ChannelState::Value(v.into())
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelState::RecvBlocked => write!(f, "recv-blocked"),
            ChannelState::SendBlocked => write!(f, "send-blocked"),
            ChannelState::Idle => write!(f, "idle"),
            ChannelState::Value(v) => write!(f, "{}", v),
        }
    }
}

/// How channel states map onto a digital value.
///
/// The defaults are the historical constants shared by the trace formats:
/// receive-blocked is 0, send-blocked is 1, idle is 2, and data values are
/// offset by 3. A channel that carries `w` data bits is traced with `w + 2`
/// bits if `w < 2` and `w + 1` bits otherwise, which leaves enough headroom
/// for the offset and never drops below 3 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEncoding {
    /// The bias added to data values. Must be larger than every sentinel.
    pub val_offset: u64,
    /// The smallest digital width a channel is traced with.
    pub min_width: usize,
}

/// Digital code of `ChannelState::RecvBlocked`.
pub const CHAN_RECV_BLOCKED: u64 = 0;
/// Digital code of `ChannelState::SendBlocked`.
pub const CHAN_SEND_BLOCKED: u64 = 1;
/// Digital code of `ChannelState::Idle`.
pub const CHAN_IDLE: u64 = 2;

impl ChannelEncoding {
    /// The historical encoding.
    pub const HISTORICAL: ChannelEncoding = ChannelEncoding {
        val_offset: 3,
        min_width: 3,
    };

    /// The digital width used to trace a channel with `width` data bits.
    pub fn encoded_width(&self, width: usize) -> usize {
        let w = if width < 2 { width + 2 } else { width + 1 };
        w.max(self.min_width)
    }

    /// The digital code of a non-data state.
    pub fn sentinel(&self, state: &ChannelState) -> Option<u64> {
        match state {
            ChannelState::RecvBlocked => Some(CHAN_RECV_BLOCKED),
            ChannelState::SendBlocked => Some(CHAN_SEND_BLOCKED),
            ChannelState::Idle => Some(CHAN_IDLE),
            ChannelState::Value(_) => None,
        }
    }

    /// Encode a state into a single word.
    ///
    /// Fails if the biased data value does not fit into one word.
    pub fn encode_scalar(&self, state: &ChannelState) -> Result<u64> {
        let v = match state {
            ChannelState::Value(v) => v
                .to_u64()
                .ok_or(TraceError::ChannelOverflow { width: WORD_BITS })?,
            _ => return Ok(self.sentinel(state).unwrap_or(CHAN_IDLE)),
        };
        let biased = v.wrapping_add(self.val_offset);
        if biased < v {
            return Err(TraceError::ChannelOverflow { width: WORD_BITS });
        }
        Ok(biased)
    }

    /// Encode a state into a value of `width` bits.
    ///
    /// The bias carries from word to word. Bits beyond `width` are truncated.
    pub fn encode(&self, state: &ChannelState, width: usize) -> WideValue {
        match state {
            ChannelState::Value(v) => {
                let (biased, _) = v
                    .resize(width.max(v.width()))
                    .overflowing_add_u64(self.val_offset);
                biased.resize(width)
            }
            _ => WideValue::from_u64(width, self.sentinel(state).unwrap_or(CHAN_IDLE)),
        }
    }

    /// Encode a state into a value of `width` bits, failing instead of
    /// truncating if the biased value does not fit.
    pub fn encode_checked(&self, state: &ChannelState, width: usize) -> Result<WideValue> {
        if let ChannelState::Value(v) = state {
            let (biased, _) = v
                .resize(width.max(v.width()) + WORD_BITS)
                .overflowing_add_u64(self.val_offset);
            if biased.significant_bits() > width {
                return Err(TraceError::ChannelOverflow { width });
            }
        }
        Ok(self.encode(state, width))
    }

    /// Decode a digital value into a state.
    ///
    /// Codes below the offset that are not one of the three sentinels read
    /// as idle.
    pub fn decode(&self, v: &WideValue) -> ChannelState {
        match v.checked_sub_u64(self.val_offset) {
            Some(data) => ChannelState::Value(data),
            None => match v.to_u64() {
                Some(CHAN_RECV_BLOCKED) => ChannelState::RecvBlocked,
                Some(CHAN_SEND_BLOCKED) => ChannelState::SendBlocked,
                _ => ChannelState::Idle,
            },
        }
    }
}

impl Default for ChannelEncoding {
    fn default() -> Self {
        ChannelEncoding::HISTORICAL
    }
}
