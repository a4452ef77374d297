// Copyright (c) 2017-2021 Fabian Schuiki

//! Signals recorded in a trace.

use crate::backend::NodeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A single bit.
    Bool,
    /// An integer of the given bit width.
    Int(usize),
    /// A channel carrying values of the given bit width.
    Chan(usize),
    /// A real-valued signal, such as a voltage or current.
    Analog,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SignalKind::Bool => write!(f, "bool"),
            SignalKind::Int(w) => write!(f, "int<{}>", w),
            SignalKind::Chan(w) => write!(f, "chan<{}>", w),
            SignalKind::Analog => write!(f, "analog"),
        }
    }
}

/// A handle to a signal declared in a session.
///
/// The handle remembers which session created it, so it cannot be used to
/// address a signal of another session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId {
    pub(crate) session: u32,
    pub(crate) index: u32,
}

impl SignalId {
    /// The position of the signal in declaration order.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "s{}.{}", self.session, self.index)
    }
}

/// A signal declared in a session.
#[derive(Clone, Debug)]
pub struct Signal {
    name: String,
    kind: SignalKind,
    node: NodeRef,
}

impl Signal {
    pub(crate) fn new(name: String, kind: SignalKind, node: NodeRef) -> Signal {
        Signal { name, kind, node }
    }

    /// The signal's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signal's kind.
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// The backend's reference to the signal.
    pub fn node(&self) -> NodeRef {
        self.node
    }
}
