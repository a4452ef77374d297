// Copyright (c) 2017-2021 Fabian Schuiki

//! Trace format backends
//!
//! A trace format is a factory registered under a short prefix. It advertises
//! the set of operations it implements through `Operations`, and hands out
//! writer or reader handles that perform them. Every operation beyond `close`
//! is optional at the trait level; the loader checks that the advertised set
//! is complete and consistent before a session ever calls into the handle.

use crate::{
    config::TraceConfig,
    error::{Result, TraceError},
    signal::SignalKind,
    value::{ChannelState, SignalValue, TimeMode, Timestamp, WideValue},
};

mod loader;
mod ops;

pub use self::loader::*;
pub use self::ops::*;

impl_table_key! {
    /// A reference to a signal within a backend handle.
    struct NodeRef(u32) as "n";
}

fn unsupported<T>(op: Operations) -> Result<T> {
    Err(TraceError::Unsupported(op.name().unwrap_or("?").to_owned()))
}

/// A trace format that can create and/or open traces.
pub trait TraceFormat: Send + Sync {
    /// The set of operations this format implements.
    fn operations(&self) -> Operations;

    /// Create a new trace for writing.
    ///
    /// Called with `config.mode` set to a mode for which the format has a
    /// creation entry point.
    fn create(&self, config: &TraceConfig) -> Result<Box<dyn TraceWriter>> {
        let _ = config;
        unsupported(Operations::CREATE)
    }

    /// Open an existing trace for reading.
    fn open(&self, name: &str, mode: TimeMode) -> Result<Box<dyn TraceReader>> {
        let _ = (name, mode);
        unsupported(Operations::OPEN)
    }
}

/// An open trace that is being written.
///
/// The session calls these in protocol order: one declaration block, one
/// init block, then any number of changes. Change operations receive the
/// time stamp in the mode the trace was created with.
pub trait TraceWriter {
    /// Begin the signal declaration block.
    fn signal_start(&mut self) -> Result<()>;

    /// Declare an analog signal.
    fn add_analog_signal(&mut self, name: &str) -> Result<NodeRef> {
        let _ = name;
        unsupported(Operations::ADD_ANALOG_SIGNAL)
    }

    /// Declare a single-bit digital signal.
    fn add_digital_signal(&mut self, name: &str) -> Result<NodeRef> {
        let _ = name;
        unsupported(Operations::ADD_DIGITAL_SIGNAL)
    }

    /// Declare an integer signal of `width` bits.
    fn add_int_signal(&mut self, name: &str, width: usize) -> Result<NodeRef> {
        let _ = (name, width);
        unsupported(Operations::ADD_INT_SIGNAL)
    }

    /// Declare a channel signal carrying `width` data bits.
    fn add_chan_signal(&mut self, name: &str, width: usize) -> Result<NodeRef> {
        let _ = (name, width);
        unsupported(Operations::ADD_CHAN_SIGNAL)
    }

    /// End the signal declaration block.
    fn signal_end(&mut self) -> Result<()>;

    /// Begin the block of initial values.
    fn init_start(&mut self) -> Result<()>;

    /// End the block of initial values.
    fn init_end(&mut self) -> Result<()>;

    /// Record a digital value of at most one word.
    ///
    /// For single-bit signals the value is a `BoolValue` code.
    fn change_digital(&mut self, node: NodeRef, time: &Timestamp, value: u64) -> Result<()> {
        let _ = (node, time, value);
        unsupported(Operations::change_digital(time.mode()))
    }

    /// Record a digital value of arbitrary width.
    fn change_wide_digital(
        &mut self,
        node: NodeRef,
        time: &Timestamp,
        value: &WideValue,
    ) -> Result<()> {
        let _ = (node, value);
        unsupported(Operations::change_wide_digital(time.mode()))
    }

    /// Record an analog value.
    fn change_analog(&mut self, node: NodeRef, time: &Timestamp, value: f64) -> Result<()> {
        let _ = (node, value);
        unsupported(Operations::change_analog(time.mode()))
    }

    /// Record a channel state.
    ///
    /// Only called if the format advertises a native channel change for the
    /// width of the state's data value.
    fn change_chan(&mut self, node: NodeRef, time: &Timestamp, state: &ChannelState) -> Result<()> {
        let _ = (node, state);
        unsupported(Operations::change_chan(time.mode()))
    }

    /// Flush and release the trace.
    fn close(self: Box<Self>) -> Result<()>;
}

/// The global properties of a trace opened for reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceHeader {
    /// The last time stamp in the trace, in seconds.
    pub stop_time: f64,
    /// The duration of one tick, in seconds.
    pub time_per_tick: f64,
}

/// An open trace that is being read.
///
/// A reader maintains a cursor into the trace. Values reported by
/// `get_signal` are those in effect at the cursor.
pub trait TraceReader {
    /// Read the trace's global properties.
    fn header(&mut self) -> Result<TraceHeader>;

    /// Find a signal by name.
    fn signal_lookup(&mut self, name: &str) -> Result<Option<NodeRef>>;

    /// Determine the kind of a signal.
    fn signal_type(&mut self, node: NodeRef) -> Result<SignalKind>;

    /// Read a signal's value at the cursor.
    fn get_signal(&mut self, node: NodeRef) -> Result<SignalValue>;

    /// Move the cursor forward by a number of value change steps.
    fn advance_time(&mut self, steps: u64) -> Result<()> {
        let _ = steps;
        unsupported(Operations::ADVANCE_TIME)
    }

    /// Move the cursor forward by an amount of time in seconds.
    fn advance_time_by(&mut self, delta: f64) -> Result<()> {
        let _ = delta;
        unsupported(Operations::ADVANCE_TIME_BY)
    }

    /// Check whether there are changes beyond the cursor.
    fn has_more_data(&mut self) -> Result<bool>;

    /// Release the trace.
    fn close(self: Box<Self>) -> Result<()>;
}
