// Copyright (c) 2017-2021 Fabian Schuiki

//! The named operations a trace format can provide.

use crate::value::TimeMode;
use bitflags::bitflags;

bitflags! {
    /// A set of operations provided by a trace format.
    ///
    /// Each flag corresponds to one named entry point, addressed as
    /// `<prefix>_<name>`. The `_ALT` variants take integer tick times instead
    /// of real times.
    #[derive(Default)]
    pub struct Operations: u64 {
        const CREATE = 1 << 0;
        const CREATE_ALT = 1 << 1;
        const SIGNAL_START = 1 << 2;
        const ADD_ANALOG_SIGNAL = 1 << 3;
        const ADD_DIGITAL_SIGNAL = 1 << 4;
        const ADD_INT_SIGNAL = 1 << 5;
        const ADD_CHAN_SIGNAL = 1 << 6;
        const SIGNAL_END = 1 << 7;
        const INIT_START = 1 << 8;
        const INIT_END = 1 << 9;

        const CHANGE_DIGITAL = 1 << 10;
        const CHANGE_ANALOG = 1 << 11;
        const CHANGE_WIDE_DIGITAL = 1 << 12;
        const CHANGE_CHAN = 1 << 13;
        const CHANGE_WIDE_CHAN = 1 << 14;

        const CHANGE_DIGITAL_ALT = 1 << 15;
        const CHANGE_ANALOG_ALT = 1 << 16;
        const CHANGE_WIDE_DIGITAL_ALT = 1 << 17;
        const CHANGE_CHAN_ALT = 1 << 18;
        const CHANGE_WIDE_CHAN_ALT = 1 << 19;

        const OPEN = 1 << 20;
        const OPEN_ALT = 1 << 21;
        const HEADER = 1 << 22;
        const SIGNAL_LOOKUP = 1 << 23;
        const SIGNAL_TYPE = 1 << 24;
        const GET_SIGNAL = 1 << 25;
        const ADVANCE_TIME = 1 << 26;
        const ADVANCE_TIME_BY = 1 << 27;
        const HAS_MORE_DATA = 1 << 28;

        const CLOSE = 1 << 29;

        /// Entry points that create a trace for writing.
        const CREATORS = Self::CREATE.bits | Self::CREATE_ALT.bits;
        /// Entry points that open a trace for reading.
        const OPENERS = Self::OPEN.bits | Self::OPEN_ALT.bits;
        /// Entry points that add a signal of any kind.
        const ADD_SIGNAL = Self::ADD_ANALOG_SIGNAL.bits
            | Self::ADD_DIGITAL_SIGNAL.bits
            | Self::ADD_INT_SIGNAL.bits
            | Self::ADD_CHAN_SIGNAL.bits;
        /// Entry points that add a signal with a digital representation.
        const ADD_DIGITAL_KINDS = Self::ADD_DIGITAL_SIGNAL.bits
            | Self::ADD_INT_SIGNAL.bits
            | Self::ADD_CHAN_SIGNAL.bits;
        /// Entry points a writer cannot do without.
        const WRITER_REQUIRED = Self::SIGNAL_START.bits
            | Self::SIGNAL_END.bits
            | Self::INIT_START.bits
            | Self::INIT_END.bits;
        /// Entry points a reader cannot do without.
        const READER_REQUIRED = Self::HEADER.bits
            | Self::SIGNAL_LOOKUP.bits
            | Self::SIGNAL_TYPE.bits
            | Self::GET_SIGNAL.bits
            | Self::HAS_MORE_DATA.bits;
    }
}

/// The name of every operation, in the order they are resolved.
static NAMES: &[(Operations, &str)] = &[
    (Operations::CREATE, "create"),
    (Operations::CREATE_ALT, "create_alt"),
    (Operations::SIGNAL_START, "signal_start"),
    (Operations::ADD_ANALOG_SIGNAL, "add_analog_signal"),
    (Operations::ADD_DIGITAL_SIGNAL, "add_digital_signal"),
    (Operations::ADD_INT_SIGNAL, "add_int_signal"),
    (Operations::ADD_CHAN_SIGNAL, "add_chan_signal"),
    (Operations::SIGNAL_END, "signal_end"),
    (Operations::INIT_START, "init_start"),
    (Operations::INIT_END, "init_end"),
    (Operations::CHANGE_DIGITAL, "change_digital"),
    (Operations::CHANGE_ANALOG, "change_analog"),
    (Operations::CHANGE_WIDE_DIGITAL, "change_wide_digital"),
    (Operations::CHANGE_CHAN, "change_chan"),
    (Operations::CHANGE_WIDE_CHAN, "change_wide_chan"),
    (Operations::CHANGE_DIGITAL_ALT, "change_digital_alt"),
    (Operations::CHANGE_ANALOG_ALT, "change_analog_alt"),
    (Operations::CHANGE_WIDE_DIGITAL_ALT, "change_wide_digital_alt"),
    (Operations::CHANGE_CHAN_ALT, "change_chan_alt"),
    (Operations::CHANGE_WIDE_CHAN_ALT, "change_wide_chan_alt"),
    (Operations::OPEN, "open"),
    (Operations::OPEN_ALT, "open_alt"),
    (Operations::HEADER, "header"),
    (Operations::SIGNAL_LOOKUP, "signal_lookup"),
    (Operations::SIGNAL_TYPE, "type"),
    (Operations::GET_SIGNAL, "get_signal"),
    (Operations::ADVANCE_TIME, "advance_time"),
    (Operations::ADVANCE_TIME_BY, "advance_time_by"),
    (Operations::HAS_MORE_DATA, "has_more_data"),
    (Operations::CLOSE, "close"),
];

impl Operations {
    /// Iterate over the individual operations in this set, in resolution
    /// order.
    pub fn each(self) -> impl Iterator<Item = Operations> {
        NAMES
            .iter()
            .map(|&(op, _)| op)
            .filter(move |&op| self.contains(op))
    }

    /// The name of a single operation.
    ///
    /// Returns `None` for empty or composite sets.
    pub fn name(self) -> Option<&'static str> {
        NAMES.iter().find(|&&(op, _)| op == self).map(|&(_, n)| n)
    }

    /// The fully qualified symbol of a single operation under `prefix`.
    pub fn symbol(self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.name().unwrap_or("?"))
    }

    /// Look up an operation by name.
    pub fn from_name(name: &str) -> Option<Operations> {
        NAMES.iter().find(|&&(_, n)| n == name).map(|&(op, _)| op)
    }

    /// The entry point that creates a trace in `mode`.
    pub fn create(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CREATE,
            TimeMode::Tick => Operations::CREATE_ALT,
        }
    }

    /// The entry point that opens a trace in `mode`.
    pub fn open(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::OPEN,
            TimeMode::Tick => Operations::OPEN_ALT,
        }
    }

    /// The scalar digital change entry point for `mode`.
    pub fn change_digital(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CHANGE_DIGITAL,
            TimeMode::Tick => Operations::CHANGE_DIGITAL_ALT,
        }
    }

    /// The wide digital change entry point for `mode`.
    pub fn change_wide_digital(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CHANGE_WIDE_DIGITAL,
            TimeMode::Tick => Operations::CHANGE_WIDE_DIGITAL_ALT,
        }
    }

    /// The analog change entry point for `mode`.
    pub fn change_analog(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CHANGE_ANALOG,
            TimeMode::Tick => Operations::CHANGE_ANALOG_ALT,
        }
    }

    /// The scalar channel change entry point for `mode`.
    pub fn change_chan(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CHANGE_CHAN,
            TimeMode::Tick => Operations::CHANGE_CHAN_ALT,
        }
    }

    /// The wide channel change entry point for `mode`.
    pub fn change_wide_chan(mode: TimeMode) -> Operations {
        match mode {
            TimeMode::Real => Operations::CHANGE_WIDE_CHAN,
            TimeMode::Tick => Operations::CHANGE_WIDE_CHAN_ALT,
        }
    }

    /// The time modes for which this set has a creation entry point.
    pub fn write_modes(self) -> impl Iterator<Item = TimeMode> {
        [TimeMode::Real, TimeMode::Tick]
            .iter()
            .cloned()
            .filter(move |&m| self.contains(Operations::create(m)))
    }
}
