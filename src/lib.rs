// Copyright (c) 2017-2021 Fabian Schuiki

//! Recording of simulation signal changes into waveform traces.
//!
//! A simulator declares its signals once, records their initial values, and
//! then streams value changes tagged with simulated time. This library checks
//! that the calls follow that protocol, converts values into the digital
//! representations trace formats expect, and hands them to a pluggable format
//! backend. The reference backend writes Value Change Dump (VCD) files.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wavetrace::{Session, SignalKind, TraceConfig};
//!
//! # fn main() -> wavetrace::Result<()> {
//! let vcd = Arc::new(wavetrace::load("vcd")?);
//! let mut trace = Session::create(&vcd, TraceConfig::new("out.vcd").time_per_tick(1e-12))?;
//! let clk = trace.declare_signal("clk", SignalKind::Bool)?;
//! trace.begin_init()?;
//! trace.init_value(clk, false)?;
//! trace.end_init()?;
//! trace.record_change(clk, 1e-9, true)?;
//! trace.close()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

#[macro_use]
pub mod table;
pub mod backend;
pub mod config;
pub mod dump;
pub mod error;
pub mod session;
pub mod signal;
pub mod value;
pub mod vcd;

pub use crate::{
    backend::{load, BackendDescriptor, NodeRef, Operations, Registry, TraceFormat},
    config::TraceConfig,
    error::{LoadError, Result, TraceError},
    session::{Session, SessionState},
    signal::{Signal, SignalId, SignalKind},
    value::{BoolValue, ChannelEncoding, ChannelState, SignalValue, TimeMode, Timestamp, WideValue},
};
