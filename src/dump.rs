// Copyright (c) 2017-2021 Fabian Schuiki

//! A simple trace format for debugging and regression testing.
//!
//! The dump lists each time step as a `@<tick>` line, followed by one
//! `  <name> = <value>` line per change. Integers print in hexadecimal.

use crate::{
    backend::{NodeRef, Operations, TraceFormat, TraceWriter},
    config::TraceConfig,
    error::{Result, TraceError},
    table::Table,
    value::{BoolValue, Timescale, Timestamp, WideValue},
};
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// The dump trace format. Writes real-time traces only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DumpFormat;

impl TraceFormat for DumpFormat {
    fn operations(&self) -> Operations {
        Operations::CREATE
            | Operations::WRITER_REQUIRED
            | Operations::ADD_DIGITAL_SIGNAL
            | Operations::ADD_INT_SIGNAL
            | Operations::ADD_ANALOG_SIGNAL
            | Operations::CHANGE_DIGITAL
            | Operations::CHANGE_WIDE_DIGITAL
            | Operations::CHANGE_ANALOG
            | Operations::CLOSE
    }

    fn create(&self, config: &TraceConfig) -> Result<Box<dyn TraceWriter>> {
        let file = File::create(&config.name)?;
        Ok(Box::new(DumpWriter::new(BufWriter::new(file), config)))
    }
}

/// A writer that emits a trace as a human-readable change dump.
pub struct DumpWriter<T> {
    writer: T,
    timescale: Timescale,
    signals: Table<NodeRef, (String, Option<usize>)>,
    last_tick: Option<u64>,
}

impl<T: Write> DumpWriter<T> {
    /// Create a new dump writer which will write its dump to `writer`.
    pub fn new(writer: T, config: &TraceConfig) -> Self {
        DumpWriter {
            writer,
            timescale: Timescale::quantize(config.time_per_tick),
            signals: Table::new(),
            last_tick: None,
        }
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> T {
        self.writer
    }

    fn add(&mut self, name: &str, width: Option<usize>) -> NodeRef {
        self.signals.add((name.to_owned(), width))
    }

    /// Write the time step header if the time has moved.
    fn step(&mut self, time: &Timestamp) -> Result<()> {
        let tick = match time {
            Timestamp::Real(t) => self.timescale.ticks(*t),
            Timestamp::Tick(_) => {
                return Err(TraceError::Unsupported("change_digital_alt".to_owned()))
            }
        };
        if self.last_tick != Some(tick) {
            write!(self.writer, "@{}\n", tick)?;
            self.last_tick = Some(tick);
        }
        Ok(())
    }

    fn check(&self, node: NodeRef) -> Result<()> {
        match self.signals.get(node) {
            Some(_) => Ok(()),
            None => Err(TraceError::UnknownSignal),
        }
    }
}

impl<T: Write> TraceWriter for DumpWriter<T> {
    fn signal_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn add_analog_signal(&mut self, name: &str) -> Result<NodeRef> {
        Ok(self.add(name, None))
    }

    fn add_digital_signal(&mut self, name: &str) -> Result<NodeRef> {
        Ok(self.add(name, Some(1)))
    }

    fn add_int_signal(&mut self, name: &str, width: usize) -> Result<NodeRef> {
        Ok(self.add(name, Some(width)))
    }

    fn signal_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn init_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn init_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn change_digital(&mut self, node: NodeRef, time: &Timestamp, value: u64) -> Result<()> {
        self.change_wide_digital(node, time, &value.into())
    }

    fn change_wide_digital(
        &mut self,
        node: NodeRef,
        time: &Timestamp,
        value: &WideValue,
    ) -> Result<()> {
        self.check(node)?;
        self.step(time)?;
        let (name, width) = &self.signals[node];
        match *width {
            Some(1) => {
                let v = value.to_u64().and_then(BoolValue::from_u64);
                let v = v.unwrap_or_else(|| value.bit(0).into());
                write!(self.writer, "  {} = {}\n", name, v)?;
            }
            Some(width) => {
                let v = value.resize(width).to_biguint();
                write!(self.writer, "  {} = 0x{:02$x}\n", name, v, (width + 3) / 4)?;
            }
            None => return Err(TraceError::Unsupported("change_digital".to_owned())),
        }
        Ok(())
    }

    fn change_analog(&mut self, node: NodeRef, time: &Timestamp, value: f64) -> Result<()> {
        self.check(node)?;
        self.step(time)?;
        let (name, _) = &self.signals[node];
        write!(self.writer, "  {} = {}\n", name, value)?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
