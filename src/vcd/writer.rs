// Copyright (c) 2017-2021 Fabian Schuiki

use crate::{
    backend::{NodeRef, TraceWriter},
    config::TraceConfig,
    error::{Result, TraceError},
    table::Table,
    value::{BitBuffer, ChannelEncoding, ChannelState, TimeMode, Timescale, Timestamp, WideValue},
    vcd::{format_exact, format_real, identifier, natural_cmp},
};
use itertools::Itertools;
use std::io::Write;

/// How a variable is declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VarKind {
    /// A digital variable of the given width.
    Wire(usize),
    /// A channel with the given data width.
    Chan(usize),
    /// An analog variable.
    Real,
}

#[derive(Debug)]
struct Var {
    name: String,
    ident: String,
    kind: VarKind,
}

/// A writer that emits a trace as VCD.
pub struct VcdWriter<W> {
    sink: W,
    mode: TimeMode,
    timescale: Timescale,
    encoding: ChannelEncoding,
    vars: Table<NodeRef, Var>,
    declared: bool,
    in_dump: bool,
    last_time: Option<WideValue>,
    bits: BitBuffer,
}

impl<W: Write> VcdWriter<W> {
    /// Create a new writer and emit the VCD header into `sink`.
    ///
    /// The tick duration requested in `config` is quantized to the nearest
    /// decade; real time stamps are converted using the quantized duration.
    pub fn new(sink: W, config: &TraceConfig) -> Result<Self> {
        let mut writer = VcdWriter {
            sink,
            mode: config.mode,
            timescale: Timescale::quantize(config.time_per_tick),
            encoding: config.channel,
            vars: Table::new(),
            declared: false,
            in_dump: false,
            last_time: None,
            bits: BitBuffer::new(),
        };
        writer.emit_header(config.time_per_tick)?;
        Ok(writer)
    }

    /// The timescale ticks are expressed in.
    pub fn timescale(&self) -> Timescale {
        self.timescale
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit_header(&mut self, time_per_tick: f64) -> Result<()> {
        let w = &mut self.sink;
        write!(w, "$date\n   {}\n$end\n", time::now().ctime())?;
        write!(
            w,
            "$version\n   VCD generated by wavetrace {}.\n$end\n",
            env!("CARGO_PKG_VERSION")
        )?;
        write!(
            w,
            "$comment\n   actual timescale is {}.\n$end\n",
            format_real(time_per_tick, 6)
        )?;
        write!(w, "$timescale {} $end\n", self.timescale)?;
        write!(w, "$scope module top $end\n")?;
        Ok(())
    }

    fn add_var(&mut self, name: &str, kind: VarKind) -> Result<NodeRef> {
        if self.declared {
            error!("VCD variable `{}` added after the definitions", name);
            return Err(TraceError::Unsupported("add_signal".to_owned()));
        }
        let index = self.vars.len();
        let node = self.vars.add(Var {
            name: name.to_owned(),
            ident: identifier(index),
            kind,
        });
        trace!("VCD variable {} `{}` is {:?}", node, name, kind);
        Ok(node)
    }

    fn var(&self, node: NodeRef) -> Result<&Var> {
        self.vars.get(node).ok_or(TraceError::UnknownSignal)
    }

    /// Emit the variable definitions in natural order.
    fn emit_definitions(&mut self) -> Result<()> {
        let w = &mut self.sink;
        for var in self
            .vars
            .values()
            .sorted_by(|a, b| natural_cmp(&a.name, &b.name))
        {
            let (ty, width) = match var.kind {
                VarKind::Wire(width) => ("wire", width),
                VarKind::Chan(width) => ("wire", self.encoding.encoded_width(width)),
                VarKind::Real => ("real", 1),
            };
            write!(w, "$var {} {} {} {} $end\n", ty, width, var.ident, var.name)?;
        }
        write!(w, "$upscope $end\n")?;
        write!(w, "$enddefinitions $end\n")?;
        self.declared = true;
        Ok(())
    }

    /// Emit a time marker if `time` differs from the last one emitted.
    ///
    /// Values in the init block carry no time marker.
    fn emit_time(&mut self, time: &Timestamp) -> Result<()> {
        if self.in_dump {
            return Ok(());
        }
        let ticks = match time {
            Timestamp::Real(t) => WideValue::from(self.timescale.ticks(*t)),
            Timestamp::Tick(t) => t.clone(),
        };
        if self.last_time.as_ref() == Some(&ticks) {
            return Ok(());
        }
        write!(self.sink, "#{}\n", ticks)?;
        self.last_time = Some(ticks);
        Ok(())
    }

    fn check_mode(&self, time: &Timestamp) -> Result<()> {
        if time.mode() != self.mode {
            return Err(TraceError::TimeModeMismatch {
                expected: self.mode,
            });
        }
        Ok(())
    }

    fn emit_bits(&mut self, node: NodeRef, render: impl FnOnce(&mut BitBuffer, usize) -> Result<()>) -> Result<()> {
        let (width, ident) = {
            let var = self.var(node)?;
            let width = match var.kind {
                VarKind::Wire(w) => w,
                VarKind::Chan(w) => self.encoding.encoded_width(w),
                VarKind::Real => return Err(TraceError::Unsupported("change_digital".to_owned())),
            };
            (width, var.ident.clone())
        };
        render(&mut self.bits, width)?;
        write!(self.sink, "b{} {}\n", self.bits.as_str(), ident)?;
        Ok(())
    }
}

impl<W: Write> TraceWriter for VcdWriter<W> {
    fn signal_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn add_analog_signal(&mut self, name: &str) -> Result<NodeRef> {
        self.add_var(name, VarKind::Real)
    }

    fn add_digital_signal(&mut self, name: &str) -> Result<NodeRef> {
        self.add_var(name, VarKind::Wire(1))
    }

    fn add_int_signal(&mut self, name: &str, width: usize) -> Result<NodeRef> {
        self.add_var(name, VarKind::Wire(width))
    }

    fn add_chan_signal(&mut self, name: &str, width: usize) -> Result<NodeRef> {
        self.add_var(name, VarKind::Chan(width))
    }

    fn signal_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn init_start(&mut self) -> Result<()> {
        self.emit_definitions()?;
        write!(self.sink, "$dumpvars\n")?;
        self.in_dump = true;
        Ok(())
    }

    fn init_end(&mut self) -> Result<()> {
        write!(self.sink, "$end\n")?;
        self.in_dump = false;
        Ok(())
    }

    fn change_digital(&mut self, node: NodeRef, time: &Timestamp, value: u64) -> Result<()> {
        self.check_mode(time)?;
        self.var(node)?;
        self.emit_time(time)?;
        self.emit_bits(node, |bits, width| bits.render_u64(width, value).map(|_| ()))
    }

    fn change_wide_digital(
        &mut self,
        node: NodeRef,
        time: &Timestamp,
        value: &WideValue,
    ) -> Result<()> {
        self.check_mode(time)?;
        self.var(node)?;
        self.emit_time(time)?;
        self.emit_bits(node, |bits, width| bits.render_wide(width, value).map(|_| ()))
    }

    fn change_analog(&mut self, node: NodeRef, time: &Timestamp, value: f64) -> Result<()> {
        self.check_mode(time)?;
        let ident = match self.var(node)? {
            Var {
                kind: VarKind::Real,
                ident,
                ..
            } => ident.clone(),
            _ => return Err(TraceError::Unsupported("change_analog".to_owned())),
        };
        self.emit_time(time)?;
        write!(self.sink, "r{} {}\n", format_exact(value), ident)?;
        Ok(())
    }

    fn change_chan(&mut self, node: NodeRef, time: &Timestamp, state: &ChannelState) -> Result<()> {
        self.check_mode(time)?;
        if !matches!(self.var(node)?.kind, VarKind::Chan(_)) {
            return Err(TraceError::Unsupported("change_chan".to_owned()));
        }
        self.emit_time(time)?;
        let encoding = self.encoding;
        self.emit_bits(node, |bits, width| {
            match state {
                ChannelState::Idle => bits.render_padded(width, 'z', "00"),
                ChannelState::RecvBlocked => bits.render_padded(width, 'z', "01"),
                ChannelState::SendBlocked => bits.render_padded(width, 'z', "10"),
                ChannelState::Value(_) => {
                    let code = encoding.encode_checked(state, width)?;
                    bits.render_wide(width, &code)
                }
            }
            .map(|_| ())
        })
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.flush()?;
        debug!("Closed VCD trace with {} variables", self.vars.len());
        Ok(())
    }
}
