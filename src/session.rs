// Copyright (c) 2017-2021 Fabian Schuiki

//! Trace sessions
//!
//! A session is one open trace. Sessions created for writing enforce the
//! protocol every trace format relies on: all signals are declared first,
//! then their initial values are recorded, then changes are streamed in time
//! order until the trace is closed. Sessions opened for reading skip straight
//! to the streaming phase.
//!
//! Calls that violate the protocol are refused with an error and leave the
//! session untouched. Two omissions are forgiven with a warning: starting the
//! init block without declaring any signals, and ending it without recording
//! any initial values.

use crate::{
    backend::{
        BackendDescriptor, NodeRef, Operations, TraceHeader, TraceReader, TraceWriter,
    },
    config::TraceConfig,
    error::{Result, TraceError},
    signal::{Signal, SignalId, SignalKind},
    value::{BoolValue, ChannelEncoding, ChannelState, SignalValue, TimeMode, Timestamp, WideValue, WORD_BITS},
};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

/// The protocol state of a session.
///
/// States only ever advance in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Nothing has happened yet.
    Idle,
    /// Signals are being declared.
    DeclaringSignals,
    /// The declaration block is closed. Passed through by `begin_init`.
    AwaitingInit,
    /// The init block is open and initial values are being recorded.
    InInit,
    /// The init block is closed, but no change has been recorded.
    AwaitingChanges,
    /// Changes are being recorded, or the trace is being read.
    Streaming,
    /// The trace has been closed.
    Closed,
}

impl SessionState {
    /// The historical number of the state.
    pub fn number(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::DeclaringSignals => "declaring signals",
            SessionState::AwaitingInit => "awaiting init",
            SessionState::InInit => "in init",
            SessionState::AwaitingChanges => "awaiting changes",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
        };
        write!(f, "{} ({})", name, self.number())
    }
}

enum Handle {
    Writer(Box<dyn TraceWriter>),
    Reader(Box<dyn TraceReader>),
}

static NEXT_SESSION: AtomicU32 = AtomicU32::new(0);

/// An open trace.
pub struct Session {
    id: u32,
    name: String,
    mode: TimeMode,
    state: SessionState,
    handle: Option<Handle>,
    backend: Arc<BackendDescriptor>,
    signals: Vec<Signal>,
    names: HashMap<String, SignalId>,
    encoding: ChannelEncoding,
    init_count: usize,
}

impl Session {
    fn new(name: String, mode: TimeMode, handle: Handle, backend: &Arc<BackendDescriptor>) -> Self {
        let state = match handle {
            Handle::Writer(_) => SessionState::Idle,
            Handle::Reader(_) => SessionState::Streaming,
        };
        Session {
            id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            name,
            mode,
            state,
            handle: Some(handle),
            backend: backend.clone(),
            signals: Vec::new(),
            names: HashMap::new(),
            encoding: ChannelEncoding::default(),
            init_count: 0,
        }
    }

    /// Create a new trace for writing.
    pub fn create(backend: &Arc<BackendDescriptor>, config: TraceConfig) -> Result<Session> {
        let writer = backend.create(&config)?;
        debug!(
            "Created {} time trace `{}` with `{}`",
            config.mode,
            config.name,
            backend.prefix()
        );
        let mut session = Session::new(config.name, config.mode, Handle::Writer(writer), backend);
        session.encoding = config.channel;
        Ok(session)
    }

    /// Open an existing trace for reading.
    pub fn open(backend: &Arc<BackendDescriptor>, name: &str, mode: TimeMode) -> Result<Session> {
        let reader = backend.open(name, mode)?;
        debug!(
            "Opened {} time trace `{}` with `{}`",
            mode,
            name,
            backend.prefix()
        );
        Ok(Session::new(name.to_owned(), mode, Handle::Reader(reader), backend))
    }

    /// The destination or source of the trace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The time mode of the trace.
    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    /// The protocol state of the session.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check whether the trace was opened for reading.
    pub fn is_read_only(&self) -> bool {
        matches!(self.handle, Some(Handle::Reader(_)))
    }

    /// The format the trace is written or read with.
    pub fn backend(&self) -> &Arc<BackendDescriptor> {
        &self.backend
    }

    /// The channel encoding in effect.
    pub fn channel_encoding(&self) -> &ChannelEncoding {
        &self.encoding
    }

    /// The signals declared or looked up so far.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// The number of initial values recorded so far.
    pub fn init_count(&self) -> usize {
        self.init_count
    }

    /// Access a signal by handle.
    pub fn signal(&self, id: SignalId) -> Result<&Signal> {
        if id.session != self.id {
            warn!("Signal {:?} does not belong to trace `{}`", id, self.name);
            return Err(TraceError::UnknownSignal);
        }
        self.signals.get(id.index()).ok_or(TraceError::UnknownSignal)
    }

    fn refuse(&self, op: &'static str) -> TraceError {
        if self.state == SessionState::Closed {
            error!("{} called on closed trace `{}`", op, self.name);
            return TraceError::Closed;
        }
        error!("{} called in illegal state {}", op, self.state);
        TraceError::IllegalState {
            op,
            state: self.state,
        }
    }

    fn writer(&mut self, op: &'static str) -> Result<&mut dyn TraceWriter> {
        match self.handle {
            Some(Handle::Writer(ref mut w)) => Ok(w.as_mut()),
            Some(Handle::Reader(_)) => {
                warn!("{} refused on trace `{}` opened for reading", op, self.name);
                Err(TraceError::ReadOnly(op))
            }
            None => Err(TraceError::Closed),
        }
    }

    fn reader(&mut self, op: &'static str) -> Result<&mut dyn TraceReader> {
        match self.handle {
            Some(Handle::Reader(ref mut r)) => Ok(r.as_mut()),
            Some(Handle::Writer(_)) => {
                warn!("{} refused on trace `{}` created for writing", op, self.name);
                Err(TraceError::WriteOnly(op))
            }
            None => Err(TraceError::Closed),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        trace!("Trace `{}`: {} -> {}", self.name, self.state, state);
        self.state = state;
    }

    /// Declare a signal.
    ///
    /// The first declaration opens the declaration block. Declarations are
    /// refused once the init block has been started.
    pub fn declare_signal(&mut self, name: &str, kind: SignalKind) -> Result<SignalId> {
        self.writer("declare_signal")?;
        if self.state != SessionState::Idle && self.state != SessionState::DeclaringSignals {
            return Err(self.refuse("declare_signal"));
        }
        if self.names.contains_key(name) {
            warn!("Signal `{}` declared twice in `{}`", name, self.name);
            return Err(TraceError::DuplicateSignal(name.to_owned()));
        }
        let op = match kind {
            SignalKind::Bool => Operations::ADD_DIGITAL_SIGNAL,
            SignalKind::Int(_) => Operations::ADD_INT_SIGNAL,
            SignalKind::Chan(_) => Operations::ADD_CHAN_SIGNAL,
            SignalKind::Analog => Operations::ADD_ANALOG_SIGNAL,
        };
        if !self.backend.has(op) {
            let symbol = op.symbol(self.backend.prefix());
            warn!("Cannot declare {} signal `{}`: no `{}`", kind, name, symbol);
            return Err(TraceError::Unsupported(symbol));
        }
        self.signals.try_reserve(1)?;
        self.names.try_reserve(1)?;

        if self.state == SessionState::Idle {
            self.writer("declare_signal")?.signal_start()?;
            self.set_state(SessionState::DeclaringSignals);
        }
        let writer = self.writer("declare_signal")?;
        let node = match kind {
            SignalKind::Bool => writer.add_digital_signal(name)?,
            SignalKind::Int(w) => writer.add_int_signal(name, w)?,
            SignalKind::Chan(w) => writer.add_chan_signal(name, w)?,
            SignalKind::Analog => writer.add_analog_signal(name)?,
        };
        let id = self.push_signal(name, kind, node);
        debug!("Declared {} signal `{}` as {:?}", kind, name, id);
        Ok(id)
    }

    fn push_signal(&mut self, name: &str, kind: SignalKind, node: NodeRef) -> SignalId {
        let id = SignalId {
            session: self.id,
            index: self.signals.len() as u32,
        };
        self.signals.push(Signal::new(name.to_owned(), kind, node));
        self.names.insert(name.to_owned(), id);
        id
    }

    /// Close the declaration block and open the init block in one step.
    pub fn begin_init(&mut self) -> Result<()> {
        self.writer("begin_init")?;
        match self.state {
            SessionState::Idle => {
                warn!("No signals declared in `{}`", self.name);
                self.writer("begin_init")?.signal_start()?;
                self.set_state(SessionState::DeclaringSignals);
            }
            SessionState::DeclaringSignals => (),
            _ => return Err(self.refuse("begin_init")),
        }
        let writer = self.writer("begin_init")?;
        writer.signal_end()?;
        self.set_state(SessionState::AwaitingInit);
        self.writer("begin_init")?.init_start()?;
        self.set_state(SessionState::InInit);
        Ok(())
    }

    /// Record the initial value of a signal.
    pub fn init_value(&mut self, signal: SignalId, value: impl Into<SignalValue>) -> Result<()> {
        self.writer("init_value")?;
        if self.state != SessionState::InInit {
            return Err(self.refuse("init_value"));
        }
        let time = Timestamp::zero(self.mode);
        self.dispatch(signal, &time, &value.into())?;
        self.init_count += 1;
        Ok(())
    }

    /// Close the init block.
    pub fn end_init(&mut self) -> Result<()> {
        self.writer("end_init")?;
        if self.state != SessionState::InInit {
            return Err(self.refuse("end_init"));
        }
        if self.init_count == 0 {
            warn!("No initial values recorded in `{}`", self.name);
        }
        self.writer("end_init")?.init_end()?;
        self.set_state(SessionState::AwaitingChanges);
        Ok(())
    }

    /// Record a change of a signal's value.
    ///
    /// Refused until the init block has been closed.
    pub fn record_change(
        &mut self,
        signal: SignalId,
        time: impl Into<Timestamp>,
        value: impl Into<SignalValue>,
    ) -> Result<()> {
        self.writer("record_change")?;
        let time = time.into();
        if time.mode() != self.mode {
            warn!(
                "Change at {} refused on {} time trace `{}`",
                time, self.mode, self.name
            );
            return Err(TraceError::TimeModeMismatch {
                expected: self.mode,
            });
        }
        match self.state {
            SessionState::AwaitingChanges | SessionState::Streaming => (),
            _ => return Err(self.refuse("record_change")),
        }
        self.dispatch(signal, &time, &value.into())?;
        if self.state == SessionState::AwaitingChanges {
            self.set_state(SessionState::Streaming);
        }
        Ok(())
    }

    /// Record a change of a boolean or integer signal to a value of at most
    /// one word.
    ///
    /// For boolean signals the value is a `BoolValue` code.
    pub fn change_digital(
        &mut self,
        signal: SignalId,
        time: impl Into<Timestamp>,
        value: u64,
    ) -> Result<()> {
        let value = match self.signal(signal)?.kind() {
            SignalKind::Bool => match BoolValue::from_u64(value) {
                Some(b) => SignalValue::Bool(b),
                None => SignalValue::int(value),
            },
            _ => SignalValue::int(value),
        };
        self.record_change(signal, time, value)
    }

    /// Record a change of an integer signal to a value of arbitrary width.
    pub fn change_wide_digital(
        &mut self,
        signal: SignalId,
        time: impl Into<Timestamp>,
        value: WideValue,
    ) -> Result<()> {
        self.record_change(signal, time, SignalValue::Int(value))
    }

    /// Record a change of an analog signal.
    pub fn change_analog(
        &mut self,
        signal: SignalId,
        time: impl Into<Timestamp>,
        value: f64,
    ) -> Result<()> {
        self.record_change(signal, time, SignalValue::Analog(value))
    }

    /// Record a change of a channel's state.
    pub fn change_chan(
        &mut self,
        signal: SignalId,
        time: impl Into<Timestamp>,
        state: ChannelState,
    ) -> Result<()> {
        self.record_change(signal, time, SignalValue::Chan(state))
    }

    /// Hand a value to the backend, using the operation that matches the
    /// signal's kind and the value's width.
    fn dispatch(&mut self, id: SignalId, time: &Timestamp, value: &SignalValue) -> Result<()> {
        let signal = self.signal(id)?;
        let (node, kind) = (signal.node(), signal.kind());
        if !value.fits(&kind) {
            warn!(
                "Value {:?} does not fit {} signal `{}`",
                value,
                kind,
                signal.name()
            );
            return Err(TraceError::KindMismatch {
                signal: signal.name().to_owned(),
                kind,
            });
        }
        trace!("{} {} = {:?}", time, signal.name(), value);

        let mode = self.mode;
        let backend = self.backend.clone();
        let require = |op: Operations| -> Result<()> {
            if backend.has(op) {
                Ok(())
            } else {
                let symbol = op.symbol(backend.prefix());
                warn!("Change refused: no `{}`", symbol);
                Err(TraceError::Unsupported(symbol))
            }
        };
        let encoding = self.encoding;
        let writer = self.writer("record_change")?;

        match (kind, value) {
            (SignalKind::Analog, SignalValue::Analog(v)) => {
                require(Operations::change_analog(mode))?;
                writer.change_analog(node, time, *v)
            }
            (SignalKind::Bool, SignalValue::Bool(b)) => {
                require(Operations::change_digital(mode))?;
                writer.change_digital(node, time, *b as u64)
            }
            (SignalKind::Bool, SignalValue::Int(v)) => {
                require(Operations::change_digital(mode))?;
                let code = BoolValue::from_u64(v.word(0)).unwrap_or_else(|| v.bit(0).into());
                writer.change_digital(node, time, code as u64)
            }
            (SignalKind::Int(width), SignalValue::Int(v)) => {
                if width <= WORD_BITS {
                    require(Operations::change_digital(mode))?;
                    let v = v.resize(width);
                    writer.change_digital(node, time, v.word(0))
                } else {
                    require(Operations::change_wide_digital(mode))?;
                    writer.change_wide_digital(node, time, &v.resize(width))
                }
            }
            (SignalKind::Chan(width), SignalValue::Chan(state)) => {
                let traced = encoding.encoded_width(width);
                let code = encoding.encode_checked(state, traced).map_err(|e| {
                    warn!("Channel {} value {} does not fit: {}", node, state, e);
                    e
                })?;
                let wide = match state {
                    ChannelState::Value(v) => v.significant_words() > 1,
                    _ => false,
                };
                let native = if wide {
                    Operations::change_wide_chan(mode)
                } else {
                    Operations::change_chan(mode)
                };
                if backend.has(native) {
                    return writer.change_chan(node, time, state);
                }
                if traced <= WORD_BITS {
                    require(Operations::change_digital(mode))?;
                    writer.change_digital(node, time, code.word(0))
                } else {
                    require(Operations::change_wide_digital(mode))?;
                    writer.change_wide_digital(node, time, &code)
                }
            }
            _ => unreachable!("value kinds checked above"),
        }
    }

    /// Close the trace and release the backend's handle.
    ///
    /// Writers can only be closed once the init block is over.
    pub fn close(&mut self) -> Result<()> {
        match (self.state, &self.handle) {
            (SessionState::AwaitingChanges, Some(Handle::Writer(_))) => {
                warn!("Empty trace `{}`", self.name)
            }
            (SessionState::Streaming, _) => (),
            _ => return Err(self.refuse("close")),
        }
        self.set_state(SessionState::Closed);
        let result = match self.handle.take() {
            Some(Handle::Writer(w)) => w.close(),
            Some(Handle::Reader(r)) => r.close(),
            None => Err(TraceError::Closed),
        };
        debug!("Closed trace `{}`", self.name);
        result
    }

    /// Read the global properties of a trace opened for reading.
    pub fn header(&mut self) -> Result<TraceHeader> {
        self.reader("header")?.header()
    }

    /// Find a signal of a trace opened for reading by name.
    pub fn lookup(&mut self, name: &str) -> Result<Option<SignalId>> {
        self.reader("lookup")?;
        if let Some(&id) = self.names.get(name) {
            return Ok(Some(id));
        }
        let reader = self.reader("lookup")?;
        let node = match reader.signal_lookup(name)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let kind = reader.signal_type(node)?;
        self.signals.try_reserve(1)?;
        self.names.try_reserve(1)?;
        Ok(Some(self.push_signal(name, kind, node)))
    }

    /// The kind of a signal of a trace opened for reading.
    pub fn signal_kind(&mut self, id: SignalId) -> Result<SignalKind> {
        self.reader("signal_kind")?;
        Ok(self.signal(id)?.kind())
    }

    /// Read the value of a signal at the cursor.
    pub fn value(&mut self, id: SignalId) -> Result<SignalValue> {
        self.reader("value")?;
        let node = self.signal(id)?.node();
        self.reader("value")?.get_signal(node)
    }

    /// Move the cursor forward by a number of steps.
    pub fn advance(&mut self, steps: u64) -> Result<()> {
        self.reader("advance")?;
        self.require_reader_op(Operations::ADVANCE_TIME)?;
        self.reader("advance")?.advance_time(steps)
    }

    /// Move the cursor forward by an amount of time in seconds.
    pub fn advance_by(&mut self, delta: f64) -> Result<()> {
        self.reader("advance_by")?;
        self.require_reader_op(Operations::ADVANCE_TIME_BY)?;
        self.reader("advance_by")?.advance_time_by(delta)
    }

    /// Check whether there are changes beyond the cursor.
    pub fn has_more_data(&mut self) -> Result<bool> {
        self.reader("has_more_data")?.has_more_data()
    }

    fn require_reader_op(&self, op: Operations) -> Result<()> {
        if self.backend.has(op) {
            return Ok(());
        }
        let symbol = op.symbol(self.backend.prefix());
        warn!("Trace format lacks `{}`", symbol);
        Err(TraceError::Unsupported(symbol))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("read_only", &self.is_read_only())
            .field("backend", &self.backend.prefix())
            .field("signals", &self.signals.len())
            .finish()
    }
}
