// Copyright (c) 2017-2021 Fabian Schuiki

//! Resolving and validating trace formats.

use crate::{
    backend::{Operations, TraceFormat, TraceReader, TraceWriter},
    config::TraceConfig,
    dump::DumpFormat,
    error::{LoadError, Result, TraceError},
    value::TimeMode,
    vcd::VcdFormat,
};
use std::{collections::HashMap, fmt, sync::Arc};

/// A set of trace formats addressable by prefix.
#[derive(Clone, Default)]
pub struct Registry {
    formats: HashMap<String, Arc<dyn TraceFormat>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a registry with the formats built into this crate: `vcd` and
    /// `dump`.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register("vcd", VcdFormat);
        reg.register("dump", DumpFormat);
        reg
    }

    /// Register a format under `prefix`, replacing any previous format with
    /// the same prefix.
    pub fn register(&mut self, prefix: impl Into<String>, format: impl TraceFormat + 'static) {
        self.formats.insert(prefix.into(), Arc::new(format));
    }

    /// Check whether a format is registered under `prefix`.
    pub fn contains(&self, prefix: &str) -> bool {
        self.formats.contains_key(prefix)
    }

    /// Resolve and validate the format registered under `prefix`.
    pub fn load(&self, prefix: &str) -> std::result::Result<BackendDescriptor, LoadError> {
        let format = match self.formats.get(prefix) {
            Some(f) => f.clone(),
            None => {
                error!("No trace format registered under `{}`", prefix);
                return Err(LoadError::NotFound(prefix.to_owned()));
            }
        };
        let ops = format.operations();
        validate(prefix, ops)?;
        debug!("Loaded trace format `{}` with {:?}", prefix, ops);
        Ok(BackendDescriptor {
            prefix: prefix.to_owned(),
            ops,
            format,
        })
    }
}

/// Resolve and validate one of the built-in formats.
pub fn load(prefix: &str) -> std::result::Result<BackendDescriptor, LoadError> {
    Registry::with_builtin().load(prefix)
}

/// Check that an operation set is complete and consistent.
///
/// Every missing required operation is logged; the first one is returned.
pub fn validate(prefix: &str, ops: Operations) -> std::result::Result<(), LoadError> {
    let mut required = Operations::CLOSE;
    let can_write = ops.intersects(Operations::CREATORS);
    let can_read = ops.intersects(Operations::OPENERS);
    if can_write {
        required |= Operations::WRITER_REQUIRED;
    }
    if can_read {
        required |= Operations::READER_REQUIRED;
    }
    let missing = required - ops;
    for op in missing.each() {
        error!("Trace format lacks required `{}`", op.symbol(prefix));
    }
    if let Some(op) = missing.each().next() {
        return Err(LoadError::MissingOperation(op.symbol(prefix)));
    }
    if !can_write && !can_read {
        error!("Trace format `{}` can neither read nor write", prefix);
        return Err(LoadError::NoCapability(prefix.to_owned()));
    }

    if can_write {
        if !ops.intersects(Operations::ADD_SIGNAL) {
            error!("Trace format `{}` cannot add any kind of signal", prefix);
            return Err(LoadError::NoSignalKinds(prefix.to_owned()));
        }
        for mode in ops.write_modes() {
            validate_mode(prefix, ops, mode)?;
        }
    }

    if can_read && !ops.intersects(Operations::ADVANCE_TIME | Operations::ADVANCE_TIME_BY) {
        let symbol = Operations::ADVANCE_TIME.symbol(prefix);
        error!("Trace format lacks `{}` or its `_by` variant", symbol);
        return Err(LoadError::MissingOperation(symbol));
    }
    Ok(())
}

/// Check that every signal kind a writer can add can also be changed in
/// `mode`.
fn validate_mode(
    prefix: &str,
    ops: Operations,
    mode: TimeMode,
) -> std::result::Result<(), LoadError> {
    let inconsistent = |needed: Operations, by: Operations| {
        let err = LoadError::Inconsistent {
            symbol: needed.symbol(prefix),
            reason: format!(
                "is required by `{}` for {} time traces",
                by.symbol(prefix),
                mode
            ),
        };
        error!("{}", err);
        err
    };

    let analog = Operations::change_analog(mode);
    if ops.contains(Operations::ADD_ANALOG_SIGNAL) && !ops.contains(analog) {
        return Err(inconsistent(analog, Operations::ADD_ANALOG_SIGNAL));
    }

    let digital_adds = ops & Operations::ADD_DIGITAL_KINDS;
    if !digital_adds.is_empty() {
        let digital = Operations::change_digital(mode);
        if !ops.contains(digital) {
            let by = digital_adds.each().next().unwrap_or(Operations::ADD_DIGITAL_SIGNAL);
            return Err(inconsistent(digital, by));
        }
        let wide = Operations::change_wide_digital(mode);
        if !ops.contains(wide) {
            warn!(
                "Trace format lacks `{}`; values wider than one word are unsupported",
                wide.symbol(prefix)
            );
        }
    }

    let chan = Operations::change_chan(mode);
    let wide_chan = Operations::change_wide_chan(mode);
    if ops.contains(Operations::ADD_CHAN_SIGNAL | chan) && !ops.contains(wide_chan) {
        warn!(
            "Trace format lacks `{}`; wide channel values are encoded digitally",
            wide_chan.symbol(prefix)
        );
    }
    Ok(())
}

/// A validated trace format.
///
/// Descriptors are immutable and can be shared among sessions.
#[derive(Clone)]
pub struct BackendDescriptor {
    prefix: String,
    ops: Operations,
    format: Arc<dyn TraceFormat>,
}

impl BackendDescriptor {
    /// The prefix the format was loaded under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The operations the format provides.
    pub fn operations(&self) -> Operations {
        self.ops
    }

    /// Check whether the format provides all of `ops`.
    pub fn has(&self, ops: Operations) -> bool {
        self.ops.contains(ops)
    }

    /// Check whether the format can create traces.
    pub fn can_write(&self) -> bool {
        self.ops.intersects(Operations::CREATORS)
    }

    /// Check whether the format can open traces.
    pub fn can_read(&self) -> bool {
        self.ops.intersects(Operations::OPENERS)
    }

    pub(crate) fn create(&self, config: &TraceConfig) -> Result<Box<dyn TraceWriter>> {
        let op = Operations::create(config.mode);
        if !self.has(op) {
            error!("Trace format lacks `{}`", op.symbol(&self.prefix));
            return Err(TraceError::Unsupported(op.symbol(&self.prefix)));
        }
        self.format.create(config)
    }

    pub(crate) fn open(&self, name: &str, mode: TimeMode) -> Result<Box<dyn TraceReader>> {
        let op = Operations::open(mode);
        if !self.has(op) {
            error!("Trace format lacks `{}`", op.symbol(&self.prefix));
            return Err(TraceError::Unsupported(op.symbol(&self.prefix)));
        }
        self.format.open(name, mode)
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("prefix", &self.prefix)
            .field("ops", &self.ops)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_ops() -> Operations {
        Operations::CREATE
            | Operations::WRITER_REQUIRED
            | Operations::CLOSE
            | Operations::ADD_DIGITAL_SIGNAL
            | Operations::CHANGE_DIGITAL
    }

    #[test]
    fn minimal_writer() {
        assert_eq!(validate("x", writer_ops()), Ok(()));
    }

    #[test]
    fn close_is_required() {
        assert_eq!(
            validate("x", writer_ops() - Operations::CLOSE),
            Err(LoadError::MissingOperation("x_close".into()))
        );
    }

    #[test]
    fn writer_group_is_required() {
        assert_eq!(
            validate("x", writer_ops() - Operations::INIT_END),
            Err(LoadError::MissingOperation("x_init_end".into()))
        );
    }

    #[test]
    fn capability_is_required() {
        assert_eq!(
            validate("x", writer_ops() - Operations::CREATE),
            Err(LoadError::NoCapability("x".into()))
        );
    }

    #[test]
    fn signal_kinds_are_required() {
        assert_eq!(
            validate("x", writer_ops() - Operations::ADD_DIGITAL_SIGNAL),
            Err(LoadError::NoSignalKinds("x".into()))
        );
    }

    #[test]
    fn kinds_need_changes_per_mode() {
        let ops = writer_ops() | Operations::ADD_ANALOG_SIGNAL;
        match validate("x", ops) {
            Err(LoadError::Inconsistent { symbol, .. }) => assert_eq!(symbol, "x_change_analog"),
            r => panic!("unexpected {:?}", r),
        }
        let ops = writer_ops() | Operations::CREATE_ALT;
        match validate("x", ops) {
            Err(LoadError::Inconsistent { symbol, .. }) => {
                assert_eq!(symbol, "x_change_digital_alt")
            }
            r => panic!("unexpected {:?}", r),
        }
        let ops = ops | Operations::CHANGE_DIGITAL_ALT;
        assert_eq!(validate("x", ops), Ok(()));
    }

    #[test]
    fn reader_needs_advance() {
        let ops = Operations::OPEN | Operations::READER_REQUIRED | Operations::CLOSE;
        assert_eq!(
            validate("x", ops),
            Err(LoadError::MissingOperation("x_advance_time".into()))
        );
        assert_eq!(validate("x", ops | Operations::ADVANCE_TIME_BY), Ok(()));
    }

    #[test]
    fn unknown_prefix() {
        assert_eq!(
            Registry::new().load("nope").unwrap_err(),
            LoadError::NotFound("nope".into())
        );
    }

    #[test]
    fn builtin_formats_load() {
        let vcd = load("vcd").unwrap();
        assert!(vcd.can_write());
        assert!(vcd.can_read());
        let dump = load("dump").unwrap();
        assert!(dump.can_write());
        assert!(!dump.can_read());
    }
}
