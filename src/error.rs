// Copyright (c) 2017-2021 Fabian Schuiki

//! Errors produced while loading backends and recording traces.

use crate::{session::SessionState, signal::SignalKind, value::TimeMode};
use std::collections::TryReserveError;
use thiserror::Error;

/// A result carrying a `TraceError`.
pub type Result<T> = std::result::Result<T, TraceError>;

/// An error that occurred while resolving a backend.
///
/// Every variant names the prefix or the fully qualified operation symbol
/// (`<prefix>_<op>`) that caused the load to fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no trace format registered under prefix `{0}`")]
    NotFound(String),
    #[error("missing required operation `{0}`")]
    MissingOperation(String),
    #[error("inconsistent operation set: `{symbol}` {reason}")]
    Inconsistent { symbol: String, reason: String },
    #[error("trace format `{0}` can neither read nor write traces")]
    NoCapability(String),
    #[error("trace format `{0}` cannot add any kind of signal")]
    NoSignalKinds(String),
}

/// An error that occurred while operating on a trace session.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{op} called in illegal state {state}")]
    IllegalState {
        op: &'static str,
        state: SessionState,
    },
    #[error("{0} refused: trace was opened for reading")]
    ReadOnly(&'static str),
    #[error("{0} refused: trace was created for writing")]
    WriteOnly(&'static str),
    #[error("operation `{0}` is not supported by the trace format")]
    Unsupported(String),
    #[error("signal does not belong to this trace")]
    UnknownSignal,
    #[error("signal `{0}` declared twice")]
    DuplicateSignal(String),
    #[error("value does not match kind {kind} of signal `{signal}`")]
    KindMismatch { signal: String, kind: SignalKind },
    #[error("time stamp does not match the trace's {expected} time mode")]
    TimeModeMismatch { expected: TimeMode },
    #[error("channel value does not fit into {width} bits")]
    ChannelOverflow { width: usize },
    #[error("trace was already closed")]
    Closed,
    #[error("cannot grow scratch buffer")]
    Resource(#[from] TryReserveError),
    #[error("I/O operation failed")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Load(#[from] LoadError),
}
