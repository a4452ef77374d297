// Copyright (c) 2017-2021 Fabian Schuiki

//! Trace configuration.

use crate::value::{ChannelEncoding, TimeMode};
use serde::{Deserialize, Serialize};

/// The parameters of a trace to be created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// The destination of the trace, typically a file path.
    pub name: String,
    /// The time of the last change, in seconds.
    pub stop_time: f64,
    /// The duration of one tick, in seconds.
    pub time_per_tick: f64,
    /// Whether changes are stamped with real or tick times.
    pub mode: TimeMode,
    /// How channel states are encoded for formats without native channels.
    pub channel: ChannelEncoding,
}

impl TraceConfig {
    /// Create a configuration for a trace written to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        TraceConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the stop time.
    pub fn stop_time(mut self, stop_time: f64) -> Self {
        self.stop_time = stop_time;
        self
    }

    /// Set the duration of one tick.
    pub fn time_per_tick(mut self, time_per_tick: f64) -> Self {
        self.time_per_tick = time_per_tick;
        self
    }

    /// Set the time mode.
    pub fn mode(mut self, mode: TimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the channel encoding.
    pub fn channel(mut self, channel: ChannelEncoding) -> Self {
        self.channel = channel;
        self
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            name: String::new(),
            stop_time: 0.0,
            time_per_tick: 1e-12,
            mode: TimeMode::Real,
            channel: ChannelEncoding::default(),
        }
    }
}
