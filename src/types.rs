// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;
use std::str::FromStr;

/// Kind of event a metric represents when it is encoded.
///
/// `Increment` and `Decrement` are counters with a fixed value of `1` and
/// `-1` respectively. Any value supplied alongside them is ignored.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MetricKind {
    Timing,
    Gauge,
    Count,
    Increment,
    Decrement,
}

impl MetricKind {
    /// Unit suffix used on the wire for this kind of metric.
    pub fn unit(self) -> MetricUnit {
        match self {
            MetricKind::Timing => MetricUnit::Milliseconds,
            MetricKind::Gauge => MetricUnit::Gauge,
            MetricKind::Count | MetricKind::Increment | MetricKind::Decrement => MetricUnit::Counter,
        }
    }
}

/// Type suffix of a line in the Statsd protocol.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MetricUnit {
    Milliseconds,
    Gauge,
    Counter,
}

impl MetricUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Gauge => "g",
            MetricUnit::Counter => "c",
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl FromStr for MetricUnit {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ms" => Ok(MetricUnit::Milliseconds),
            "g" => Ok(MetricUnit::Gauge),
            "c" => Ok(MetricUnit::Counter),
            _ => Err(MetricError::from((ErrorKind::InvalidInput, "Unknown metric type"))),
        }
    }
}

/// A single metric event, created per call and consumed by the encoder.
#[derive(Debug, PartialEq, Clone)]
pub struct MetricEvent {
    key: String,
    value: i64,
    kind: MetricKind,
    rate: Option<f64>,
}

impl MetricEvent {
    pub fn new<S>(key: S, value: i64, kind: MetricKind) -> Self
    where
        S: Into<String>,
    {
        MetricEvent {
            key: key.into(),
            value,
            kind,
            rate: None,
        }
    }

    pub fn timing<S: Into<String>>(key: S, value: i64) -> Self {
        Self::new(key, value, MetricKind::Timing)
    }

    pub fn gauge<S: Into<String>>(key: S, value: i64) -> Self {
        Self::new(key, value, MetricKind::Gauge)
    }

    pub fn count<S: Into<String>>(key: S, value: i64) -> Self {
        Self::new(key, value, MetricKind::Count)
    }

    pub fn increment<S: Into<String>>(key: S) -> Self {
        Self::new(key, 1, MetricKind::Increment)
    }

    pub fn decrement<S: Into<String>>(key: S) -> Self {
        Self::new(key, -1, MetricKind::Decrement)
    }

    /// Set the sampling rate used when this event is sent.
    pub fn with_rate(self, rate: f64) -> Self {
        MetricEvent {
            rate: Some(rate),
            ..self
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }
}

/// A metric line in the canonical format sent to a Statsd server.
///
/// Instances are returned by the client after the line has been accepted
/// by the local network stack.
#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub struct Metric {
    repr: String,
}

impl Metric {
    /// Return the full string representation of the metric, without any
    /// trailing newline.
    pub fn as_metric_str(&self) -> &str {
        &self.repr
    }

    pub fn len(&self) -> usize {
        self.repr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repr.is_empty()
    }
}

impl From<String> for Metric {
    fn from(repr: String) -> Self {
        Metric { repr }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.repr.fmt(f)
    }
}

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidState,
    ResolutionError,
    BindError,
    ConnectError,
    WriteError,
    ReceiveError,
    Unhandled,
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match *self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::ResolutionError => "resolution error",
            ErrorKind::BindError => "bind error",
            ErrorKind::ConnectError => "connect error",
            ErrorKind::WriteError => "write error",
            ErrorKind::ReceiveError => "receive error",
            ErrorKind::Unhandled => "unhandled event",
            ErrorKind::IoError => "I/O error",
        };
        desc.fmt(f)
    }
}

/// Error generated by this library, either while encoding a metric or
/// while performing I/O on one of the transports.
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(ErrorKind, io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(kind, _) => kind,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ErrorKind::IoError, ref err) => err.fmt(f),
            ErrorRepr::IoError(kind, ref err) => write!(f, "{}: {}", kind, err),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(_, ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(ErrorKind::IoError, err),
        }
    }
}

impl From<(ErrorKind, io::Error)> for MetricError {
    fn from((kind, err): (ErrorKind, io::Error)) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(kind, err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
