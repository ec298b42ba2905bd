// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError};
use std::fmt;

/// Sample rate used when a caller doesn't supply one. Every event is sent.
pub const DEFAULT_SAMPLE_RATE: f64 = 1.0;

/// Represents the sample rate of a metric. This is used to tell the Statsd
/// server how often a metric was actually sent so that it can scale the value
/// back up. The sample rate is a value greater than 0.0 and at most 1.0.
///
/// The rate is written using the shortest decimal representation that parses
/// back to the same value, so `0.1` is written as `@0.1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate {
    value: f64,
}

impl SampleRate {
    pub fn value(&self) -> f64 {
        self.value
    }

    /// A rate of exactly 1.0 is implied by the protocol and never written.
    pub fn is_written(&self) -> bool {
        self.value != DEFAULT_SAMPLE_RATE
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.value)
    }
}

impl TryFrom<f64> for SampleRate {
    type Error = MetricError;

    fn try_from(rate: f64) -> Result<Self, Self::Error> {
        if rate > 0.0 && rate <= 1.0 {
            Ok(SampleRate { value: rate })
        } else {
            Err(MetricError::from((
                ErrorKind::InvalidInput,
                "Sample rate must be between 0.0 and 1.0",
            )))
        }
    }
}
