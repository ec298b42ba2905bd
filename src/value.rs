// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError, MetricResult};
use std::time::Duration;

/// Conversion trait for valid metric values
///
/// Every value sent over the wire is an integer. Floating point values are
/// truncated toward zero (never rounded) and `Duration` values are converted
/// to whole milliseconds. Values that cannot be represented as an `i64` are
/// rejected with an `InvalidInput` error.
///
/// Typical use of the client shouldn't require interacting with this trait.
pub trait ToMetricValue {
    fn try_to_value(self) -> MetricResult<i64>;
}

impl ToMetricValue for i64 {
    fn try_to_value(self) -> MetricResult<i64> {
        Ok(self)
    }
}

impl ToMetricValue for i32 {
    fn try_to_value(self) -> MetricResult<i64> {
        Ok(i64::from(self))
    }
}

impl ToMetricValue for u32 {
    fn try_to_value(self) -> MetricResult<i64> {
        Ok(i64::from(self))
    }
}

impl ToMetricValue for u64 {
    fn try_to_value(self) -> MetricResult<i64> {
        i64::try_from(self).map_err(|_| MetricError::from((ErrorKind::InvalidInput, "i64 overflow")))
    }
}

impl ToMetricValue for usize {
    fn try_to_value(self) -> MetricResult<i64> {
        i64::try_from(self).map_err(|_| MetricError::from((ErrorKind::InvalidInput, "i64 overflow")))
    }
}

impl ToMetricValue for f64 {
    fn try_to_value(self) -> MetricResult<i64> {
        if !self.is_finite() {
            return Err(MetricError::from((ErrorKind::InvalidInput, "value is not finite")));
        }

        let truncated = self.trunc();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        if truncated >= i64::MAX as f64 || truncated < i64::MIN as f64 {
            Err(MetricError::from((ErrorKind::InvalidInput, "i64 overflow")))
        } else {
            Ok(truncated as i64)
        }
    }
}

impl ToMetricValue for f32 {
    fn try_to_value(self) -> MetricResult<i64> {
        f64::from(self).try_to_value()
    }
}

impl ToMetricValue for Duration {
    fn try_to_value(self) -> MetricResult<i64> {
        let as_millis = self.as_millis();
        if as_millis > i64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "i64 overflow")))
        } else {
            Ok(as_millis as i64)
        }
    }
}
