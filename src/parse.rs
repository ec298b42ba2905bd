// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::format::SampleRate;
use crate::types::{ErrorKind, MetricError, MetricResult, MetricUnit};
use std::fmt;
use std::str::{self, FromStr};

/// A line of the Statsd protocol decoded into its parts.
///
/// Valid lines have the form:
///
/// - `<key>:<integer value>|<unit>`
/// - `<key>:<integer value>|<unit>|@<sample rate>`
///
/// Where the unit is one of `ms`, `g` or `c` and the sample rate is in (0, 1].
///
/// # Example
///
/// ```
/// use statsd_udp::{MetricUnit, WireLine};
///
/// let line: WireLine = "some.task:133|ms".parse().unwrap();
/// assert_eq!("some.task", line.key());
/// assert_eq!(133, line.value());
/// assert_eq!(MetricUnit::Milliseconds, line.unit());
/// assert_eq!(None, line.rate());
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct WireLine {
    key: String,
    value: i64,
    unit: MetricUnit,
    rate: Option<f64>,
}

impl WireLine {
    /// Decode the raw payload of a single datagram.
    pub fn from_payload(payload: &[u8]) -> MetricResult<WireLine> {
        let line = str::from_utf8(payload)
            .map_err(|_| MetricError::from((ErrorKind::InvalidInput, "Metric is not valid UTF-8")))?;
        line.parse()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn unit(&self) -> MetricUnit {
        self.unit
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    /// The `<value>|<unit>` part of the line, as produced by `encode`.
    pub fn value_part(&self) -> String {
        format!("{}|{}", self.value, self.unit)
    }
}

impl fmt::Display for WireLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}|{}", self.key, self.value, self.unit)?;
        if let Some(rate) = self.rate {
            write!(f, "|@{}", rate)?;
        }
        Ok(())
    }
}

impl FromStr for WireLine {
    type Err = MetricError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\n', '\r']);

        let (key, rest) = match line.split_once(':') {
            Some((key, rest)) if !key.is_empty() => (key, rest),
            _ => return Err(MetricError::from((ErrorKind::InvalidInput, "Metrics require a name"))),
        };

        let mut parts = rest.split('|');
        let value = match parts.next() {
            Some(v) if !v.is_empty() => v
                .parse::<i64>()
                .map_err(|_| MetricError::from((ErrorKind::InvalidInput, "Metric value must be an integer")))?,
            _ => return Err(MetricError::from((ErrorKind::InvalidInput, "Metrics require a value"))),
        };

        let unit = match parts.next() {
            Some(u) => u.parse::<MetricUnit>()?,
            None => return Err(MetricError::from((ErrorKind::InvalidInput, "Metrics require a type"))),
        };

        let rate = match parts.next() {
            Some(r) => {
                let raw = r
                    .strip_prefix('@')
                    .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "Sample rate must start with '@'")))?;
                let parsed = raw
                    .parse::<f64>()
                    .map_err(|_| MetricError::from((ErrorKind::InvalidInput, "Sample rate must be a number")))?;
                Some(SampleRate::try_from(parsed)?.value())
            }
            None => None,
        };

        if parts.next().is_some() {
            return Err(MetricError::from((ErrorKind::InvalidInput, "Unexpected trailing fields")));
        }

        Ok(WireLine {
            key: key.to_owned(),
            value,
            unit,
            rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::WireLine;
    use crate::format::{encode, format_line};
    use crate::types::{ErrorKind, MetricKind, MetricUnit};

    #[test]
    fn test_wire_line_valid() {
        let valid = vec![
            ("foo.test:12|ms", "foo.test", 12, MetricUnit::Milliseconds, None),
            ("test:-18|g", "test", -18, MetricUnit::Gauge, None),
            ("thing.total:12|c", "thing.total", 12, MetricUnit::Counter, None),
            ("thing.total:5|c|@0.1", "thing.total", 5, MetricUnit::Counter, Some(0.1)),
            ("thing.total:5|ms|@0.5\n", "thing.total", 5, MetricUnit::Milliseconds, Some(0.5)),
        ];

        for (input, key, value, unit, rate) in valid {
            let line: WireLine = input.parse().unwrap();
            assert_eq!(key, line.key(), "input was: {}", input);
            assert_eq!(value, line.value(), "input was: {}", input);
            assert_eq!(unit, line.unit(), "input was: {}", input);
            assert_eq!(rate, line.rate(), "input was: {}", input);
        }
    }

    #[test]
    fn test_wire_line_invalid() {
        let invalid = vec![
            "",
            "metric",
            "metric|12",
            "metric:13|",
            "metric:14|c@1",
            "metric:14|c|1",
            "metric:14|c|@2",
            "metric:14|c|@0.5|x",
            "metric:1.5|g",
            "metric:|c",
            ":|@",
            ":1|c",
            "metric:1|h",
        ];

        for input in invalid {
            let res = input.parse::<WireLine>();
            assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind(), "input was: {:?}", input);
        }
    }

    #[test]
    fn test_wire_line_from_payload_invalid_utf8() {
        let res = WireLine::from_payload(&[0x66, 0x6f, 0xff, 0x3a, 0x31, 0x7c, 0x63]);
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
    }

    #[test]
    fn test_wire_line_recovers_encoded_fields() {
        let cases = vec![
            (MetricKind::Timing, 133, None),
            (MetricKind::Gauge, 80, None),
            (MetricKind::Count, -7, Some(0.1)),
            (MetricKind::Increment, 0, Some(0.75)),
            (MetricKind::Decrement, 0, Some(1.0)),
        ];

        for (kind, value, rate) in cases {
            let value_part = encode(kind, value);
            let encoded = format_line("some.key", &value_part, rate);
            let decoded: WireLine = encoded.parse().unwrap();

            assert_eq!("some.key", decoded.key());
            assert_eq!(value_part, decoded.value_part());
            assert_eq!(kind.unit(), decoded.unit());
            assert_eq!(rate.filter(|r| *r != 1.0), decoded.rate());
            assert_eq!(encoded, decoded.to_string());
        }
    }
}
