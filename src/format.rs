// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2018 Philip Jenvey <pjenvey@mozilla.com>
// Copyright 2018-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Encoding of metric events into lines of the Statsd protocol.
//!
//! Each line has the form `<key>:<value>|<unit>[|@<rate>]` where the unit
//! is one of `ms` (timing), `g` (gauge) or `c` (counter). The sample rate
//! suffix is only written when the rate is less than one.

mod sample_rate;

pub use self::sample_rate::{SampleRate, DEFAULT_SAMPLE_RATE};

use crate::types::{Metric, MetricEvent, MetricKind, MetricResult};
use std::fmt::Write;

/// Encode the value part of a line (`<value>|<unit>`) for the given kind.
///
/// Increments and decrements always use the literal values `1` and `-1`,
/// the `value` argument is ignored for them.
///
/// # Example
///
/// ```
/// use statsd_udp::{encode, MetricKind};
///
/// assert_eq!("133|ms", encode(MetricKind::Timing, 133));
/// assert_eq!("-1|c", encode(MetricKind::Decrement, 99));
/// ```
pub fn encode(kind: MetricKind, value: i64) -> String {
    let mut out = String::with_capacity(24);
    write_value_part(&mut out, kind, value);
    out
}

/// Join a key and an encoded value part into a full line, appending the
/// sample rate when it is present and not equal to one.
///
/// No validation of the key is performed. Callers are responsible for not
/// using the reserved characters `:`, `|` or `\n` in keys.
///
/// # Example
///
/// ```
/// use statsd_udp::format_line;
///
/// assert_eq!("some.key:4|c", format_line("some.key", "4|c", None));
/// assert_eq!("some.key:4|c", format_line("some.key", "4|c", Some(1.0)));
/// assert_eq!("some.key:4|c|@0.1", format_line("some.key", "4|c", Some(0.1)));
/// ```
pub fn format_line(key: &str, value_part: &str, rate: Option<f64>) -> String {
    match rate {
        Some(rate) if rate != DEFAULT_SAMPLE_RATE => format!("{}:{}|@{}", key, value_part, rate),
        _ => format!("{}:{}", key, value_part),
    }
}

fn write_value_part(out: &mut String, kind: MetricKind, value: i64) {
    let _ = match kind {
        MetricKind::Increment => write!(out, "1|{}", kind.unit()),
        MetricKind::Decrement => write!(out, "-1|{}", kind.unit()),
        MetricKind::Timing | MetricKind::Gauge | MetricKind::Count => write!(out, "{}|{}", value, kind.unit()),
    };
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    kind: MetricKind,
    val: i64,
    rate: Option<SampleRate>,
    base_size: usize,
}

impl<'a> MetricFormatter<'a> {
    #[rustfmt::skip]
    pub(crate) fn new(prefix: &'a str, key: &'a str, kind: MetricKind, val: i64) -> Self {
        MetricFormatter {
            prefix,
            key,
            kind,
            val,
            rate: None,
            // enough room for the largest i64 value and unit so that the
            // common case only allocates once
            base_size: prefix.len() + key.len() + 1 /* : */ + 20 /* value */ + 1 /* | */ + 2, /* unit */
        }
    }

    pub(crate) fn from_event(prefix: &'a str, event: &'a MetricEvent) -> Self {
        Self::new(prefix, event.key(), event.kind(), event.value())
    }

    /// Attach a sample rate, failing if it is outside of (0, 1].
    pub(crate) fn with_sample_rate(&mut self, rate: f64) -> MetricResult<()> {
        let rate = SampleRate::try_from(rate)?;
        self.rate = if rate.is_written() { Some(rate) } else { None };
        Ok(())
    }

    pub(crate) fn format(&self) -> Metric {
        let mut out = String::with_capacity(self.base_size + if self.rate.is_some() { 24 } else { 0 });
        out.push_str(self.prefix);
        out.push_str(self.key);
        out.push(':');
        write_value_part(&mut out, self.kind, self.val);
        if let Some(rate) = self.rate {
            let _ = write!(out, "|{}", rate);
        }
        Metric::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{encode, format_line, MetricFormatter};
    use crate::types::{ErrorKind, MetricEvent, MetricKind};

    #[test]
    fn test_encode_units() {
        assert_eq!("133|ms", encode(MetricKind::Timing, 133));
        assert_eq!("80|g", encode(MetricKind::Gauge, 80));
        assert_eq!("-12|c", encode(MetricKind::Count, -12));
    }

    #[test]
    fn test_encode_fixed_counters_ignore_value() {
        assert_eq!("1|c", encode(MetricKind::Increment, 42));
        assert_eq!("-1|c", encode(MetricKind::Decrement, 42));
    }

    #[test]
    fn test_format_line_without_rate() {
        assert_eq!("k:80|g", format_line("k", "80|g", None));
        assert_eq!("k:80|g", format_line("k", "80|g", Some(1.0)));
    }

    #[test]
    fn test_format_line_with_rate() {
        assert_eq!("k:1|c|@0.1", format_line("k", "1|c", Some(0.1)));
    }

    #[test]
    fn test_metric_formatter_timing() {
        let fmt = MetricFormatter::new("", "some.task", MetricKind::Timing, 133);
        assert_eq!("some.task:133|ms", fmt.format().as_metric_str());
    }

    #[test]
    fn test_metric_formatter_prefix() {
        let fmt = MetricFormatter::new("prefix.", "some.gauge", MetricKind::Gauge, 7);
        assert_eq!("prefix.some.gauge:7|g", fmt.format().as_metric_str());
    }

    #[test]
    fn test_metric_formatter_counter_with_sample_rate() {
        let mut fmt = MetricFormatter::new("prefix.", "some.key", MetricKind::Count, 4);
        fmt.with_sample_rate(0.5).unwrap();

        assert_eq!("prefix.some.key:4|c|@0.5", fmt.format().as_metric_str());
    }

    #[test]
    fn test_metric_formatter_doesnt_write_default_sample_rate() {
        let mut fmt = MetricFormatter::new("prefix.", "some.key", MetricKind::Count, 4);
        fmt.with_sample_rate(1.0).unwrap();

        assert_eq!("prefix.some.key:4|c", fmt.format().as_metric_str());
    }

    #[test]
    fn test_metric_formatter_invalid_sample_rate() {
        let mut fmt = MetricFormatter::new("", "some.key", MetricKind::Count, 4);
        let err = fmt.with_sample_rate(1.5).unwrap_err();

        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn test_metric_formatter_matches_format_line() {
        let events = vec![
            MetricEvent::timing("a.timer", 250),
            MetricEvent::gauge("a.gauge", -3),
            MetricEvent::count("a.count", 17),
            MetricEvent::increment("a.incr"),
            MetricEvent::decrement("a.decr"),
        ];

        for event in events.iter() {
            for rate in [None, Some(1.0), Some(0.25)] {
                let mut fmt = MetricFormatter::from_event("", event);
                if let Some(r) = rate {
                    fmt.with_sample_rate(r).unwrap();
                }

                let expected = format_line(event.key(), &encode(event.kind(), event.value()), rate);
                assert_eq!(expected, fmt.format().as_metric_str());
            }
        }
    }
}
