// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An asynchronous Statsd client and server over UDP.
//!
//! ## Features
//!
//! * Encoding of timers, gauges and counters into the Statsd line protocol,
//!   `<key>:<value>|<unit>[|@<rate>]`, and parsing lines back.
//! * Probabilistic sampling of metrics with an injectable source of randomness.
//! * A client that sends each metric as a single UDP datagram from async code.
//! * A server that reads datagrams and hands them to a `DatagramHandler`.
//! * Observers for socket lifecycle events on both the client and the server.
//!
//! Both the client and the server run on [Tokio](https://tokio.rs) and must
//! be used from within a Tokio runtime. Nothing is logged unless the
//! application installs a [tracing](https://docs.rs/tracing) subscriber.
//!
//! ## Usage
//!
//! ### Sending Metrics
//!
//! The client resolves its destination and opens a socket when connected.
//! Each send resolves once the local network stack has accepted the
//! datagram. UDP gives no indication of whether it was received.
//!
//! ```rust,no_run
//! use statsd_udp::{StatsdClient, DEFAULT_PORT};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> statsd_udp::MetricResult<()> {
//! let mut client = StatsdClient::builder("metrics.example.com", DEFAULT_PORT)?
//!     .with_prefix("my.app")
//!     .build();
//!
//! client.connect().await?;
//! client.timing("some.task", 133).await?;
//! client.gauge("some.gauge", 80).await?;
//! client.incr("some.counter").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Sampling
//!
//! Metrics can be sent with a sample rate in (0, 1]. Metrics that are
//! sampled out resolve to `Ok(None)` without anything being sent, sampled
//! in metrics have the rate appended so that the server can scale them.
//!
//! ```rust,no_run
//! use statsd_udp::{MetricKind, StatsdClient, DEFAULT_PORT};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> statsd_udp::MetricResult<()> {
//! let mut client = StatsdClient::new("metrics.example.com", DEFAULT_PORT)?;
//! client.connect().await?;
//!
//! if let Some(metric) = client.send_metric("some.counter", 1, MetricKind::Count, Some(0.1)).await? {
//!     assert_eq!("some.counter:1|c|@0.1", metric.as_metric_str());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Receiving Metrics
//!
//! The server passes each datagram to its handler without decoding it. The
//! default handler logs the address of the sender. A `DecodingHandler`
//! parses payloads into `WireLine`s.
//!
//! ```rust,no_run
//! use statsd_udp::{DecodingHandler, StatsdServer, DEFAULT_PORT};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> statsd_udp::MetricResult<()> {
//! let mut server = StatsdServer::builder("0.0.0.0", DEFAULT_PORT)?
//!     .with_handler(DecodingHandler::new(|line, peer| {
//!         println!("{} {} {} from {}", line.key(), line.value(), line.unit(), peer);
//!     }))
//!     .build();
//!
//! server.listen().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Encoding Without A Client
//!
//! ```rust
//! use statsd_udp::{encode, format_line, MetricKind, WireLine};
//!
//! let line = format_line("some.task", &encode(MetricKind::Timing, 133), None);
//! assert_eq!("some.task:133|ms", line);
//!
//! let parsed: WireLine = line.parse().unwrap();
//! assert_eq!("some.task", parsed.key());
//! assert_eq!(133, parsed.value());
//! ```

#![forbid(unsafe_code)]

pub use self::client::{ClientState, StatsdClient, StatsdClientBuilder};

pub use self::config::{EndpointConfig, DEFAULT_PORT};

pub use self::events::{EventKind, Observer, Observers, TransportEvent, UnhandledPolicy};

pub use self::format::{encode, format_line, SampleRate, DEFAULT_SAMPLE_RATE};

pub use self::handlers::{
    Datagram, DatagramHandler, DecodingHandler, LoggingHandler, NopDatagramHandler, SpyDatagramHandler,
};

pub use self::parse::WireLine;

pub use self::sampler::Sampler;

pub use self::server::{ServerState, StatsdServer, StatsdServerBuilder, DEFAULT_BUFFER_SIZE};

pub use self::stats::TransportStats;

pub use self::types::{ErrorKind, Metric, MetricError, MetricEvent, MetricKind, MetricResult, MetricUnit};

pub use self::value::ToMetricValue;

mod client;
mod config;
mod events;
mod format;
mod handlers;
mod net;
mod parse;
pub mod prelude;
mod sampler;
mod server;
mod stats;
mod types;
mod value;
