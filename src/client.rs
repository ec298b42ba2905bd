// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::config::EndpointConfig;
use crate::events::{EventKind, Observer, Observers, TransportEvent, UnhandledPolicy};
use crate::format::{MetricFormatter, DEFAULT_SAMPLE_RATE};
use crate::handlers::LoggingHandler;
use crate::net::{notify, spawn_receiver};
use crate::sampler::Sampler;
use crate::stats::{SocketStats, TransportStats};
use crate::types::{ErrorKind, Metric, MetricError, MetricEvent, MetricKind, MetricResult};
use crate::value::ToMetricValue;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const ROLE: &str = "client";

// Large enough for any reply a Statsd server might send back.
const CLIENT_BUFFER_SIZE: usize = 2048;

/// Lifecycle of a `StatsdClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Unconnected,
    Connecting,
    Ready,
    Closed,
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct.
///
/// # Example
///
/// ```
/// use statsd_udp::{EventKind, StatsdClient, TransportEvent};
///
/// # fn main() -> statsd_udp::MetricResult<()> {
/// let client = StatsdClient::builder("metrics.example.com", 8125)?
///     .with_prefix("my.app")
///     .with_observer(EventKind::SocketReady, |event| {
///         if let TransportEvent::SocketReady { local_addr } = event {
///             println!("sending from {}", local_addr);
///         }
///     })
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct StatsdClientBuilder {
    config: EndpointConfig,
    prefix: String,
    sampler: Sampler,
    observers: Vec<(EventKind, Observer)>,
    policy: UnhandledPolicy,
}

impl StatsdClientBuilder {
    pub fn new(config: EndpointConfig) -> Self {
        StatsdClientBuilder {
            // required
            config,

            // optional with defaults
            prefix: String::new(),
            sampler: Sampler::new(),
            observers: Vec::new(),
            policy: UnhandledPolicy::default(),
        }
    }

    /// Set a prefix prepended to the key of every metric sent, separated
    /// from the key with a `.`. By default no prefix is used.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Self::formatted_prefix(prefix);
        self
    }

    /// Set the sampler used to decide if events with a sample rate are sent.
    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Register an observer for a kind of event. Observers are invoked in
    /// the order they are registered, after the logging handler every
    /// client uses for inbound datagrams.
    pub fn with_observer<F>(mut self, kind: EventKind, observer: F) -> Self
    where
        F: Fn(&TransportEvent<'_>) + Send + Sync + 'static,
    {
        self.observers.push((kind, Box::new(observer)));
        self
    }

    pub fn with_unhandled_policy(mut self, policy: UnhandledPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings.
    pub fn build(self) -> StatsdClient {
        StatsdClient::from_builder(self)
    }

    fn formatted_prefix(prefix: &str) -> String {
        if prefix.is_empty() {
            String::new()
        } else {
            format!("{}.", prefix.trim_end_matches('.'))
        }
    }
}

/// Client for sending Statsd metrics over UDP from async code.
///
/// A client must be connected before metrics can be sent. Connecting
/// resolves the configured host and binds a local socket with an OS
/// assigned port. Every metric is then sent as a single datagram and the
/// future returned for it resolves as soon as the local network stack has
/// accepted the bytes. There is no indication of whether anything received
/// them.
///
/// Datagrams sent back to the client's socket are logged and dispatched to
/// observers registered for `EventKind::Datagram`.
///
/// # Example
///
/// ```no_run
/// use statsd_udp::{StatsdClient, DEFAULT_PORT};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> statsd_udp::MetricResult<()> {
/// let mut client = StatsdClient::new("metrics.example.com", DEFAULT_PORT)?;
/// client.connect().await?;
///
/// client.timing("some.task", 133).await?;
/// client.gauge("some.gauge", 80).await?;
/// client.incr("some.counter").await?;
/// # Ok(())
/// # }
/// ```
pub struct StatsdClient {
    config: EndpointConfig,
    prefix: String,
    sampler: Sampler,
    observers: Arc<Observers>,
    stats: Arc<SocketStats>,
    state: ClientState,
    socket: Option<Arc<UdpSocket>>,
    target: Option<SocketAddr>,
    local_addr: Option<SocketAddr>,
    receiver: Option<JoinHandle<()>>,
}

impl StatsdClient {
    /// Create a client with default settings that sends to the given host
    /// and port.
    pub fn new<S>(host: S, port: u16) -> MetricResult<Self>
    where
        S: Into<String>,
    {
        Ok(Self::builder(host, port)?.build())
    }

    /// Create a builder for a client that sends to the given host and port.
    pub fn builder<S>(host: S, port: u16) -> MetricResult<StatsdClientBuilder>
    where
        S: Into<String>,
    {
        Ok(StatsdClientBuilder::new(EndpointConfig::new(host, port)?))
    }

    pub fn from_config(config: EndpointConfig) -> Self {
        StatsdClientBuilder::new(config).build()
    }

    fn from_builder(builder: StatsdClientBuilder) -> Self {
        let mut observers = Observers::new(builder.policy);
        observers.subscribe_handler(Arc::new(LoggingHandler));
        for (kind, observer) in builder.observers {
            observers.subscribe_boxed(kind, observer);
        }

        StatsdClient {
            config: builder.config,
            prefix: builder.prefix,
            sampler: builder.sampler,
            observers: Arc::new(observers),
            stats: Arc::new(SocketStats::default()),
            state: ClientState::Unconnected,
            socket: None,
            target: None,
            local_addr: None,
            receiver: None,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Local address of the socket, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn stats(&self) -> TransportStats {
        TransportStats::from(self.stats.as_ref())
    }

    /// Resolve the destination and open the socket used to send metrics,
    /// returning the local address of the socket.
    ///
    /// Fails with `ResolutionError` if the host can't be resolved and with
    /// `ConnectError` if a socket can't be created. The client is left
    /// unconnected after a failure so that connecting can be retried.
    /// Connecting a client that isn't unconnected fails with `InvalidState`.
    pub async fn connect(&mut self) -> MetricResult<SocketAddr> {
        if self.state != ClientState::Unconnected {
            return Err(MetricError::from((ErrorKind::InvalidState, "Client is not unconnected")));
        }

        self.state = ClientState::Connecting;
        debug!(role = ROLE, endpoint = %self.config, "connecting");

        let (socket, target, local_addr) = match self.open_socket().await {
            Ok(v) => v,
            Err(e) => {
                self.state = ClientState::Unconnected;
                debug!(role = ROLE, endpoint = %self.config, error = %e, "failed to connect");
                return Err(e);
            }
        };

        let socket = Arc::new(socket);
        self.receiver = Some(spawn_receiver(
            Arc::downgrade(&socket),
            Arc::clone(&self.observers),
            Arc::clone(&self.stats),
            CLIENT_BUFFER_SIZE,
            ROLE,
        ));
        self.socket = Some(socket);
        self.target = Some(target);
        self.local_addr = Some(local_addr);
        self.state = ClientState::Ready;

        debug!(role = ROLE, local = %local_addr, dest = %target, "ready");
        notify(&self.observers, &TransportEvent::SocketReady { local_addr }, ROLE);
        Ok(local_addr)
    }

    async fn open_socket(&self) -> MetricResult<(UdpSocket, SocketAddr, SocketAddr)> {
        let target = self.config.resolve().await?;
        let bind: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        // Left unconnected so that ICMP errors from a missing listener
        // don't fail subsequent sends.
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| MetricError::from((ErrorKind::ConnectError, e)))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| MetricError::from((ErrorKind::ConnectError, e)))?;

        Ok((socket, target, local_addr))
    }

    /// Send a metric with an optional sample rate as a single datagram.
    ///
    /// The sampler decides whether the metric is sent at all based on the
    /// rate, which is `1.0` when not given. Metrics that are sampled out
    /// resolve to `Ok(None)` without anything being written. Otherwise the
    /// metric that was written is returned once the OS has accepted it.
    ///
    /// Fails with `InvalidInput` for a value that can't be represented or
    /// a sample rate outside of (0, 1], `WriteError` if the OS rejected the
    /// write, and `InvalidState` if the client isn't connected.
    pub async fn send_metric<T>(
        &self,
        key: &str,
        value: T,
        kind: MetricKind,
        rate: Option<f64>,
    ) -> MetricResult<Option<Metric>>
    where
        T: ToMetricValue,
    {
        let (socket, target) = match (self.state, &self.socket, self.target) {
            (ClientState::Ready, Some(socket), Some(target)) => (socket, target),
            _ => return Err(MetricError::from((ErrorKind::InvalidState, "Client is not connected"))),
        };

        if !self.sampler.should_sample(rate.unwrap_or(DEFAULT_SAMPLE_RATE)) {
            self.stats.incr_sampled_out();
            trace!(role = ROLE, key, "metric sampled out");
            return Ok(None);
        }

        let value = value.try_to_value()?;
        let mut formatter = MetricFormatter::new(&self.prefix, key, kind, value);
        if let Some(rate) = rate {
            formatter.with_sample_rate(rate)?;
        }

        let metric = formatter.format();
        let bytes = metric.as_metric_str().as_bytes();
        let res = socket.send_to(bytes, target).await;

        self.stats
            .update(res, bytes.len())
            .map_err(|e| MetricError::from((ErrorKind::WriteError, e)))?;

        trace!(role = ROLE, dest = %target, metric = %metric, "sent metric");
        Ok(Some(metric))
    }

    /// Send a previously constructed event, using its sample rate.
    pub async fn send_event(&self, event: &MetricEvent) -> MetricResult<Option<Metric>> {
        self.send_metric(event.key(), event.value(), event.kind(), event.rate())
            .await
    }

    /// Send a timing in milliseconds. Fractional values are truncated.
    pub async fn timing<T>(&self, key: &str, value: T) -> MetricResult<Option<Metric>>
    where
        T: ToMetricValue,
    {
        self.send_metric(key, value, MetricKind::Timing, None).await
    }

    pub async fn gauge<T>(&self, key: &str, value: T) -> MetricResult<Option<Metric>>
    where
        T: ToMetricValue,
    {
        self.send_metric(key, value, MetricKind::Gauge, None).await
    }

    pub async fn count<T>(&self, key: &str, value: T) -> MetricResult<Option<Metric>>
    where
        T: ToMetricValue,
    {
        self.send_metric(key, value, MetricKind::Count, None).await
    }

    pub async fn incr(&self, key: &str) -> MetricResult<Option<Metric>> {
        self.send_metric(key, 1, MetricKind::Increment, None).await
    }

    pub async fn decr(&self, key: &str) -> MetricResult<Option<Metric>> {
        self.send_metric(key, -1, MetricKind::Decrement, None).await
    }

    /// Stop reading from and release the socket. Closing a client that
    /// isn't connected has no effect.
    pub fn close(&mut self) {
        if self.state != ClientState::Ready {
            return;
        }

        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }

        self.socket = None;
        self.target = None;
        self.local_addr = None;
        self.state = ClientState::Closed;

        debug!(role = ROLE, endpoint = %self.config, "closed");
        notify(&self.observers, &TransportEvent::Closed, ROLE);
    }
}

impl Drop for StatsdClient {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ config: {:?}, prefix: {:?}, state: {:?}, local_addr: {:?}, observers: {:?} }}",
            self.config, self.prefix, self.state, self.local_addr, self.observers,
        )
    }
}
