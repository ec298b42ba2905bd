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
use crate::handlers::{DatagramHandler, LoggingHandler};
use crate::net::{notify, spawn_receiver};
use crate::stats::{SocketStats, TransportStats};
use crate::types::{ErrorKind, MetricError, MetricResult};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::debug;

/// Largest payload that fits in a single UDP datagram over IPv4.
pub const DEFAULT_BUFFER_SIZE: usize = 65_507;

const ROLE: &str = "server";

/// Lifecycle of a `StatsdServer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Unbound,
    Binding,
    Listening,
    Closed,
}

/// Builder for creating and customizing `StatsdServer` instances.
///
/// # Example
///
/// ```
/// use statsd_udp::{NopDatagramHandler, StatsdServer, UnhandledPolicy};
///
/// # fn main() -> statsd_udp::MetricResult<()> {
/// let server = StatsdServer::builder("0.0.0.0", 8125)?
///     .with_handler(NopDatagramHandler)
///     .with_unhandled_policy(UnhandledPolicy::Fail)
///     .with_buffer_size(1432)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct StatsdServerBuilder {
    config: EndpointConfig,
    handler: Arc<dyn DatagramHandler + Send + Sync>,
    observers: Vec<(EventKind, Observer)>,
    policy: UnhandledPolicy,
    buf_size: usize,
}

impl StatsdServerBuilder {
    pub fn new(config: EndpointConfig) -> Self {
        StatsdServerBuilder {
            // required
            config,

            // optional with defaults
            handler: Arc::new(LoggingHandler),
            observers: Vec::new(),
            policy: UnhandledPolicy::default(),
            buf_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set the handler invoked for each datagram and receive error. It
    /// replaces the default handler, which only logs the sender.
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: DatagramHandler + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Register an observer for a kind of event, invoked after the handler
    /// and any observers already registered for the same kind.
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

    /// Set the size of the buffer datagrams are read into. Datagrams larger
    /// than the buffer are truncated.
    pub fn with_buffer_size(mut self, buf_size: usize) -> Self {
        self.buf_size = buf_size;
        self
    }

    /// Construct a new `StatsdServer` instance based on current settings.
    pub fn build(self) -> StatsdServer {
        StatsdServer::from_builder(self)
    }
}

/// Server that reads Statsd datagrams from a UDP socket.
///
/// Once listening, every datagram is passed, undecoded, to the configured
/// `DatagramHandler` along with the address of the sender. Errors reading
/// from the socket are passed to the handler too and do not stop the server.
/// Use a `DecodingHandler` to turn payloads into `WireLine`s.
///
/// # Example
///
/// ```no_run
/// use statsd_udp::{DecodingHandler, StatsdServer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> statsd_udp::MetricResult<()> {
/// let mut server = StatsdServer::builder("0.0.0.0", 8125)?
///     .with_handler(DecodingHandler::new(|line, peer| println!("{} from {}", line, peer)))
///     .build();
///
/// let addr = server.listen().await?;
/// println!("listening on {}", addr);
/// # Ok(())
/// # }
/// ```
pub struct StatsdServer {
    config: EndpointConfig,
    observers: Arc<Observers>,
    stats: Arc<SocketStats>,
    buf_size: usize,
    state: ServerState,
    socket: Option<Arc<UdpSocket>>,
    local_addr: Option<SocketAddr>,
    receiver: Option<JoinHandle<()>>,
}

impl StatsdServer {
    /// Create a server with default settings that binds to the given host
    /// and port.
    pub fn new<S>(host: S, port: u16) -> MetricResult<Self>
    where
        S: Into<String>,
    {
        Ok(Self::builder(host, port)?.build())
    }

    pub fn builder<S>(host: S, port: u16) -> MetricResult<StatsdServerBuilder>
    where
        S: Into<String>,
    {
        Ok(StatsdServerBuilder::new(EndpointConfig::new(host, port)?))
    }

    /// Create a builder for a server that binds to a port picked by the OS.
    /// The port is available from `local_addr` once listening.
    pub fn ephemeral<S>(host: S) -> MetricResult<StatsdServerBuilder>
    where
        S: Into<String>,
    {
        Ok(StatsdServerBuilder::new(EndpointConfig::with_any_port(host, 0)?))
    }

    pub fn from_config(config: EndpointConfig) -> Self {
        StatsdServerBuilder::new(config).build()
    }

    fn from_builder(builder: StatsdServerBuilder) -> Self {
        let mut observers = Observers::new(builder.policy);
        observers.subscribe_handler(builder.handler);
        for (kind, observer) in builder.observers {
            observers.subscribe_boxed(kind, observer);
        }

        StatsdServer {
            config: builder.config,
            observers: Arc::new(observers),
            stats: Arc::new(SocketStats::default()),
            buf_size: builder.buf_size,
            state: ServerState::Unbound,
            socket: None,
            local_addr: None,
            receiver: None,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address the socket is bound to, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn stats(&self) -> TransportStats {
        TransportStats::from(self.stats.as_ref())
    }

    /// Bind the socket and start reading datagrams from it in a background
    /// task, returning the address the socket is bound to.
    ///
    /// Fails with `ResolutionError` if the host can't be resolved and with
    /// `BindError` if the socket can't be bound, for example because the
    /// address is already in use. The server is left unbound after a
    /// failure. Listening on a server that isn't unbound fails with
    /// `InvalidState`.
    pub async fn listen(&mut self) -> MetricResult<SocketAddr> {
        if self.state != ServerState::Unbound {
            return Err(MetricError::from((ErrorKind::InvalidState, "Server is not unbound")));
        }

        self.state = ServerState::Binding;
        debug!(role = ROLE, endpoint = %self.config, "binding");

        let (socket, local_addr) = match self.bind_socket().await {
            Ok(v) => v,
            Err(e) => {
                self.state = ServerState::Unbound;
                debug!(role = ROLE, endpoint = %self.config, error = %e, "failed to bind");
                return Err(e);
            }
        };

        let socket = Arc::new(socket);
        self.receiver = Some(spawn_receiver(
            Arc::downgrade(&socket),
            Arc::clone(&self.observers),
            Arc::clone(&self.stats),
            self.buf_size,
            ROLE,
        ));
        self.socket = Some(socket);
        self.local_addr = Some(local_addr);
        self.state = ServerState::Listening;

        debug!(role = ROLE, local = %local_addr, "listening");
        notify(&self.observers, &TransportEvent::SocketReady { local_addr }, ROLE);
        Ok(local_addr)
    }

    async fn bind_socket(&self) -> MetricResult<(UdpSocket, SocketAddr)> {
        let addr = self.config.resolve().await?;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| MetricError::from((ErrorKind::BindError, e)))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| MetricError::from((ErrorKind::BindError, e)))?;

        Ok((socket, local_addr))
    }

    /// Stop reading datagrams and release the socket. Closing a server
    /// that isn't listening has no effect.
    pub fn close(&mut self) {
        if self.state != ServerState::Listening {
            return;
        }

        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }

        self.socket = None;
        self.local_addr = None;
        self.state = ServerState::Closed;

        debug!(role = ROLE, endpoint = %self.config, "closed");
        notify(&self.observers, &TransportEvent::Closed, ROLE);
    }
}

impl Drop for StatsdServer {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.abort();
        }
    }
}

impl fmt::Debug for StatsdServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdServer {{ config: {:?}, state: {:?}, local_addr: {:?}, buf_size: {}, observers: {:?} }}",
            self.config, self.state, self.local_addr, self.buf_size, self.observers,
        )
    }
}
