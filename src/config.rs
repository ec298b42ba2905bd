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
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::net::lookup_host;

/// Default port used by Statsd servers.
pub const DEFAULT_PORT: u16 = 8125;

/// Host and port of a transport: the destination of a client or the local
/// bind address of a server.
///
/// The host may be a hostname or an IP address. It is resolved when the
/// transport connects or starts listening, not when the configuration is
/// created.
///
/// # Example
///
/// ```
/// use statsd_udp::{EndpointConfig, DEFAULT_PORT};
///
/// let config = EndpointConfig::new("metrics.example.com", DEFAULT_PORT).unwrap();
/// let parsed: EndpointConfig = "metrics.example.com:8125".parse().unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointConfig {
    host: String,
    port: u16,
}

impl EndpointConfig {
    /// Create a new configuration, failing if the host is empty or the port
    /// is zero.
    pub fn new<S>(host: S, port: u16) -> MetricResult<Self>
    where
        S: Into<String>,
    {
        if port == 0 {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "Port must be between 1 and 65535",
            )));
        }

        Self::with_any_port(host, port)
    }

    // Port zero asks the OS to pick a port, which only makes sense for
    // binding a server socket.
    pub(crate) fn with_any_port<S>(host: S, port: u16) -> MetricResult<Self>
    where
        S: Into<String>,
    {
        let host = host.into();
        if host.is_empty() {
            return Err(MetricError::from((ErrorKind::InvalidInput, "Host must not be empty")));
        }

        Ok(EndpointConfig { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve the configured host and port into the first address yielded
    /// by the system resolver.
    pub(crate) async fn resolve(&self) -> MetricResult<SocketAddr> {
        let mut addrs = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| MetricError::from((ErrorKind::ResolutionError, e)))?;

        match addrs.next() {
            Some(addr) => Ok(addr),
            None => Err(MetricError::from((
                ErrorKind::ResolutionError,
                "No socket addresses yielded",
            ))),
        }
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for EndpointConfig {
    type Err = MetricError;

    /// Parse `host:port`, with IPv6 hosts in brackets (`[::1]:8125`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "Expected host:port")))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        let port = port
            .parse::<u16>()
            .map_err(|_| MetricError::from((ErrorKind::InvalidInput, "Port must be between 1 and 65535")))?;

        EndpointConfig::new(host, port)
    }
}
