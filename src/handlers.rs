// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2019-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::parse::WireLine;
use crate::types::MetricError;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::fmt;
use std::net::SocketAddr;
use tracing::{debug, trace, warn};

/// Trait for consumers of datagrams read by a transport.
///
/// The payload is passed exactly as it was read from the socket, no
/// decoding is performed before the handler is invoked. Implementations
/// should not block since they are invoked on the task reading the socket.
///
/// Any `Fn(&[u8], SocketAddr)` closure is a handler that ignores errors.
///
/// # Example
///
/// ```
/// use std::net::SocketAddr;
/// use statsd_udp::{DatagramHandler, MetricError};
///
/// struct PrintingHandler;
///
/// impl DatagramHandler for PrintingHandler {
///     fn on_datagram(&self, payload: &[u8], peer: SocketAddr) {
///         println!("{} bytes from {}", payload.len(), peer);
///     }
///
///     fn on_error(&self, err: &MetricError) {
///         eprintln!("receive error: {}", err);
///     }
/// }
/// ```
pub trait DatagramHandler {
    /// Invoked once for every datagram read from the socket.
    fn on_datagram(&self, payload: &[u8], peer: SocketAddr);

    /// Invoked when reading from the socket fails. The socket keeps being
    /// read after this returns.
    ///
    /// The default implementation discards the error.
    fn on_error(&self, err: &MetricError) {
        let _ = err;
    }
}

impl<F> DatagramHandler for F
where
    F: Fn(&[u8], SocketAddr),
{
    fn on_datagram(&self, payload: &[u8], peer: SocketAddr) {
        (self)(payload, peer);
    }
}

/// `DatagramHandler` that logs the address of each sender and otherwise
/// discards the datagram.
///
/// This is the handler a server uses unless another one is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingHandler;

impl DatagramHandler for LoggingHandler {
    fn on_datagram(&self, payload: &[u8], peer: SocketAddr) {
        debug!(peer = %peer, bytes = payload.len(), "received datagram");
    }

    fn on_error(&self, err: &MetricError) {
        warn!(error = %err, kind = ?err.kind(), "error receiving datagram");
    }
}

/// `DatagramHandler` that discards all datagrams and errors.
#[derive(Debug, Clone, Default)]
pub struct NopDatagramHandler;

impl DatagramHandler for NopDatagramHandler {
    fn on_datagram(&self, _payload: &[u8], _peer: SocketAddr) {}
}

/// A datagram as captured by a `SpyDatagramHandler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub peer: SocketAddr,
}

/// `DatagramHandler` implementation that writes every datagram to the
/// `Sender` half of a channel while callers are given ownership of the
/// `Receiver` half.
///
/// This is not a general purpose handler, rather it's meant for verifying
/// datagrams received during the course of integration tests or for handing
/// them off to another thread. By default, the channel used is unbounded.
/// The channel size can be limited using the `with_capacity` method, in
/// which case datagrams are dropped when the channel is full.
#[derive(Debug, Clone)]
pub struct SpyDatagramHandler {
    sender: Sender<Datagram>,
}

impl SpyDatagramHandler {
    pub fn new() -> (Receiver<Datagram>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<Datagram>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<Datagram>, Self) {
        let (tx, rx) = match queue {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };

        (rx, SpyDatagramHandler { sender: tx })
    }
}

impl DatagramHandler for SpyDatagramHandler {
    fn on_datagram(&self, payload: &[u8], peer: SocketAddr) {
        let datagram = Datagram {
            payload: payload.to_vec(),
            peer,
        };

        match self.sender.try_send(datagram) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!(peer = %peer, "spy channel full, dropping datagram"),
            Err(TrySendError::Disconnected(_)) => trace!(peer = %peer, "spy channel closed, dropping datagram"),
        }
    }
}

/// `DatagramHandler` that decodes each datagram as a single Statsd line and
/// passes the result to a callback.
///
/// Datagrams that are not valid lines are reported to the error callback
/// as `InvalidInput` errors, along with any errors reading the socket. By
/// default errors are logged.
///
/// # Example
///
/// ```
/// use statsd_udp::{DecodingHandler, StatsdServer};
///
/// # fn main() -> statsd_udp::MetricResult<()> {
/// let handler = DecodingHandler::new(|line, peer| {
///     println!("{} = {} ({}) from {}", line.key(), line.value(), line.unit(), peer);
/// });
///
/// let server = StatsdServer::builder("127.0.0.1", 8125)?
///     .with_handler(handler)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct DecodingHandler<F> {
    on_line: F,
    errors: Box<dyn Fn(&MetricError) + Send + Sync>,
}

impl<F> DecodingHandler<F>
where
    F: Fn(WireLine, SocketAddr),
{
    pub fn new(on_line: F) -> Self {
        DecodingHandler {
            on_line,
            errors: Box::new(log_error_handler),
        }
    }

    /// Set the callback used for datagrams that can't be decoded and for
    /// errors reading the socket.
    pub fn with_error_handler<E>(mut self, errors: E) -> Self
    where
        E: Fn(&MetricError) + Send + Sync + 'static,
    {
        self.errors = Box::new(errors);
        self
    }
}

impl<F> DatagramHandler for DecodingHandler<F>
where
    F: Fn(WireLine, SocketAddr),
{
    fn on_datagram(&self, payload: &[u8], peer: SocketAddr) {
        match WireLine::from_payload(payload) {
            Ok(line) => (self.on_line)(line, peer),
            Err(e) => (self.errors)(&e),
        }
    }

    fn on_error(&self, err: &MetricError) {
        (self.errors)(err);
    }
}

impl<F> fmt::Debug for DecodingHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecodingHandler {{ on_line: ..., errors: ... }}")
    }
}

fn log_error_handler(err: &MetricError) {
    warn!(error = %err, kind = ?err.kind(), "unable to handle datagram");
}

#[cfg(test)]
mod tests {
    use super::{DatagramHandler, DecodingHandler, NopDatagramHandler, SpyDatagramHandler};
    use crate::types::{ErrorKind, MetricUnit};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    fn peer() -> SocketAddr {
        "127.0.0.1:51234".parse().unwrap()
    }

    #[test]
    fn test_nop_datagram_handler() {
        let handler = NopDatagramHandler;
        handler.on_datagram(b"baz:4|c", peer());
    }

    #[test]
    fn test_spy_datagram_handler() {
        let (rx, handler) = SpyDatagramHandler::new();
        handler.on_datagram(b"some.task:133|ms", peer());

        let datagram = rx.try_recv().unwrap();
        assert_eq!(b"some.task:133|ms".to_vec(), datagram.payload);
        assert_eq!(peer(), datagram.peer);
    }

    #[test]
    fn test_spy_datagram_handler_full_drops() {
        let (rx, handler) = SpyDatagramHandler::with_capacity(1);
        handler.on_datagram(b"a:1|c", peer());
        handler.on_datagram(b"b:1|c", peer());

        assert_eq!(b"a:1|c".to_vec(), rx.try_recv().unwrap().payload);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closure_datagram_handler() {
        let count = Arc::new(Mutex::new(0));
        let count_ref = Arc::clone(&count);
        let handler = move |_payload: &[u8], _peer: SocketAddr| *count_ref.lock().unwrap() += 1;

        handler.on_datagram(b"a:1|c", peer());
        handler.on_datagram(b"a:1|c", peer());
        assert_eq!(2, *count.lock().unwrap());
    }

    #[test]
    fn test_decoding_handler_valid_line() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines_ref = Arc::clone(&lines);
        let handler = DecodingHandler::new(move |line, peer| lines_ref.lock().unwrap().push((line, peer)));

        handler.on_datagram(b"some.task:133|ms", peer());

        let lines = lines.lock().unwrap();
        assert_eq!(1, lines.len());
        assert_eq!("some.task", lines[0].0.key());
        assert_eq!(133, lines[0].0.value());
        assert_eq!(MetricUnit::Milliseconds, lines[0].0.unit());
        assert_eq!(peer(), lines[0].1);
    }

    #[test]
    fn test_decoding_handler_invalid_line() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_ref = Arc::clone(&errors);
        let handler = DecodingHandler::new(|_line, _peer| panic!("should not decode"))
            .with_error_handler(move |err| errors_ref.lock().unwrap().push(err.kind()));

        handler.on_datagram(b"not a metric", peer());

        assert_eq!(vec![ErrorKind::InvalidInput], *errors.lock().unwrap());
    }
}
