// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registration of observers for events raised by the transports.
//!
//! Both the client and the server keep an ordered list of observers for
//! each kind of event. When an event is raised, every observer registered
//! for its kind is invoked synchronously, in the order they were registered.
//! What happens to an event without any observers is decided by the
//! `UnhandledPolicy` of the transport.

use crate::handlers::DatagramHandler;
use crate::types::{ErrorKind, MetricError, MetricResult};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Kind of an event, used as the key observers are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SocketReady,
    Datagram,
    ReceiveError,
    Closed,
}

/// Event raised by a client or server transport.
#[derive(Debug)]
pub enum TransportEvent<'a> {
    /// The socket was created and is ready to send or receive.
    SocketReady { local_addr: SocketAddr },
    /// A datagram was read from the socket.
    Datagram { payload: &'a [u8], peer: SocketAddr },
    /// Reading from the socket failed. The socket keeps being read.
    ReceiveError { error: &'a MetricError },
    /// The socket was closed by the transport.
    Closed,
}

impl TransportEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::SocketReady { .. } => EventKind::SocketReady,
            TransportEvent::Datagram { .. } => EventKind::Datagram,
            TransportEvent::ReceiveError { .. } => EventKind::ReceiveError,
            TransportEvent::Closed => EventKind::Closed,
        }
    }
}

/// What to do with an event that has no observers registered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnhandledPolicy {
    /// Silently drop the event.
    #[default]
    Ignore,
    /// Report an `ErrorKind::Unhandled` error from the dispatch.
    Fail,
}

/// Callback invoked for an event.
pub type Observer = Box<dyn Fn(&TransportEvent<'_>) + Send + Sync>;

/// Ordered mapping from event kind to the observers registered for it.
pub struct Observers {
    observers: HashMap<EventKind, Vec<Observer>>,
    policy: UnhandledPolicy,
}

impl Observers {
    pub fn new(policy: UnhandledPolicy) -> Self {
        Observers {
            observers: HashMap::new(),
            policy,
        }
    }

    /// Register an observer to be invoked after any already registered for
    /// the same kind of event.
    pub fn subscribe<F>(&mut self, kind: EventKind, observer: F)
    where
        F: Fn(&TransportEvent<'_>) + Send + Sync + 'static,
    {
        self.subscribe_boxed(kind, Box::new(observer));
    }

    pub(crate) fn subscribe_boxed(&mut self, kind: EventKind, observer: Observer) {
        self.observers.entry(kind).or_default().push(observer);
    }

    /// Register a `DatagramHandler` for both datagrams and receive errors.
    pub(crate) fn subscribe_handler(&mut self, handler: Arc<dyn DatagramHandler + Send + Sync>) {
        let on_datagram = Arc::clone(&handler);
        self.subscribe(EventKind::Datagram, move |event| {
            if let TransportEvent::Datagram { payload, peer } = event {
                on_datagram.on_datagram(payload, *peer);
            }
        });

        self.subscribe(EventKind::ReceiveError, move |event| {
            if let TransportEvent::ReceiveError { error } = event {
                handler.on_error(error);
            }
        });
    }

    pub fn policy(&self) -> UnhandledPolicy {
        self.policy
    }

    /// Number of observers registered for a kind of event.
    pub fn count(&self, kind: EventKind) -> usize {
        self.observers.get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every observer registered for the kind of `event`, in
    /// registration order, returning how many were invoked.
    pub fn dispatch(&self, event: &TransportEvent<'_>) -> MetricResult<usize> {
        let observers = match self.observers.get(&event.kind()) {
            Some(observers) if !observers.is_empty() => observers,
            _ => {
                return match self.policy {
                    UnhandledPolicy::Ignore => Ok(0),
                    UnhandledPolicy::Fail => Err(MetricError::from((
                        ErrorKind::Unhandled,
                        "No observers registered for event",
                    ))),
                };
            }
        };

        for observer in observers.iter() {
            observer(event);
        }

        Ok(observers.len())
    }
}

impl Default for Observers {
    fn default() -> Self {
        Self::new(UnhandledPolicy::default())
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&EventKind, usize> = self.observers.iter().map(|(k, v)| (k, v.len())).collect();
        write!(f, "Observers {{ observers: {:?}, policy: {:?} }}", counts, self.policy)
    }
}
