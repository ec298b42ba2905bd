// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::events::{Observers, TransportEvent};
use crate::stats::SocketStats;
use crate::types::{ErrorKind, MetricError};
use std::sync::{Arc, Weak};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Dispatch an event to observers, logging it when nothing handled it
/// and the transport is configured to treat that as an error.
pub(crate) fn notify(observers: &Observers, event: &TransportEvent<'_>, role: &'static str) {
    if let Err(e) = observers.dispatch(event) {
        warn!(role, event = ?event.kind(), error = %e, "unhandled transport event");
    }
}

/// Spawn a task that reads datagrams from the socket until the socket is
/// dropped by its transport or the task is aborted.
pub(crate) fn spawn_receiver(
    socket: Weak<UdpSocket>,
    observers: Arc<Observers>,
    stats: Arc<SocketStats>,
    buf_size: usize,
    role: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(receive_loop(socket, observers, stats, buf_size, role))
}

async fn receive_loop(
    socket: Weak<UdpSocket>,
    observers: Arc<Observers>,
    stats: Arc<SocketStats>,
    buf_size: usize,
    role: &'static str,
) {
    let mut buf = vec![0u8; buf_size];

    loop {
        // The upgraded handle keeps the socket open for the whole read, so a
        // transport closing mid-read relies on aborting this task. The check
        // only stops a loop whose socket was already gone.
        let socket = match socket.upgrade() {
            Some(s) => s,
            None => {
                debug!(role, "socket dropped, stopping receive loop");
                break;
            }
        };

        match socket.recv_from(&mut buf).await {
            Ok((n, peer)) => {
                stats.incr_received(n);
                trace!(role, peer = %peer, bytes = n, "read datagram");

                let event = TransportEvent::Datagram {
                    payload: &buf[..n],
                    peer,
                };
                notify(&observers, &event, role);
            }
            Err(e) => {
                stats.incr_receive_errors();
                let error = MetricError::from((ErrorKind::ReceiveError, e));
                debug!(role, error = %error, "failed to read datagram");

                notify(&observers, &TransportEvent::ReceiveError { error: &error }, role);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::spawn_receiver;
    use crate::events::{EventKind, Observers, TransportEvent, UnhandledPolicy};
    use crate::stats::{SocketStats, TransportStats};
    use crate::types::ErrorKind;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::UdpSocket;

    #[tokio::test]
    async fn test_receiver_exits_without_socket() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let weak = Arc::downgrade(&socket);
        drop(socket);

        let observers = Arc::new(Observers::new(UnhandledPolicy::Ignore));
        let stats = Arc::new(SocketStats::default());
        let handle = spawn_receiver(weak, observers, stats, 64, "test");

        let res = tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_receiver_dispatches_datagrams() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender_addr = sender.local_addr().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ref = Arc::clone(&seen);
        let mut observers = Observers::new(UnhandledPolicy::Fail);
        observers.subscribe(EventKind::Datagram, move |event| {
            if let TransportEvent::Datagram { payload, peer } = event {
                seen_ref.lock().unwrap().push((payload.to_vec(), *peer));
            }
        });

        let stats = Arc::new(SocketStats::default());
        let handle = spawn_receiver(
            Arc::downgrade(&socket),
            Arc::new(observers),
            Arc::clone(&stats),
            64,
            "test",
        );

        sender.send_to(b"some.gauge:7|g", addr).await.unwrap();

        for _ in 0..200 {
            if !seen.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.abort();
        assert_eq!(vec![(b"some.gauge:7|g".to_vec(), sender_addr)], *seen.lock().unwrap());

        let snapshot = TransportStats::from(stats.as_ref());
        assert_eq!(1, snapshot.packets_received);
        assert_eq!(14, snapshot.bytes_received);
    }

    // Linux reports ICMP port unreachable on the next read of a connected
    // socket, which is an easy way to make a read fail.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_receiver_continues_after_error() {
        let freed = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let freed_addr = freed.local_addr().unwrap();
        drop(freed);

        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        socket.connect(freed_addr).await.unwrap();
        socket.send(b"x").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let errors_ref = Arc::clone(&seen);
        let datagrams_ref = Arc::clone(&seen);
        let mut observers = Observers::new(UnhandledPolicy::Fail);
        observers.subscribe(EventKind::ReceiveError, move |event| {
            if let TransportEvent::ReceiveError { error } = event {
                assert_eq!(ErrorKind::ReceiveError, error.kind());
                errors_ref.lock().unwrap().push("err".to_owned());
            }
        });
        observers.subscribe(EventKind::Datagram, move |event| {
            if let TransportEvent::Datagram { payload, .. } = event {
                datagrams_ref
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(payload).into_owned());
            }
        });

        let stats = Arc::new(SocketStats::default());
        let handle = spawn_receiver(
            Arc::downgrade(&socket),
            Arc::new(observers),
            Arc::clone(&stats),
            64,
            "test",
        );

        let sender = UdpSocket::bind(freed_addr).await.unwrap();
        sender.send_to(b"k:1|c", addr).await.unwrap();

        for _ in 0..200 {
            if seen.lock().unwrap().len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.abort();
        assert_eq!(vec!["err".to_owned(), "k:1|c".to_owned()], *seen.lock().unwrap());

        let snapshot = TransportStats::from(stats.as_ref());
        assert_eq!(1, snapshot.receive_errors);
        assert_eq!(1, snapshot.packets_received);
        assert_eq!(5, snapshot.bytes_received);
    }
}
