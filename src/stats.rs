// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of I/O telemetry for a client or server transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
    pub packets_sampled_out: u64,
    pub bytes_received: u64,
    pub packets_received: u64,
    pub receive_errors: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SocketStats {
    bytes_sent: AtomicU64,
    packets_sent: AtomicU64,
    bytes_dropped: AtomicU64,
    packets_dropped: AtomicU64,
    packets_sampled_out: AtomicU64,
    bytes_received: AtomicU64,
    packets_received: AtomicU64,
    receive_errors: AtomicU64,
}

impl SocketStats {
    pub(crate) fn incr_sampled_out(&self) {
        self.packets_sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_received(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_receive_errors(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a write of `len` bytes, passing the result through.
    pub(crate) fn update(&self, res: io::Result<usize>, len: usize) -> io::Result<usize> {
        match res {
            Ok(written) => {
                self.bytes_sent.fetch_add(written as u64, Ordering::Relaxed);
                self.packets_sent.fetch_add(1, Ordering::Relaxed);
                Ok(written)
            }
            Err(e) => {
                self.bytes_dropped.fetch_add(len as u64, Ordering::Relaxed);
                self.packets_dropped.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

impl From<&SocketStats> for TransportStats {
    fn from(stats: &SocketStats) -> Self {
        TransportStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
            packets_sampled_out: stats.packets_sampled_out.load(Ordering::Relaxed),
            bytes_received: stats.bytes_received.load(Ordering::Relaxed),
            packets_received: stats.packets_received.load(Ordering::Relaxed),
            receive_errors: stats.receive_errors.load(Ordering::Relaxed),
        }
    }
}
