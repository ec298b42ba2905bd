// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export commonly used traits for easy glob imports
//!
//! # Example
//!
//! ```
//! use std::net::SocketAddr;
//! use std::time::Duration;
//! use statsd_udp::prelude::*;
//!
//! struct CountingHandler;
//!
//! impl DatagramHandler for CountingHandler {
//!     fn on_datagram(&self, payload: &[u8], _peer: SocketAddr) {
//!         println!("{} bytes", payload.len());
//!     }
//! }
//!
//! assert_eq!(250, Duration::from_millis(250).try_to_value().unwrap());
//! ```

pub use crate::handlers::DatagramHandler;
pub use crate::value::ToMetricValue;
