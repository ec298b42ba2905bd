// statsd-udp - An asynchronous Statsd client and server over UDP
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Decides whether a metric event at a given sample rate should be sent.
///
/// Each decision draws one uniform value in `[0, 1)` and accepts the event
/// when the draw is less than or equal to the rate. A rate of one or more
/// is always accepted without drawing. A rate of zero or less (or `NaN`)
/// is never accepted.
///
/// The source of randomness can be swapped out with `Sampler::from_rng`
/// which is useful for deterministic tests.
///
/// # Example
///
/// ```
/// use statsd_udp::Sampler;
///
/// let sampler = Sampler::new();
/// assert!(sampler.should_sample(1.0));
/// assert!(!sampler.should_sample(0.0));
/// ```
pub struct Sampler {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Sampler {
    /// Create a sampler backed by an RNG seeded from the operating system.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a sampler that draws from the given RNG.
    pub fn from_rng<R>(rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Sampler {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn should_sample(&self, rate: f64) -> bool {
        if rate >= 1.0 {
            return true;
        }

        if rate.is_nan() || rate <= 0.0 {
            return false;
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let draw: f64 = rng.gen();
        draw <= rate
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sampler {{ rng: ... }}")
    }
}
