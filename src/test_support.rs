extern crate std;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

/// Delay provider that records every requested wait, in nanoseconds.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded waits of exactly `us` microseconds.
    pub fn count_us(&self, us: u32) -> usize {
        self.waits_ns
            .iter()
            .filter(|ns| **ns == u64::from(us) * 1_000)
            .count()
    }

    /// Number of recorded waits of exactly `ms` milliseconds.
    pub fn count_ms(&self, ms: u32) -> usize {
        self.count_us(ms * 1_000)
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.push(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_ns.push(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ns.push(u64::from(ms) * 1_000_000);
    }
}
