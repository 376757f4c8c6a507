//! Blastoff core types
//!
//! Colors and the flame palette, strip configuration, the strip driver capability
//! and the control protocol shared by the animation service and its clients.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub use crate::{
    color::{Color, PALETTE},
    driver::{DriverFactory, StripDriver},
    errors::{DriverError, Error, OperationError, Result},
};

pub mod color;
pub mod driver;
pub mod errors;
pub mod proto;

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Brightness used when no other value was configured.
pub const DEFAULT_BRIGHTNESS: u8 = 60;
/// Number of LEDs on the stand strip.
pub const DEFAULT_LED_COUNT: u16 = 60;
/// Delay between two animation steps, in milliseconds.
pub const DEFAULT_STEP_INTERVAL_MS: u64 = 50;

/// LED strip parameters, fixed for the whole lifetime of the service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct StripConfig {
    /// Global strip brightness.
    pub brightness: u8,
    /// The number of LEDs in the strip.
    pub led_count: u16,
    /// Delay between two animation steps.
    pub step_interval_ms: u64,
}

impl StripConfig {
    /// Creates a strip configuration with the default step interval.
    pub const fn new(brightness: u8, led_count: u16) -> Self {
        Self {
            brightness,
            led_count,
            step_interval_ms: DEFAULT_STEP_INTERVAL_MS,
        }
    }

    /// Returns the same configuration with the given step interval.
    #[must_use]
    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Delay between two animation steps.
    pub const fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// The number of LEDs as a frame buffer length.
    pub const fn len(&self) -> usize {
        self.led_count as usize
    }

    /// Returns true if the strip has no LEDs at all.
    pub const fn is_empty(&self) -> bool {
        self.led_count == 0
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BRIGHTNESS, DEFAULT_LED_COUNT)
    }
}
