//! LED strip driver capability.
//!
//! The animation engine never touches hardware directly: it talks to a [`StripDriver`]
//! obtained from a [`DriverFactory`]. Any backend satisfying these traits is acceptable,
//! be it a real WS281x strip or an in-memory double that records the written frames.

use crate::{Color, DriverError, StripConfig};

/// Handle to an initialized LED strip.
pub trait StripDriver: Send + 'static {
    /// Performs one-time driver setup before the first frame.
    fn setup(&mut self) -> Result<(), DriverError>;
    /// Pushes the whole frame buffer to the strip.
    fn render(&mut self, frame: &[Color]) -> Result<(), DriverError>;
    /// Releases the driver resources.
    ///
    /// No other method is called after the driver has been released.
    fn release(&mut self);
}

/// Allocates strip drivers for the given configuration.
pub trait DriverFactory: Send + Sync + 'static {
    /// Driver type produced by this factory.
    type Driver: StripDriver;
    /// Allocates a new driver with the given brightness and LED count.
    fn create(&self, config: &StripConfig) -> Result<Self::Driver, DriverError>;
}

impl<F, D> DriverFactory for F
where
    F: Fn(&StripConfig) -> Result<D, DriverError> + Send + Sync + 'static,
    D: StripDriver,
{
    type Driver = D;

    fn create(&self, config: &StripConfig) -> Result<Self::Driver, DriverError> {
        self(config)
    }
}

#[cfg(any(feature = "std", test))]
impl<T: ?Sized + StripDriver> StripDriver for Box<T> {
    fn setup(&mut self) -> Result<(), DriverError> {
        T::setup(self)
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), DriverError> {
        T::render(self, frame)
    }

    fn release(&mut self) {
        T::release(self);
    }
}
