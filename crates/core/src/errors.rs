use core::fmt::Display;

use displaydoc::Display;
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// A specialized result type for the Blastoff control protocol.
pub type Result<T> = core::result::Result<T, Error>;

/// LED strip driver failures.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Debug, Serialize, Deserialize, MaxSize,
)]
pub enum DriverError {
    /// Unable to initialize the LED strip driver.
    Init,
    /// Unable to set up the LED strip driver.
    Setup,
    /// Unable to render a frame on the LED strip.
    Render,
}

impl DriverError {
    /// Creates a new driver initialization error.
    pub fn init<E: Display>(cause: E) -> Self {
        log::error!("LED strip driver initialization failed: {cause}");
        Self::Init
    }

    /// Creates a new driver setup error.
    pub fn setup<E: Display>(cause: E) -> Self {
        log::error!("LED strip driver setup failed: {cause}");
        Self::Setup
    }

    /// Creates a new frame rendering error.
    pub fn render<E: Display>(cause: E) -> Self {
        log::error!("LED strip frame rendering failed: {cause}");
        Self::Render
    }
}

/// Lifecycle transition failures.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Debug, Serialize, Deserialize, MaxSize,
)]
pub enum OperationError {
    /// Unable to start the animation: {0}
    Start(DriverError),
    /// Unable to stop the animation: {0}
    Stop(DriverError),
    /// The animation service is shutting down.
    Closed,
}

impl OperationError {
    /// Returns the underlying driver failure, if any.
    pub const fn driver_error(self) -> Option<DriverError> {
        match self {
            Self::Start(err) | Self::Stop(err) => Some(err),
            Self::Closed => None,
        }
    }
}

/// Errors that can occur when processing control requests.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Debug, Serialize, Deserialize, MaxSize,
)]
pub enum Error {
    /// {0}
    Operation(OperationError),
    /// Network read or write error.
    Network,
    /// Data decoding error.
    Decode,
    /// Data encoding error.
    Encode,
    /// Unexpected response to the request.
    UnexpectedResponse,
}

impl Error {
    /// Creates a new network error.
    pub fn network<E: Display>(cause: E) -> Self {
        log::debug!("Network error: {cause}");
        Self::Network
    }

    /// Creates a new decode data error.
    pub fn decode<E: Display>(cause: E) -> Self {
        log::debug!("Unable to decode message: {cause}");
        Self::Decode
    }

    /// Creates a new encode data error.
    pub fn encode<E: Display>(cause: E) -> Self {
        log::debug!("Unable to encode message: {cause}");
        Self::Encode
    }
}

impl From<OperationError> for Error {
    fn from(inner: OperationError) -> Self {
        Self::Operation(inner)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Start(err) | Self::Stop(err) => Some(err),
            Self::Closed => None,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::Start(DriverError::Init);
        assert_eq!(
            err.to_string(),
            "Unable to start the animation: Unable to initialize the LED strip driver."
        );
        assert_eq!(err.driver_error(), Some(DriverError::Init));
        assert_eq!(OperationError::Closed.driver_error(), None);
        assert_eq!(
            Error::from(OperationError::Stop(DriverError::Render)).to_string(),
            "Unable to stop the animation: Unable to render a frame on the LED strip."
        );
    }
}
