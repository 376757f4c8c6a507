//! Blastoff control protocol.
//!
//! Every message is a [`packet::Packet`] prefix followed by a postcard encoded header.
//! Requests flow from clients to the animation service, responses and state change
//! notifications flow back.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

pub mod packet;

/// Protocol name, kept from the D-Bus interface of the original stand controller.
pub const INTERFACE_NAME: &str = "com.github.jirikopecky.SaturnV.BlastOff";

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, MaxSize)]
pub enum RequestHeader {
    /// Start the flame animation.
    Start,
    /// Stop the flame animation and blank the strip.
    Stop,
    /// Request the current animation state.
    IsStarted,
    /// Switch this connection into the state change notifications stream.
    Subscribe,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, MaxSize)]
pub enum ResponseHeader {
    Empty,
    IsStarted(bool),
    /// Animation state has been changed.
    StateChanged(bool),
    Error(crate::Error),
}

impl ResponseHeader {
    pub const fn empty(self) -> crate::Result<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Error(err) => Err(err),
            _ => Err(crate::Error::UnexpectedResponse),
        }
    }

    pub const fn is_started(self) -> crate::Result<bool> {
        match self {
            Self::IsStarted(value) => Ok(value),
            Self::Error(err) => Err(err),
            _ => Err(crate::Error::UnexpectedResponse),
        }
    }

    pub const fn state_changed(self) -> crate::Result<bool> {
        match self {
            Self::StateChanged(value) => Ok(value),
            Self::Error(err) => Err(err),
            _ => Err(crate::Error::UnexpectedResponse),
        }
    }
}

impl From<crate::Result<()>> for ResponseHeader {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Empty,
            Err(err) => Self::Error(err),
        }
    }
}

/// Possible header types.
#[derive(Serialize, PartialEq, Eq, Clone, Copy, Debug, MaxSize)]
#[serde(untagged)]
pub enum Headers {
    Request(RequestHeader),
    Response(ResponseHeader),
}

impl From<RequestHeader> for Headers {
    fn from(value: RequestHeader) -> Self {
        Self::Request(value)
    }
}

impl From<ResponseHeader> for Headers {
    fn from(value: ResponseHeader) -> Self {
        Self::Response(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DriverError, Error, OperationError};

    #[test]
    fn test_response_accessors() {
        assert_eq!(ResponseHeader::Empty.empty(), Ok(()));
        assert_eq!(ResponseHeader::IsStarted(true).is_started(), Ok(true));
        assert_eq!(ResponseHeader::StateChanged(false).state_changed(), Ok(false));
        assert_eq!(
            ResponseHeader::IsStarted(true).empty(),
            Err(Error::UnexpectedResponse)
        );

        let err = Error::Operation(OperationError::Stop(DriverError::Render));
        assert_eq!(ResponseHeader::Error(err).is_started(), Err(err));
        assert_eq!(ResponseHeader::from(Err(err)), ResponseHeader::Error(err));
    }
}
