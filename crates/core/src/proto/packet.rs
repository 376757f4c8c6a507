use endian_codec::{DecodeLE, EncodeLE};
pub use endian_codec::PackedSize;
use postcard::experimental::max_size::MaxSize;
use serde::de::DeserializeOwned;

use super::{Headers, RequestHeader, ResponseHeader};

/// Length prefix of every protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PackedSize, EncodeLE, DecodeLE)]
pub struct Packet {
    pub header_len: u32,
}

impl Packet {
    /// Max encoded header length.
    pub const MAX_HEADER_LEN: usize = Headers::POSTCARD_MAX_SIZE;
    /// Max packet with header length.
    pub const MAX_LEN: usize = Self::MAX_HEADER_LEN + Self::PACKED_LEN;

    pub fn from_bytes(buf: &[u8]) -> Self {
        Self::decode_from_le_bytes(&buf[..Self::PACKED_LEN])
    }

    pub fn header_len(self) -> usize {
        self.header_len as usize
    }
}

/// Header types that can be read from a packet body.
pub trait FromPacket: Sized {
    fn from_bytes(buf: &[u8]) -> Result<Self, postcard::Error>;
}

impl<T: DeserializeOwned + Into<Headers>> FromPacket for T {
    fn from_bytes(buf: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(buf)
    }
}

impl RequestHeader {
    pub fn encode(self, buf: &mut [u8]) -> crate::Result<&mut [u8]> {
        Headers::Request(self).encode(buf)
    }
}

impl ResponseHeader {
    pub fn encode(self, buf: &mut [u8]) -> crate::Result<&mut [u8]> {
        Headers::Response(self).encode(buf)
    }
}

impl Headers {
    /// Writes the packet prefix and the header into the given buffer and returns
    /// the encoded part of it.
    pub fn encode(self, buf: &mut [u8]) -> crate::Result<&mut [u8]> {
        if buf.len() < Packet::MAX_LEN {
            return Err(crate::Error::Encode);
        }

        let header_len = postcard::to_slice(&self, &mut buf[Packet::PACKED_LEN..])
            .map_err(crate::Error::encode)?
            .len();
        let packet = Packet {
            header_len: u32::try_from(header_len).map_err(crate::Error::encode)?,
        };
        packet.encode_as_le_bytes(&mut buf[..Packet::PACKED_LEN]);

        Ok(&mut buf[..Packet::PACKED_LEN + header_len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DriverError, Error, OperationError};

    #[test]
    fn test_encode_request() {
        let mut buf = [0_u8; Packet::MAX_LEN];
        let encoded = RequestHeader::Subscribe.encode(&mut buf).unwrap();

        let packet = Packet::from_bytes(encoded);
        assert_eq!(packet.header_len() + Packet::PACKED_LEN, encoded.len());
        let header = RequestHeader::from_bytes(&encoded[Packet::PACKED_LEN..]).unwrap();
        assert_eq!(header, RequestHeader::Subscribe);
    }

    #[test]
    fn test_encode_error_response() {
        let expected = ResponseHeader::Error(Error::Operation(OperationError::Start(
            DriverError::Setup,
        )));

        let mut buf = [0_u8; Packet::MAX_LEN];
        let encoded = expected.encode(&mut buf).unwrap();
        let header_len = Packet::from_bytes(encoded).header_len();
        assert!(header_len <= Packet::MAX_HEADER_LEN);

        let actual = ResponseHeader::from_bytes(&encoded[Packet::PACKED_LEN..]).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let mut buf = [0_u8; 2];
        assert_eq!(
            ResponseHeader::Empty.encode(&mut buf).unwrap_err(),
            Error::Encode
        );
    }
}
