//! A connection between the animation service and its clients.

use std::io::ErrorKind;

use blastoff_core::proto::{
    packet::{FromPacket, PackedSize, Packet},
    Headers, RequestHeader, ResponseHeader,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{BlastoffError, BlastoffResult};

/// Established connection between Blastoff peers.
///
/// This structure provides low-level communication API on top of any byte stream.
pub struct Connection<T> {
    socket: T,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(socket: T) -> Self {
        Self { socket }
    }

    /// Receives a next request from the connected peer.
    ///
    /// Returns `None` if the peer has closed the connection.
    pub async fn receive_request(&mut self) -> BlastoffResult<Option<RequestHeader>> {
        self.receive_message().await
    }

    /// Receives a next response from the connected peer.
    pub async fn receive_response(&mut self) -> BlastoffResult<ResponseHeader> {
        self.receive_message()
            .await?
            .ok_or_else(|| BlastoffError::network("connection closed by peer"))
    }

    /// Sends a message to the connected peer.
    pub async fn send_message(&mut self, header: impl Into<Headers>) -> BlastoffResult<()> {
        let header = header.into();
        log::trace!("Sending message {header:?}");

        let mut buf = [0_u8; Packet::MAX_LEN];
        let bytes = header.encode(&mut buf)?;
        self.socket
            .write_all(bytes)
            .await
            .map_err(BlastoffError::network)?;
        self.socket.flush().await.map_err(BlastoffError::network)
    }

    /// Waits until the peer closes its side of the connection.
    ///
    /// Only for peers that are not expected to send anything, any incoming byte is
    /// treated as a protocol violation. Dropping the returned future loses no data.
    pub async fn wait_closed(&mut self) -> BlastoffResult<()> {
        let mut byte = [0_u8; 1];
        match self.socket.read(&mut byte).await {
            Ok(0) => Ok(()),
            Ok(_) => Err(BlastoffError::decode("unexpected data from the peer")),
            Err(err) => Err(BlastoffError::network(err)),
        }
    }

    /// Receives a next incoming message from the connected peer.
    async fn receive_message<H: FromPacket>(&mut self) -> BlastoffResult<Option<H>> {
        // Read packet prefix
        let mut buf = [0_u8; Packet::MAX_LEN];
        match self.socket.read_exact(&mut buf[..Packet::PACKED_LEN]).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(BlastoffError::network(err)),
        }
        let packet = Packet::from_bytes(&buf);
        log::trace!("Got a next packet {packet:?}");

        // Read header
        let header_len = packet.header_len();
        if header_len > Packet::MAX_HEADER_LEN {
            return Err(BlastoffError::decode(format_args!(
                "header is too long: {header_len} bytes"
            )));
        }

        let header_buf = &mut buf[..header_len];
        self.socket
            .read_exact(header_buf)
            .await
            .map_err(BlastoffError::network)?;
        H::from_bytes(header_buf)
            .map(Some)
            .map_err(BlastoffError::decode)
    }

    /// Returns the underlying socket.
    pub fn into_inner(self) -> T {
        self.socket
    }
}
