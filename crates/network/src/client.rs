use std::path::Path;

use blastoff_core::proto::RequestHeader;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::UnixStream,
};

use crate::{BlastoffError, BlastoffResult, Connection};

/// Blastoff control socket client.
pub struct Client<T = UnixStream> {
    connection: Connection<T>,
}

impl Client<UnixStream> {
    /// Connects to the animation service listening on the given socket path.
    pub async fn connect(path: impl AsRef<Path>) -> BlastoffResult<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(BlastoffError::network)?;
        log::debug!("Connected to {}", path.display());
        Ok(Self::new(stream))
    }
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client on top of the given stream.
    pub fn new(socket: T) -> Self {
        Self {
            connection: Connection::new(socket),
        }
    }

    /// Starts the flame animation.
    pub async fn start(&mut self) -> BlastoffResult<()> {
        self.connection.send_message(RequestHeader::Start).await?;
        self.connection.receive_response().await?.empty()
    }

    /// Stops the flame animation.
    pub async fn stop(&mut self) -> BlastoffResult<()> {
        self.connection.send_message(RequestHeader::Stop).await?;
        self.connection.receive_response().await?.empty()
    }

    /// Returns true if the flame animation is running.
    pub async fn is_started(&mut self) -> BlastoffResult<bool> {
        self.connection
            .send_message(RequestHeader::IsStarted)
            .await?;
        self.connection.receive_response().await?.is_started()
    }

    /// Turns this client into the stream of the animation state changes.
    pub async fn subscribe(mut self) -> BlastoffResult<Subscription<T>> {
        self.connection
            .send_message(RequestHeader::Subscribe)
            .await?;
        let running = self.connection.receive_response().await?.is_started()?;
        Ok(Subscription {
            connection: self.connection,
            running,
        })
    }
}

/// Stream of the animation state change notifications.
pub struct Subscription<T = UnixStream> {
    connection: Connection<T>,
    running: bool,
}

impl<T> Subscription<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the last known animation state.
    pub fn is_started(&self) -> bool {
        self.running
    }

    /// Waits for the next state change and returns the new state.
    pub async fn next_state(&mut self) -> BlastoffResult<bool> {
        self.running = self.connection.receive_response().await?.state_changed()?;
        Ok(self.running)
    }
}
