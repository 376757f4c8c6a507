use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::UnixStream,
};

use crate::{BlastoffResult, Client};

/// Maps an on/off switch onto the animation control operations.
///
/// Home automation bridges expose the stand as a simple switch; turning it on starts
/// the animation, turning it off stops it.
pub struct SwitchBridge<T = UnixStream> {
    client: Client<T>,
}

impl<T> SwitchBridge<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(client: Client<T>) -> Self {
        Self { client }
    }

    /// Applies a remote switch update.
    pub async fn set_on(&mut self, on: bool) -> BlastoffResult<()> {
        log::trace!("State change remote requested: {on}");
        if on {
            self.client.start().await?;
        } else {
            self.client.stop().await?;
        }
        log::info!("Switch turned {}", if on { "on" } else { "off" });
        Ok(())
    }

    /// Reads the switch state.
    pub async fn is_on(&mut self) -> BlastoffResult<bool> {
        log::trace!("State read request");
        let on = self.client.is_started().await?;
        log::trace!("State read finished: {on}");
        Ok(on)
    }

    pub fn into_client(self) -> Client<T> {
        self.client
    }
}
