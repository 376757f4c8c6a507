//! Control socket server.

use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use blastoff_app::{Controller, DriverFactory, StateObserver};
use blastoff_core::proto::{RequestHeader, ResponseHeader};
use tokio::{
    net::{UnixListener, UnixStream},
    sync::broadcast,
    task::JoinSet,
};

use crate::{BlastoffError, BlastoffResult, Connection};

/// Pending state change notifications per subscriber.
const EVENTS_QUEUE_LEN: usize = 16;

/// Relays controller state changes to the subscribed connections.
#[derive(Debug, Clone)]
pub struct StateBroadcaster {
    sender: broadcast::Sender<bool>,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENTS_QUEUE_LEN);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscriptions.
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StateObserver for StateBroadcaster {
    fn state_changed(&self, running: bool) {
        log::debug!("Emitting state changed signal: {running}");
        // There may be no subscribers at all.
        let _ = self.sender.send(running);
    }
}

/// Serves the controller operations on a Unix domain socket.
pub struct Server<F: DriverFactory> {
    listener: UnixListener,
    path: PathBuf,
    controller: Arc<Controller<F>>,
    events: StateBroadcaster,
}

impl<F: DriverFactory> Server<F> {
    /// Binds the control socket at the given path.
    ///
    /// A stale socket file left by a crashed service is replaced, but binding fails if
    /// another service is still listening on it.
    pub async fn bind(
        path: impl AsRef<Path>,
        controller: Arc<Controller<F>>,
        events: StateBroadcaster,
    ) -> std::io::Result<Self> {
        let path = path.as_ref().to_owned();
        if path.exists() {
            if UnixStream::connect(&path).await.is_ok() {
                return Err(std::io::Error::new(
                    ErrorKind::AddrInUse,
                    format!("{} is already served by another process", path.display()),
                ));
            }
            log::debug!("Removing stale socket {}", path.display());
            std::fs::remove_file(&path)?;
        }

        let listener = UnixListener::bind(&path)?;
        log::info!("Bound control socket on the {}", path.display());
        Ok(Self {
            listener,
            path,
            controller,
            events,
        })
    }

    /// Returns the control socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts client connections until the `shutdown` future completes.
    ///
    /// Every client connection is closed before this method returns. A controller call
    /// that was already dispatched may still complete, so callers that need a final
    /// state use [`Controller::shutdown`] afterwards.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> std::io::Result<()> {
        tokio::pin!(shutdown);
        let mut clients = JoinSet::new();
        let served = loop {
            tokio::select! {
                () = &mut shutdown => {
                    log::info!("Control socket is shutting down");
                    break Ok(());
                }
                Some(finished) = clients.join_next(), if !clients.is_empty() => {
                    if let Err(err) = finished {
                        log::warn!("Client task failed: {err}");
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, _address) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => break Err(err),
                    };
                    log::debug!("Accepted an incoming connection");

                    let controller = self.controller.clone();
                    let events = self.events.clone();
                    clients.spawn(async move {
                        if let Err(err) = handle_client(controller, events, stream).await {
                            log::debug!("Closed connection with client: {err}");
                        }
                    });
                }
            }
        };

        log::debug!("Closing {} client connections", clients.len());
        clients.shutdown().await;
        served
    }
}

impl<F: DriverFactory> Drop for Server<F> {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            log::warn!("Unable to remove socket {}: {err}", self.path.display());
        }
    }
}

/// Runs a blocking controller call outside of the async executor.
async fn call<F, R>(
    controller: &Arc<Controller<F>>,
    op: impl FnOnce(&Controller<F>) -> R + Send + 'static,
) -> R
where
    F: DriverFactory,
    R: Send + 'static,
{
    let controller = controller.clone();
    tokio::task::spawn_blocking(move || op(&controller))
        .await
        .unwrap_or_else(|err| std::panic::resume_unwind(err.into_panic()))
}

async fn handle_client<F: DriverFactory>(
    controller: Arc<Controller<F>>,
    events: StateBroadcaster,
    stream: UnixStream,
) -> BlastoffResult<()> {
    let mut peer = Connection::new(stream);
    while let Some(request) = peer.receive_request().await? {
        log::trace!("Got request {request:?}");

        let response = match request {
            RequestHeader::Start => ResponseHeader::from(
                call(&controller, Controller::start)
                    .await
                    .map_err(BlastoffError::from),
            ),
            RequestHeader::Stop => ResponseHeader::from(
                call(&controller, Controller::stop)
                    .await
                    .map_err(BlastoffError::from),
            ),
            RequestHeader::IsStarted => {
                ResponseHeader::IsStarted(call(&controller, Controller::is_started).await)
            }
            RequestHeader::Subscribe => {
                // Subscribe before reading the state to not miss a change in between.
                let receiver = events.subscribe();
                let running = call(&controller, Controller::is_started).await;
                peer.send_message(ResponseHeader::IsStarted(running)).await?;
                return stream_state_changes(peer, receiver).await;
            }
        };
        peer.send_message(response).await?;
    }

    log::debug!("Client disconnected");
    Ok(())
}

async fn stream_state_changes(
    mut peer: Connection<UnixStream>,
    mut receiver: broadcast::Receiver<bool>,
) -> BlastoffResult<()> {
    loop {
        let event = tokio::select! {
            closed = peer.wait_closed() => {
                closed?;
                log::debug!("Subscriber disconnected");
                return Ok(());
            }
            event = receiver.recv() => event,
        };

        match event {
            Ok(running) => {
                peer.send_message(ResponseHeader::StateChanged(running))
                    .await?;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Subscriber lagged behind, skipped {skipped} state changes");
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}
