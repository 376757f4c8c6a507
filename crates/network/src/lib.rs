//! Blastoff control transport
//!
//! Exposes the animation lifecycle controller over a local Unix domain socket and
//! relays its state changes to the subscribed peers.

// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
// Too many false positives.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub use blastoff_core as core;
use blastoff_core::{Error as BlastoffError, Result as BlastoffResult};

pub use crate::{
    client::{Client, Subscription},
    connection::Connection,
    server::{Server, StateBroadcaster},
    switch::SwitchBridge,
};

mod client;
mod connection;
mod server;
mod switch;

/// Default path of the control socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/blastoff.sock";
