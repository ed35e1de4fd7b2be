//! Core traits that decouple hyprfeed from any specific event source or
//! external tool.
//!
//! The [`EventBridge`](crate::bridge::EventBridge) only knows about
//! [`Transport`]; the [`StatusFeed`](crate::status::StatusFeed) only knows
//! about [`Compositor`] and [`Mixer`].  Concrete backends live in
//! [`hyprland`](crate::hyprland), [`process`](crate::process) and
//! [`tools`](crate::tools).

use crate::types::{WindowInfo, Workspace};
use std::io::BufRead;

//  Transport

/// Errors from establishing an event transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The source does not exist or cannot be reached: a missing socket,
    /// an unset environment variable, a binary that fails to spawn.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// A source of newline-delimited event records.
///
/// An implementation might connect to a Unix socket, spawn a subprocess and
/// read its stdout, or hand out an in-memory buffer in tests.
///
/// # Contract
///
/// * [`connect`](Transport::connect) runs on the caller's thread and must
///   fail fast: if the source is not there, return
///   [`TransportError::Unavailable`] rather than retrying.
/// * The returned reader is moved to the listener thread and read until it
///   reports end-of-stream or an error.  Dropping it releases every
///   resource the transport acquired.
pub trait Transport: Send {
    /// Human-readable description for logs (a socket path, a command line).
    fn describe(&self) -> String;

    /// Open the source.
    fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError>;
}

//  Compositor

/// Workspace and window queries against the compositor.
///
/// Consumers re-query through this trait whenever the event bridge tells
/// them something changed.
pub trait Compositor {
    type Error: std::error::Error + Send + 'static;

    /// All workspaces, sorted by id ascending.
    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error>;

    /// The focused workspace.
    fn active_workspace(&self) -> Result<Workspace, Self::Error>;

    /// The focused window, or `None` if nothing has focus.
    fn active_window(&self) -> Result<Option<WindowInfo>, Self::Error>;

    /// Switch the focused monitor to workspace `id`.
    fn switch_workspace(&self, id: i32) -> Result<(), Self::Error>;
}

//  Mixer

/// Volume control for the default audio sink.
pub trait Mixer {
    type Error: std::error::Error + Send + 'static;

    /// Current volume in percent.
    fn volume(&self) -> Result<u32, Self::Error>;

    /// Set the volume in percent.
    fn set_volume(&self, percent: u32) -> Result<(), Self::Error>;
}
