//! Hyprland's event socket (`socket2`) as a [`Transport`].
//!
//! Hyprland writes one event per line in the `EVENT>>DATA\n` format to
//! every client connected to
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.
//! There is no handshake and nothing is ever written back.
//!
//! | Event              | Payload                 |
//! |--------------------|-------------------------|
//! | `workspace`        | `<name>`                |
//! | `createworkspace`  | `<name>`                |
//! | `destroyworkspace` | `<name>`                |
//! | `focusedmon`       | `<monitor>,<workspace>` |
//! | `activewindow`     | `<class>,<title>`       |

use crate::traits::{Transport, TransportError};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// File name of the event socket inside the instance directory.
pub const SOCKET2: &str = ".socket2.sock";

/// The focused workspace changed.
pub const WORKSPACE: &str = "workspace";
pub const CREATE_WORKSPACE: &str = "createworkspace";
pub const DESTROY_WORKSPACE: &str = "destroyworkspace";
/// Focus moved to another monitor (and therefore another workspace).
pub const FOCUSED_MONITOR: &str = "focusedmon";
pub const ACTIVE_WINDOW: &str = "activewindow";

/// Events after which the workspace list or the active workspace may differ.
pub const WORKSPACE_EVENTS: [&str; 4] =
    [WORKSPACE, CREATE_WORKSPACE, DESTROY_WORKSPACE, FOCUSED_MONITOR];

/// Connects to Hyprland's event socket.
#[derive(Debug, Clone)]
pub struct Socket2Transport {
    path: Result<PathBuf, String>,
}

impl Socket2Transport {
    /// Locate the socket from `XDG_RUNTIME_DIR` and
    /// `HYPRLAND_INSTANCE_SIGNATURE`.
    ///
    /// Missing variables are reported by
    /// [`connect`](Transport::connect), not here.
    pub fn from_env() -> Self {
        Self {
            path: super::socket_path(SOCKET2),
        }
    }

    /// Use an explicit socket path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: Ok(path.as_ref().to_path_buf()),
        }
    }

    /// The resolved socket path, if the environment allowed resolving it.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().ok()
    }
}

impl Transport for Socket2Transport {
    fn describe(&self) -> String {
        match &self.path {
            Ok(path) => path.display().to_string(),
            Err(e) => format!("<hyprland socket2: {}>", e),
        }
    }

    fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
        let path = self
            .path
            .as_ref()
            .map_err(|e| TransportError::Unavailable(e.clone()))?;
        if !path.exists() {
            return Err(TransportError::Unavailable(format!(
                "socket not found at {}",
                path.display()
            )));
        }
        let stream = UnixStream::connect(path).map_err(|e| {
            TransportError::Unavailable(format!("connect to {}: {}", path.display(), e))
        })?;
        Ok(Box::new(BufReader::new(stream)))
    }
}

//  Tests
