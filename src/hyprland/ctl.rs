//! [`Compositor`] implementation backed by Hyprland's command socket.
//!
//! Talks to `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`
//! directly instead of shelling out to `hyprctl`.  Every request opens a
//! short-lived connection, writes the command and reads until Hyprland
//! closes the socket.

use crate::traits::Compositor;
use crate::types::{WindowInfo, Workspace};
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// File name of the command socket inside the instance directory.
pub const SOCKET: &str = ".socket.sock";

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprctlError(String);

/// Hyprland command-socket client.
#[derive(Debug, Clone)]
pub struct Hyprctl {
    path: Option<PathBuf>,
}

impl Default for Hyprctl {
    fn default() -> Self {
        Self::new()
    }
}

impl Hyprctl {
    /// Resolve the socket from the environment on every request.
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Use an explicit socket path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    fn socket_path(&self) -> Result<PathBuf, HyprctlError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => super::socket_path(SOCKET).map_err(HyprctlError),
        }
    }

    /// Send a raw command and return the response as a string.
    fn request(&self, command: &str) -> Result<String, HyprctlError> {
        let path = self.socket_path()?;
        let mut stream = UnixStream::connect(&path)
            .map_err(|e| HyprctlError(format!("connect to {}: {}", path.display(), e)))?;

        stream
            .write_all(command.as_bytes())
            .map_err(|e| HyprctlError(format!("write: {}", e)))?;

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .map_err(|e| HyprctlError(format!("read: {}", e)))?;

        String::from_utf8(response).map_err(|e| HyprctlError(format!("utf-8: {}", e)))
    }

    /// Send a JSON data query (`j/<command>`).
    fn json(&self, data_command: &str) -> Result<String, HyprctlError> {
        self.request(&format!("j/{}", data_command))
    }

    /// Send a dispatch command and check for `"ok"`.
    pub fn dispatch(&self, args: &str) -> Result<(), HyprctlError> {
        let response = self.request(&format!("/dispatch {}", args))?;
        if response.trim() == "ok" {
            Ok(())
        } else {
            Err(HyprctlError(format!("dispatch error: {}", response.trim())))
        }
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of the objects returned by `j/workspaces` and `j/activeworkspace`.
#[derive(Deserialize)]
struct WorkspaceJson {
    id: i32,
    name: String,
    #[serde(default)]
    monitor: String,
    #[serde(default)]
    windows: u32,
}

impl From<WorkspaceJson> for Workspace {
    fn from(w: WorkspaceJson) -> Self {
        Workspace {
            id: w.id,
            name: w.name,
            monitor: w.monitor,
            windows: w.windows,
        }
    }
}

/// Subset of the object returned by `j/activewindow`.
#[derive(Deserialize)]
struct ActiveWindowJson {
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
}

fn parse_err(e: serde_json::Error) -> HyprctlError {
    HyprctlError(format!("parse: {}", e))
}

/// Parse a `j/workspaces` response, sorted by id.
pub(crate) fn parse_workspaces(json: &str) -> Result<Vec<Workspace>, HyprctlError> {
    let raw: Vec<WorkspaceJson> = serde_json::from_str(json).map_err(parse_err)?;
    let mut workspaces: Vec<Workspace> = raw.into_iter().map(Workspace::from).collect();
    workspaces.sort_by_key(|w| w.id);
    Ok(workspaces)
}

pub(crate) fn parse_workspace(json: &str) -> Result<Workspace, HyprctlError> {
    serde_json::from_str::<WorkspaceJson>(json)
        .map(Workspace::from)
        .map_err(parse_err)
}

pub(crate) fn parse_active_window(json: &str) -> Result<Option<WindowInfo>, HyprctlError> {
    // Hyprland returns an empty object `{}` when no window is focused.
    if json.trim() == "{}" {
        return Ok(None);
    }
    let w: ActiveWindowJson = serde_json::from_str(json).map_err(parse_err)?;
    Ok(Some(WindowInfo {
        title: w.title,
        class: w.class,
    }))
}

//  Compositor implementation

impl Compositor for Hyprctl {
    type Error = HyprctlError;

    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error> {
        parse_workspaces(&self.json("workspaces")?)
    }

    fn active_workspace(&self) -> Result<Workspace, Self::Error> {
        parse_workspace(&self.json("activeworkspace")?)
    }

    fn active_window(&self) -> Result<Option<WindowInfo>, Self::Error> {
        parse_active_window(&self.json("activewindow")?)
    }

    fn switch_workspace(&self, id: i32) -> Result<(), Self::Error> {
        self.dispatch(&format!("workspace {}", id))
    }
}

//  Tests
