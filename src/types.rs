//! Types used throughout hyprfeed.
//!
//! [`EventRecord`] is the unit the event bridge moves around; the rest are
//! the supporting data types that consumers get back from the compositor
//! and from a finished listener.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the event name and its payload on Hyprland's
/// `socket2` (`EVENT>>DATA`).
pub const EVENT_SEPARATOR: &str = ">>";

/// One line received from an event transport, with the trailing newline
/// and surrounding whitespace removed.
///
/// The bridge never looks inside a record.  The accessors below exist for
/// observers that want to filter on Hyprland's `EVENT>>DATA` layout; any
/// other stream (e.g. `pactl subscribe`) is just free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRecord(String);

impl EventRecord {
    /// Build a record from a raw line, trimming surrounding whitespace.
    pub fn new(line: impl AsRef<str>) -> Self {
        Self(line.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The event name: everything before the first `>>`.
    ///
    /// Returns `None` when the record has no separator.
    pub fn kind(&self) -> Option<&str> {
        self.split().map(|(kind, _)| kind)
    }

    /// The payload: everything after the first `>>`.
    pub fn data(&self) -> Option<&str> {
        self.split().map(|(_, data)| data)
    }

    /// `true` if the event name equals `kind`.
    ///
    /// `workspace` matches `workspace>>2` but not `workspacev2>>2,2`.
    pub fn is(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }

    fn split(&self) -> Option<(&str, &str)> {
        let sep = self.0.find(EVENT_SEPARATOR)?;
        Some((&self.0[..sep], &self.0[sep + EVENT_SEPARATOR.len()..]))
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventRecord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A workspace as reported by the compositor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i32,
    pub name: String,
    /// Name of the monitor the workspace lives on.
    pub monitor: String,
    /// Number of windows on the workspace.
    pub windows: u32,
}

/// The focused window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub title: String,
    pub class: String,
}

/// Why a listener stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The peer closed the socket or the child closed its stdout.
    EndOfStream,
    /// A read failed.  The message is the I/O error text.
    ReadError(String),
}

/// Summary handed to disconnect hooks and returned from
/// [`BridgeHandle::join`](crate::bridge::BridgeHandle::join).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEnd {
    /// Name of the bridge that stopped.
    pub bridge: String,
    /// Records read before the stream ended.
    pub lines: u64,
    pub reason: EndReason,
}
