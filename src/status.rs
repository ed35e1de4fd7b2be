//! The headless status feed.
//!
//! [`StatusFeed`] is the consumer side of the event bridges: it owns a
//! [`Status`] snapshot, re-queries the compositor or the mixer whenever a
//! bridge reports a relevant record, polls the clock, battery and
//! now-playing track on a timer, and renders the snapshot as one JSON
//! line for a bar to display.
//!
//! It lives on the main thread.  Bridge observers reach it only through
//! [`marshal`](crate::dispatch::marshal).
//!
//! Collaborator failures are logged and leave the previous value in place,
//! so a bar shows stale-but-present data rather than flickering.

use crate::config::FeedConfig;
use crate::hyprland::events::{ACTIVE_WINDOW, WORKSPACE_EVENTS};
use crate::tools::{self, battery};
use crate::traits::{Compositor, Mixer};
use crate::types::EventRecord;
use log::{debug, warn};
use serde::Serialize;
use std::fmt::Write;

/// Everything a status bar shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Ids of the regular workspaces, ascending.  Special workspaces
    /// (negative ids) are left out.
    pub workspaces: Vec<i32>,
    pub active_workspace: Option<i32>,
    pub window_title: Option<String>,
    /// Default sink volume in percent.
    pub volume: Option<u32>,
    pub battery: Option<String>,
    /// Now-playing text, at most [`TRACK_MAX_CHARS`] characters.
    pub track: Option<String>,
    pub clock: String,
}

/// Longest track text the feed passes on.
pub const TRACK_MAX_CHARS: usize = 80;

/// Keeps a [`Status`] up to date.
pub struct StatusFeed<C: Compositor, M: Mixer> {
    compositor: C,
    mixer: M,
    config: FeedConfig,
    status: Status,
}

impl<C: Compositor, M: Mixer> StatusFeed<C, M> {
    pub fn new(compositor: C, mixer: M, config: FeedConfig) -> Self {
        Self {
            compositor,
            mixer,
            config,
            status: Status::default(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Query everything once.  Returns `true` if the snapshot changed.
    pub fn refresh_all(&mut self) -> bool {
        let workspaces = self.refresh_workspaces();
        let window = self.refresh_window();
        let volume = self.refresh_volume();
        let polled = self.poll();
        workspaces || window || volume || polled
    }

    /// React to a compositor record.  Returns `true` if the snapshot
    /// changed.
    pub fn on_compositor_event(&mut self, record: &EventRecord) -> bool {
        match record.kind() {
            Some(kind) if WORKSPACE_EVENTS.contains(&kind) => self.refresh_workspaces(),
            Some(ACTIVE_WINDOW) => self.refresh_window(),
            _ => false,
        }
    }

    /// React to an audio record.  Any line means the volume may have moved.
    pub fn on_audio_event(&mut self, record: &EventRecord) -> bool {
        debug!("audio event: {}", record);
        self.refresh_volume()
    }

    /// Re-read the workspace list and the active workspace.
    pub fn refresh_workspaces(&mut self) -> bool {
        let before = (self.status.workspaces.clone(), self.status.active_workspace);

        match self.compositor.workspaces() {
            Ok(list) => {
                let mut ids: Vec<i32> =
                    list.into_iter().map(|w| w.id).filter(|id| *id > 0).collect();
                ids.sort_unstable();
                ids.dedup();
                self.status.workspaces = ids;
            }
            Err(e) => warn!("workspace query failed: {}", e),
        }
        match self.compositor.active_workspace() {
            Ok(ws) => self.status.active_workspace = Some(ws.id),
            Err(e) => warn!("active workspace query failed: {}", e),
        }

        before != (self.status.workspaces.clone(), self.status.active_workspace)
    }

    pub fn refresh_window(&mut self) -> bool {
        match self.compositor.active_window() {
            Ok(window) => replace(&mut self.status.window_title, window.map(|w| w.title)),
            Err(e) => {
                warn!("active window query failed: {}", e);
                false
            }
        }
    }

    pub fn refresh_volume(&mut self) -> bool {
        match self.mixer.volume() {
            Ok(v) => replace(&mut self.status.volume, Some(v)),
            Err(e) => {
                warn!("volume query failed: {}", e);
                false
            }
        }
    }

    /// Timer-driven refresh of the clock and, if enabled, the battery and
    /// the track.
    pub fn poll(&mut self) -> bool {
        let clock = format_clock(&self.config.clock_format);
        let mut changed = replace(&mut self.status.clock, clock);
        if self.config.battery {
            match battery::read() {
                Ok(charge) => changed |= replace(&mut self.status.battery, Some(charge)),
                Err(e) => debug!("battery query failed: {}", e),
            }
        }
        if let Some(command) = &self.config.track_command {
            match tools::run("sh", &["-c", command.as_str()]) {
                Ok(out) => {
                    let text = truncate_chars(out.trim(), TRACK_MAX_CHARS);
                    let track = (!text.is_empty()).then(|| text.to_string());
                    changed |= replace(&mut self.status.track, track);
                }
                Err(e) => debug!("track query failed: {}", e),
            }
        }
        changed
    }

    /// The snapshot as a single JSON line (no trailing newline).
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.status)
    }
}

/// Assign `value` to `slot`, reporting whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// The first `max` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Local time formatted with `format`; an invalid format falls back to
/// RFC 3339 instead of panicking.
fn format_clock(format: &str) -> String {
    let now = chrono::Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        warn!("invalid clock format {:?}", format);
        return now.to_rfc3339();
    }
    out
}
