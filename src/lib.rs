//! **hyprfeed** — live Hyprland and audio state for desktop-shell widgets.
//!
//! Bars, launchers and settings popups on a Hyprland desktop all need the
//! same thing: be told when the compositor or the mixer changed, then
//! re-query and redraw.  hyprfeed provides that plumbing without any GUI
//! toolkit, and ships a headless daemon that prints the resulting state as
//! JSON lines for any bar to render.
//!
//! # Architecture
//!
//! * [`bridge::EventBridge`] — owns one background listener per event
//!   source and fans every received line out to registered observers.
//! * [`traits::Transport`] — abstracts where lines come from: Hyprland's
//!   `socket2` ([`hyprland::events`]) or a subprocess's stdout
//!   ([`process`]).
//! * [`dispatch`] — moves observer work onto the consumer's thread, since
//!   observers run on the listener thread.
//! * [`traits::Compositor`] / [`traits::Mixer`] — the queries consumers
//!   run on notification, implemented by [`hyprland::ctl`] and
//!   [`tools::audio`].
//! * [`status::StatusFeed`] — the consumer used by the daemon.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod hyprland;
pub mod process;
pub mod status;
pub mod tools;
pub mod traits;
pub mod types;
