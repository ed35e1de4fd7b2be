//! Hyprland-specific implementations.
//!
//! * [`events`] — the `socket2` event stream as a
//!   [`Transport`](crate::traits::Transport).
//! * [`ctl`] — workspace and window queries over the command socket,
//!   implementing [`Compositor`](crate::traits::Compositor).
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod ctl;
pub mod events;

use std::path::PathBuf;

/// Resolve `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/<socket>`.
///
/// Hyprland ≥ 0.40 keeps both of its sockets in that directory.
pub(crate) fn socket_path(socket: &str) -> Result<PathBuf, String> {
    let runtime_dir =
        std::env::var("XDG_RUNTIME_DIR").map_err(|_| "XDG_RUNTIME_DIR not set".to_string())?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| "HYPRLAND_INSTANCE_SIGNATURE not set".to_string())?;
    Ok(PathBuf::from(runtime_dir).join("hypr").join(his).join(socket))
}
