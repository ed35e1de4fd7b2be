//! PulseAudio / PipeWire volume through `pactl`.
//!
//! [`Pactl`] answers volume queries for the default sink.
//! [`subscription`] builds the transport for the audio event bridge: the
//! `pactl subscribe` stream filtered down to sink events.  The lines are
//! not interpreted; any of them means "re-query the volume".

use super::{run, ToolError};
use crate::process::CommandTransport;
use crate::traits::Mixer;

/// Shell pipeline behind the default audio event stream.
pub const DEFAULT_SUBSCRIBE: &str = "pactl subscribe | grep --line-buffered sink";

/// Upper bound accepted by [`Pactl::set_volume`]; pactl allows boosting
/// past 100%.
pub const MAX_VOLUME: u32 = 150;

/// The default audio event transport.
pub fn subscription() -> CommandTransport {
    CommandTransport::shell(DEFAULT_SUBSCRIBE)
}

/// Volume control for the default sink via `pactl`.
#[derive(Debug, Clone, Default)]
pub struct Pactl;

impl Pactl {
    pub fn new() -> Self {
        Self
    }

    /// Name of the default sink.
    pub fn default_sink(&self) -> Result<String, ToolError> {
        let out = run("pactl", &["get-default-sink"])?;
        let sink = out.trim();
        if sink.is_empty() {
            return Err(ToolError::parse("pactl", out));
        }
        Ok(sink.to_string())
    }
}

/// First `NN%` figure in `text`.
///
/// `pactl get-sink-volume` prints one entry per channel; the first one is
/// what the bar shows.  Some locales put a (non-breaking) space between
/// the number and the sign.
pub(crate) fn first_percent(text: &str) -> Option<u32> {
    text.match_indices('%').find_map(|(end, _)| {
        let head = text[..end].trim_end();
        let start = head.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        head[start..].parse().ok()
    })
}

impl Mixer for Pactl {
    type Error = ToolError;

    fn volume(&self) -> Result<u32, ToolError> {
        let sink = self.default_sink()?;
        let out = run("pactl", &["get-sink-volume", &sink])?;
        first_percent(&out).ok_or_else(|| ToolError::parse("pactl", out))
    }

    fn set_volume(&self, percent: u32) -> Result<(), ToolError> {
        let sink = self.default_sink()?;
        let level = format!("{}%", percent.min(MAX_VOLUME));
        run("pactl", &["set-sink-volume", &sink, &level])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Transport;

    #[test]
    fn parses_first_channel_volume() {
        let out = "Volume: front-left: 32768 /  50% / -18.06 dB,   \
                   front-right: 39321 /  60% / -13.31 dB\n        balance 0.00\n";
        assert_eq!(first_percent(out), Some(50));
    }

    #[test]
    fn percent_without_digits_is_skipped() {
        assert_eq!(first_percent("100% done"), Some(100));
        assert_eq!(first_percent("weird % then 7%"), Some(7));
        assert_eq!(first_percent("no volume here"), None);
    }

    #[test]
    fn percent_after_multibyte_space() {
        let out = "Volume: front-left: 32768 / 50\u{a0}% / -18.06 dB\n";
        assert_eq!(first_percent(out), Some(50));
        assert_eq!(first_percent("50\u{a0}%"), Some(50));
        assert_eq!(first_percent("50\u{202f}%"), Some(50));
        assert_eq!(first_percent("é% then 12%"), Some(12));
    }

    #[test]
    fn subscription_filters_sink_events() {
        assert_eq!(
            subscription().describe(),
            "sh -c pactl subscribe | grep --line-buffered sink"
        );
    }
}
