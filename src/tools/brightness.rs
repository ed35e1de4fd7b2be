//! Backlight brightness through `brightnessctl`.

use super::{run, ToolError};

/// `brightnessctl` wrapper, optionally pinned to one device.
#[derive(Debug, Clone, Default)]
pub struct Brightnessctl {
    device: Option<String>,
}

impl Brightnessctl {
    /// Let `brightnessctl` pick the default backlight.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(device: impl Into<String>) -> Self {
        Self {
            device: Some(device.into()),
        }
    }

    fn query(&self, what: &str) -> Result<u64, ToolError> {
        let mut args: Vec<&str> = Vec::new();
        if let Some(device) = &self.device {
            args.extend(["-d", device.as_str()]);
        }
        args.push(what);
        let out = run("brightnessctl", &args)?;
        out.trim()
            .parse()
            .map_err(|_| ToolError::parse("brightnessctl", out))
    }

    /// Current brightness in percent of the device maximum.
    pub fn get(&self) -> Result<u32, ToolError> {
        let current = self.query("g")?;
        let max = self.query("m")?;
        to_percent(current, max).ok_or_else(|| ToolError::parse("brightnessctl", "max is 0"))
    }

    /// Set brightness in percent (clamped to 100).
    pub fn set(&self, percent: u32) -> Result<(), ToolError> {
        let level = format!("{}%", percent.min(100));
        let mut args: Vec<&str> = Vec::new();
        if let Some(device) = &self.device {
            args.extend(["-d", device.as_str()]);
        }
        args.extend(["s", level.as_str()]);
        run("brightnessctl", &args)?;
        Ok(())
    }
}

/// `current / max` as a rounded percentage.
pub(crate) fn to_percent(current: u64, max: u64) -> Option<u32> {
    if max == 0 {
        return None;
    }
    let pct = (current.min(max) * 100 + max / 2) / max;
    Some(pct as u32)
}
