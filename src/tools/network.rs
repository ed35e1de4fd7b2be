//! Wi-Fi (iwd) and Bluetooth (BlueZ) through their command-line clients.

use super::{run, ToolError};
use serde::Serialize;

/// A device known to `bluetoothctl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BluetoothDevice {
    pub address: String,
    pub name: String,
}

/// Trigger a scan on `interface` and list the visible network names.
pub fn wifi_networks(interface: &str) -> Result<Vec<String>, ToolError> {
    run("iwctl", &["station", interface, "scan"])?;
    let out = run("iwctl", &["station", interface, "get-networks"])?;
    Ok(parse_networks(&out))
}

/// Start or stop the `iwd` service.
pub fn set_wifi(on: bool) -> Result<(), ToolError> {
    let action = if on { "start" } else { "stop" };
    run("systemctl", &[action, "iwd"])?;
    Ok(())
}

/// Devices `bluetoothctl` knows about.
pub fn bluetooth_devices() -> Result<Vec<BluetoothDevice>, ToolError> {
    let out = run("bluetoothctl", &["devices"])?;
    Ok(parse_devices(&out))
}

/// Power the Bluetooth controller on or off.
pub fn set_bluetooth(on: bool) -> Result<(), ToolError> {
    run("bluetoothctl", &["power", if on { "on" } else { "off" }])?;
    Ok(())
}

/// Remove ANSI escape sequences (`ESC [ … letter`); iwctl colours its
/// tables even when stdout is a pipe.
fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Network names from an `iwctl station <if> get-networks` table.
///
/// The table has a title, separator rules and a column header before the
/// rows; columns are separated by runs of spaces and the connected network
/// is marked with a leading `>`.
pub(crate) fn parse_networks(output: &str) -> Vec<String> {
    strip_ansi(output)
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('-')
                && !line.starts_with("Available networks")
                && !line.starts_with("Network name")
                && !line.starts_with("No networks")
        })
        .filter_map(|line| {
            let line = line.trim_start_matches('>').trim_start();
            let name = line.split("  ").next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Parse `Device <MAC> <name…>` lines.
pub(crate) fn parse_devices(output: &str) -> Vec<BluetoothDevice> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ').unwrap_or((rest, ""));
            Some(BluetoothDevice {
                address: address.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iwctl_table() {
        let out = "                               Available networks\n\
                   --------------------------------------------------------------------------------\n\
                   \u{1b}[1;90m      Network name                      Security            Signal\u{1b}[0m\n\
                   --------------------------------------------------------------------------------\n\
                   \u{1b}[0m  > \u{1b}[0mHome Net                          psk                 ****\n\
                   \u{20}   CoffeeShop                        open                **  \n\
                   \n";
        assert_eq!(parse_networks(out), vec!["Home Net", "CoffeeShop"]);
    }

    #[test]
    fn empty_scan() {
        let out = "  Available networks\n---------\n  No networks available\n";
        assert!(parse_networks(out).is_empty());
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\u{1b}[1;31mred\u{1b}[0m"), "red");
    }

    #[test]
    fn parses_bluetooth_devices() {
        let out = "Device 00:1A:7D:DA:71:13 WH-1000XM4\n\
                   Device 5C:F3:70:9E:A1:02 Logitech MX Master 3\n\
                   [bluetooth]# \n";
        assert_eq!(
            parse_devices(out),
            vec![
                BluetoothDevice {
                    address: "00:1A:7D:DA:71:13".into(),
                    name: "WH-1000XM4".into(),
                },
                BluetoothDevice {
                    address: "5C:F3:70:9E:A1:02".into(),
                    name: "Logitech MX Master 3".into(),
                },
            ]
        );
    }
}
