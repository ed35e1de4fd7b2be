//! Battery charge through `acpi`.

use super::{run, ToolError};

/// Charge of the first battery that does not report `0%`, e.g. `"87%"`.
pub fn read() -> Result<String, ToolError> {
    let out = run("acpi", &[])?;
    parse_acpi(&out).ok_or_else(|| ToolError::parse("acpi", out))
}

/// Pick the charge field out of `acpi` output.
///
/// Lines look like `Battery 0: Discharging, 87%, 02:10:00 remaining`.
/// Batteries stuck at ` 0%` are phantom devices on many laptops and are
/// skipped.
pub(crate) fn parse_acpi(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| !line.contains(" 0%"))
        .find_map(|line| line.split(", ").nth(1))
        .map(|field| field.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_charge_of_first_real_battery() {
        let out = "Battery 0: Unknown, 0%, rate information unavailable\n\
                   Battery 1: Discharging, 87%, 02:10:00 remaining\n";
        assert_eq!(parse_acpi(out).as_deref(), Some("87%"));
    }

    #[test]
    fn full_battery_has_no_time_field() {
        assert_eq!(parse_acpi("Battery 0: Full, 100%\n").as_deref(), Some("100%"));
    }

    #[test]
    fn no_battery() {
        assert_eq!(parse_acpi("No support for device type: power_supply\n"), None);
        assert_eq!(parse_acpi(""), None);
    }
}
