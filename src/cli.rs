//! Command-line parsing for the `hyprfeed` binary.
//!
//! ```text
//! hyprfeed [run]                 stream status JSON lines (default)
//! hyprfeed events                print raw compositor events
//! hyprfeed workspace <id>        switch workspace
//! hyprfeed volume [<pct>]        print or set the default sink volume
//! hyprfeed brightness [<pct>]    print or set backlight brightness
//! hyprfeed wifi list|on|off      list networks or toggle iwd
//! hyprfeed bluetooth list|on|off list devices or toggle the controller
//! hyprfeed launch <command…>     run a shell command detached
//! hyprfeed filter [<query…>]     filter stdin lines (launcher search)
//! ```

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cli {
    Run,
    Events,
    Workspace(i32),
    Volume(Option<u32>),
    Brightness(Option<u32>),
    Wifi(Toggle),
    Bluetooth(Toggle),
    Launch(String),
    Filter(String),
    Help,
}

/// `list`, `on` or `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    List,
    On,
    Off,
}

/// Error from parsing the command line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{command}: missing argument <{what}>")]
    Missing {
        command: &'static str,
        what: &'static str,
    },
    #[error("{command}: invalid argument {value:?}")]
    Invalid {
        command: &'static str,
        value: String,
    },
}

pub const USAGE: &str = "\
usage: hyprfeed [run]
       hyprfeed events
       hyprfeed workspace <id>
       hyprfeed volume [<percent>]
       hyprfeed brightness [<percent>]
       hyprfeed wifi list|on|off
       hyprfeed bluetooth list|on|off
       hyprfeed launch <command...>
       hyprfeed filter [<query...>]";

fn number<T: std::str::FromStr>(command: &'static str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Invalid {
        command,
        value: value.to_string(),
    })
}

fn toggle(command: &'static str, value: Option<&str>) -> Result<Toggle, CliError> {
    match value {
        None | Some("list") => Ok(Toggle::List),
        Some("on") => Ok(Toggle::On),
        Some("off") => Ok(Toggle::Off),
        Some(other) => Err(CliError::Invalid {
            command,
            value: other.to_string(),
        }),
    }
}

/// Parse arguments, excluding the program name.
pub fn parse<I, S>(args: I) -> Result<Cli, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let rest = args.get(1..).unwrap_or_default();
    let first_rest = rest.first().map(String::as_str);

    match args.first().map(String::as_str) {
        None | Some("run") => Ok(Cli::Run),
        Some("-h") | Some("--help") | Some("help") => Ok(Cli::Help),
        Some("events") => Ok(Cli::Events),
        Some("workspace") => {
            let id = first_rest.ok_or(CliError::Missing {
                command: "workspace",
                what: "id",
            })?;
            Ok(Cli::Workspace(number("workspace", id)?))
        }
        Some("volume") => Ok(Cli::Volume(
            first_rest.map(|v| number("volume", v)).transpose()?,
        )),
        Some("brightness") => Ok(Cli::Brightness(
            first_rest.map(|v| number("brightness", v)).transpose()?,
        )),
        Some("wifi") => Ok(Cli::Wifi(toggle("wifi", first_rest)?)),
        Some("bluetooth") => Ok(Cli::Bluetooth(toggle("bluetooth", first_rest)?)),
        Some("launch") => {
            if rest.is_empty() {
                return Err(CliError::Missing {
                    command: "launch",
                    what: "command",
                });
            }
            Ok(Cli::Launch(rest.join(" ")))
        }
        Some("filter") => Ok(Cli::Filter(rest.join(" "))),
        Some(other) => Err(CliError::UnknownCommand(other.to_string())),
    }
}
