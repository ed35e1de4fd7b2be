//! Entry point for the **hyprfeed** binary.
//!
//! The default command starts the compositor and audio event bridges on
//! background threads and runs the status feed on the main thread.
//! Bridge observers never touch the feed directly: they post tasks into
//! the main thread's [`MainQueue`] via [`marshal`], and the main loop
//! drains that queue between timer-driven polls.
//!
//! The remaining commands are one-shot wrappers around the same
//! collaborators (workspace switch, volume, brightness, Wi-Fi, Bluetooth,
//! launcher, search filter).

use hyprfeed::bridge::EventBridge;
use hyprfeed::cli::{self, Cli, Toggle};
use hyprfeed::config::{config_dir, Config};
use hyprfeed::dispatch::{marshal, Dispatcher, MainQueue};
use hyprfeed::hyprland::ctl::Hyprctl;
use hyprfeed::hyprland::events::Socket2Transport;
use hyprfeed::process::CommandTransport;
use hyprfeed::status::StatusFeed;
use hyprfeed::tools::audio::{self, Pactl};
use hyprfeed::tools::brightness::Brightnessctl;
use hyprfeed::tools::{launcher, menu, network, ToolError};
use hyprfeed::traits::{Compositor, Mixer};
use log::{error, info, warn};
use std::io::{BufRead, Write};
use std::time::Instant;

/// Try to load the config from `$XDG_CONFIG_HOME/hyprfeed/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn hyprctl(config: &Config) -> Hyprctl {
    match &config.hyprland.command_socket {
        Some(path) => Hyprctl::at(path),
        None => Hyprctl::new(),
    }
}

fn event_transport(config: &Config) -> Socket2Transport {
    match &config.hyprland.event_socket {
        Some(path) => Socket2Transport::at(path),
        None => Socket2Transport::from_env(),
    }
}

/// Print one line to stdout.  Returns `false` once stdout is gone.
fn print_line(line: &str) -> bool {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", line).and_then(|_| out.flush()).is_ok()
}

//  Main

fn main() {
    env_logger::init();

    let command = match cli::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n{}", e, cli::USAGE);
            std::process::exit(2);
        }
    };
    let config = load_config();

    let result = match command {
        Cli::Run => {
            run_feed(config);
            Ok(())
        }
        Cli::Events => {
            run_events(config);
            Ok(())
        }
        Cli::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        other => run_oneshot(other, &config),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

//  Status feed

type Feed = StatusFeed<Hyprctl, Pactl>;

/// State owned by the main thread and handed to every queued task.
struct App {
    feed: Feed,
    running: bool,
}

impl App {
    fn emit(&mut self) {
        match self.feed.render() {
            Ok(line) => {
                if !print_line(&line) {
                    info!("stdout closed, exiting");
                    self.running = false;
                }
            }
            Err(e) => error!("failed to render status: {}", e),
        }
    }
}

fn run_feed(config: Config) {
    let feed = StatusFeed::new(hyprctl(&config), Pactl::new(), config.feed.clone());
    let mut app = App {
        feed,
        running: true,
    };
    let (mut queue, dispatcher) = MainQueue::<App>::new();

    // Compositor events: required.
    let hyprland = EventBridge::new("hyprland");
    hyprland.register_observer(marshal(&dispatcher, |app: &mut App, record| {
        if app.feed.on_compositor_event(&record) {
            app.emit();
        }
    }));
    {
        let dispatcher = dispatcher.clone();
        hyprland.on_disconnect(move |end| {
            warn!("{}: event stream ended after {} lines", end.bridge, end.lines);
            dispatcher.post(Box::new(|app: &mut App| app.running = false));
        });
    }
    let _hyprland = match hyprland.start(event_transport(&config)) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}: cannot listen for compositor events: {}", hyprland.name(), e);
            std::process::exit(1);
        }
    };

    // Audio events: optional; without them the volume is only read once.
    let _audio = if config.audio.enabled {
        let audio = EventBridge::new("audio");
        audio.register_observer(marshal(&dispatcher, |app: &mut App, record| {
            if app.feed.on_audio_event(&record) {
                app.emit();
            }
        }));
        let transport = config
            .audio
            .subscribe_command
            .as_deref()
            .and_then(CommandTransport::from_argv)
            .unwrap_or_else(audio::subscription);
        match audio.start(transport) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("{}: events unavailable, volume will not update: {}", audio.name(), e);
                None
            }
        }
    } else {
        None
    };
    drop(dispatcher);

    app.feed.refresh_all();
    app.emit();

    let interval = config.feed.poll_interval();
    let mut next_poll = Instant::now() + interval;
    info!("hyprfeed running");
    // Bridges hold their observers, and so a dispatcher each, for the life
    // of the process: the queue never disconnects. The compositor
    // disconnect hook is what clears `running`.
    while app.running {
        let timeout = next_poll.saturating_duration_since(Instant::now());
        let _ = queue.run_for(&mut app, timeout);
        if Instant::now() >= next_poll {
            if app.feed.poll() {
                app.emit();
            }
            next_poll = Instant::now() + interval;
        }
    }
}

//  Raw events

fn run_events(config: Config) {
    let bridge = EventBridge::new("hyprland");
    bridge.register(|record| {
        if !print_line(record.as_str()) {
            std::process::exit(0);
        }
    });
    match bridge.start(event_transport(&config)) {
        Ok(handle) => {
            let end = handle.join();
            info!("{}: event stream ended after {} lines", end.bridge, end.lines);
        }
        Err(e) => {
            error!("{}: cannot listen for compositor events: {}", bridge.name(), e);
            std::process::exit(1);
        }
    }
}

//  One-shot commands

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Hyprland(#[from] hyprfeed::hyprland::ctl::HyprctlError),
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
}

fn run_oneshot(command: Cli, config: &Config) -> Result<(), CommandError> {
    match command {
        Cli::Workspace(id) => hyprctl(config).switch_workspace(id)?,
        Cli::Volume(None) => println!("{}", Pactl::new().volume()?),
        Cli::Volume(Some(pct)) => Pactl::new().set_volume(pct)?,
        Cli::Brightness(level) => {
            let ctl = match &config.brightness.device {
                Some(device) => Brightnessctl::with_device(device.clone()),
                None => Brightnessctl::new(),
            };
            match level {
                Some(pct) => ctl.set(pct)?,
                None => println!("{}", ctl.get()?),
            }
        }
        Cli::Wifi(Toggle::List) => {
            for ssid in network::wifi_networks(&config.network.wifi_interface)? {
                println!("{}", ssid);
            }
        }
        Cli::Wifi(toggle) => network::set_wifi(toggle == Toggle::On)?,
        Cli::Bluetooth(Toggle::List) => {
            for device in network::bluetooth_devices()? {
                println!("{}\t{}", device.address, device.name);
            }
        }
        Cli::Bluetooth(toggle) => network::set_bluetooth(toggle == Toggle::On)?,
        Cli::Launch(command) => {
            let pid = launcher::spawn(&command)?;
            info!("launched pid {}", pid);
        }
        Cli::Filter(query) => {
            let items = std::io::stdin()
                .lock()
                .lines()
                .collect::<Result<Vec<String>, _>>()?;
            for item in menu::filter(&items, &query) {
                if !print_line(item) {
                    break;
                }
            }
        }
        Cli::Run | Cli::Events | Cli::Help => {}
    }
    Ok(())
}
