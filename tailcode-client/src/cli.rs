use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tailcode_shared::config::Config;
use tailcode_shared::device::Device;
use tracing::warn;

use crate::config;
use crate::discover::{self, DiscoveredDevice};
use crate::notify::{DEFAULT_TITLE, Notifier, Notify, notify};
use crate::ssh::{self, REACHABLE_TIMEOUT, RemoteTransport, SshTransport};
use crate::tailscale::{self, Liveness, TailscaleCli};
use crate::util::format::{cyan, dim, green, online_badge, red, render_table, yellow, yes_no};
use crate::util::logging::init_tracing;
use crate::util::polling::{WaitConfig, wait_for};
use crate::webhook;
use crate::wol::{Broadcaster, UdpBroadcaster, Waker};

#[derive(Parser)]
#[command(name = "tc")]
#[command(version, about = "Connect to any device on your tailnet, waking it first if needed", long_about = None)]
struct Cli {
    /// Config file (defaults to ./config/config.yaml, ./config.yaml, then the user config dir)
    #[arg(long, global = true, env = "TAILCODE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all devices and their online status
    Status,

    /// Send Wake-on-LAN to a device
    Wake {
        /// Device to wake
        device: String,
    },

    /// Open a terminal session on a device, waking it if needed
    Connect {
        /// Device to connect to (defaults to preferences.default_device)
        device: Option<String>,

        /// Don't attach the tmux session
        #[arg(short, long)]
        no_session: bool,

        /// Fail instead of waking an offline device
        #[arg(short = 'W', long)]
        no_wake: bool,
    },

    /// Connect to a device and launch the coding assistant
    Ai {
        /// Device to connect to (defaults to preferences.default_device)
        device: Option<String>,

        /// Project directory to cd into first
        #[arg(short, long)]
        project: Option<String>,

        /// Fail instead of waking an offline device
        #[arg(short = 'W', long)]
        no_wake: bool,
    },

    /// Run a single command on a device
    Run {
        device: String,
        command: String,
    },

    /// Send a push notification
    Notify {
        message: String,

        #[arg(short, long, default_value = DEFAULT_TITLE)]
        title: String,
    },

    /// Start the webhook server for phone shortcuts
    Serve {
        #[arg(short, long, default_value_t = webhook::DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value = webhook::DEFAULT_HOST)]
        host: String,

        /// Bearer token required on POST routes
        #[arg(long, env = "TAILCODE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Discover devices from Tailscale and generate a config
    Discover {
        /// SSH user for servers
        #[arg(short, long, default_value = "")]
        user: String,

        /// Where to write the config (defaults to the user config dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only list the discovered devices
        #[arg(short, long)]
        show: bool,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

/// Parse the command line, run it, and return the process exit code.
pub async fn cli() -> Result<i32> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { .. } => init_tracing("info"),
        _ => init_tracing("warn"),
    }

    let load = || config::load(cli.config.as_deref());

    match cli.command {
        Commands::Status => status(&load()?).await,
        Commands::Wake { device } => {
            let config = load()?;
            let device = find_device(&config, &device)?;
            let system = SystemBackends::new(&config);
            wake(&config, &system.backends(), device).await
        }
        Commands::Connect {
            device,
            no_session,
            no_wake,
        } => {
            let config = load()?;
            let device = resolve_device(&config, device.as_deref())?;
            let system = SystemBackends::new(&config);
            let backends = system.backends();
            let wait = WaitConfig::default();
            if let Some(code) = ensure_online(&config, &backends, device, !no_wake, wait).await? {
                return Ok(code);
            }
            println!("Connecting to {}...", cyan(&device.name));
            ssh::ssh_connect(device, &config.ssh, None, !no_session).await
        }
        Commands::Ai {
            device,
            project,
            no_wake,
        } => {
            let config = load()?;
            let device = resolve_device(&config, device.as_deref())?;
            let system = SystemBackends::new(&config);
            let backends = system.backends();
            let wait = WaitConfig::default();
            if let Some(code) = ensure_online(&config, &backends, device, !no_wake, wait).await? {
                return Ok(code);
            }
            println!("Connecting to {} + Claude Code...", cyan(&device.name));
            let command = assistant_command(project.as_deref());
            ssh::ssh_connect(device, &config.ssh, Some(&command), true).await
        }
        Commands::Run { device, command } => {
            let config = load()?;
            let device = find_device(&config, &device)?;
            run(&config, device, &command).await
        }
        Commands::Notify { message, title } => {
            let config = load()?;
            let notifier = Notifier::from_config(&config.notifications)?;
            if notify(&notifier, &message, Some(&title)).await {
                println!("{}", green("Sent"));
                Ok(0)
            } else {
                println!("{}", red("Failed"));
                Ok(1)
            }
        }
        Commands::Serve { port, host, token } => {
            let config = load()?;
            println!("Webhook server on {}", cyan(&format!("{host}:{port}")));
            println!("POST /wake   {{\"device\": \"name\"}}");
            println!("POST /status");
            println!("POST /notify {{\"message\": \"text\"}}");
            println!("GET  /health");
            let token = token.filter(|t| !t.is_empty());
            webhook::serve(config, &host, port, token).await?;
            Ok(0)
        }
        Commands::Discover {
            user,
            output,
            show,
            force,
        } => discover_devices(&user, output, show, force).await,
        Commands::Version => {
            println!("tc version {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

fn find_device<'a>(config: &'a Config, name: &str) -> Result<&'a Device> {
    config
        .device(name)
        .with_context(|| format!("Device '{name}' not found"))
}

/// The named device, or the configured default when no name is given.
/// Client devices are refused.
fn resolve_device<'a>(config: &'a Config, name: Option<&str>) -> Result<&'a Device> {
    let device = match name {
        Some(name) => find_device(config, name)?,
        None => config
            .default_device()
            .context("No default device configured")?,
    };
    if !device.can_connect() {
        bail!("{} is a client device, can't connect to it", device.name);
    }
    Ok(device)
}

fn assistant_command(project: Option<&str>) -> String {
    match project {
        Some(dir) if !dir.is_empty() => format!("cd {dir} && claude"),
        _ => "claude".to_string(),
    }
}

async fn status_rows(config: &Config, liveness: &dyn Liveness) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(config.devices.len());
    for device in &config.devices {
        let online = liveness.is_online(&device.hostname).await;
        rows.push(vec![
            cyan(&device.name),
            dim(&device.hostname),
            device.role.to_string(),
            online_badge(online),
            yes_no(device.can_wake()),
        ]);
    }
    rows
}

async fn status(config: &Config) -> Result<i32> {
    let rows = status_rows(config, &TailscaleCli).await;
    println!(
        "{}",
        render_table("Devices", &["NAME", "HOST", "ROLE", "STATUS", "WOL"], &rows)
    );
    Ok(0)
}

/// Collaborators of the wake and connect flows.
struct Backends<'a> {
    liveness: &'a dyn Liveness,
    transport: &'a dyn RemoteTransport,
    broadcaster: &'a dyn Broadcaster,
    /// Set when `preferences.auto_wake` asks for a notification per wake.
    notifier: Option<&'a dyn Notify>,
}

/// Real SSH, UDP and notification backends built from the config.
struct SystemBackends {
    transport: SshTransport,
    broadcaster: UdpBroadcaster,
    notifier: Option<Notifier>,
}

impl SystemBackends {
    fn new(config: &Config) -> Self {
        let notifier = if config.preferences.auto_wake {
            Notifier::from_config(&config.notifications)
                .map_err(|e| warn!("Skipping wake notifications: {e}"))
                .ok()
        } else {
            None
        };
        Self {
            transport: SshTransport::from_config(&config.ssh),
            broadcaster: UdpBroadcaster::new(config.wol.broadcast.clone(), config.wol.port),
            notifier,
        }
    }

    fn backends(&self) -> Backends<'_> {
        Backends {
            liveness: &TailscaleCli,
            transport: &self.transport,
            broadcaster: &self.broadcaster,
            notifier: self.notifier.as_ref().map(|n| n as &dyn Notify),
        }
    }
}

/// Plan, print the path, deliver. Returns 1 when the wake failed.
async fn wake(config: &Config, backends: &Backends<'_>, device: &Device) -> Result<i32> {
    let waker = Waker::new(
        config,
        backends.liveness,
        backends.transport,
        backends.broadcaster,
    );

    let relay = match waker.plan(device).await {
        Ok(relay) => relay,
        Err(e) => {
            println!("{}", red(&e.to_string()));
            return Ok(1);
        }
    };
    match relay {
        Some(relay) => println!(
            "Waking {} via {}...",
            cyan(&device.name),
            dim(&relay.name)
        ),
        None => println!("Waking {} (local broadcast)...", cyan(&device.name)),
    }

    let result = waker.deliver(device, relay).await;
    if !result.success {
        let reason = result.error_message().unwrap_or_default();
        println!("{}", red(&format!("Failed: {reason}")));
        return Ok(1);
    }

    println!(
        "{} ({})",
        green("WoL sent"),
        result.method_tag().unwrap_or_default()
    );
    if let Some(notifier) = backends.notifier {
        notify(notifier, &format!("Waking {}", device.name), None).await;
    }
    Ok(0)
}

/// Make sure `device` is up before a session. `Some(code)` means stop
/// and exit with that code. A wake whose wait runs out still proceeds to
/// the session attempt.
async fn ensure_online(
    config: &Config,
    backends: &Backends<'_>,
    device: &Device,
    allow_wake: bool,
    wait: WaitConfig,
) -> Result<Option<i32>> {
    if backends.liveness.is_online(&device.hostname).await {
        return Ok(None);
    }
    if !allow_wake || !device.can_wake() {
        println!("{}", red(&format!("{} is offline", device.name)));
        return Ok(Some(1));
    }

    println!("{}", yellow(&format!("{} offline, waking...", device.name)));
    let code = wake(config, backends, device).await?;
    if code != 0 {
        return Ok(Some(code));
    }

    if !wait_until_reachable(backends.transport, device, wait).await {
        warn!("{} did not answer in time, trying to connect anyway", device.name);
    }
    Ok(None)
}

/// Poll `is_reachable` (each probe bounded by `REACHABLE_TIMEOUT`) with
/// progress dots until `wait` runs out.
async fn wait_until_reachable(
    transport: &dyn RemoteTransport,
    device: &Device,
    wait: WaitConfig,
) -> bool {
    print!("Waiting for {}...", cyan(&device.name));
    let _ = std::io::stdout().flush();

    let ready = wait_for(
        wait,
        move || ssh::is_reachable(transport, device, REACHABLE_TIMEOUT),
        || {
            print!(".");
            let _ = std::io::stdout().flush();
        },
    )
    .await;

    if ready {
        println!(" {}", green("ready"));
    } else {
        println!(" {}", red("timeout"));
    }
    ready
}

async fn run(config: &Config, device: &Device, command: &str) -> Result<i32> {
    let transport = SshTransport::from_config(&config.ssh);
    let timeout = Duration::from_secs(config.ssh.timeout_secs);
    let output = ssh::ssh_exec(&transport, device, command, timeout)
        .await
        .with_context(|| format!("Failed to run command on {}", device.name))?;

    if !output.stdout.is_empty() {
        print!("{}", output.stdout);
    }
    if !output.stderr.is_empty() {
        eprint!("{}", red(&output.stderr));
    }
    Ok(output.exit_code.unwrap_or(1))
}

fn discovered_rows(devices: &[DiscoveredDevice]) -> Vec<Vec<String>> {
    devices
        .iter()
        .map(|d| {
            vec![
                cyan(&d.hostname),
                d.name.clone(),
                d.os.clone(),
                online_badge(d.online),
                if d.is_self {
                    yellow("<- you")
                } else {
                    String::new()
                },
            ]
        })
        .collect()
}

async fn discover_devices(user: &str, output: Option<PathBuf>, show: bool, force: bool) -> Result<i32> {
    let status = tailscale::status()
        .await
        .context("No devices discovered. Is Tailscale running?")?;
    let devices = discover::discover(&status);
    if devices.is_empty() {
        println!("{}", red("No devices discovered. Is Tailscale running?"));
        return Ok(1);
    }

    if show {
        println!(
            "{}",
            render_table(
                "Discovered Devices",
                &["HOSTNAME", "NAME", "OS", "STATUS", "SELF"],
                &discovered_rows(&devices),
            )
        );
        return Ok(0);
    }

    let output = match output {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    if output.exists() && !force {
        println!(
            "{}",
            yellow(&format!(
                "Config exists: {} (use --force to overwrite)",
                output.display()
            ))
        );
        return Ok(1);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, discover::generate_config_yaml(&devices, user))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", green(&format!("Config written: {}", output.display())));
    println!("\nDiscovered {} devices", devices.len());
    println!(
        "\n{} Edit the config to add MAC addresses for Wake-on-LAN",
        yellow("Next:")
    );
    Ok(0)
}
