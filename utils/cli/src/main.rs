use std::path::{Path, PathBuf};

use anyhow::Context;
use blastoff_cli::{run_daemon, DaemonConfig};
use blastoff_network::{Client, SwitchBridge};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

/// Saturn V stand flame animation
///
/// Runs the LED strip animation service and controls it via the local control socket.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = false)]
struct Cli {
    /// Control socket path
    #[arg(short, long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,
    /// Actual command
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the animation service
    Daemon {
        /// Configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Global strip brightness
        #[arg(short, long)]
        brightness: Option<u8>,
        /// The number of LEDs in the strip
        #[arg(short, long = "led-count")]
        led_count: Option<u16>,
    },
    /// Start the animation
    Start,
    /// Stop the animation and blank the strip
    Stop,
    /// Print whether the animation is running
    Status,
    /// Print animation state changes as they happen
    Watch,
    /// Turn the stand switch on or off
    Switch {
        #[arg(value_enum)]
        state: SwitchState,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate the completions for
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
enum SwitchState {
    On,
    Off,
}

fn state_name(running: bool) -> &'static str {
    if running {
        "running"
    } else {
        "stopped"
    }
}

async fn connect(path: &Path) -> anyhow::Result<Client> {
    Client::connect(path)
        .await
        .with_context(|| format!("Unable to connect to {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let socket = cli
        .socket
        .clone()
        .unwrap_or_else(|| DaemonConfig::default().socket);

    match cli.command {
        Command::Daemon {
            config,
            brightness,
            led_count,
        } => {
            let mut daemon_config = match config {
                Some(path) => DaemonConfig::from_file(&path)?,
                None => DaemonConfig::default(),
            };
            if let Some(brightness) = brightness {
                daemon_config.strip.brightness = brightness;
            }
            if let Some(led_count) = led_count {
                daemon_config.strip.led_count = led_count;
            }
            if let Some(socket) = cli.socket {
                daemon_config.socket = socket;
            }

            log::debug!("Using {daemon_config:?}");
            run_daemon(daemon_config).await?;
        }
        Command::Start => {
            log::info!("Sending start request to {}", socket.display());
            connect(&socket).await?.start().await?;
        }
        Command::Stop => {
            log::info!("Sending stop request to {}", socket.display());
            connect(&socket).await?.stop().await?;
        }
        Command::Status => {
            let running = connect(&socket).await?.is_started().await?;
            println!("{}", state_name(running));
        }
        Command::Watch => {
            let mut subscription = connect(&socket).await?.subscribe().await?;
            println!("{}", state_name(subscription.is_started()));
            loop {
                let running = subscription.next_state().await?;
                println!("{}", state_name(running));
            }
        }
        Command::Switch { state } => {
            let mut switch = SwitchBridge::new(connect(&socket).await?);
            switch.set_on(state == SwitchState::On).await?;
            log::trace!("Switch is {}", state_name(switch.is_on().await?));
        }
        Command::Completions { shell } => {
            shell.generate(&mut Cli::command(), &mut std::io::stdout());
        }
    }

    Ok(())
}
