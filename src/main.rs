use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rover_firmware::config::RoverConfig;
use rover_firmware::runtime;

/// Rover command and telemetry runtime
#[derive(Parser, Debug)]
#[command(name = "rover-firmware", version)]
struct Cli {
    /// JSON config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port for commands (and telemetry unless --telemetry-port is set)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate for both serial links
    #[arg(short, long)]
    baud: Option<u32>,

    /// Separate serial port for telemetry
    #[arg(long)]
    telemetry_port: Option<String>,

    /// Main loop frequency
    #[arg(long)]
    loop_hz: Option<u64>,
}

impl Cli {
    /// File (or defaults) with command-line overrides applied
    fn load_config(&self) -> rover_firmware::Result<RoverConfig> {
        let mut config = match &self.config {
            Some(path) => RoverConfig::from_file(path)?,
            None => RoverConfig::default(),
        };

        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(port) = &self.telemetry_port {
            config.serial.telemetry_port = Some(port.clone());
        }
        if let Some(hz) = self.loop_hz {
            config.loop_hz = hz;
        }

        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = start(&cli).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn start(cli: &Cli) -> rover_firmware::Result<()> {
    let config = cli.load_config()?;
    runtime::run(config).await
}
