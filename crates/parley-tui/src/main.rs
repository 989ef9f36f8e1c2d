//! Parley terminal client entry point.

use std::{fs::File, path::PathBuf, sync::Mutex, time::Duration};

use clap::Parser;
use parley_core::{ClientConfig, EchoConfig, PresenceConfig};
use parley_tui::{Runtime, SystemEnv, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for Parley line chat servers")]
#[command(version)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file. The terminal belongs to the UI, so logging is
    /// off without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Delay before reconnecting after the connection drops
    #[arg(long, default_value = "3000")]
    reconnect_ms: u64,

    /// Wait for the first entry of an online list
    #[arg(long, default_value = "2000")]
    who_wait_ms: u64,

    /// Quiet period after the latest entry that ends an online list
    #[arg(long, default_value = "500")]
    who_entry_ms: u64,

    /// Upper bound on collecting one online list
    #[arg(long, default_value = "5000")]
    who_ceiling_ms: u64,

    /// How long a sent public message waits for its server echo
    #[arg(long, default_value = "8000")]
    echo_window_ms: u64,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            presence: PresenceConfig {
                initial_wait: Duration::from_millis(self.who_wait_ms),
                entry_wait: Duration::from_millis(self.who_entry_ms),
                ceiling: Duration::from_millis(self.who_ceiling_ms),
            },
            echo: EchoConfig { window: Duration::from_millis(self.echo_window_ms) },
            reconnect_delay: Duration::from_millis(self.reconnect_ms),
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        let file = File::create(path)?;
        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        tracing_subscriber::registry().with(layer).with(filter).init();
    }

    tracing::info!(server = %args.server, "parley starting");

    let driver = TerminalDriver::new()?;
    let runtime = Runtime::new(driver, SystemEnv::new(), args.client_config(), args.server);

    Ok(runtime.run().await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_client_defaults() {
        let args = Args::try_parse_from(["parley"]).unwrap();

        assert_eq!(args.server, "127.0.0.1:8888");
        assert_eq!(args.client_config(), ClientConfig::default());
    }

    #[test]
    fn timing_flags_reach_the_config() {
        let args = Args::try_parse_from([
            "parley",
            "--server",
            "chat.example:9000",
            "--who-wait-ms",
            "1500",
            "--who-ceiling-ms",
            "9000",
            "--reconnect-ms",
            "250",
        ])
        .unwrap();
        let config = args.client_config();

        assert_eq!(args.server, "chat.example:9000");
        assert_eq!(config.presence.initial_wait, Duration::from_millis(1500));
        assert_eq!(config.presence.ceiling, Duration::from_millis(9000));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.presence.entry_wait, Duration::from_millis(500));
    }
}
