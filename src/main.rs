use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use oneinbox::app::App;
use oneinbox::commands;
use oneinbox::config::Config;
use oneinbox::feeds::inbox::HttpInbox;
use oneinbox::feeds::{InboxApi, Platform};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "oneinbox",
    version,
    about = "Live console for the OneInBox customer-service demo"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides server.base_url
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Only poll; never ask the backend to generate demo messages
    #[arg(long)]
    no_auto_generate: bool,

    /// How many recent messages the feed shows
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    window: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message as a customer
    Send {
        /// whatsapp, instagram or facebook
        #[arg(short, long, default_value = "whatsapp")]
        platform: Platform,
        /// Customer name shown on the card
        #[arg(long)]
        customer: Option<String>,
        text: String,
    },
    /// Delete every message on the backend
    Clear {
        /// Required; without it nothing is deleted
        #[arg(long)]
        yes: bool,
    },
    /// Print the current counters
    Stats,
    /// Print the most recent messages
    Messages {
        #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    if cli.no_auto_generate {
        config.refresh.auto_generate = false;
    }
    if let Some(window) = cli.window {
        config.feed.window = usize::try_from(window).context("--window is too large")?;
    }
    config.validate()?;

    init_logging(&config.log_file());
    info!("backend: {}", config.base_url());

    let inbox = HttpInbox::new(config.base_url(), config.server.request_timeout());
    let mut stdout = io::stdout();

    match cli.command {
        Some(Command::Send {
            platform,
            customer,
            text,
        }) => {
            let customer = customer.unwrap_or_else(|| config.feed.customer_name.clone());
            commands::send(&inbox, platform, &customer, &text, &mut stdout).await
        }
        Some(Command::Clear { yes }) => commands::clear(&inbox, yes, &mut stdout).await,
        Some(Command::Stats) => commands::stats(&inbox, &mut stdout).await,
        Some(Command::Messages { limit }) => {
            let limit = usize::try_from(limit).context("--limit is too large")?;
            commands::messages(&inbox, limit, &mut stdout).await
        }
        None => run_dashboard(&config, Arc::new(inbox)).await,
    }
}

/// Logs go to a file; the terminal belongs to the dashboard.
fn init_logging(path: &Path) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,oneinbox=debug"));

    let file = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));

    match file {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(_) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

/// Raw mode and the alternate screen, undone on drop whichever way the
/// dashboard exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
    }
}

async fn run_dashboard(config: &Config, api: Arc<dyn InboxApi>) -> Result<()> {
    let mut app = App::new(config, api);

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    app.run(&mut terminal).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_guard_leaves_cooked_mode() {
        // Without a tty `enter` fails part-way; either way nothing stays raw.
        drop(TerminalGuard::enter());
        assert!(!crossterm::terminal::is_raw_mode_enabled().unwrap_or(false));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(Cli::try_parse_from(["oneinbox", "messages", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["oneinbox", "--window", "0"]).is_err());
    }

    #[test]
    fn test_parse_overrides_and_subcommands() {
        let cli = Cli::try_parse_from([
            "oneinbox",
            "--server",
            "http://10.0.0.2:5000",
            "--window",
            "20",
            "messages",
            "-l",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.2:5000"));
        assert_eq!(cli.window, Some(20));
        assert!(matches!(cli.command, Some(Command::Messages { limit: 5 })));

        let cli = Cli::try_parse_from(["oneinbox", "send", "-p", "ig", "Hola"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Send { platform: Platform::Instagram, .. })
        ));

        let cli = Cli::try_parse_from(["oneinbox", "clear"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Clear { yes: false })));
    }
}
