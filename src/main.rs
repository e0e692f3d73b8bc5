use anyhow::{Context, Result};
use apple_music::AppleMusic;
use clap::Parser;
use music_scrobbler::config::Config;
use music_scrobbler::event_loop::{self, LoopMessage};
use music_scrobbler::listener;
use music_scrobbler::media_monitor::MediaMonitor;
use music_scrobbler::scrobbler::Services;
use music_scrobbler::text_cleanup::TextCleaner;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

/// Scrobble what the macOS Music player plays to Last.fm and ListenBrainz
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to music_scrobbler.conf in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Read player notifications from standard input, one JSON object per line
    #[arg(long)]
    stdin: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let write_style = if atty::is(atty::Stream::Stderr) {
        env_logger::WriteStyle::Auto
    } else {
        env_logger::WriteStyle::Never
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .write_style(write_style)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let services = Services::from_config(&config)?;
    if services.is_empty() {
        log::warn!("Nothing will be scrobbled until a service is enabled in the config file");
    }

    let player = AppleMusic::new(config.player_app.clone());
    let (tx, rx) = mpsc::channel();

    let mut monitor = MediaMonitor::new(
        player,
        services,
        event_loop::loop_timer(tx.clone()),
        TextCleaner::new(&config.cleanup),
    )
    .with_length_probe_delay(Duration::from_secs(config.length_probe_delay));

    start_listener(&args, tx)?;

    event_loop::run(&mut monitor, rx);
    Ok(())
}

fn start_listener(args: &Args, tx: Sender<LoopMessage>) -> Result<()> {
    if args.stdin {
        listener::spawn_stdin_listener(tx);
        return Ok(());
    }

    #[cfg(target_os = "macos")]
    {
        listener::spawn_notification_listener(tx);
        log::info!("Listening for {:?}", listener::NOTIFICATION_NAMES);
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    {
        drop(tx);
        anyhow::bail!("Player notifications are only available on macOS; use --stdin to replay them")
    }
}
