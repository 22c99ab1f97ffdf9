//! Presence Lock CLI
//!
//! Locks the screen when you walk away and hides it when someone looks over
//! your shoulder.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use presence_lock::{
    bus::{open_i2c, parse_hex, BusError, FrameSource, ReplaySource, TimedSource},
    config::{ChecksumPolicy, Config},
    core::{classify, decode, verify_checksum},
    dispatch::ActionDispatcher,
    hid::{GadgetKeyboard, KeySender, LogOnlySender, Platform},
    transparency::{create_shared_log_with_persistence, read_persisted},
    AgentError, AgentSettings, PresenceAgent, PRIVACY_DECLARATION, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presence-lock")]
#[command(version = VERSION)]
#[command(about = "Lock or hide the screen based on a Person Sensor", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the sensor and send key chords
    Run {
        /// Host platform, which decides the key chords (windows, macos, popos)
        #[arg(long)]
        platform: Option<Platform>,

        /// I2C device the sensor is attached to
        #[arg(long)]
        device: Option<PathBuf>,

        /// Read frames from a hex capture file instead of the bus
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Start the capture over when it runs out
        #[arg(long, requires = "replay")]
        loop_replay: bool,

        /// HID gadget device used to send key chords
        #[arg(long)]
        hid_device: Option<PathBuf>,

        /// Log chords instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Checksum handling (ignore, warn, discard)
        #[arg(long)]
        checksum: Option<ChecksumPolicy>,
    },

    /// Pause a running agent
    Pause,

    /// Resume a paused agent
    Resume,

    /// Show configuration and cumulative statistics
    Status,

    /// Display privacy declaration
    Privacy,

    /// Decode one hex-encoded sensor result and classify it
    Decode {
        /// 39 bytes of hex, whitespace allowed
        #[arg(required = true)]
        hex: Vec<String>,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    let result = match cli.command {
        Commands::Run {
            platform,
            device,
            replay,
            loop_replay,
            hid_device,
            dry_run,
            checksum,
        } => cmd_run(
            &config_path,
            RunOverrides {
                platform,
                device,
                replay,
                loop_replay,
                hid_device,
                dry_run,
                checksum,
            },
        ),
        Commands::Pause => cmd_set_paused(&config_path, true),
        Commands::Resume => cmd_set_paused(&config_path, false),
        Commands::Status => cmd_status(&config_path),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Decode { hex } => cmd_decode(&config_path, &hex.join(" ")),
        Commands::Config => cmd_config(&config_path),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

/// Command-line settings that take precedence over the config file.
struct RunOverrides {
    platform: Option<Platform>,
    device: Option<PathBuf>,
    replay: Option<PathBuf>,
    loop_replay: bool,
    hid_device: Option<PathBuf>,
    dry_run: bool,
    checksum: Option<ChecksumPolicy>,
}

fn cmd_run(config_path: &Path, overrides: RunOverrides) -> Result<()> {
    let mut config = Config::load_from(config_path).context("loading configuration")?;
    if let Some(platform) = overrides.platform {
        config.platform = platform;
    }
    if let Some(device) = overrides.device {
        config.bus.device = device;
    }
    if let Some(hid_device) = overrides.hid_device {
        config.hid_device = hid_device;
    }
    if let Some(checksum) = overrides.checksum {
        config.checksum_policy = checksum;
    }
    config.validate()?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create data directory: {e}");
    }

    let thresholds = config.presence_thresholds()?;
    println!("Presence Lock v{VERSION}");
    println!();
    println!("  Platform: {:?}", config.platform);
    println!(
        "  Lock chord: {} after {} polls without you",
        config.platform.lock_chord(),
        thresholds.main_face_timeout_count
    );
    println!(
        "  Minimize chord: {} after {} polls with an onlooker",
        config.platform.minimize_chord(),
        thresholds.lookie_loo_timeout_count
    );
    println!("  Poll interval: {} ms", config.poll_interval.as_millis());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let source: Box<dyn FrameSource + Send> = match overrides.replay {
        Some(ref path) => {
            let replay = ReplaySource::from_path(path, overrides.loop_replay)?;
            tracing::info!(frames = replay.len(), path = %path.display(), "Replaying capture");
            Box::new(replay)
        }
        None => Box::new(open_i2c(&config.bus.device, config.bus.address)?),
    };
    let source = TimedSource::spawn(source, config.read_timeout)?;

    let sender: Box<dyn KeySender> = if overrides.dry_run {
        Box::new(LogOnlySender::new())
    } else {
        Box::new(GadgetKeyboard::open(&config.hid_device)?)
    };

    let transparency_log = create_shared_log_with_persistence(config.stats_path());
    let mut agent = PresenceAgent::new(
        source,
        ActionDispatcher::new(sender, config.platform),
        AgentSettings::from_config(&config)?,
        transparency_log.clone(),
    );

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    // Support pause/resume from another process by polling the config file.
    let mut paused = config.paused;
    let mut last_config_check = Instant::now();
    if paused {
        println!("Agent is currently paused.");
        println!("Run `presence-lock resume` to start watching.");
        println!();
    }

    let mut outcome = Ok(());
    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load_from(config_path) {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    if paused {
                        tracing::info!("Pausing");
                    } else {
                        tracing::info!("Resuming");
                        agent.reset();
                    }
                }
            }
            last_config_check = Instant::now();
        }

        if paused {
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        match agent.tick() {
            Ok(_) => {}
            Err(AgentError::Bus(BusError::Exhausted)) => {
                tracing::info!("Replay finished");
                break;
            }
            Err(e) => {
                outcome = Err(anyhow::Error::new(e).context("sensor polling stopped"));
                break;
            }
        }

        thread::sleep(config.poll_interval);
    }

    println!();
    println!("Stopping...");
    if let Err(e) = transparency_log.save() {
        tracing::warn!("Could not save statistics: {e}");
    }
    println!();
    println!("{}", transparency_log.summary());

    outcome
}

fn cmd_set_paused(config_path: &Path, paused: bool) -> Result<()> {
    Config::set_paused(config_path, paused)
        .with_context(|| format!("updating {}", config_path.display()))?;
    if paused {
        println!("Agent paused. Use 'presence-lock resume' to continue.");
    } else {
        println!("Agent resumed.");
    }
    Ok(())
}

fn cmd_status(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path).context("loading configuration")?;
    let thresholds = config.presence_thresholds()?;

    println!("Presence Lock Status");
    println!("====================");
    println!();
    println!("Configuration:");
    println!("  Platform: {:?}", config.platform);
    println!(
        "  Sensor: {} at {:#04x}",
        config.bus.device.display(),
        config.bus.address
    );
    println!("  HID device: {}", config.hid_device.display());
    println!("  Poll interval: {} ms", config.poll_interval.as_millis());
    println!(
        "  Lock after: {} ms ({} polls)",
        config.main_face_timeout.as_millis(),
        thresholds.main_face_timeout_count
    );
    println!(
        "  Minimize after: {} ms ({} polls)",
        config.lookie_loo_timeout.as_millis(),
        thresholds.lookie_loo_timeout_count
    );
    println!("  Checksum policy: {:?}", config.checksum_policy);
    println!("  Paused: {}", config.paused);
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        match read_persisted(&stats_path) {
            Ok(stats) => {
                println!("Cumulative Statistics:");
                println!("  Frames polled: {}", stats.frames_polled);
                println!("  Frames with you in view: {}", stats.frames_with_main_face);
                println!("  Frames with an onlooker: {}", stats.frames_with_lookie_loo);
                println!("  Checksum mismatches: {}", stats.checksum_mismatches);
                println!("  Frames discarded: {}", stats.frames_discarded);
                println!("  Screen locks sent: {}", stats.locks_sent);
                println!("  Minimizes sent: {}", stats.minimizes_sent);
                println!("  Failed sends: {}", stats.dispatch_failures);
                println!("  Last updated: {}", stats.last_updated);
            }
            Err(e) => tracing::warn!("Could not read {}: {e}", stats_path.display()),
        }
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_decode(config_path: &Path, hex: &str) -> Result<()> {
    let config = Config::load_from(config_path).context("loading configuration")?;
    let raw = parse_hex(hex).map_err(anyhow::Error::msg)?;
    let frame = decode(&raw)?;
    let classification = classify(&frame, &config.classifier);
    let checksum = match verify_checksum(&raw) {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };

    let report = serde_json::json!({
        "frame": frame,
        "classification": classification,
        "checksum": checksum,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_config(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path).context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {config_path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
