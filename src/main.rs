use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::process::Command;

use melodora::cli::{Cli, Commands};
use melodora::core::keep_alive;
use melodora::core::process::run_with_timeout;
use melodora::core::{config, init_logger, logging::log_backend_configuration};
use melodora::download::{spawn_sweeper, AudioQuality, Backends};
use melodora::telegram::{create_bot, schema, setup_bot_commands, Controller, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, backend selection, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from spawned tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Search { query, limit, json }) => run_cli_search(query, limit, json).await,
        Some(Commands::Download { id, quality, output }) => run_cli_download(id, quality, output).await,
        Some(Commands::CheckTools) => run_check_tools().await,
    }
}

/// Prints search candidates of the configured backend
async fn run_cli_search(query: String, limit: usize, json: bool) -> Result<()> {
    let backends = Backends::from_config()?;
    let tracks = backends.search.search(query.trim(), limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    if tracks.is_empty() {
        println!("Nothing found for '{}'", query);
        return Ok(());
    }
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>2}. [{}] {} ({})", i + 1, track.id, track.title, track.duration);
    }
    Ok(())
}

/// Downloads one track to disk
async fn run_cli_download(id: String, quality: Option<AudioQuality>, output: Option<String>) -> Result<()> {
    let backends = Backends::from_config()?;
    let quality = quality.unwrap_or_else(AudioQuality::configured_default);

    log::info!("Downloading {} at {} via {}", id, quality, backends.download.name());
    let payload = backends
        .download
        .download(&id, quality)
        .await
        .ok_or_else(|| anyhow::anyhow!("Download of '{}' failed, see the log for details", id))?;

    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&payload.filename));
    tokio::fs::write(&path, &payload.bytes).await?;

    println!(
        "✅ Saved {} - {} ({} bytes) to {}",
        payload.artist,
        payload.title,
        payload.bytes.len(),
        path.display()
    );
    Ok(())
}

/// Runs `--version` on every external tool the yt-dlp backend needs
async fn run_check_tools() -> Result<()> {
    let tools = [
        ("yt-dlp", config::YTDL_BIN.as_str(), "--version"),
        ("ffmpeg", config::FFMPEG_BIN.as_str(), "-version"),
        ("ffprobe", config::FFPROBE_BIN.as_str(), "-version"),
    ];

    let mut missing = Vec::new();
    for (tool, bin, flag) in tools {
        let mut cmd = Command::new(bin);
        cmd.arg(flag);
        match run_with_timeout(&mut cmd, Duration::from_secs(15), tool).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                println!("✅ {}: {}", tool, version.lines().next().unwrap_or("unknown").trim());
            }
            Ok(output) => {
                println!("❌ {} ({}) exited with {}", tool, bin, output.status);
                missing.push(tool);
            }
            Err(e) => {
                println!("❌ {} ({}): {}", tool, bin, e);
                missing.push(tool);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Unavailable tools: {}", missing.join(", ")))
    }
}

async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    log_backend_configuration();

    let backends = Backends::from_config()?;
    let bot = create_bot()?;

    let controller = Controller::new(backends);

    // Background maintenance
    spawn_sweeper(
        PathBuf::from(config::TEMP_FILES_DIR.as_str()),
        config::cleanup::retention(),
        config::cleanup::sweep_interval(),
    );
    controller
        .sessions()
        .spawn_purge_task(config::session::purge_interval());

    if let Some(port) = *config::keep_alive::PORT {
        tokio::spawn(async move {
            if let Err(e) = keep_alive::start_keep_alive_server(port).await {
                log::error!("Keep-alive server stopped: {}", e);
            }
        });
        if let Some(url) = config::keep_alive::SELF_PING_URL.clone() {
            keep_alive::spawn_self_ping(url, config::keep_alive::self_ping_interval());
        }
    } else {
        log::info!("KEEP_ALIVE_PORT not set, keep-alive server disabled");
    }

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let handler = schema(HandlerDeps::new(controller));

    log::info!("================================================");
    log::info!(
        "🎉 Bot initialization complete in {:.2}s",
        bot_init_start.elapsed().as_secs_f64()
    );
    log::info!("📡 Ready to receive updates!");
    log::info!("================================================");

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
