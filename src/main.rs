// CuePipe - play media files one after another from the terminal
// Builds the playlist, hands each file to an external player and asks what
// to do with it afterwards

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cuepipe::actions::FileActions;
use cuepipe::cli::{inputs, Args, Session};
use cuepipe::config::Config;
use cuepipe::media::{ItemCatalog, SniffClassifier};
use cuepipe::player::MpvPlayer;
use cuepipe::playlist::PlaylistBuilder;
use std::path::Path;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CUEPIPE_LOG";

fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow!("setting up logging: {}", e))?;
        return Ok(None);
    };

    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = log_file
        .file_name()
        .with_context(|| format!("log file {} has no file name", log_file.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("setting up logging: {}", e))?;

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Dropping the guard flushes the log file
    let log_guard = init_logging(args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!("cuepipe starting up");

    let raw_paths = inputs::collect_paths(&args.files, args.textfile, config.playlist.directory_depth)?;
    let catalog = ItemCatalog::new(SniffClassifier::new())?;
    let builder = PlaylistBuilder::with_config(catalog, &config.playlist);
    let mut outcome = builder
        .build(&raw_paths, args.build_options())
        .context("building playlist")?;

    for diagnostic in &outcome.diagnostics {
        debug!("{}", diagnostic);
    }

    if !outcome.randomize && outcome.resume_index > outcome.items.len() {
        warn!(
            start = outcome.resume_index,
            len = outcome.items.len(),
            "start position past the end of the playlist"
        );
        println!(
            "Start position {} is past the end of the playlist ({} files), starting from the top",
            outcome.resume_index,
            outcome.items.len()
        );
        outcome.resume_index = 0;
    }
    let store = outcome.into_store(&mut rand::thread_rng())?;
    info!(files = store.len(), cursor = store.cursor(), "playlist ready");

    let player = MpvPlayer::new(&config.player, args.player_options());
    let actions = FileActions::new(config.actions.clone(), args.nodelete);
    let mut session = Session::new(store, player, actions, args.session_settings());

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = session.run(stdin) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!();
            // The blocking stdin read can't be cancelled, so don't wait for runtime shutdown.
            // exit() skips destructors; flush the log file first.
            drop(log_guard);
            std::process::exit(130);
        }
    }

    Ok(())
}
