//! Terminal front end: runs the slideshow and reads control commands from stdin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rust_slideshow::config::{FileSettingsStore, SettingsStore};
use rust_slideshow::control::{self, ControlInput};
use rust_slideshow::events::{SlideshowCommand, SlideshowEvent};
use rust_slideshow::metadata::FileMetadataReader;
use rust_slideshow::relocate::FsRelocator;
use rust_slideshow::tasks::{slideshow, watch};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch as watch_channel};
use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "slideshow", version, about = "Folder slideshow with metadata search")]
struct Args {
    /// Folder (or single image) to show; defaults to the saved source folder
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Settings file (.json, or .yaml/.yml)
    #[arg(short, long, value_name = "FILE", default_value = "slideshow_config.json")]
    settings: PathBuf,

    /// Set the slide interval (ms); the value is saved to the settings file
    #[arg(long, value_name = "MILLIS")]
    interval_ms: Option<u64>,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Deterministic seed for random sort order
    #[arg(long, value_name = "SEED")]
    shuffle_seed: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("rust_slideshow={level},slideshow={level}")))
        .context("building log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let store = FileSettingsStore::new(&args.settings);
    info!(settings = %store.path().display(), "using settings file");
    let saved_source = store.load().source;

    let mut orchestrator = slideshow::SlideshowOrchestrator::new(
        Box::new(store),
        Box::new(FileMetadataReader),
        Box::new(FsRelocator),
    )
    .with_shuffle_seed(args.shuffle_seed);

    let now = Instant::now();
    if let Some(ms) = args.interval_ms {
        orchestrator
            .set_interval(ms, now)
            .with_context(|| format!("invalid --interval-ms {ms}"))?;
    }

    let start_path = args.path.or(saved_source);
    let (mut orchestrator, opened) = task::spawn_blocking(move || {
        let opened = match start_path.as_deref() {
            Some(path) if path.is_dir() => Some(orchestrator.open_folder(path)),
            Some(path) => Some(orchestrator.open_file(path)),
            None => None,
        };
        (orchestrator, opened)
    })
    .await
    .context("opening start path")?;
    match opened {
        Some(Ok(count)) => info!(count, "start path opened"),
        Some(Err(err)) => warn!("{err}; use 'open <path>' to pick another folder"),
        None => println!("no folder given and no saved source folder; use 'open <path>'"),
    }
    if args.paused {
        orchestrator.set_paused(true, now);
    }
    let initial_folder = orchestrator.navigation().collection().folder().map(PathBuf::from);

    let cancel = CancellationToken::new();
    let (cmd_tx, cmd_rx) = mpsc::channel::<SlideshowCommand>(64);
    let (event_tx, mut event_rx) = mpsc::channel::<SlideshowEvent>(64);
    let (folder_tx, folder_rx) = watch_channel::channel::<Option<PathBuf>>(initial_folder);

    let mut tasks = JoinSet::new();
    tasks.spawn(slideshow::run(orchestrator, cmd_rx, event_tx, cancel.clone()));
    tasks.spawn(watch::run(folder_rx, cmd_tx.clone(), cancel.clone()));

    {
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received; shutting down");
            cancel.cancel();
            Ok::<(), anyhow::Error>(())
        });
    }

    cmd_tx.send(SlideshowCommand::Start).await.ok();
    println!("{}", control::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            maybe_event = event_rx.recv() => match maybe_event {
                Some(SlideshowEvent::FolderOpened(folder)) => {
                    println!("folder: {}", folder.display());
                    let _ = folder_tx.send(Some(folder));
                }
                Some(SlideshowEvent::SessionEnded) | None => {
                    println!("no images left");
                    cancel.cancel();
                    break;
                }
                Some(event) => print_event(&event),
            },

            line = lines.next_line() => match line {
                Ok(Some(line)) => match control::parse_line(&line) {
                    Ok(Some(ControlInput::Command(cmd))) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(ControlInput::Help)) => println!("{}", control::HELP),
                    Ok(Some(ControlInput::Quit)) => {
                        cancel.cancel();
                        break;
                    }
                    Ok(None) => {}
                    Err(msg) => println!("{msg}"),
                },
                Ok(None) => {
                    info!("stdin closed; shutting down");
                    cancel.cancel();
                    break;
                }
                Err(err) => {
                    warn!("stdin error: {err}");
                    cancel.cancel();
                    break;
                }
            },
        }
    }

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("task failed: {err:#}"),
            Err(err) => warn!("task panicked: {err}"),
        }
    }
    Ok(())
}

fn print_event(event: &SlideshowEvent) {
    match event {
        SlideshowEvent::Display(item) => {
            println!(
                "[{} / {}] {}",
                item.position,
                item.total,
                item.path.display()
            );
            if !item.text.is_empty() {
                println!("{}", highlight(&item.text, &item.highlights));
            }
        }
        SlideshowEvent::Feedback(msg) => println!("» {msg}"),
        SlideshowEvent::ConfirmDelete(path) => println!(
            "move {} to the trash? type 'delete yes' to confirm",
            path.display()
        ),
        SlideshowEvent::Empty => println!("0 / 0"),
        SlideshowEvent::FolderOpened(_) | SlideshowEvent::SessionEnded => {}
    }
}

/// Wrap highlighted ranges in brackets for terminal output.
fn highlight(text: &str, ranges: &[std::ops::Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len() + ranges.len() * 2);
    let mut pos = 0;
    for r in ranges {
        if r.start < pos {
            continue;
        }
        out.push_str(&text[pos..r.start]);
        out.push('[');
        out.push_str(&text[r.clone()]);
        out.push(']');
        pos = r.end;
    }
    out.push_str(&text[pos..]);
    out
}
