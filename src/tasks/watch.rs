use std::path::PathBuf;

use anyhow::Result;
use notify::event::{ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::collection::{IMAGE_EXTENSIONS, is_supported_image};
use crate::events::SlideshowCommand;

/// Watches the active folder and reports image files that disappear.
///
/// `folder_rx` carries the folder currently shown; the watch follows it.
#[instrument(skip_all)]
pub async fn run(
    mut folder_rx: watch::Receiver<Option<PathBuf>>,
    to_slideshow: mpsc::Sender<SlideshowCommand>,
    cancel: CancellationToken,
) -> Result<()> {
    // Bridge notify callback -> async channel
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Result<Event>>(128);
    let mut watcher = recommended_watcher(move |res| {
        let _ = watch_tx.blocking_send(res);
    })?;
    let mut watching: Option<PathBuf> = None;
    let initial = folder_rx.borrow_and_update().clone();
    follow(&mut watcher, &mut watching, initial);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting watch task");
                break;
            }

            changed = folder_rx.changed() => {
                if changed.is_err() {
                    debug!("folder channel closed");
                    break;
                }
                let next = folder_rx.borrow_and_update().clone();
                follow(&mut watcher, &mut watching, next);
            }

            Some(res) = watch_rx.recv() => match res {
                Ok(event) => {
                    debug!(kind = ?event.kind, paths = ?event.paths, "notify event");
                    for path in removed_images(&event) {
                        info!(path = %path.display(), "fs: image removed");
                        if to_slideshow.send(SlideshowCommand::FileRemoved(path)).await.is_err() {
                            debug!("slideshow channel closed");
                            return Ok(());
                        }
                    }
                }
                Err(err) => error!("watch error: {err}"),
            }
        }
    }
    Ok(())
}

fn follow(watcher: &mut RecommendedWatcher, watching: &mut Option<PathBuf>, next: Option<PathBuf>) {
    if *watching == next {
        return;
    }
    if let Some(old) = watching.take()
        && let Err(err) = watcher.unwatch(&old)
    {
        debug!(path = %old.display(), error = %err, "unwatch failed");
    }
    if let Some(folder) = next {
        match watcher.watch(&folder, RecursiveMode::NonRecursive) {
            Ok(()) => {
                info!(watching = %folder.display(), "notify watcher initialized");
                *watching = Some(folder);
            }
            Err(err) => error!(path = %folder.display(), "cannot watch folder: {err}"),
        }
    }
}

/// Image paths an event reports as gone.
fn removed_images(event: &Event) -> Vec<PathBuf> {
    let is_image = |p: &&PathBuf| is_supported_image(p.as_path(), IMAGE_EXTENSIONS);
    match &event.kind {
        EventKind::Remove(RemoveKind::File | RemoveKind::Any) => {
            event.paths.iter().filter(is_image).cloned().collect()
        }
        // Renames are reported per path; decide by existence.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter(is_image)
            .filter(|p| !p.exists())
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}
