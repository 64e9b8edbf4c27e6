use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task;
use tokio::time::{Duration, Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::collection::{IMAGE_EXTENSIONS, ImageCollection, is_supported_image};
use crate::config::{SettingsRecord, SettingsStore, SlideInterval, SortDirection, SortMode};
use crate::error::Error;
use crate::events::{CopyTarget, DisplayedItem, SlideshowCommand, SlideshowEvent};
use crate::metadata::MetadataReader;
use crate::navigation::{Direction, NavigationController};
use crate::relocate::Relocator;
use crate::search::{ScanToken, SearchQuery, SkipSearchEngine, StepOutcome};

/// Pause between two steps of a skip search.
pub const SCAN_STEP_DELAY: Duration = Duration::from_millis(10);

/// Upper bound on how long the task sleeps with nothing scheduled.
const IDLE_WAKE: Duration = Duration::from_secs(1);

/// Drives the slideshow: periodic advance, manual navigation, skip search,
/// and the delete/copy actions.
///
/// All methods are synchronous and take the current time explicitly; [`run`]
/// feeds them from commands and timer deadlines. Outgoing notifications are
/// queued and collected with [`Self::drain_events`].
pub struct SlideshowOrchestrator {
    settings: SettingsRecord,
    store: Box<dyn SettingsStore>,
    reader: Box<dyn MetadataReader>,
    relocator: Box<dyn Relocator>,
    nav: NavigationController,
    search: SkipSearchEngine,
    interval: SlideInterval,
    paused: bool,
    running: bool,
    ended: bool,
    next_tick: Option<Instant>,
    pending_step: Option<(ScanToken, Instant)>,
    shuffle_seed: Option<u64>,
    events: Vec<SlideshowEvent>,
}

impl SlideshowOrchestrator {
    /// Build an orchestrator from the settings held by `store`.
    pub fn new(
        store: Box<dyn SettingsStore>,
        reader: Box<dyn MetadataReader>,
        relocator: Box<dyn Relocator>,
    ) -> Self {
        let settings = store.load();
        let interval = settings.slide_interval();
        let collection = ImageCollection::new(settings.sort_order, settings.sort_direction);
        Self {
            settings,
            store,
            reader,
            relocator,
            nav: NavigationController::new(collection),
            search: SkipSearchEngine::new(),
            interval,
            paused: false,
            running: false,
            ended: false,
            next_tick: None,
            pending_step: None,
            shuffle_seed: None,
            events: Vec::new(),
        }
    }

    /// Deterministic shuffling for random sort order.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn search(&self) -> &SkipSearchEngine {
        &self.search
    }

    pub fn interval(&self) -> SlideInterval {
        self.interval
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Take all notifications produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SlideshowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Earliest instant at which [`Self::on_timer`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let step = self.pending_step.map(|(_, due)| due);
        match (step, self.next_tick) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle(&mut self, cmd: SlideshowCommand, now: Instant) {
        debug!(?cmd, "slideshow command");
        match cmd {
            SlideshowCommand::Start => self.start(now),
            SlideshowCommand::Stop => self.stop(),
            SlideshowCommand::Advance(direction) => self.manual_advance(direction, now),
            SlideshowCommand::RandomJump => self.random_jump(now),
            SlideshowCommand::SetPaused(paused) => self.set_paused(paused, now),
            SlideshowCommand::TogglePause => self.set_paused(!self.paused, now),
            SlideshowCommand::SetInterval(ms) => {
                let _ = self.set_interval(ms, now);
            }
            SlideshowCommand::SetSort { mode, direction } => self.set_sort(mode, direction),
            SlideshowCommand::SetQuery(text) => self.set_query(&text),
            SlideshowCommand::SetSkipToMatch(on) => self.set_skip_to_match(on),
            SlideshowCommand::SetConfirmDelete(on) => self.set_confirm_delete(on),
            SlideshowCommand::SetInfoPanelVisible(on) => self.set_info_panel_visible(on),
            SlideshowCommand::SetCopyFolder(target, folder) => self.set_copy_folder(target, folder),
            SlideshowCommand::OpenFolder(folder) => {
                let _ = self.open_folder(&folder);
            }
            SlideshowCommand::OpenFile(path) => {
                let _ = self.open_file(&path);
            }
            SlideshowCommand::Delete { confirmed } => self.delete_current(confirmed),
            SlideshowCommand::Copy(target) => self.copy_current(target),
            SlideshowCommand::ItemUnreadable => self.on_item_unreadable(),
            SlideshowCommand::FileRemoved(path) => self.on_file_removed(&path),
        }
    }

    /// Load `folder`, sort it, and show its first image.
    ///
    /// # Errors
    /// [`Error::FolderUnavailable`] when the folder cannot be listed; the
    /// persisted source folder is cleared in that case.
    pub fn open_folder(&mut self, folder: &Path) -> crate::error::Result<usize> {
        let count = self.load_folder(folder)?;
        if count == 0 {
            self.feedback("No images found in source folder.");
            self.emit(SlideshowEvent::Empty);
        } else {
            self.display_current();
        }
        Ok(count)
    }

    /// Load the folder containing `path`, select `path`, and pause the show.
    ///
    /// # Errors
    /// [`Error::FolderUnavailable`] when `path` is not an existing image file
    /// or its folder cannot be listed; the persisted source folder is cleared
    /// if it names `path` or a folder that is gone.
    pub fn open_file(&mut self, path: &Path) -> crate::error::Result<usize> {
        let folder = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !path.is_file() || !is_supported_image(path, IMAGE_EXTENSIONS) {
            warn!(path = %path.display(), "not an image file");
            if folder.is_dir() {
                self.folder_unavailable(&[path]);
            } else {
                self.folder_unavailable(&[path, folder]);
            }
            return Err(Error::FolderUnavailable(path.to_path_buf()));
        }
        let count = self.load_folder(folder)?;
        let target = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.nav.set_current_path(&target) {
            debug!(path = %path.display(), "opened file not in collection; showing first image");
        }
        if count == 0 {
            self.emit(SlideshowEvent::Empty);
        } else {
            self.display_current();
        }
        self.paused = true;
        self.next_tick = None;
        Ok(count)
    }

    fn load_folder(&mut self, folder: &Path) -> crate::error::Result<usize> {
        self.cancel_scan();
        let mut collection =
            ImageCollection::new(self.settings.sort_order, self.settings.sort_direction);
        if let Some(seed) = self.shuffle_seed {
            collection = collection.with_seed(seed);
        }
        if let Err(err) = collection.load(folder, IMAGE_EXTENSIONS) {
            warn!(folder = %folder.display(), error = %err, "cannot open folder");
            self.folder_unavailable(&[folder]);
            return Err(err);
        }
        collection.sort();
        let loaded = collection
            .folder()
            .map_or_else(|| folder.to_path_buf(), Path::to_path_buf);
        let count = collection.len();
        self.nav.replace(collection);
        self.settings.source = Some(loaded.clone());
        self.persist();
        self.emit(SlideshowEvent::FolderOpened(loaded));
        Ok(count)
    }

    /// Report a missing source and forget it if it is the persisted one.
    fn folder_unavailable(&mut self, candidates: &[&Path]) {
        self.feedback("Source folder not found.");
        if let Some(source) = self.settings.source.as_deref()
            && candidates.contains(&source)
        {
            self.settings.source = None;
            self.persist();
        }
    }

    /// Show the current image and arm the periodic advance unless paused.
    pub fn start(&mut self, now: Instant) {
        if self.ended {
            return;
        }
        self.running = true;
        self.display_current();
        if !self.paused {
            self.arm(now);
        }
        info!(interval_ms = self.interval.millis(), paused = self.paused, "slideshow started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_tick = None;
        self.cancel_scan();
        info!("slideshow stopped");
    }

    /// Pausing keeps the current image; resuming waits a full interval.
    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        self.paused = paused;
        if paused {
            self.next_tick = None;
            self.cancel_scan();
            self.feedback("Paused");
        } else {
            if self.running {
                self.arm(now);
            }
            self.feedback("Resumed");
        }
    }

    /// # Errors
    /// [`Error::InvalidInterval`] outside 500..=60000 ms.
    pub fn set_interval(&mut self, millis: u64, now: Instant) -> crate::error::Result<()> {
        let interval = match SlideInterval::new(millis) {
            Ok(interval) => interval,
            Err(err) => {
                self.feedback(format!("Error: {err}"));
                return Err(err);
            }
        };
        self.interval = interval;
        self.settings.interval = interval.millis();
        self.persist();
        if self.running && !self.paused {
            self.arm(now);
        }
        self.feedback(format!(
            "Interval set to {:.1}s",
            interval.as_duration().as_secs_f64()
        ));
        Ok(())
    }

    /// Re-sort, return to the first image, and persist the choice.
    pub fn set_sort(&mut self, mode: SortMode, direction: SortDirection) {
        self.cancel_scan();
        self.nav.sort(mode, direction);
        self.settings.sort_order = mode;
        self.settings.sort_direction = direction;
        self.persist();
        self.display_current();
    }

    pub fn set_query(&mut self, text: &str) {
        self.search.set_query(SearchQuery::parse(text));
        if !self.search.is_scanning() {
            self.pending_step = None;
        }
    }

    pub fn set_skip_to_match(&mut self, on: bool) {
        self.settings.skip_non_matching = on;
        self.persist();
        self.feedback(format!(
            "Skip to match is now {}",
            if on { "ON" } else { "OFF" }
        ));
        if !on {
            self.cancel_scan();
        }
    }

    pub fn set_confirm_delete(&mut self, on: bool) {
        self.settings.confirm_delete = on;
        self.persist();
        self.feedback(format!(
            "Deletion confirmation {}",
            if on { "enabled" } else { "disabled" }
        ));
    }

    pub fn set_info_panel_visible(&mut self, on: bool) {
        self.settings.info_panel_visible = on;
        self.persist();
    }

    pub fn set_copy_folder(&mut self, target: CopyTarget, folder: PathBuf) {
        match target {
            CopyTarget::Favorites => self.settings.favorites = Some(folder),
            CopyTarget::Likes => self.settings.likes = Some(folder),
        }
        self.persist();
    }

    /// Step once in `direction`, or start a skip search when skip-to-match is
    /// enabled and a query is set.
    pub fn manual_advance(&mut self, direction: Direction, now: Instant) {
        self.cancel_scan();
        if self.nav.is_empty() {
            return;
        }
        if self.running && !self.paused {
            self.arm(now);
        }

        if self.settings.skip_non_matching && !self.search.query().is_empty() {
            self.feedback(match direction {
                Direction::Forward => "Searching for next match...",
                Direction::Backward => "Searching for previous match...",
            });
            if let Some(token) = self.search.begin(&self.nav, direction) {
                self.scan_step(token, now);
            }
        } else if self.nav.step(direction).is_ok() {
            self.display_current();
        }
    }

    pub fn random_jump(&mut self, now: Instant) {
        self.cancel_scan();
        if self.nav.random_jump().is_err() {
            return;
        }
        self.display_current();
        if self.running && !self.paused {
            self.arm(now);
        }
    }

    /// Run whatever is due at `now`: a pending scan step and/or the periodic advance.
    pub fn on_timer(&mut self, now: Instant) {
        if let Some((token, due)) = self.pending_step
            && due <= now
        {
            self.pending_step = None;
            self.scan_step(token, now);
        }
        if let Some(due) = self.next_tick
            && due <= now
        {
            self.tick(now);
        }
    }

    /// Continue the scan identified by `token`. Stale tokens are ignored.
    pub fn scan_step(&mut self, token: ScanToken, now: Instant) {
        match self.search.step(token, &mut self.nav, self.reader.as_ref()) {
            StepOutcome::Matched { index } => {
                debug!(index, "skip search found a match");
                self.pending_step = None;
                self.feedback("Match found!");
                self.display_current();
                if self.running && !self.paused {
                    self.arm(now);
                }
            }
            StepOutcome::Exhausted { .. } => {
                self.pending_step = None;
                self.feedback("No more matches found.");
                self.display_current();
            }
            StepOutcome::Continue { .. } => {
                self.pending_step = Some((token, now + SCAN_STEP_DELAY));
            }
            StepOutcome::Stale => {
                if self.pending_step.is_some_and(|(t, _)| t == token) {
                    self.pending_step = None;
                }
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        self.arm(now);
        if !self.running || self.paused || self.search.is_scanning() {
            return;
        }
        if self.nav.next().is_ok() {
            self.display_current();
        }
    }

    /// The viewer failed to show the current image: drop it and move on.
    pub fn on_item_unreadable(&mut self) {
        self.cancel_scan();
        match self.nav.handle_unreadable() {
            Ok(_) => self.display_current(),
            Err(Error::CollectionExhausted) => self.end_session(),
            Err(err) => debug!(error = %err, "unreadable report with nothing current"),
        }
    }

    /// A file vanished from disk; forget it without disturbing the current image.
    pub fn on_file_removed(&mut self, path: &Path) {
        if self.nav.collection().position(path).is_none() {
            return;
        }
        self.cancel_scan();
        let was_current = self.nav.current_path().is_ok_and(|p| p == path);
        match self.nav.remove_path(path) {
            Ok(_) if was_current => self.display_current(),
            Ok(_) => {}
            Err(Error::CollectionExhausted) => self.end_session(),
            Err(err) => debug!(error = %err, "file removal ignored"),
        }
    }

    /// Move the current image to the trash.
    ///
    /// With delete confirmation enabled, an unconfirmed request only emits
    /// [`SlideshowEvent::ConfirmDelete`].
    pub fn delete_current(&mut self, confirmed: bool) {
        self.cancel_scan();
        let Ok(path) = self.nav.current_path().map(Path::to_path_buf) else {
            return;
        };
        if self.settings.confirm_delete && !confirmed {
            self.emit(SlideshowEvent::ConfirmDelete(path));
            return;
        }
        if !path.exists() {
            self.feedback("File not found. Removing from list.");
            let removed = self.nav.handle_unreadable();
            self.after_removal(removed, None);
            return;
        }
        match self.relocator.move_to_trash(&path) {
            Ok(()) => {
                let removed = self.nav.remove_current();
                self.after_removal(removed, Some("Moved to Trash"));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "move to trash failed");
                self.feedback(format!("Error: {err}"));
            }
        }
    }

    /// Show what follows a removed item, or end the session when none is left.
    fn after_removal(&mut self, removed: crate::error::Result<PathBuf>, message: Option<&str>) {
        match removed {
            Ok(_) => {
                self.display_current();
                if let Some(message) = message {
                    self.feedback(message);
                }
            }
            Err(Error::CollectionExhausted) => {
                self.feedback("No more images.");
                self.end_session();
            }
            Err(err) => debug!(error = %err, "nothing to remove"),
        }
    }

    /// Copy the current image into the favorites or likes folder.
    pub fn copy_current(&mut self, target: CopyTarget) {
        let folder = match target {
            CopyTarget::Favorites => self.settings.favorites.clone(),
            CopyTarget::Likes => self.settings.likes.clone(),
        };
        let Some(folder) = folder else {
            self.feedback(format!("'{}' folder not set", target.label()));
            return;
        };
        let Ok(path) = self.nav.current_path().map(Path::to_path_buf) else {
            return;
        };
        match self.relocator.copy_to(&path, &folder) {
            Ok(_) => self.feedback(format!("Copied to {}!", target.label())),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "copy failed");
                self.feedback(format!("Error: {err}"));
            }
        }
    }

    fn end_session(&mut self) {
        info!("no images left; ending session");
        self.ended = true;
        self.running = false;
        self.next_tick = None;
        self.cancel_scan();
        self.emit(SlideshowEvent::SessionEnded);
    }

    fn display_current(&mut self) {
        let Ok(path) = self.nav.current_path() else {
            return;
        };
        let path = path.to_path_buf();
        let metadata = self.reader.read(&path);
        let text = metadata.to_text();
        let highlights = self.search.query().highlights(&text);
        let position = self.nav.current_index().map_or(0, |i| i + 1);
        debug!(path = %path.display(), position, total = self.nav.len(), "display");
        self.emit(SlideshowEvent::Display(DisplayedItem {
            path,
            position,
            total: self.nav.len(),
            metadata,
            text,
            highlights,
        }));
    }

    fn arm(&mut self, now: Instant) {
        self.next_tick = Some(now + self.interval.as_duration());
    }

    fn cancel_scan(&mut self) {
        self.search.cancel();
        self.pending_step = None;
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.settings) {
            warn!(error = %err, "failed to save settings");
        }
    }

    fn feedback(&mut self, message: impl Into<String>) {
        self.emit(SlideshowEvent::Feedback(message.into()));
    }

    fn emit(&mut self, event: SlideshowEvent) {
        self.events.push(event);
    }
}

/// Runs the slideshow until cancelled, the command channel closes, or the
/// session ends.
///
/// Commands are applied as they arrive; periodic advances and skip-search
/// steps fire when their deadlines pass. Every orchestrator call touches the
/// filesystem (metadata, listing, settings, trash), so each one runs on the
/// blocking pool. Events are forwarded in order.
#[instrument(skip_all)]
pub async fn run(
    mut orchestrator: SlideshowOrchestrator,
    mut commands: Receiver<SlideshowCommand>,
    events: Sender<SlideshowEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    if !forward(&mut orchestrator, &events).await {
        return Ok(());
    }

    loop {
        let wake = orchestrator
            .next_deadline()
            .unwrap_or_else(|| Instant::now() + IDLE_WAKE);

        let cmd = select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting slideshow task");
                break;
            }

            maybe_cmd = commands.recv() => match maybe_cmd {
                Some(cmd) => Some(cmd),
                None => {
                    debug!("command channel closed");
                    break;
                }
            },

            _ = sleep_until(wake) => None,
        };

        let now = Instant::now();
        orchestrator = on_blocking_pool(orchestrator, move |o| match cmd {
            Some(cmd) => o.handle(cmd, now),
            None => o.on_timer(now),
        })
        .await?;

        if !forward(&mut orchestrator, &events).await {
            break;
        }
        if orchestrator.is_ended() {
            break;
        }
    }

    Ok(())
}

/// Apply `f` to the orchestrator on tokio's blocking pool and hand it back.
///
/// # Errors
/// Fails if `f` panicked; the orchestrator is lost in that case.
pub async fn on_blocking_pool<F>(
    mut orchestrator: SlideshowOrchestrator,
    f: F,
) -> Result<SlideshowOrchestrator>
where
    F: FnOnce(&mut SlideshowOrchestrator) + Send + 'static,
{
    task::spawn_blocking(move || {
        f(&mut orchestrator);
        orchestrator
    })
    .await
    .context("slideshow worker panicked")
}

async fn forward(orchestrator: &mut SlideshowOrchestrator, events: &Sender<SlideshowEvent>) -> bool {
    for event in orchestrator.drain_events() {
        if events.send(event).await.is_err() {
            warn!("event channel closed");
            return false;
        }
    }
    true
}
