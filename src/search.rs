//! Incremental "skip to next match" scanning over image metadata.
//!
//! A scan advances the [`NavigationController`] one image per [`SkipSearchEngine::step`]
//! and tests that image's metadata against a [`SearchQuery`]. The caller decides
//! when to call `step` again, so a long scan never blocks other work. Every scan
//! carries a [`ScanToken`]; steps presented with an older token are ignored.

use std::ops::Range;

use tracing::{debug, trace};

use crate::metadata::MetadataReader;
use crate::navigation::{Direction, NavigationController};

/// Lowercased search terms, all of which must occur in an image's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    terms: Vec<String>,
}

impl SearchQuery {
    /// Split `text` on any whitespace (including the ideographic space).
    pub fn parse(text: &str) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for term in text.split_whitespace().map(str::to_lowercase) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self {
            raw: text.to_string(),
            terms,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `true` when every term occurs in `text`, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.terms.iter().all(|t| haystack.contains(t.as_str()))
    }

    /// Byte ranges in `text` where any term occurs, ASCII case-insensitively,
    /// sorted by start.
    pub fn highlights(&self, text: &str) -> Vec<Range<usize>> {
        let bytes = text.as_bytes();
        let mut out = Vec::new();
        for term in &self.terms {
            let needle = term.as_bytes();
            if needle.is_empty() || needle.len() > bytes.len() {
                continue;
            }
            let mut start = 0;
            while start + needle.len() <= bytes.len() {
                let end = start + needle.len();
                if text.is_char_boundary(start)
                    && text.is_char_boundary(end)
                    && bytes[start..end].eq_ignore_ascii_case(needle)
                {
                    out.push(start..end);
                    start = end;
                } else {
                    start += 1;
                }
            }
        }
        out.sort_by_key(|r| (r.start, r.end));
        out
    }
}

/// Identity of one scan; a new one is issued by every [`SkipSearchEngine::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Exhausted,
}

/// Result of a single [`SkipSearchEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The image at `index` matched; the engine is idle again.
    Matched { index: usize },
    /// The scan is back at its start without a match.
    Exhausted { index: usize },
    /// The visited image did not match; call `step` again later.
    Continue { index: usize },
    /// The token does not belong to an active scan; nothing happened.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct ActiveScan {
    token: ScanToken,
    direction: Direction,
    start_index: usize,
    steps: usize,
}

/// Cancellable stepping scanner; see the module docs.
#[derive(Debug, Clone, Default)]
pub struct SkipSearchEngine {
    query: SearchQuery,
    active: Option<ActiveScan>,
    exhausted: bool,
    generation: u64,
}

impl SkipSearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        if self.active.is_some() {
            ScanState::Scanning
        } else if self.exhausted {
            ScanState::Exhausted
        } else {
            ScanState::Idle
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.active.is_some()
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Replace the predicate. Cancels any active scan.
    pub fn set_query(&mut self, query: SearchQuery) {
        if query != self.query {
            self.cancel();
            self.query = query;
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.active.map(|a| a.direction)
    }

    pub fn start_index(&self) -> Option<usize> {
        self.active.map(|a| a.start_index)
    }

    /// Token of the running scan, if any.
    pub fn token(&self) -> Option<ScanToken> {
        self.active.map(|a| a.token)
    }

    /// Start scanning from the controller's current position.
    ///
    /// Returns `None` without changing state when the query is empty or there
    /// is nothing to scan. An active scan is replaced.
    pub fn begin(&mut self, nav: &NavigationController, direction: Direction) -> Option<ScanToken> {
        if self.query.is_empty() {
            debug!("skip search requested with empty query; ignoring");
            return None;
        }
        let start_index = nav.current_index()?;
        self.generation += 1;
        let token = ScanToken(self.generation);
        self.active = Some(ActiveScan {
            token,
            direction,
            start_index,
            steps: 0,
        });
        self.exhausted = false;
        debug!(?direction, start_index, terms = ?self.query.terms(), "skip search started");
        Some(token)
    }

    /// Visit the next image of the scan identified by `token`.
    pub fn step(
        &mut self,
        token: ScanToken,
        nav: &mut NavigationController,
        reader: &dyn MetadataReader,
    ) -> StepOutcome {
        let Some(mut scan) = self.active.filter(|a| a.token == token) else {
            trace!(?token, "stale scan step ignored");
            return StepOutcome::Stale;
        };
        let Ok(index) = nav.step(scan.direction) else {
            self.active = None;
            return StepOutcome::Stale;
        };
        scan.steps += 1;

        if index == scan.start_index {
            debug!(steps = scan.steps, "skip search wrapped without a match");
            self.active = None;
            self.exhausted = true;
            return StepOutcome::Exhausted { index };
        }

        let matched = nav
            .current_path()
            .map(|path| self.query.matches(&reader.read(path).to_text()))
            .unwrap_or(false);
        if matched {
            debug!(index, steps = scan.steps, "skip search matched");
            self.active = None;
            return StepOutcome::Matched { index };
        }

        self.active = Some(scan);
        StepOutcome::Continue { index }
    }

    /// Stop the active scan. The current index stays wherever the scan got to.
    pub fn cancel(&mut self) {
        if let Some(scan) = self.active.take() {
            debug!(steps = scan.steps, "skip search cancelled");
        }
        self.exhausted = false;
    }
}
