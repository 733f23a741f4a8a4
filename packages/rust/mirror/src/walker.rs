//! Recursive book walk: chapters fan out, sections pass the gate, questions
//! materialize one artifact each.
//!
//! Chapter walks run concurrently and are joined together; each section
//! acquires a gate slot before touching its question list and processes the
//! questions strictly in source order. A leaf whose artifact already exists
//! on disk is skipped without any network traffic, which is the only form of
//! resumability: re-running over a partial output tree redoes nothing.
//!
//! Per-leaf failures (bad payload, HTTP error, collision) are captured in the
//! report instead of aborting sibling branches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use bookmirror_client::ApiClient;
use bookmirror_shared::{Chapter, QuestionRef, Result, Section};

use crate::artifact::{ArtifactStore, render_index_html};
use crate::gate::ConcurrencyGate;

// ---------------------------------------------------------------------------
// MirrorReport
// ---------------------------------------------------------------------------

/// Summary of a completed mirror run.
#[derive(Debug, Clone)]
pub struct MirrorReport {
    /// Book display name (output root directory).
    pub book_name: String,
    /// Leaves fetched and written this run.
    pub leaves_written: usize,
    /// Leaves skipped because their artifact already existed.
    pub leaves_skipped: usize,
    /// Failed leaves/branches as (book-relative path, reason).
    pub failures: Vec<(String, String)>,
    /// Total duration of the walk.
    pub duration: Duration,
}

/// Outcome of one leaf (or one failed branch).
enum LeafOutcome {
    Written,
    Skipped,
    Failed(String, String),
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting walk status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a leaf artifact is written.
    fn leaf_written(&self, path: &str);
    /// Called when a leaf is skipped as already done.
    fn leaf_skipped(&self, path: &str);
    /// Called when the walk completes.
    fn done(&self, report: &MirrorReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn leaf_written(&self, _path: &str) {}
    fn leaf_skipped(&self, _path: &str) {}
    fn done(&self, _report: &MirrorReport) {}
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

/// The tree walker. Cheap to clone; clones share the client, store, and gate.
#[derive(Clone)]
pub struct Mirror {
    api: ApiClient,
    store: Arc<dyn ArtifactStore>,
    gate: ConcurrencyGate,
    progress: Arc<dyn ProgressReporter>,
}

impl Mirror {
    /// Walker over `api` writing through `store`, with at most `concurrency`
    /// sections in flight.
    pub fn new(api: ApiClient, store: Arc<dyn ArtifactStore>, concurrency: u32) -> Self {
        Self {
            api,
            store,
            gate: ConcurrencyGate::new(concurrency as usize),
            progress: Arc::new(SilentProgress),
        }
    }

    /// Attach a progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// The section concurrency gate (inspectable for tests and diagnostics).
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Mirror one book edition into `output_root/{book name}/`.
    ///
    /// Root resolution failures are fatal; everything below the root is
    /// isolated per branch and collected into the report.
    #[instrument(skip_all, fields(book_id = book_id))]
    pub async fn run(&self, book_id: u64, output_root: &Path) -> Result<MirrorReport> {
        let start = Instant::now();

        self.progress.phase("Resolving book");
        let book = self.api.fetch_book_edition(book_id).await?;

        info!(
            book = %book.name,
            chapters = book.chapters.len(),
            concurrency = self.gate.capacity(),
            "starting mirror"
        );

        let book_dir = output_root.join(&book.name);
        self.store.create_dir(&book_dir)?;

        self.progress.phase("Walking chapters");
        let mut handles = Vec::new();
        for chapter in book.chapters {
            let walker = self.clone();
            let dir = book_dir.clone();
            handles.push(tokio::spawn(async move {
                walker.walk_chapter(chapter, &dir).await
            }));
        }

        let mut written = 0usize;
        let mut skipped = 0usize;
        let mut failures: Vec<(String, String)> = Vec::new();

        for handle in handles {
            match handle.await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            LeafOutcome::Written => written += 1,
                            LeafOutcome::Skipped => skipped += 1,
                            LeafOutcome::Failed(path, reason) => failures.push((path, reason)),
                        }
                    }
                }
                Err(e) => failures.push(("chapter task".into(), e.to_string())),
            }
        }

        let report = MirrorReport {
            book_name: book.name,
            leaves_written: written,
            leaves_skipped: skipped,
            failures,
            duration: start.elapsed(),
        };

        self.progress.done(&report);

        info!(
            book = %report.book_name,
            written = report.leaves_written,
            skipped = report.leaves_skipped,
            failed = report.failures.len(),
            duration_ms = report.duration.as_millis(),
            "mirror complete"
        );

        Ok(report)
    }

    /// Walk one chapter: sections in source order, each behind the gate.
    async fn walk_chapter(&self, chapter: Chapter, book_dir: &Path) -> Vec<LeafOutcome> {
        let chapter_rel = chapter.position.to_string();
        let chapter_dir = book_dir.join(&chapter_rel);

        if let Err(e) = self.store.create_dir(&chapter_dir) {
            warn!(chapter = %chapter_rel, error = %e, "chapter directory creation failed");
            return vec![LeafOutcome::Failed(chapter_rel, e.to_string())];
        }

        let mut outcomes = Vec::new();
        for section in chapter.sections {
            outcomes.extend(
                self.walk_section(section, &chapter_dir, &chapter_rel)
                    .await,
            );
        }
        outcomes
    }

    /// Walk one section's question list while holding a gate slot.
    async fn walk_section(
        &self,
        section: Section,
        chapter_dir: &Path,
        chapter_rel: &str,
    ) -> Vec<LeafOutcome> {
        let section_rel = format!("{chapter_rel}/{}", section.position);
        let section_dir = chapter_dir.join(section.position.to_string());

        if let Err(e) = self.store.create_dir(&section_dir) {
            warn!(section = %section_rel, error = %e, "section directory creation failed");
            return vec![LeafOutcome::Failed(section_rel, e.to_string())];
        }

        let _permit = self.gate.acquire().await;
        debug!(section = %section_rel, questions = section.questions.len(), "processing section");

        // Sibling leaf dir names derived so far, for collision detection.
        let mut seen_names: HashSet<String> = HashSet::new();

        let mut outcomes = Vec::with_capacity(section.questions.len());
        for question in &section.questions {
            outcomes.push(
                self.process_question(question, &section_dir, &section_rel, &mut seen_names)
                    .await,
            );
        }
        outcomes
    }

    /// Materialize one leaf: skip if done, else fetch, render, and write.
    async fn process_question(
        &self,
        question: &QuestionRef,
        section_dir: &Path,
        section_rel: &str,
        seen_names: &mut HashSet<String>,
    ) -> LeafOutcome {
        let dir_name = question.dir_name();
        let leaf_rel = format!("{section_rel}/{dir_name}");

        // A second sibling deriving the same name would be silently treated
        // as already done; report it instead.
        if !seen_names.insert(dir_name.clone()) {
            warn!(leaf = %leaf_rel, "sibling directory name collision");
            return LeafOutcome::Failed(
                leaf_rel,
                "directory name collides with an earlier sibling".into(),
            );
        }

        let leaf_dir: PathBuf = section_dir.join(&dir_name);
        if let Err(e) = self.store.create_dir(&leaf_dir) {
            return LeafOutcome::Failed(leaf_rel, e.to_string());
        }

        if self.store.exists(&leaf_dir) {
            debug!(leaf = %leaf_rel, "artifact exists, skipping");
            self.progress.leaf_skipped(&leaf_rel);
            return LeafOutcome::Skipped;
        }

        let detail = match self.api.fetch_exercise(question.exercise.id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(leaf = %leaf_rel, error = %e, "leaf fetch failed");
                return LeafOutcome::Failed(leaf_rel, e.to_string());
            }
        };

        let html = render_index_html(detail.display_title(), &detail.light_solution);
        if let Err(e) = self.store.write_index(&leaf_dir, &html) {
            warn!(leaf = %leaf_rel, error = %e, "leaf write failed");
            return LeafOutcome::Failed(leaf_rel, e.to_string());
        }

        self.progress.leaf_written(&leaf_rel);
        LeafOutcome::Written
    }
}
