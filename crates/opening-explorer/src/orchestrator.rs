//! Build orchestration: cache lookups, off-thread builds, last-request-wins.
//!
//! Requests never block. A full miss dispatches one background job (persistent
//! lookup, then aggregation) whose reply is tagged with the request's content
//! hash. Replies whose tag is no longer the latest request are dropped.

use std::sync::Arc;

use chess_core::StoredGame;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::aggregate::aggregate;
use crate::cache::{DiskCache, ResidentCache};
use crate::config::{BuildOptions, ExplorerConfig};
use crate::error::{BuildError, ValidationError};
use crate::hash::{content_hash, ContentHash};
use crate::projection::Perspective;
use crate::tree::OpeningTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    HashComputed,
    CacheCheck,
    Building,
    Ready,
    /// The previous in-flight build was superseded.
    Aborted,
    Failed,
}

#[derive(Debug, Clone)]
pub enum TreeStatus {
    Ready(Arc<OpeningTree>),
    Building,
    Failed {
        reason: BuildError,
        /// The resident tree for an earlier game set, if any.
        fallback: Option<Arc<OpeningTree>>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplorerStats {
    pub resident_hits: u64,
    pub persistent_hits: u64,
    pub builds_dispatched: u64,
    pub builds_completed: u64,
    pub stale_results_dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreeSource {
    Persistent,
    Built,
}

struct BuildMessage {
    hash: ContentHash,
    outcome: Result<(Arc<OpeningTree>, TreeSource), BuildError>,
}

/// Reply slot moved into a build job. If the job ends without replying
/// (panic, runtime shutdown) dropping it reports a failure instead.
struct BuildReply {
    hash: ContentHash,
    tx: Option<UnboundedSender<BuildMessage>>,
}

impl BuildReply {
    fn send(mut self, outcome: Result<(Arc<OpeningTree>, TreeSource), BuildError>) {
        if let Some(tx) = self.tx.take() {
            // The explorer may be gone; nobody is left to tell.
            let _ = tx.send(BuildMessage {
                hash: self.hash.clone(),
                outcome,
            });
        }
    }
}

impl Drop for BuildReply {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(BuildMessage {
                hash: self.hash.clone(),
                outcome: Err(BuildError::WorkerFailed(
                    "build task ended without a result".into(),
                )),
            });
        }
    }
}

#[derive(Debug, Clone)]
struct Request {
    hash: ContentHash,
    perspective: Perspective,
}

pub struct OpeningExplorer {
    options: BuildOptions,
    runtime: Handle,
    resident: ResidentCache,
    disk: Option<Arc<DiskCache>>,
    results_tx: UnboundedSender<BuildMessage>,
    results_rx: UnboundedReceiver<BuildMessage>,
    phase: BuildPhase,
    latest: Option<Request>,
    in_flight: Option<ContentHash>,
    failure: Option<(ContentHash, BuildError)>,
    stats: ExplorerStats,
}

impl OpeningExplorer {
    /// Create an explorer that runs builds on the current tokio runtime.
    pub fn new(config: &ExplorerConfig) -> Result<Self, BuildError> {
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    pub fn with_runtime(config: &ExplorerConfig, runtime: Handle) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let disk = config
            .cache_dir
            .as_ref()
            .map(|dir| Arc::new(DiskCache::new(dir, config.cache_capacity)));

        Self {
            options: config.build.clone(),
            runtime,
            resident: ResidentCache::default(),
            disk,
            results_tx,
            results_rx,
            phase: BuildPhase::Idle,
            latest: None,
            in_flight: None,
            failure: None,
            stats: ExplorerStats::default(),
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn stats(&self) -> ExplorerStats {
        self.stats
    }

    /// Request the tree for `games` seen from `perspective`.
    ///
    /// Returns at once: `Ready` on a resident hit, otherwise `Building` while a
    /// background job resolves it (see [`poll`](Self::poll) and [`wait`](Self::wait)).
    pub fn request_tree(
        &mut self,
        games: &[StoredGame],
        perspective: Perspective,
    ) -> Result<TreeStatus, ValidationError> {
        if games.is_empty() {
            return Err(ValidationError::EmptyGameSet);
        }

        self.drain_results();

        let hash = content_hash(games, &self.options);
        if let Some(stale) = self.in_flight.take_if(|h| *h != hash) {
            info!(superseded = %stale, next = %hash, "Abandoning in-flight tree build");
            self.transition(BuildPhase::Aborted);
        }
        self.transition(BuildPhase::HashComputed);
        self.latest = Some(Request {
            hash: hash.clone(),
            perspective,
        });

        self.transition(BuildPhase::CacheCheck);
        if let Some(resident) = self.resident.lookup(&hash) {
            let tree = resident.view(perspective);
            self.stats.resident_hits += 1;
            self.transition(BuildPhase::Ready);
            return Ok(TreeStatus::Ready(tree));
        }

        if self.in_flight.is_none() {
            self.dispatch(hash, games);
        }
        self.transition(BuildPhase::Building);
        Ok(TreeStatus::Building)
    }

    /// Switch perspective on the latest request without rehashing its games.
    pub fn set_perspective(&mut self, perspective: Perspective) -> Option<TreeStatus> {
        self.latest.as_mut()?.perspective = perspective;
        self.poll()
    }

    /// Apply any finished builds and report the latest request's status.
    /// `None` before the first request.
    pub fn poll(&mut self) -> Option<TreeStatus> {
        self.drain_results();
        self.status()
    }

    /// Wait for the latest request to resolve.
    pub async fn wait(&mut self) -> Option<TreeStatus> {
        self.drain_results();
        while self.in_flight.is_some() {
            match self.results_rx.recv().await {
                Some(message) => self.accept(message),
                None => break,
            }
        }
        self.status()
    }

    fn status(&self) -> Option<TreeStatus> {
        let request = self.latest.as_ref()?;

        if let Some(resident) = self.resident.lookup(&request.hash) {
            return Some(TreeStatus::Ready(resident.view(request.perspective)));
        }

        match &self.failure {
            Some((hash, reason)) if *hash == request.hash && self.in_flight.is_none() => {
                Some(TreeStatus::Failed {
                    reason: reason.clone(),
                    fallback: self
                        .resident
                        .current()
                        .map(|resident| resident.view(request.perspective)),
                })
            }
            _ => Some(TreeStatus::Building),
        }
    }

    fn dispatch(&mut self, hash: ContentHash, games: &[StoredGame]) {
        let mut games = games.to_vec();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));

        let reply = BuildReply {
            hash: hash.clone(),
            tx: Some(self.results_tx.clone()),
        };
        let options = self.options.clone();
        let disk = self.disk.clone();

        info!(hash = %hash, games = games.len(), "Dispatching opening tree build");
        self.in_flight = Some(hash.clone());
        self.failure = None;
        self.stats.builds_dispatched += 1;

        self.runtime.spawn(async move {
            let outcome = run_build(&hash, games, options, disk).await;
            reply.send(outcome);
        });
    }

    fn drain_results(&mut self) {
        while let Ok(message) = self.results_rx.try_recv() {
            self.accept(message);
        }
    }

    fn accept(&mut self, message: BuildMessage) {
        if self.in_flight.as_ref() != Some(&message.hash) {
            self.stats.stale_results_dropped += 1;
            debug!(hash = %message.hash, "Dropping result of superseded tree build");
            return;
        }
        self.in_flight = None;

        match message.outcome {
            Ok((tree, source)) => {
                match source {
                    TreeSource::Persistent => self.stats.persistent_hits += 1,
                    TreeSource::Built => self.stats.builds_completed += 1,
                }
                info!(
                    hash = %message.hash,
                    source = ?source,
                    nodes = tree.len(),
                    games = tree.game_count,
                    "Opening tree ready"
                );
                self.resident.replace(message.hash, tree);
                self.transition(BuildPhase::Ready);
            }
            Err(reason) => {
                error!(hash = %message.hash, error = %reason, "Opening tree build failed");
                self.failure = Some((message.hash, reason));
                self.transition(BuildPhase::Failed);
            }
        }
    }

    fn transition(&mut self, next: BuildPhase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "Explorer phase change");
            self.phase = next;
        }
    }
}

/// Background job: persistent tier first, then a full build saved back to it.
/// Persistent failures are logged and treated as misses.
async fn run_build(
    hash: &ContentHash,
    games: Vec<StoredGame>,
    options: BuildOptions,
    disk: Option<Arc<DiskCache>>,
) -> Result<(Arc<OpeningTree>, TreeSource), BuildError> {
    if let Some(disk) = disk.clone() {
        let key = hash.clone();
        match tokio::task::spawn_blocking(move || disk.load(&key)).await {
            Ok(Ok(Some(tree))) => return Ok((Arc::new(tree), TreeSource::Persistent)),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!(hash = %hash, error = %e, "Ignoring unreadable cached tree"),
            Err(e) => warn!(hash = %hash, error = %e, "Cached tree lookup did not finish"),
        }
    }

    let tree = tokio::task::spawn_blocking(move || aggregate(&games, &options))
        .await
        .map_err(|e| BuildError::WorkerFailed(e.to_string()))?;
    let tree = Arc::new(tree);

    if let Some(disk) = disk {
        let (key, snapshot) = (hash.clone(), tree.clone());
        match tokio::task::spawn_blocking(move || disk.store(&key, &snapshot)).await {
            Ok(Ok(())) => debug!(hash = %hash, "Saved opening tree to disk cache"),
            Ok(Err(e)) => warn!(hash = %hash, error = %e, "Failed to save opening tree"),
            Err(e) => warn!(hash = %hash, error = %e, "Opening tree save did not finish"),
        }
    }

    Ok((tree, TreeSource::Built))
}
