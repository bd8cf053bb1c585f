// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Background scanning
//!
//! [`ScanService`] runs scans on tokio's blocking pool and publishes the
//! outcome through a `watch` channel. Every request bumps a generation
//! counter; a scan whose generation is no longer current when it finishes is
//! dropped. A newer request therefore replaces an outstanding one, and
//! [`ScanService::cancel`] abandons it.

use crate::scanner::{self, ScanError, ScanOptions};
use crate::types::RepositoryRecord;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the latest scan request has produced so far
#[derive(Debug, Clone, Default)]
pub enum ScanState {
    /// No scan requested, or the last one was cancelled
    #[default]
    Idle,
    /// A scan is running
    Scanning {
        /// Generation of the running scan
        generation: u64,
    },
    /// The latest scan completed
    Ready {
        /// Generation that produced these records
        generation: u64,
        /// The complete, sorted record set
        records: Arc<[RepositoryRecord]>,
    },
    /// The latest scan failed; there are no results
    Failed {
        /// Generation that failed
        generation: u64,
        /// Why it failed
        error: Arc<ScanError>,
    },
}

impl ScanState {
    /// Records of a completed scan
    #[must_use]
    pub fn records(&self) -> Option<&Arc<[RepositoryRecord]>> {
        match self {
            Self::Ready { records, .. } => Some(records),
            _ => None,
        }
    }

    /// Generation this state belongs to
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Scanning { generation }
            | Self::Ready { generation, .. }
            | Self::Failed { generation, .. } => Some(*generation),
        }
    }

    /// Whether a scan is in flight
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::Scanning { .. })
    }

    /// Whether this state is final for its generation
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }
}

/// A requested scan
#[derive(Debug)]
pub struct ScanTicket {
    /// Generation assigned to the request
    pub generation: u64,
    /// Task that runs the scan and publishes its result
    pub handle: JoinHandle<()>,
}

/// Coordinates background scans and publishes their results
#[derive(Debug, Clone)]
pub struct ScanService {
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<ScanState>>,
}

impl Default for ScanService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanService {
    /// Create an idle service
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Start a scan of `root`, superseding any scan still running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_scan(&self, root: PathBuf, options: ScanOptions) -> ScanTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scanning = ScanState::Scanning { generation };
        publish_if_current(&self.generation, &self.state, generation, scanning);
        debug!("Scan {generation} requested for {}", root.display());

        let counter = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let next = match scan_async(root, options).await {
                Ok(records) => ScanState::Ready {
                    generation,
                    records: records.into(),
                },
                Err(error) => {
                    warn!("Scan {generation} failed: {error}");
                    ScanState::Failed {
                        generation,
                        error: Arc::new(error),
                    }
                }
            };

            if !publish_if_current(&counter, &state, generation, next) {
                debug!("Discarding superseded scan {generation}");
            }
        });

        ScanTicket { generation, handle }
    }

    /// Abandon the outstanding scan, if any. Its result will be discarded.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Scans before {generation} cancelled");
        publish_if_current(&self.generation, &self.state, generation, ScanState::Idle);
    }

    /// Receive every published state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// The current state
    #[must_use]
    pub fn snapshot(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Generation of the most recent request or cancellation
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Publish `next` only if `generation` is still the latest.
///
/// The check runs under the channel lock, so a newer request cannot slip in
/// between the check and the write.
fn publish_if_current(
    counter: &AtomicU64,
    state: &watch::Sender<ScanState>,
    generation: u64,
    next: ScanState,
) -> bool {
    state.send_if_modified(|current| {
        if counter.load(Ordering::SeqCst) == generation {
            *current = next;
            true
        } else {
            false
        }
    })
}

/// Run one scan on the blocking pool.
///
/// # Errors
///
/// Returns the scan's [`ScanError`]; a scan task that panics or is aborted is
/// reported as a [`ScanError::TraversalFailure`] at the root.
pub async fn scan_async(
    root: PathBuf,
    options: ScanOptions,
) -> Result<Vec<RepositoryRecord>, ScanError> {
    let task_root = root.clone();
    match tokio::task::spawn_blocking(move || scanner::scan(&task_root, &options)).await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(ScanError::TraversalFailure {
            path: root,
            source: io::Error::other(join_error),
        }),
    }
}
