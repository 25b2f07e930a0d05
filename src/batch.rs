//! Batch orchestration: queue, per-item lifecycle and export.
//!
//! A [`Batch`] owns an ordered queue of work items. Each item moves through
//!
//! ```text
//! Idle → Processing → Completed | Error
//! ```
//!
//! and can be removed from any state. Items are processed strictly one at a
//! time, in arrival order; a failure marks only that item and processing
//! continues with the next one.
//!
//! ## Concurrency
//!
//! The batch is `Sync` and meant to be shared (e.g. behind an `Arc`) between
//! the shell that feeds it and whatever drives processing. An atomic
//! in-flight flag makes [`Batch::process_pending`] re-entrant safe: a call
//! made while another is running returns immediately. The queue lock is not
//! held while an item renders, so [`Batch::remove`] and [`Batch::reset`]
//! never wait on a render. A render whose item disappeared meanwhile is
//! finished and then dropped.
//!
//! ## Notifications
//!
//! Every transition is published as a [`BatchEvent`] on an optional
//! `std::sync::mpsc` channel. A dropped receiver is ignored.
//!
//! ## Mode
//!
//! Single vs. mosaic mode is a property of the whole batch and can only be
//! changed while the queue is empty.

use crate::archive::{ArchiveError, package_zip};
use crate::imaging::{
    BackendError, CanvasBackend, ImageBackend, TargetSpec, TileGrid, resize_image, tile_image,
};
use crate::naming::{base_name, mosaic_archive_name, resized_filename};
use crate::types::{EncodedBuffer, SourceImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("mode can only change on an empty batch ({items} item(s) queued)")]
    ModeChangeRejected { items: usize },
    #[error("no item {0}")]
    NotFound(ItemId),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no item {0}")]
    NotFound(ItemId),
    #[error("{name}: cannot export an item that is {status}")]
    NotCompleted { name: String, status: ItemStatus },
    #[error("{name}: item has no output")]
    NoOutput { name: String },
    #[error("{name}: {source}")]
    Archive { name: String, source: ArchiveError },
}

/// Stable identity of a work item within its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// 1-based position in the order items were created.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What every item of the batch is turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One letterboxed image per source.
    #[default]
    Single,
    /// One tile per grid cell per source.
    Mosaic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Processing,
    Completed,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Published on every observable change of the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    StatusChanged {
        id: ItemId,
        name: String,
        status: ItemStatus,
        /// Number of encoded buffers; non-zero only when completed.
        outputs: usize,
        /// Failure message; present only on error.
        error: Option<String>,
    },
    Removed {
        id: ItemId,
        name: String,
    },
    Cleared {
        count: usize,
    },
}

/// Read-only view of a work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub media_type: String,
    pub status: ItemStatus,
    pub outputs: usize,
    pub output_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A downloadable result: suggested filename plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub buffer: EncodedBuffer,
}

enum ItemState {
    Idle,
    Processing,
    Completed(Vec<EncodedBuffer>),
    Failed(BackendError),
}

struct WorkItem {
    id: ItemId,
    name: String,
    media_type: String,
    /// Dropped once the item reaches a terminal state.
    source: Option<Arc<SourceImage>>,
    state: ItemState,
}

impl WorkItem {
    fn status(&self) -> ItemStatus {
        match self.state {
            ItemState::Idle => ItemStatus::Idle,
            ItemState::Processing => ItemStatus::Processing,
            ItemState::Completed(_) => ItemStatus::Completed,
            ItemState::Failed(_) => ItemStatus::Error,
        }
    }

    fn outputs(&self) -> &[EncodedBuffer] {
        match &self.state {
            ItemState::Completed(outputs) => outputs,
            _ => &[],
        }
    }

    fn error(&self) -> Option<String> {
        match &self.state {
            ItemState::Failed(err) => Some(err.to_string()),
            _ => None,
        }
    }

    fn status_event(&self) -> BatchEvent {
        BatchEvent::StatusChanged {
            id: self.id,
            name: self.name.clone(),
            status: self.status(),
            outputs: self.outputs().len(),
            error: self.error(),
        }
    }

    fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            status: self.status(),
            outputs: self.outputs().len(),
            output_bytes: self.outputs().iter().map(EncodedBuffer::len).sum(),
            error: self.error(),
        }
    }
}

struct Queue {
    mode: Mode,
    items: Vec<WorkItem>,
    next_id: u64,
}

/// Clears the in-flight flag on every exit path, including unwinding.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ordered queue of images rendered with one backend and one target spec.
pub struct Batch<B = CanvasBackend> {
    backend: B,
    spec: TargetSpec,
    grid: TileGrid,
    queue: Mutex<Queue>,
    in_flight: AtomicBool,
    events: Option<Sender<BatchEvent>>,
}

impl<B: ImageBackend> Batch<B> {
    pub fn new(backend: B, spec: TargetSpec, grid: TileGrid) -> Self {
        Self {
            backend,
            spec,
            grid,
            queue: Mutex::new(Queue {
                mode: Mode::default(),
                items: Vec::new(),
                next_id: 1,
            }),
            in_flight: AtomicBool::new(false),
            events: None,
        }
    }

    /// Publish status changes on `events`.
    pub fn with_events(mut self, events: Sender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn mode(&self) -> Mode {
        self.queue().mode
    }

    /// Switch between single and mosaic mode. Only allowed on an empty batch.
    pub fn set_mode(&self, mode: Mode) -> Result<(), BatchError> {
        let mut queue = self.queue();
        if !queue.items.is_empty() {
            return Err(BatchError::ModeChangeRejected {
                items: queue.items.len(),
            });
        }
        queue.mode = mode;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queue().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().items.is_empty()
    }

    pub fn status(&self, id: ItemId) -> Option<ItemStatus> {
        self.queue()
            .items
            .iter()
            .find(|item| item.id == id)
            .map(WorkItem::status)
    }

    /// Snapshots of all items in queue order.
    pub fn items(&self) -> Vec<ItemSnapshot> {
        self.queue().items.iter().map(WorkItem::snapshot).collect()
    }

    /// Append sources as idle items, in order, then process the queue.
    ///
    /// Returns the new item ids in the same order as `sources`. When another
    /// thread is already processing, the new items are picked up by that
    /// run and this call returns without rendering.
    pub fn enqueue(&self, sources: impl IntoIterator<Item = SourceImage>) -> Vec<ItemId> {
        let mut ids = Vec::new();
        {
            let mut queue = self.queue();
            for source in sources {
                let id = ItemId(queue.next_id);
                queue.next_id += 1;

                let item = WorkItem {
                    id,
                    name: source.name().to_string(),
                    media_type: source.media_type().to_string(),
                    source: Some(Arc::new(source)),
                    state: ItemState::Idle,
                };
                self.emit(item.status_event());
                queue.items.push(item);
                ids.push(id);
            }
        }
        log::info!("queued {} item(s)", ids.len());

        self.process_pending();
        ids
    }

    /// Render idle items one at a time until none are left.
    ///
    /// Returns how many items this call rendered; `0` when another call is
    /// already in flight.
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        loop {
            let Some(guard) = InFlight::acquire(&self.in_flight) else {
                log::debug!("processing already in flight");
                return processed;
            };

            while let Some((id, source, mode)) = self.claim_next() {
                let result = self.render(&source, mode);
                drop(source);
                self.finish(id, result);
                processed += 1;
            }
            drop(guard);

            // An enqueue that ran between the last claim and the release
            // saw the flag still set and left its items to us.
            if !self.has_idle() {
                return processed;
            }
        }
    }

    /// Remove an item in any state, dropping its buffers.
    pub fn remove(&self, id: ItemId) -> Result<(), BatchError> {
        let mut queue = self.queue();
        let pos = queue
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(BatchError::NotFound(id))?;
        let item = queue.items.remove(pos);
        drop(queue);

        if matches!(item.state, ItemState::Processing) {
            log::debug!("{id} {}: removed while processing", item.name);
        }
        log::info!("{id} {}: removed", item.name);
        self.emit(BatchEvent::Removed {
            id,
            name: item.name,
        });
        Ok(())
    }

    /// Drop every item. Returns how many were removed.
    pub fn reset(&self) -> usize {
        let count = {
            let mut queue = self.queue();
            let count = queue.items.len();
            queue.items.clear();
            count
        };
        log::info!("batch reset, {count} item(s) dropped");
        self.emit(BatchEvent::Cleared { count });
        count
    }

    /// Downloadable result of one completed item.
    ///
    /// Single mode yields `{stem}_resized.{ext}`; mosaic mode yields
    /// `{stem}_mosaico.zip`. A failed export leaves the item untouched.
    pub fn export(&self, id: ItemId) -> Result<Artifact, ExportError> {
        let queue = self.queue();
        let item = queue
            .items
            .iter()
            .find(|item| item.id == id)
            .ok_or(ExportError::NotFound(id))?;
        build_artifact(queue.mode, item)
    }

    /// Export every completed item, each on its own.
    pub fn export_all(&self) -> Vec<(ItemId, Result<Artifact, ExportError>)> {
        let queue = self.queue();
        queue
            .items
            .iter()
            .filter(|item| item.status() == ItemStatus::Completed)
            .map(|item| {
                let artifact = build_artifact(queue.mode, item);
                if let Err(err) = &artifact {
                    log::error!("{} export failed: {err}", item.id);
                }
                (item.id, artifact)
            })
            .collect()
    }

    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn has_idle(&self) -> bool {
        self.queue()
            .items
            .iter()
            .any(|item| matches!(item.state, ItemState::Idle))
    }

    /// Mark the first idle item as processing and hand out its source.
    fn claim_next(&self) -> Option<(ItemId, Arc<SourceImage>, Mode)> {
        let mut queue = self.queue();
        let mode = queue.mode;
        let item = queue
            .items
            .iter_mut()
            .find(|item| matches!(item.state, ItemState::Idle))?;

        let source = Arc::clone(item.source.as_ref()?);
        item.state = ItemState::Processing;
        self.emit(item.status_event());
        Some((item.id, source, mode))
    }

    fn render(&self, source: &SourceImage, mode: Mode) -> Result<Vec<EncodedBuffer>, BackendError> {
        match mode {
            Mode::Single => resize_image(&self.backend, source, &self.spec).map(|out| vec![out]),
            Mode::Mosaic => tile_image(&self.backend, source, &self.spec, self.grid),
        }
    }

    fn finish(&self, id: ItemId, result: Result<Vec<EncodedBuffer>, BackendError>) {
        let mut queue = self.queue();
        let Some(item) = queue.items.iter_mut().find(|item| item.id == id) else {
            log::debug!("{id}: item gone before its render finished, output discarded");
            return;
        };

        item.state = match result {
            Ok(outputs) => {
                log::info!("{id} {}: completed, {} output(s)", item.name, outputs.len());
                ItemState::Completed(outputs)
            }
            Err(err) => {
                log::error!("{id} failed: {err}");
                ItemState::Failed(err)
            }
        };
        item.source = None;
        self.emit(item.status_event());
    }
}

fn build_artifact(mode: Mode, item: &WorkItem) -> Result<Artifact, ExportError> {
    let ItemState::Completed(outputs) = &item.state else {
        return Err(ExportError::NotCompleted {
            name: item.name.clone(),
            status: item.status(),
        });
    };

    match mode {
        Mode::Single => {
            let buffer = outputs.first().ok_or_else(|| ExportError::NoOutput {
                name: item.name.clone(),
            })?;
            Ok(Artifact {
                filename: resized_filename(&item.name, &buffer.media_type),
                buffer: buffer.clone(),
            })
        }
        Mode::Mosaic => {
            let base = base_name(&item.name);
            let buffer = package_zip(outputs, base).map_err(|source| ExportError::Archive {
                name: item.name.clone(),
                source,
            })?;
            Ok(Artifact {
                filename: mosaic_archive_name(base),
                buffer,
            })
        }
    }
}
