//! Per-job record of materialized segments

use crate::types::{SegmentArtifact, SegmentRef};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Slot arena keyed by a segment's position in the selected range
///
/// Workers only touch their own slot, so the merge can walk slots in order
/// without caring which fetch finished first.
#[derive(Default)]
pub(crate) struct SegmentLedger {
    slots: Mutex<Vec<Slot>>,
    total: AtomicUsize,
    completed: AtomicUsize,
}

struct Slot {
    index: usize,
    artifact: Option<SegmentArtifact>,
}

impl SegmentLedger {
    /// Size the arena for `segments`, dropping anything recorded before
    pub(crate) async fn reset(&self, segments: &[SegmentRef]) {
        let mut slots = self.slots.lock().await;
        *slots = segments
            .iter()
            .map(|s| Slot {
                index: s.index,
                artifact: None,
            })
            .collect();
        self.total.store(segments.len(), Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
    }

    pub(crate) fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Store `artifact` in `slot` so cleanup can find it
    ///
    /// Progress is counted separately with [`mark_completed`](Self::mark_completed).
    pub(crate) async fn record(&self, slot: usize, artifact: SegmentArtifact) {
        if let Some(entry) = self.slots.lock().await.get_mut(slot) {
            entry.artifact = Some(artifact);
        }
    }

    /// Bump the completion counter and return the new count
    pub(crate) fn mark_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Playlist index and recorded artifact path for every slot, in order
    pub(crate) async fn plan(&self) -> Vec<(usize, Option<PathBuf>)> {
        self.slots
            .lock()
            .await
            .iter()
            .map(|s| (s.index, s.artifact.as_ref().map(|a| a.path.clone())))
            .collect()
    }

    /// Recorded artifacts in index order
    pub(crate) async fn artifacts(&self) -> Vec<SegmentArtifact> {
        self.slots
            .lock()
            .await
            .iter()
            .filter_map(|s| s.artifact.clone())
            .collect()
    }
}
