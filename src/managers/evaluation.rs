use crate::client::{Evaluation, Listing, ResourceKind};
use crate::events::{Envelope, EventType};
use crate::watch::WatchState;

use super::{Resource, collect_indexed, decode_records};

/// Scheduler evaluations.
///
/// Evaluations with `SnapshotIndex == 0` are not yet persisted and are never
/// emitted; they still move the watermark.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluations;

impl Resource for Evaluations {
    fn event_type(&self) -> EventType {
        EventType::Evaluation
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Evaluations
    }

    fn allow_stale(&self) -> bool {
        true
    }

    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope> {
        let evals: Vec<Evaluation> = decode_records(self.kind(), listing.records);
        let out = collect_indexed(state, EventType::Evaluation, &evals, |e| e.snapshot_index != 0);
        state.advance_index(listing.last_index);
        out
    }
}
