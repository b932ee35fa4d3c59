use crate::client::{JobStub, Listing, ResourceKind};
use crate::events::{Envelope, EventType};
use crate::watch::WatchState;

use super::{Resource, collect_indexed, decode_records};

/// Job changes. The watermark is the highest job modify index seen; the API's
/// reported index is not folded in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jobs;

impl Resource for Jobs {
    fn event_type(&self) -> EventType {
        EventType::Job
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Jobs
    }

    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope> {
        let jobs: Vec<JobStub> = decode_records(self.kind(), listing.records);
        collect_indexed(state, EventType::Job, &jobs, |_| true)
    }
}
