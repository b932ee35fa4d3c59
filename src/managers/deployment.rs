use crate::client::{Deployment, Listing, ResourceKind};
use crate::events::{Envelope, EventType};
use crate::watch::WatchState;

use super::{Resource, collect_indexed, decode_records};

/// Deployment progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployments;

impl Resource for Deployments {
    fn event_type(&self) -> EventType {
        EventType::Deployment
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployments
    }

    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope> {
        let deployments: Vec<Deployment> = decode_records(self.kind(), listing.records);
        let out = collect_indexed(state, EventType::Deployment, &deployments, |_| true);
        state.advance_index(listing.last_index);
        out
    }
}
