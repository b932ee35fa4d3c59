use crate::client::{Listing, NodeStub, ResourceKind};
use crate::events::{Envelope, EventType};
use crate::watch::WatchState;

use super::{Resource, collect_indexed, decode_records};

/// Node registrations and status changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nodes;

impl Resource for Nodes {
    fn event_type(&self) -> EventType {
        EventType::Node
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Nodes
    }

    fn collect(&self, state: &mut WatchState, listing: Listing) -> Vec<Envelope> {
        let nodes: Vec<NodeStub> = decode_records(self.kind(), listing.records);
        let out = collect_indexed(state, EventType::Node, &nodes, |_| true);
        state.advance_index(listing.last_index);
        out
    }
}
