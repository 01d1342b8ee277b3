//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// Number of setup/holding priority levels.
pub const PRIORITY_LEVELS: usize = 8;

// Lowest setup/holding priority.
pub const PRIORITY_LOWEST: u8 = 7;

// Directed TE link, as advertised by the router that owns it.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct TeLink {
    pub adv_router: Ipv4Addr,
    pub link_id: Ipv4Addr,
    pub local: Ipv4Addr,
    pub remote: Ipv4Addr,
    pub max_bandwidth: f64,
    pub unresv_bandwidth: [f64; PRIORITY_LEVELS],
    pub metric: u32,
    pub state: bool,
    // Flooding freshness.
    pub source_id: Ipv4Addr,
    pub message_id: u32,
    pub timestamp: Duration,
}

// Outcome of comparing a received link advertisement against the database.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkValidity {
    // Already seen, or older than what is stored.
    Stale,
    // Unknown (advertising router, link ID) pair.
    New,
    // Supersedes the entry at the given index.
    Newer(usize),
}

// ===== impl TeLink =====

impl TeLink {
    pub fn new(
        adv_router: Ipv4Addr,
        link_id: Ipv4Addr,
        local: Ipv4Addr,
        remote: Ipv4Addr,
        bandwidth: f64,
        metric: u32,
    ) -> TeLink {
        TeLink {
            adv_router,
            link_id,
            local,
            remote,
            max_bandwidth: bandwidth,
            unresv_bandwidth: [bandwidth; PRIORITY_LEVELS],
            metric,
            state: true,
            source_id: adv_router,
            message_id: 0,
            timestamp: Duration::ZERO,
        }
    }

    // Takes bandwidth away from the given priority level.
    //
    // Returns the deficit when the level becomes oversubscribed.
    pub fn reserve(&mut self, priority: usize, bandwidth: f64) -> Option<f64> {
        self.unresv_bandwidth[priority] -= bandwidth;
        (self.unresv_bandwidth[priority] < 0.0)
            .then_some(-self.unresv_bandwidth[priority])
    }

    // Gives bandwidth back to the given priority level and all levels below
    // it.
    pub fn release(&mut self, priority: usize, bandwidth: f64) {
        for unresv in &mut self.unresv_bandwidth[priority..] {
            *unresv += bandwidth;
        }
    }

    pub(crate) fn same_origin(&self, other: &TeLink) -> bool {
        self.source_id == other.source_id
            && self.message_id == other.message_id
            && self.timestamp == other.timestamp
    }

    pub(crate) fn same_link(&self, other: &TeLink) -> bool {
        self.adv_router == other.adv_router && self.link_id == other.link_id
    }

    pub(crate) fn is_older_than(&self, other: &TeLink) -> bool {
        self.timestamp < other.timestamp
            || (self.timestamp == other.timestamp
                && self.message_id < other.message_id)
    }
}

// ===== unit tests =====
