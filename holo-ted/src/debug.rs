//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::link::TeLink;

// TED debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    LinkCreate(&'a TeLink),
    LinkUpdate(&'a TeLink),
    LinkUpdateIgnored(&'a TeLink),
    LinkStateChange(&'a TeLink),
    LinkTimestampUpdate(&'a TeLink),
    RoutingTableRebuild(usize),
    Clear,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::LinkCreate(link)
            | Debug::LinkUpdate(link)
            | Debug::LinkUpdateIgnored(link) => {
                // Parent span(s): ted
                debug_span!("link", adv_router = %link.adv_router, link_id = %link.link_id)
                    .in_scope(|| {
                        let data = serde_json::to_string(&link).unwrap();
                        debug!(%data, "{}", self);
                    });
            }
            Debug::LinkStateChange(link) => {
                // Parent span(s): ted
                debug_span!("link", adv_router = %link.adv_router, link_id = %link.link_id)
                    .in_scope(|| {
                        debug!(state = %link.state, "{}", self);
                    });
            }
            Debug::LinkTimestampUpdate(link) => {
                // Parent span(s): ted
                debug_span!("link", adv_router = %link.adv_router, link_id = %link.link_id)
                    .in_scope(|| {
                        debug!(
                            message_id = %link.message_id,
                            timestamp = ?link.timestamp,
                            "{}", self
                        );
                    });
            }
            Debug::RoutingTableRebuild(routes) => {
                // Parent span(s): ted
                debug!(%routes, "{}", self);
            }
            Debug::Clear => {
                // Parent span(s): ted
                debug!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::LinkCreate(..) => {
                write!(f, "link created")
            }
            Debug::LinkUpdate(..) => {
                write!(f, "link updated")
            }
            Debug::LinkUpdateIgnored(..) => {
                write!(f, "ignoring stale link advertisement")
            }
            Debug::LinkStateChange(..) => {
                write!(f, "link state changed")
            }
            Debug::LinkTimestampUpdate(..) => {
                write!(f, "link timestamp updated")
            }
            Debug::RoutingTableRebuild(..) => {
                write!(f, "routing table rebuilt")
            }
            Debug::Clear => {
                write!(f, "database cleared")
            }
        }
    }
}
