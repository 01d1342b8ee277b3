//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::mpls::{Label, LabelOp};
use tracing::{debug, debug_span};

use crate::packet::{FilterSpec, Message, SenderTemplate, Session, SessionKey};
use crate::psb::Psb;
use crate::rsb::Rsb;
use crate::tasks::messages::PathNotifyMsg;

// RSVP debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate,
    InstanceStart,
    InstanceStop,
    MsgRx(&'a Ipv4Addr, &'a Message),
    MsgTx(&'a Ipv4Addr, &'a Message),
    PsbCreate(&'a Psb),
    PsbDelete(&'a Psb),
    PsbRefresh(&'a Psb),
    PsbTimeout(&'a Psb),
    NextHopUnroutable(&'a Ipv4Addr),
    NoMatchingPsb(&'a Session, &'a SenderTemplate),
    PathTearIgnored(&'a Session, &'a SenderTemplate),
    PathCreated(&'a Session, &'a SenderTemplate),
    PathNotify(&'a PathNotifyMsg),
    RsbCreate(&'a Rsb),
    RsbDelete(&'a Rsb),
    RsbCommit(&'a Rsb),
    RsbRefresh(&'a Rsb),
    RsbTimeout(&'a Rsb),
    RsbFlowAdd(&'a Rsb, &'a FilterSpec),
    RsbFlowDelete(&'a Rsb, &'a FilterSpec),
    RsbFlowEvict(&'a Rsb, &'a FilterSpec),
    RsbFlowLabelUpdate(&'a Rsb, &'a FilterSpec, &'a Option<Label>),
    LabelInstall(&'a Session, &'a FilterSpec, &'a Label, &'a LabelOp),
    LabelRemove(&'a Session, &'a FilterSpec, &'a Label),
    LabelMissing(&'a Session, &'a FilterSpec),
    CacCheck(&'a Ipv4Addr, f64, f64, f64, f64, bool),
    BandwidthAllocate(&'a Ipv4Addr, &'a Session, f64),
    Preempt(&'a Rsb, usize),
    HelloCreate(&'a Ipv4Addr),
    HelloDelete(&'a Ipv4Addr),
    HelloStart(&'a Ipv4Addr, &'a Duration),
    HelloTimeout(&'a Ipv4Addr),
    HelloIgnored(&'a Ipv4Addr),
    HelloInstanceMismatch(&'a Ipv4Addr),
    HelloPeerUp(&'a Ipv4Addr),
    TrafficSessionCreate(&'a SessionKey),
    TrafficSessionDelete(&'a SessionKey),
    TrafficPathCreate(&'a SessionKey, &'a SenderTemplate),
    TrafficPathDelete(&'a SessionKey, &'a SenderTemplate),
    TrafficPathExists(&'a SessionKey, &'a SenderTemplate),
    TrafficPathActive(&'a SessionKey, &'a SenderTemplate),
    TrafficPathUnknown(&'a SessionKey, &'a SenderTemplate),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate
            | Debug::InstanceStart
            | Debug::InstanceStop => {
                // Parent span(s): rsvp-instance
                debug!("{}", self);
            }
            Debug::MsgRx(addr, msg) => {
                // Parent span(s): rsvp-instance
                debug_span!("input", source = %addr).in_scope(|| {
                    let data = serde_json::to_string(&msg).unwrap();
                    debug!(r#type = %msg.msg_type(), %data, "{}", self);
                });
            }
            Debug::MsgTx(addr, msg) => {
                // Parent span(s): rsvp-instance
                debug_span!("output", destination = %addr).in_scope(|| {
                    let data = serde_json::to_string(&msg).unwrap();
                    debug!(r#type = %msg.msg_type(), %data, "{}", self);
                });
            }
            Debug::PsbCreate(psb)
            | Debug::PsbDelete(psb)
            | Debug::PsbRefresh(psb)
            | Debug::PsbTimeout(psb) => {
                // Parent span(s): rsvp-instance
                debug_span!("psb", id = %psb.id, session = %psb.session, sender = %psb.sender)
                    .in_scope(|| {
                        let out_iface = psb
                            .out_iface
                            .map(|addr| addr.to_string())
                            .unwrap_or_else(|| "none".to_string());
                        debug!(phop = %psb.phop, %out_iface, "{}", self);
                    });
            }
            Debug::NextHopUnroutable(addr) => {
                // Parent span(s): rsvp-instance
                debug!(address = %addr, "{}", self);
            }
            Debug::NoMatchingPsb(session, sender)
            | Debug::PathTearIgnored(session, sender)
            | Debug::PathCreated(session, sender) => {
                // Parent span(s): rsvp-instance
                debug!(%session, %sender, "{}", self);
            }
            Debug::PathNotify(msg) => {
                // Parent span(s): rsvp-instance
                let data = serde_json::to_string(&msg).unwrap();
                debug!(status = %msg.status, %data, "{}", self);
            }
            Debug::RsbCreate(rsb)
            | Debug::RsbDelete(rsb)
            | Debug::RsbCommit(rsb)
            | Debug::RsbRefresh(rsb)
            | Debug::RsbTimeout(rsb) => {
                // Parent span(s): rsvp-instance
                debug_span!("rsb", id = %rsb.id, session = %rsb.session, nhop = %rsb.nhop)
                    .in_scope(|| {
                        debug!(
                            bandwidth = %rsb.flowspec.bandwidth,
                            flows = %rsb.flows.len(),
                            "{}", self
                        );
                    });
            }
            Debug::RsbFlowAdd(rsb, filter)
            | Debug::RsbFlowDelete(rsb, filter)
            | Debug::RsbFlowEvict(rsb, filter) => {
                // Parent span(s): rsvp-instance
                debug_span!("rsb", id = %rsb.id, session = %rsb.session, nhop = %rsb.nhop)
                    .in_scope(|| {
                        debug!(%filter, "{}", self);
                    });
            }
            Debug::RsbFlowLabelUpdate(rsb, filter, label) => {
                // Parent span(s): rsvp-instance
                let label = label
                    .map(|label| label.to_string())
                    .unwrap_or_else(|| "none".to_string());
                debug_span!("rsb", id = %rsb.id, session = %rsb.session, nhop = %rsb.nhop)
                    .in_scope(|| {
                        debug!(%filter, %label, "{}", self);
                    });
            }
            Debug::LabelInstall(session, filter, in_label, out_op) => {
                // Parent span(s): rsvp-instance
                debug_span!("lib", %session, %filter).in_scope(|| {
                    debug!(%in_label, %out_op, "{}", self);
                });
            }
            Debug::LabelRemove(session, filter, in_label) => {
                // Parent span(s): rsvp-instance
                debug_span!("lib", %session, %filter).in_scope(|| {
                    debug!(%in_label, "{}", self);
                });
            }
            Debug::LabelMissing(session, filter) => {
                // Parent span(s): rsvp-instance
                debug_span!("lib", %session, %filter).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::CacCheck(
                iface,
                requested,
                shared,
                unreserved,
                available,
                admitted,
            ) => {
                // Parent span(s): rsvp-instance
                debug_span!("admission", interface = %iface).in_scope(|| {
                    debug!(
                        %requested,
                        %shared,
                        %unreserved,
                        %available,
                        %admitted,
                        "{}", self
                    );
                });
            }
            Debug::BandwidthAllocate(iface, session, bandwidth) => {
                // Parent span(s): rsvp-instance
                debug_span!("admission", interface = %iface).in_scope(|| {
                    debug!(%session, %bandwidth, "{}", self);
                });
            }
            Debug::Preempt(rsb, priority) => {
                // Parent span(s): rsvp-instance
                let iface = rsb
                    .out_iface
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|| "none".to_string());
                debug_span!("admission", interface = %iface).in_scope(|| {
                    debug!(
                        session = %rsb.session,
                        bandwidth = %rsb.flowspec.bandwidth,
                        %priority,
                        "{}", self
                    );
                });
            }
            Debug::HelloCreate(peer)
            | Debug::HelloDelete(peer)
            | Debug::HelloTimeout(peer)
            | Debug::HelloIgnored(peer)
            | Debug::HelloInstanceMismatch(peer)
            | Debug::HelloPeerUp(peer) => {
                // Parent span(s): rsvp-instance
                debug_span!("hello", %peer).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::HelloStart(peer, delay) => {
                // Parent span(s): rsvp-instance
                debug_span!("hello", %peer).in_scope(|| {
                    debug!(?delay, "{}", self);
                });
            }
            Debug::TrafficSessionCreate(key)
            | Debug::TrafficSessionDelete(key) => {
                // Parent span(s): rsvp-instance
                debug_span!("traffic").in_scope(|| {
                    debug!(
                        tunnel_id = %key.tunnel_id,
                        dst_addr = %key.dst_addr,
                        "{}", self
                    );
                });
            }
            Debug::TrafficPathCreate(key, sender)
            | Debug::TrafficPathDelete(key, sender)
            | Debug::TrafficPathExists(key, sender)
            | Debug::TrafficPathActive(key, sender)
            | Debug::TrafficPathUnknown(key, sender) => {
                // Parent span(s): rsvp-instance
                debug_span!("traffic").in_scope(|| {
                    debug!(
                        tunnel_id = %key.tunnel_id,
                        dst_addr = %key.dst_addr,
                        %sender,
                        "{}", self
                    );
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::InstanceStop => {
                write!(f, "stopping instance")
            }
            Debug::MsgRx(..) | Debug::MsgTx(..) => {
                write!(f, "message")
            }
            Debug::PsbCreate(..) => {
                write!(f, "path state created")
            }
            Debug::PsbDelete(..) => {
                write!(f, "path state deleted")
            }
            Debug::PsbRefresh(..) => {
                write!(f, "refreshing path state")
            }
            Debug::PsbTimeout(..) => {
                write!(f, "path state timed out")
            }
            Debug::NextHopUnroutable(..) => {
                write!(f, "no route to next hop")
            }
            Debug::NoMatchingPsb(..) => {
                write!(f, "no matching path state")
            }
            Debug::PathTearIgnored(..) => {
                write!(f, "ignoring teardown of merged path")
            }
            Debug::PathCreated(..) => {
                write!(f, "path established")
            }
            Debug::PathNotify(..) => {
                write!(f, "path status notification")
            }
            Debug::RsbCreate(..) => {
                write!(f, "reservation state created")
            }
            Debug::RsbDelete(..) => {
                write!(f, "reservation state deleted")
            }
            Debug::RsbCommit(..) => {
                write!(f, "committing reservation")
            }
            Debug::RsbRefresh(..) => {
                write!(f, "refreshing reservation state")
            }
            Debug::RsbTimeout(..) => {
                write!(f, "reservation state timed out")
            }
            Debug::RsbFlowAdd(..) => {
                write!(f, "flow added")
            }
            Debug::RsbFlowDelete(..) => {
                write!(f, "flow deleted")
            }
            Debug::RsbFlowEvict(..) => {
                write!(f, "flow evicted")
            }
            Debug::RsbFlowLabelUpdate(..) => {
                write!(f, "flow label updated")
            }
            Debug::LabelInstall(..) => {
                write!(f, "label installed")
            }
            Debug::LabelRemove(..) => {
                write!(f, "label removed")
            }
            Debug::LabelMissing(..) => {
                write!(f, "downstream label missing")
            }
            Debug::CacCheck(..) => {
                write!(f, "admission control check")
            }
            Debug::BandwidthAllocate(..) => {
                write!(f, "bandwidth allocated")
            }
            Debug::Preempt(..) => {
                write!(f, "preempting reservation")
            }
            Debug::HelloCreate(..) => {
                write!(f, "hello state created")
            }
            Debug::HelloDelete(..) => {
                write!(f, "hello state deleted")
            }
            Debug::HelloStart(..) => {
                write!(f, "starting hello exchange")
            }
            Debug::HelloTimeout(..) => {
                write!(f, "hello timed out")
            }
            Debug::HelloIgnored(..) => {
                write!(f, "ignoring hello")
            }
            Debug::HelloInstanceMismatch(..) => {
                write!(f, "hello instance mismatch")
            }
            Debug::HelloPeerUp(..) => {
                write!(f, "peer is up")
            }
            Debug::TrafficSessionCreate(..) => {
                write!(f, "session created")
            }
            Debug::TrafficSessionDelete(..) => {
                write!(f, "session deleted")
            }
            Debug::TrafficPathCreate(..) => {
                write!(f, "path created")
            }
            Debug::TrafficPathDelete(..) => {
                write!(f, "path deleted")
            }
            Debug::TrafficPathExists(..) => {
                write!(f, "path already exists")
            }
            Debug::TrafficPathActive(..) => {
                write!(f, "path is already signalled")
            }
            Debug::TrafficPathUnknown(..) => {
                write!(f, "unknown path")
            }
        }
    }
}
