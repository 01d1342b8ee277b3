//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::task::TimerHandle;

use crate::collections::{PsbId, PsbIndex, PsbKey};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, PSB_TIMEOUT_INTERVAL};
use crate::packet::{
    EroHop, PathMsg, RsvpHop, SenderTemplate, SenderTspec, Session,
};
use crate::traffic::{PathOwner, TrafficPath};
use crate::{admission, output, rsb, tasks};

// Path State Block.
#[derive(Debug)]
pub struct Psb {
    pub id: PsbId,
    pub session: Session,
    pub sender: SenderTemplate,
    pub tspec: SenderTspec,
    // Previous hop router. Equal to the local router ID at the ingress.
    pub phop: Ipv4Addr,
    // Outgoing interface. `None` at the egress.
    pub out_iface: Option<Ipv4Addr>,
    pub ero: Vec<EroHop>,
    pub color: u32,
    // Tunnel owner, only known at the ingress.
    pub owner: Option<PathOwner>,
    pub refresh_timer: Option<TimerHandle>,
    pub timeout_timer: Option<TimerHandle>,
}

// Outcome of the next hop evaluation for a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NextHop {
    Unreachable,
    Egress,
    Interface(Ipv4Addr),
}

// ===== impl Psb =====

impl Psb {
    pub(crate) fn key(&self) -> PsbKey {
        (self.session.key(), self.sender)
    }

    pub(crate) fn is_ingress(&self, router_id: Ipv4Addr) -> bool {
        self.phop == router_id
    }
}

// ===== global functions =====

// Creates a PSB for a PATH received from upstream.
//
// Returns `None` if the path can't be accommodated.
pub(crate) fn create(
    instance: &mut Instance,
    msg: &PathMsg,
) -> Option<PsbIndex> {
    let next_hop = eval_next_hop_interface(
        instance,
        msg.session.dst_addr,
        &msg.ero,
    );
    let out_iface = match next_hop {
        NextHop::Unreachable => return None,
        NextHop::Egress => None,
        NextHop::Interface(addr) => Some(addr),
    };
    if let Some(out_iface) = out_iface
        && instance.ted.is_local_address(out_iface)
        && !admission::cac_check(instance, &msg.session, &msg.tspec, out_iface)
    {
        return None;
    }

    let psb = Psb {
        id: instance.state.psbs.next_id(),
        session: msg.session,
        sender: msg.sender,
        tspec: msg.tspec,
        phop: msg.hop.addr,
        out_iface,
        ero: msg.ero.clone(),
        color: msg.color,
        owner: None,
        refresh_timer: None,
        timeout_timer: None,
    };
    let (psb_idx, psb) = instance.state.psbs.insert(psb);
    Debug::PsbCreate(psb).log();

    Some(psb_idx)
}

// Creates the PSB of a locally originated path.
//
// Returns `None` if the path can't be accommodated.
pub(crate) fn create_ingress(
    instance: &mut Instance,
    session: &Session,
    path: &TrafficPath,
) -> Option<PsbIndex> {
    let router_id = instance.router_id();

    // Remove ourselves from the beginning of the hop list.
    let ero = strip_local_hops(&path.ero, router_id);

    let next_hop =
        eval_next_hop_interface(instance, session.dst_addr, &ero);
    let out_iface = match next_hop {
        NextHop::Unreachable => return None,
        NextHop::Egress => None,
        NextHop::Interface(addr) => Some(addr),
    };
    if let Some(out_iface) = out_iface
        && !admission::cac_check(instance, session, &path.tspec, out_iface)
    {
        return None;
    }

    let psb = Psb {
        id: instance.state.psbs.next_id(),
        session: *session,
        sender: path.sender,
        tspec: path.tspec,
        phop: router_id,
        out_iface,
        ero,
        color: path.color,
        owner: Some(path.owner),
        refresh_timer: None,
        timeout_timer: None,
    };
    let (psb_idx, psb) = instance.state.psbs.insert(psb);
    Debug::PsbCreate(psb).log();

    Some(psb_idx)
}

// Removes the PSB, along with the RSB flow that depends on it.
pub(crate) fn remove(instance: &mut Instance, psb_idx: PsbIndex) {
    let psb = &instance.state.psbs[psb_idx];
    Debug::PsbDelete(psb).log();

    // Remove reservation state if it exists.
    let session = psb.session;
    let sender = psb.sender;
    if let Some((rsb_idx, _, flow_idx)) =
        instance.state.rsbs.find_by_filter(&session, &sender)
    {
        rsb::remove_flow(instance, rsb_idx, flow_idx);
    }

    // Cancel timers.
    let psb = &mut instance.state.psbs[psb_idx];
    let timers = [psb.refresh_timer.take(), psb.timeout_timer.take()];
    for timer in timers.into_iter().flatten() {
        instance.tx.sched.cancel(timer);
    }

    instance.state.psbs.delete(psb_idx);
}

// Determines the outgoing interface of a path.
//
// Explicitly routed paths follow the first ERO hop, while all other paths
// follow the routing table.
pub(crate) fn eval_next_hop_interface(
    instance: &Instance,
    dst_addr: Ipv4Addr,
    ero: &[EroHop],
) -> NextHop {
    let ted = &instance.ted;

    if let Some(hop) = ero.first() {
        // Explicit routing.
        let out_iface = if hop.loose {
            match ted.route_interface(hop.node) {
                Some(out_iface) => out_iface,
                None => {
                    Debug::NextHopUnroutable(&hop.node).log();
                    return NextHop::Unreachable;
                }
            }
        } else {
            match ted.find_interface_addr_by_peer(hop.node) {
                Some(out_iface) => out_iface,
                None => {
                    Error::NotRsvpPeer(hop.node).log();
                    return NextHop::Unreachable;
                }
            }
        };

        let hello = ted
            .find_peer_by_local_address(out_iface)
            .and_then(|peer| instance.state.hellos.get(&peer));
        match hello {
            // Only usable if the next hop is up and running.
            Some(hello) if hello.ok => NextHop::Interface(out_iface),
            Some(_) => NextHop::Unreachable,
            None => {
                Error::NotRsvpPeer(hop.node).log();
                NextHop::Unreachable
            }
        }
    } else {
        // Hop-by-hop routing.
        if ted.is_local_address(dst_addr) {
            return NextHop::Egress;
        }

        let Some(out_iface) = ted.route_interface(dst_addr) else {
            Debug::NextHopUnroutable(&dst_addr).log();
            return NextHop::Unreachable;
        };

        let hello = ted
            .find_peer_by_local_address(out_iface)
            .and_then(|peer| instance.state.hellos.get(&peer));
        match hello {
            Some(hello) if hello.ok => NextHop::Interface(out_iface),
            Some(_) => NextHop::Unreachable,
            // The next hop doesn't speak RSVP, so we're the egress.
            None => NextHop::Egress,
        }
    }
}

// Sends a PATH refresh downstream.
pub(crate) fn refresh(instance: &mut Instance, psb_idx: PsbIndex) {
    let psb = &instance.state.psbs[psb_idx];
    Debug::PsbRefresh(psb).log();

    let Some(out_iface) = psb.out_iface else {
        return;
    };
    let Some(nexthop) = instance.ted.find_peer_by_local_address(out_iface)
    else {
        return;
    };

    let msg = PathMsg {
        session: psb.session,
        sender: psb.sender,
        tspec: psb.tspec,
        hop: RsvpHop::new(out_iface, instance.router_id()),
        ero: psb.ero.clone(),
        color: psb.color,
    };
    output::send_path(instance, nexthop, msg);
}

// Sends a PATH_TEAR downstream, if the path leaves through a local
// interface.
pub(crate) fn send_tear(instance: &mut Instance, psb_idx: PsbIndex, force: bool) {
    let psb = &instance.state.psbs[psb_idx];
    let Some(out_iface) = psb.out_iface else {
        return;
    };
    let Some(nexthop) = instance.ted.find_peer_by_local_address(out_iface)
    else {
        return;
    };

    let (session, sender) = (psb.session, psb.sender);
    output::send_path_tear(instance, nexthop, session, sender, out_iface, force);
}

// (Re)starts the refresh timer. Only PSBs with a local outgoing interface
// are refreshed.
pub(crate) fn schedule_refresh(
    instance: &mut Instance,
    psb_idx: PsbIndex,
    delay: Duration,
) {
    let psb = &instance.state.psbs[psb_idx];
    let Some(out_iface) = psb.out_iface else {
        return;
    };
    if !instance.ted.is_local_address(out_iface) {
        return;
    }

    let psb_id = psb.id;
    let psb = &mut instance.state.psbs[psb_idx];
    if let Some(timer) = psb.refresh_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer =
        tasks::psb_refresh_timer(psb_id, delay, instance.tx.sched.as_mut());
    instance.state.psbs[psb_idx].refresh_timer = Some(timer);
}

// (Re)starts the timeout timer.
pub(crate) fn schedule_timeout(instance: &mut Instance, psb_idx: PsbIndex) {
    let psb = &mut instance.state.psbs[psb_idx];
    let psb_id = psb.id;
    if let Some(timer) = psb.timeout_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer = tasks::psb_timeout_timer(
        psb_id,
        PSB_TIMEOUT_INTERVAL,
        instance.tx.sched.as_mut(),
    );
    instance.state.psbs[psb_idx].timeout_timer = Some(timer);
}

// Returns the ERO without the leading hops that refer to this router.
pub(crate) fn strip_local_hops(
    ero: &[EroHop],
    router_id: Ipv4Addr,
) -> Vec<EroHop> {
    ero.iter()
        .skip_while(|hop| hop.node == router_id)
        .copied()
        .collect()
}

// ===== unit tests =====
