//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use holo_ted::link::PRIORITY_LEVELS;

use crate::debug::Debug;
use crate::instance::Instance;
use crate::packet::{SenderTspec, Session};
use crate::rsb;
use crate::tasks::messages::output::{ProtocolMsg, TedChangedMsg};

// Checks whether a path fits in the outgoing interface.
//
// Reservations already held by the same session are shared, so they count
// as available bandwidth.
pub(crate) fn cac_check(
    instance: &Instance,
    session: &Session,
    tspec: &SenderTspec,
    out_iface: Ipv4Addr,
) -> bool {
    let Some(index) = instance.ted.find_link_index_by_local(out_iface) else {
        return true;
    };
    let link = &instance.ted.links[index];

    let shared = instance
        .state
        .rsbs
        .iter()
        .filter(|rsb| rsb.session == *session)
        .map(|rsb| rsb.flowspec.bandwidth)
        .fold(0.0, f64::max);
    let available = link.unresv_bandwidth[session.setup_pri as usize];
    let admitted = available + shared >= tspec.bandwidth;

    Debug::CacCheck(
        &out_iface,
        tspec.bandwidth,
        shared,
        link.unresv_bandwidth[PRIORITY_LEVELS - 1],
        available,
        admitted,
    )
    .log();

    admitted
}

// Reserves (or releases, if negative) bandwidth on the outgoing interface.
//
// Oversubscribed priority levels are relieved by preempting reservations
// held at that level. Returns false if the setup priority level doesn't have
// enough bandwidth.
pub(crate) fn allocate_resource(
    instance: &mut Instance,
    out_iface: Option<Ipv4Addr>,
    session: &Session,
    bandwidth: f64,
) -> bool {
    let Some(out_iface) = out_iface else {
        return true;
    };
    if !instance.ted.is_local_address(out_iface) || bandwidth == 0.0 {
        return true;
    }
    let Some(index) = instance.ted.find_link_index_by_local(out_iface) else {
        return true;
    };

    // Note: unresv[7] <= unresv[setup_pri] <= unresv[holding_pri] <= max.
    // unresv[7] is the bandwidth actually left on the link.
    let link = &instance.ted.links[index];
    if link.unresv_bandwidth[session.setup_pri as usize] < bandwidth {
        return false;
    }

    Debug::BandwidthAllocate(&out_iface, session, bandwidth).log();
    for priority in session.holding_pri as usize..PRIORITY_LEVELS {
        let deficit = instance.ted.links[index].reserve(priority, bandwidth);
        if let Some(deficit) = deficit {
            preempt(instance, out_iface, priority, deficit);
        }
    }

    announce_link_change(instance, index);

    true
}

// Frees at least `bandwidth` on the outgoing interface by zeroing the
// reservations held at the given priority.
//
// The victims learn about it when their commit timer fires.
pub(crate) fn preempt(
    instance: &mut Instance,
    out_iface: Ipv4Addr,
    priority: usize,
    mut bandwidth: f64,
) {
    let Some(index) = instance.ted.find_link_index_by_local(out_iface) else {
        return;
    };

    for rsb_id in instance.state.rsbs.ids_by(|rsb| {
        rsb.out_iface == Some(out_iface)
            && rsb.session.holding_pri as usize == priority
            && rsb.flowspec.bandwidth != 0.0
    }) {
        let Ok((rsb_idx, rsb)) = instance.state.rsbs.get_mut_by_id(rsb_id)
        else {
            continue;
        };
        let reserved = rsb.flowspec.bandwidth;
        Debug::Preempt(rsb, priority).log();

        instance.ted.links[index].release(priority, reserved);
        bandwidth -= reserved;
        rsb.flowspec.bandwidth = 0.0;
        rsb::schedule_commit(instance, rsb_idx);

        if bandwidth <= 0.0 {
            break;
        }
    }
}

// Stamps a locally modified link and hands it over for flooding.
pub(crate) fn announce_link_change(instance: &mut Instance, index: usize) {
    let now = instance.now();
    instance.ted.update_timestamp(index, now);

    let link = instance.ted.links[index].clone();
    let msg = ProtocolMsg::TedChanged(TedChangedMsg { link });
    let _ = instance.tx.protocol_output.send(msg);
}
