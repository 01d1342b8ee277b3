//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::mpls::{Label, LabelOp};
use holo_utils::task::TimerHandle;
use itertools::Itertools;

use crate::collections::{PsbIndex, RsbId, RsbIndex, RsbKey};
use crate::debug::Debug;
use crate::instance::{Instance, RSB_TIMEOUT_INTERVAL};
use crate::packet::{
    FilterSpec, FlowDescriptor, FlowSpec, PathErrCode, ResvMsg, RsvpHop,
    Session,
};
use crate::traffic::PathNotifyStatus;
use crate::{admission, output, tasks};

// Reservation State Block.
#[derive(Debug)]
pub struct Rsb {
    pub id: RsbId,
    pub session: Session,
    // Downstream router the reservation came from. At the egress, the
    // previous hop of the path.
    pub nhop: Ipv4Addr,
    // Outgoing interface. `None` at the egress.
    pub out_iface: Option<Ipv4Addr>,
    // Bandwidth currently reserved.
    pub flowspec: FlowSpec,
    pub flows: Vec<RsbFlow>,
    pub refresh_timer: Option<TimerHandle>,
    pub commit_timer: Option<TimerHandle>,
    pub timeout_timer: Option<TimerHandle>,
}

// Flow descriptor as stored in an RSB.
#[derive(Clone, Debug, PartialEq)]
pub struct RsbFlow {
    pub filter: FilterSpec,
    pub flowspec: FlowSpec,
    pub rro: Vec<Ipv4Addr>,
    // Label advertised by the downstream router.
    pub label: Option<Label>,
    // Label installed locally. `None` until the first commit.
    pub in_label: Option<Label>,
}

// ===== impl Rsb =====

impl Rsb {
    pub(crate) fn key(&self) -> RsbKey {
        (self.session.key(), self.nhop, self.out_iface)
    }

    // Returns the position and bandwidth of the largest flow.
    //
    // Shared reservations only need as much bandwidth as their largest flow.
    pub(crate) fn max_flow(&self) -> Option<(usize, f64)> {
        let mut max: Option<(usize, f64)> = None;
        for (flow_idx, flow) in self.flows.iter().enumerate() {
            let bandwidth = flow.flowspec.bandwidth;
            if max.is_none_or(|(_, max_bw)| bandwidth > max_bw) {
                max = Some((flow_idx, bandwidth));
            }
        }
        max
    }
}

// ===== impl RsbFlow =====

impl From<&FlowDescriptor> for RsbFlow {
    fn from(flow: &FlowDescriptor) -> RsbFlow {
        RsbFlow {
            filter: flow.filter,
            flowspec: flow.flowspec,
            rro: flow.rro.clone(),
            label: flow.label,
            in_label: None,
        }
    }
}

// ===== global functions =====

// Creates an RSB for a RESV received from downstream.
pub(crate) fn create(instance: &mut Instance, msg: &ResvMsg) -> RsbIndex {
    let rsb = Rsb {
        id: instance.state.rsbs.next_id(),
        session: msg.session,
        nhop: msg.hop.addr,
        out_iface: Some(msg.hop.lih),
        flowspec: FlowSpec::default(),
        flows: msg.flows.iter().map(RsbFlow::from).collect(),
        refresh_timer: None,
        commit_timer: None,
        timeout_timer: None,
    };
    let (rsb_idx, rsb) = instance.state.rsbs.insert(rsb);
    Debug::RsbCreate(rsb).log();

    rsb_idx
}

// Creates the reservation of a path that terminates at this router.
//
// Paths of the same session arriving from the same previous hop share a
// single RSB.
pub(crate) fn create_egress(
    instance: &mut Instance,
    psb_idx: PsbIndex,
) -> RsbIndex {
    let psb = &instance.state.psbs[psb_idx];
    let session = psb.session;
    let nhop = psb.phop;
    let out_iface = psb.out_iface;
    let flow = RsbFlow {
        filter: psb.sender,
        flowspec: psb.tspec,
        rro: vec![],
        label: None,
        in_label: None,
    };

    if let Some((rsb_idx, _)) =
        instance.state.rsbs.get_by_key(&session, nhop, out_iface)
    {
        let rsb = &mut instance.state.rsbs[rsb_idx];
        Debug::RsbFlowAdd(rsb, &flow.filter).log();
        rsb.flows.push(flow);
        return rsb_idx;
    }

    let rsb = Rsb {
        id: instance.state.rsbs.next_id(),
        session,
        nhop,
        out_iface,
        flowspec: FlowSpec::default(),
        flows: vec![flow],
        refresh_timer: None,
        commit_timer: None,
        timeout_timer: None,
    };
    let (rsb_idx, rsb) = instance.state.rsbs.insert(rsb);
    Debug::RsbCreate(rsb).log();

    rsb_idx
}

// Merges the flow descriptors of a RESV refresh into an existing RSB.
pub(crate) fn update(instance: &mut Instance, rsb_idx: RsbIndex, msg: &ResvMsg) {
    for fd in &msg.flows {
        let rsb = &mut instance.state.rsbs[rsb_idx];
        match rsb.flows.iter().position(|flow| flow.filter == fd.filter) {
            Some(flow_idx) => {
                if rsb.flows[flow_idx].label == fd.label {
                    continue;
                }

                // The label must be updated in the LIB.
                rsb.flows[flow_idx].label = fd.label;
                Debug::RsbFlowLabelUpdate(rsb, &fd.filter, &fd.label).log();
                schedule_commit(instance, rsb_idx);
            }
            None => {
                // The reservation is new and must be forwarded.
                Debug::RsbFlowAdd(rsb, &fd.filter).log();
                rsb.flows.push(RsbFlow::from(fd));
                schedule_commit(instance, rsb_idx);
                schedule_refresh(instance, rsb_idx, Duration::ZERO);
            }
        }
    }
}

// Removes a flow descriptor, along with its LIB entry.
pub(crate) fn remove_flow(
    instance: &mut Instance,
    rsb_idx: RsbIndex,
    flow_idx: usize,
) {
    let rsb = &mut instance.state.rsbs[rsb_idx];
    let flow = rsb.flows.remove(flow_idx);
    Debug::RsbFlowDelete(rsb, &flow.filter).log();

    if let Some(in_label) = flow.in_label {
        Debug::LabelRemove(&rsb.session, &flow.filter, &in_label).log();
        instance.tx.lib.remove(in_label);
    }

    schedule_commit(instance, rsb_idx);
}

pub(crate) fn remove_all_flows(instance: &mut Instance, rsb_idx: RsbIndex) {
    while !instance.state.rsbs[rsb_idx].flows.is_empty() {
        remove_flow(instance, rsb_idx, 0);
    }
}

// Removes an RSB that no longer has any flow, releasing its bandwidth.
pub(crate) fn remove(instance: &mut Instance, rsb_idx: RsbIndex) {
    let rsb = &mut instance.state.rsbs[rsb_idx];
    assert!(rsb.flows.is_empty());
    Debug::RsbDelete(rsb).log();

    // Cancel timers.
    let timers = [
        rsb.refresh_timer.take(),
        rsb.commit_timer.take(),
        rsb.timeout_timer.take(),
    ];
    let session = rsb.session;
    let out_iface = rsb.out_iface;
    let bandwidth = rsb.flowspec.bandwidth;
    for timer in timers.into_iter().flatten() {
        instance.tx.sched.cancel(timer);
    }

    instance.state.rsbs.delete(rsb_idx);

    // Deallocate resources.
    if bandwidth > 0.0 {
        admission::allocate_resource(instance, out_iface, &session, -bandwidth);
    }
}

// Adjusts the reservation to the flows it carries and installs their
// labels.
//
// Flows that can't be accommodated are evicted, largest first, and reported
// upstream. An RSB left without flows is removed.
pub(crate) fn commit(instance: &mut Instance, rsb_idx: RsbIndex) {
    Debug::RsbCommit(&instance.state.rsbs[rsb_idx]).log();

    // Allocate bandwidth as needed.
    loop {
        let rsb = &instance.state.rsbs[rsb_idx];
        let Some((max_flow_idx, required)) = rsb.max_flow() else {
            remove(instance, rsb_idx);
            return;
        };

        let needed = required - rsb.flowspec.bandwidth;
        if needed == 0.0 {
            break;
        }

        let session = rsb.session;
        let out_iface = rsb.out_iface;
        if admission::allocate_resource(instance, out_iface, &session, needed)
        {
            instance.state.rsbs[rsb_idx].flowspec.bandwidth += needed;
            break;
        }

        // Not enough bandwidth, give up on the largest flow.
        let rsb = &mut instance.state.rsbs[rsb_idx];
        let flow = rsb.flows.remove(max_flow_idx);
        Debug::RsbFlowEvict(rsb, &flow.filter).log();
        let code = match flow.in_label {
            // The path was already established, so this is preemption.
            Some(in_label) => {
                Debug::LabelRemove(&session, &flow.filter, &in_label).log();
                instance.tx.lib.remove(in_label);
                PathErrCode::Preempted
            }
            None => PathErrCode::Unfeasible,
        };
        if let Some((psb_idx, _)) =
            instance.state.psbs.get_by_key(&session, &flow.filter)
        {
            output::send_path_err_psb(instance, psb_idx, code);
        }
    }

    install_labels(instance, rsb_idx);
}

// Sends RESV refreshes to every upstream router with a path covered by the
// RSB.
pub(crate) fn refresh(instance: &mut Instance, rsb_idx: RsbIndex) {
    let rsb = &instance.state.rsbs[rsb_idx];
    Debug::RsbRefresh(rsb).log();

    let phops = instance
        .state
        .psbs
        .iter()
        .filter(|psb| {
            psb.session == rsb.session && psb.out_iface == rsb.out_iface
        })
        .filter(|psb| rsb.flows.iter().any(|flow| flow.filter == psb.sender))
        // Nothing to refresh at the ingress.
        .filter(|psb| !instance.ted.is_local_address(psb.phop))
        .map(|psb| psb.phop)
        .unique()
        .collect::<Vec<_>>();

    for phop in phops {
        refresh_phop(instance, rsb_idx, phop);
    }
}

// Sends a RESV refresh to the given upstream router.
fn refresh_phop(instance: &mut Instance, rsb_idx: RsbIndex, phop: Ipv4Addr) {
    let router_id = instance.router_id();
    let rsb = &instance.state.rsbs[rsb_idx];
    let Some(lih) = instance.ted.find_peer_remote_interface(phop) else {
        return;
    };

    let flows = instance
        .state
        .psbs
        .iter()
        .filter(|psb| psb.phop == phop && psb.session == rsb.session)
        .filter_map(|psb| {
            rsb.flows
                .iter()
                .find(|flow| flow.filter == psb.sender)
                .map(|flow| {
                    let mut rro = flow.rro.clone();
                    rro.push(router_id);
                    FlowDescriptor::new(
                        psb.sender,
                        psb.tspec,
                        rro,
                        flow.in_label,
                    )
                })
        })
        .collect::<Vec<_>>();

    let msg = ResvMsg {
        session: rsb.session,
        hop: RsvpHop::new(lih, router_id),
        flows,
    };
    output::send_resv(instance, phop, msg);
}

// (Re)starts the refresh timer.
pub(crate) fn schedule_refresh(
    instance: &mut Instance,
    rsb_idx: RsbIndex,
    delay: Duration,
) {
    let rsb = &mut instance.state.rsbs[rsb_idx];
    let rsb_id = rsb.id;
    if let Some(timer) = rsb.refresh_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer =
        tasks::rsb_refresh_timer(rsb_id, delay, instance.tx.sched.as_mut());
    instance.state.rsbs[rsb_idx].refresh_timer = Some(timer);
}

// (Re)starts the commit timer.
pub(crate) fn schedule_commit(instance: &mut Instance, rsb_idx: RsbIndex) {
    let rsb = &mut instance.state.rsbs[rsb_idx];
    let rsb_id = rsb.id;
    if let Some(timer) = rsb.commit_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer = tasks::rsb_commit_timer(rsb_id, instance.tx.sched.as_mut());
    instance.state.rsbs[rsb_idx].commit_timer = Some(timer);
}

// (Re)starts the timeout timer.
pub(crate) fn schedule_timeout(instance: &mut Instance, rsb_idx: RsbIndex) {
    let rsb = &mut instance.state.rsbs[rsb_idx];
    let rsb_id = rsb.id;
    if let Some(timer) = rsb.timeout_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer = tasks::rsb_timeout_timer(
        rsb_id,
        RSB_TIMEOUT_INTERVAL,
        instance.tx.sched.as_mut(),
    );
    instance.state.rsbs[rsb_idx].timeout_timer = Some(timer);
}

// ===== helper functions =====

// Installs or updates the LIB entry of every flow of the RSB.
fn install_labels(instance: &mut Instance, rsb_idx: RsbIndex) {
    let router_id = instance.router_id();
    let session = instance.state.rsbs[rsb_idx].session;

    for flow_idx in 0..instance.state.rsbs[rsb_idx].flows.len() {
        let flow = &instance.state.rsbs[rsb_idx].flows[flow_idx];
        let filter = flow.filter;
        let label = flow.label;
        let old_in_label = flow.in_label;

        let Some((_, psb)) = instance.state.psbs.get_by_key(&session, &filter)
        else {
            continue;
        };
        let ingress = psb.is_ingress(router_id);
        let owner = psb.owner;
        let color = psb.color;
        let psb_out_iface = psb.out_iface;

        let ted = &instance.ted;
        let in_iface = if ingress {
            None
        } else {
            ted.find_interface_addr_by_peer(psb.phop)
        };

        // Outgoing label and interface.
        let (out_op, out_iface) = match psb_out_iface {
            Some(out_iface) if ted.is_local_address(out_iface) => {
                // Regular next hop.
                let Some(label) = label else {
                    Debug::LabelMissing(&session, &filter).log();
                    continue;
                };
                let op = if ingress {
                    LabelOp::Push(label)
                } else {
                    LabelOp::Swap(label)
                };
                (op, Some(out_iface))
            }
            _ => {
                // Egress router.
                let out_iface = if ted.is_local_address(session.dst_addr) {
                    None
                } else {
                    ted.route_interface(session.dst_addr)
                };
                (LabelOp::Pop, out_iface)
            }
        };

        let in_label = instance.tx.lib.install(
            old_in_label,
            in_iface,
            out_op,
            out_iface,
            color,
        );
        Debug::LabelInstall(&session, &filter, &in_label, &out_op).log();

        // Path established.
        if ingress
            && old_in_label.is_none()
            && let Some(owner) = owner
        {
            output::path_notify(
                instance,
                owner,
                session,
                filter,
                PathNotifyStatus::Created,
                Duration::ZERO,
            );
        }

        if old_in_label != Some(in_label) {
            instance.state.rsbs[rsb_idx].flows[flow_idx].in_label =
                Some(in_label);
            output::bind_fec(instance, session, filter, in_label);
        }

        // Schedule commit of merging backups too.
        let backup = Ipv4Addr::from(filter.lsp_id);
        for rsb_id in instance
            .state
            .rsbs
            .ids_by(|rsb| rsb.out_iface == Some(backup))
        {
            if let Ok((backup_idx, _)) = instance.state.rsbs.get_by_id(rsb_id)
            {
                schedule_commit(instance, backup_idx);
            }
        }
    }
}

// ===== unit tests =====
