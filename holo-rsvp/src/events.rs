//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use num_traits::FromPrimitive;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, PSB_REFRESH_INTERVAL, RSB_REFRESH_INTERVAL};
use crate::packet::{
    Message, PathErrCode, PathErrMsg, PathMsg, PathTearMsg, ResvMsg,
};
use crate::tasks::messages::PathNotifyMsg;
use crate::tasks::messages::input::TimerMsg;
use crate::tasks::messages::ProtocolInputMsg;
use crate::traffic::PathNotifyStatus;
use crate::{hello, output, psb, rsb, traffic};

// ===== global functions =====

pub(crate) fn process_protocol_msg(
    instance: &mut Instance,
    msg: ProtocolInputMsg,
) -> Result<(), Error> {
    match msg {
        // Received RSVP message.
        ProtocolInputMsg::NetRxPacket(msg) => {
            process_packet(instance, msg.src, msg.msg)
        }
        // Timer expiration.
        ProtocolInputMsg::Timer(msg) => process_timer(instance, msg),
    }
}

// ===== Network packet receipt =====

pub(crate) fn process_packet(
    instance: &mut Instance,
    src: Ipv4Addr,
    msg: Message,
) -> Result<(), Error> {
    Debug::MsgRx(&src, &msg).log();

    match msg {
        Message::Path(msg) => process_path(instance, msg),
        Message::Resv(msg) => process_resv(instance, msg),
        Message::PathTear(msg) => process_path_tear(instance, msg),
        Message::PathErr(msg) => process_path_err(instance, msg),
        Message::Hello(msg) => hello::process_msg(instance, src, &msg),
    }
}

fn process_path(instance: &mut Instance, mut msg: PathMsg) -> Result<(), Error> {
    let session = msg.session;
    if !session.valid_priorities() {
        output::send_path_err(
            instance,
            msg.hop.addr,
            msg.session,
            msg.sender,
            msg.tspec,
            PathErrCode::Unfeasible,
        );
        return Err(Error::InvalidSessionPriority(
            session.key(),
            session.setup_pri,
            session.holding_pri,
        ));
    }

    msg.ero = psb::strip_local_hops(&msg.ero, instance.router_id());

    // Create PSB if it doesn't exist yet.
    let psb_idx = match instance.state.psbs.get_by_key(&msg.session, &msg.sender)
    {
        Some((psb_idx, _)) => psb_idx,
        None => {
            let Some(psb_idx) = psb::create(instance, &msg) else {
                output::send_path_err(
                    instance,
                    msg.hop.addr,
                    msg.session,
                    msg.sender,
                    msg.tspec,
                    PathErrCode::Unfeasible,
                );
                return Ok(());
            };
            psb::schedule_refresh(instance, psb_idx, Duration::ZERO);

            // Report a next hop that is known to be down.
            let ted = &instance.ted;
            if let Some(out_iface) = instance.state.psbs[psb_idx].out_iface
                && let Some(index) = ted.find_link_index_by_local(out_iface)
                && !ted.links[index].state
            {
                output::send_path_err_psb(
                    instance,
                    psb_idx,
                    PathErrCode::NexthopFailed,
                );
            }
            psb_idx
        }
    };
    psb::schedule_timeout(instance, psb_idx);

    // Create RSB if we're the egress and it doesn't exist yet.
    let rsb_idx =
        match instance.state.rsbs.find_by_filter(&msg.session, &msg.sender) {
            Some((rsb_idx, _, _)) => Some(rsb_idx),
            None if instance.state.psbs[psb_idx].out_iface.is_none() => {
                let rsb_idx = rsb::create_egress(instance, psb_idx);
                rsb::schedule_commit(instance, rsb_idx);
                Some(rsb_idx)
            }
            None => None,
        };
    if let Some(rsb_idx) = rsb_idx {
        rsb::schedule_refresh(instance, rsb_idx, Duration::ZERO);
    }

    Ok(())
}

fn process_resv(instance: &mut Instance, mut msg: ResvMsg) -> Result<(), Error> {
    let session = msg.session;
    if !session.valid_priorities() {
        return Err(Error::InvalidSessionPriority(
            session.key(),
            session.setup_pri,
            session.holding_pri,
        ));
    }

    // Drop the flows that don't have a matching PSB.
    let psbs = &instance.state.psbs;
    msg.flows.retain(|flow| {
        let found = psbs.get_by_key(&msg.session, &flow.filter).is_some();
        if !found {
            Debug::NoMatchingPsb(&msg.session, &flow.filter).log();
        }
        found
    });
    if msg.flows.is_empty() {
        return Ok(());
    }

    // Find matching RSB.
    let rsb_idx = match instance.state.rsbs.get_by_key(
        &msg.session,
        msg.hop.addr,
        Some(msg.hop.lih),
    ) {
        Some((rsb_idx, _)) => {
            rsb::update(instance, rsb_idx, &msg);
            rsb_idx
        }
        None => {
            let rsb_idx = rsb::create(instance, &msg);
            rsb::schedule_commit(instance, rsb_idx);

            // The reservation is new, propagate it upstream immediately.
            rsb::schedule_refresh(instance, rsb_idx, Duration::ZERO);
            rsb_idx
        }
    };
    rsb::schedule_timeout(instance, rsb_idx);

    Ok(())
}

fn process_path_tear(
    instance: &mut Instance,
    msg: PathTearMsg,
) -> Result<(), Error> {
    if instance
        .state
        .psbs
        .get_by_key(&msg.session, &msg.sender)
        .is_none()
    {
        Debug::NoMatchingPsb(&msg.session, &msg.sender).log();
        return Ok(());
    }

    // Merging backups are identified by an outgoing interface equal to the
    // LSP ID.
    let backup = Ipv4Addr::from(msg.sender.lsp_id);
    let backups = instance
        .state
        .psbs
        .ids_by(|psb| psb.out_iface == Some(backup));
    if !backups.is_empty() {
        // Ignore the teardown unless it's forced.
        if !msg.force {
            Debug::PathTearIgnored(&msg.session, &msg.sender).log();
            return Ok(());
        }

        for psb_id in backups {
            if let Ok((psb_idx, _)) = instance.state.psbs.get_by_id(psb_id) {
                psb::remove(instance, psb_idx);
            }
        }
    }

    let Some((psb_idx, _)) =
        instance.state.psbs.get_by_key(&msg.session, &msg.sender)
    else {
        return Ok(());
    };

    // Forward the teardown downstream.
    psb::send_tear(instance, psb_idx, msg.force);

    psb::remove(instance, psb_idx);

    Ok(())
}

fn process_path_err(
    instance: &mut Instance,
    msg: PathErrMsg,
) -> Result<(), Error> {
    let router_id = instance.router_id();
    let Some((_, psb)) =
        instance.state.psbs.get_by_key(&msg.session, &msg.sender)
    else {
        Debug::NoMatchingPsb(&msg.session, &msg.sender).log();
        return Ok(());
    };

    if !psb.is_ingress(router_id) {
        // Forward the error upstream.
        let phop = psb.phop;
        output::forward_path_err(instance, phop, msg);
        return Ok(());
    }

    // The error reached the ingress.
    let status = match PathErrCode::from_u8(msg.error_code) {
        Some(PathErrCode::Unfeasible) => PathNotifyStatus::Unfeasible,
        Some(PathErrCode::Preempted) => PathNotifyStatus::Preempted,
        Some(PathErrCode::NexthopFailed) => PathNotifyStatus::Failed,
        None => {
            return Err(Error::UnexpectedPathErrCode(
                msg.session.key(),
                msg.sender,
                msg.error_code,
            ));
        }
    };
    if let Some(owner) = psb.owner {
        output::path_notify(
            instance,
            owner,
            msg.session,
            msg.sender,
            status,
            Duration::ZERO,
        );
    }

    Ok(())
}

// ===== Timers =====

pub(crate) fn process_timer(
    instance: &mut Instance,
    msg: TimerMsg,
) -> Result<(), Error> {
    match msg {
        TimerMsg::PsbRefresh(psb_id) => {
            let (psb_idx, psb) = instance.state.psbs.get_mut_by_id(psb_id)?;
            psb.refresh_timer = None;

            psb::refresh(instance, psb_idx);
            psb::schedule_refresh(instance, psb_idx, PSB_REFRESH_INTERVAL);
        }
        TimerMsg::PsbTimeout(psb_id) => {
            let (psb_idx, psb) = instance.state.psbs.get_mut_by_id(psb_id)?;
            psb.timeout_timer = None;
            Debug::PsbTimeout(psb).log();

            psb::send_tear(instance, psb_idx, false);
            psb::remove(instance, psb_idx);
        }
        TimerMsg::RsbRefresh(rsb_id) => {
            let (rsb_idx, rsb) = instance.state.rsbs.get_mut_by_id(rsb_id)?;
            rsb.refresh_timer = None;

            if rsb.commit_timer.is_some() {
                // Reschedule after the commit.
                rsb::schedule_refresh(instance, rsb_idx, Duration::ZERO);
            } else {
                rsb::refresh(instance, rsb_idx);
                rsb::schedule_refresh(instance, rsb_idx, RSB_REFRESH_INTERVAL);
            }
        }
        TimerMsg::RsbCommit(rsb_id) => {
            let (rsb_idx, rsb) = instance.state.rsbs.get_mut_by_id(rsb_id)?;
            rsb.commit_timer = None;

            rsb::commit(instance, rsb_idx);
        }
        TimerMsg::RsbTimeout(rsb_id) => {
            let (rsb_idx, rsb) = instance.state.rsbs.get_mut_by_id(rsb_id)?;
            rsb.timeout_timer = None;
            Debug::RsbTimeout(rsb).log();

            rsb::remove_all_flows(instance, rsb_idx);
            rsb::remove(instance, rsb_idx);
        }
        TimerMsg::HelloInterval(peer) => {
            hello::process_interval(instance, peer)?;
        }
        TimerMsg::HelloTimeout(peer) => {
            hello::process_timeout(instance, peer)?;
        }
        TimerMsg::PathNotify(msg) => {
            process_path_notify(instance, msg);
        }
    }

    Ok(())
}

// Processes a path status notification addressed to the instance itself.
fn process_path_notify(instance: &mut Instance, msg: PathNotifyMsg) {
    match msg.status {
        PathNotifyStatus::Retry => {
            traffic::create_path(instance, &msg.session, &msg.sender);
        }
        PathNotifyStatus::Unfeasible
        | PathNotifyStatus::Preempted
        | PathNotifyStatus::Failed => {
            if let Some((psb_idx, _)) =
                instance.state.psbs.get_by_key(&msg.session, &msg.sender)
            {
                traffic::path_problem(instance, psb_idx);
            }
        }
        PathNotifyStatus::Created => {
            Debug::PathCreated(&msg.session, &msg.sender).log();
        }
    }
}
