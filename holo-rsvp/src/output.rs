//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::mpls::Label;

use crate::collections::PsbIndex;
use crate::debug::Debug;
use crate::instance::Instance;
use crate::packet::{
    HelloMsg, Message, PathErrCode, PathErrMsg, PathMsg, PathTearMsg,
    ResvMsg, RsvpHop, SenderTemplate, SenderTspec, Session,
};
use crate::tasks;
use crate::tasks::messages::PathNotifyMsg;
use crate::tasks::messages::output::{
    BindFecMsg, NetTxPacketMsg, ProtocolMsg,
};
use crate::traffic::{PathNotifyStatus, PathOwner};

// ===== global functions =====

pub(crate) fn send_path(instance: &mut Instance, dst: Ipv4Addr, msg: PathMsg) {
    send_msg(instance, dst, Message::Path(msg));
}

pub(crate) fn send_resv(instance: &mut Instance, dst: Ipv4Addr, msg: ResvMsg) {
    send_msg(instance, dst, Message::Resv(msg));
}

pub(crate) fn send_path_tear(
    instance: &mut Instance,
    dst: Ipv4Addr,
    session: Session,
    sender: SenderTemplate,
    lih: Ipv4Addr,
    force: bool,
) {
    let msg = PathTearMsg {
        session,
        sender,
        hop: RsvpHop::new(lih, instance.router_id()),
        force,
    };
    send_msg(instance, dst, Message::PathTear(msg));
}

pub(crate) fn send_path_err(
    instance: &mut Instance,
    dst: Ipv4Addr,
    session: Session,
    sender: SenderTemplate,
    tspec: SenderTspec,
    code: PathErrCode,
) {
    let msg = PathErrMsg {
        session,
        sender,
        tspec,
        error_node: instance.router_id(),
        error_code: code as u8,
    };
    send_msg(instance, dst, Message::PathErr(msg));
}

// Relays an error received from downstream, leaving it unmodified.
pub(crate) fn forward_path_err(
    instance: &mut Instance,
    dst: Ipv4Addr,
    msg: PathErrMsg,
) {
    send_msg(instance, dst, Message::PathErr(msg));
}

// Reports a problem with the path upstream.
pub(crate) fn send_path_err_psb(
    instance: &mut Instance,
    psb_idx: PsbIndex,
    code: PathErrCode,
) {
    let psb = &instance.state.psbs[psb_idx];
    let (phop, session, sender, tspec) =
        (psb.phop, psb.session, psb.sender, psb.tspec);
    send_path_err(instance, phop, session, sender, tspec, code);
}

pub(crate) fn send_hello(instance: &mut Instance, dst: Ipv4Addr, msg: HelloMsg) {
    send_msg(instance, dst, Message::Hello(msg));
}

// Notifies the owner of a path about its status.
//
// Notifications addressed to the instance itself are delivered through the
// scheduler after the given delay.
pub(crate) fn path_notify(
    instance: &mut Instance,
    owner: PathOwner,
    session: Session,
    sender: SenderTemplate,
    status: PathNotifyStatus,
    delay: Duration,
) {
    let msg = PathNotifyMsg {
        owner,
        session,
        sender,
        status,
    };
    Debug::PathNotify(&msg).log();

    match owner {
        PathOwner::Local => {
            tasks::path_notify_timer(msg, delay, instance.tx.sched.as_mut());
        }
        PathOwner::Module(_) => {
            let msg = ProtocolMsg::PathNotify(msg);
            let _ = instance.tx.protocol_output.send(msg);
        }
    }
}

// Binds the LSP to its incoming label.
pub(crate) fn bind_fec(
    instance: &mut Instance,
    session: Session,
    sender: SenderTemplate,
    label: Label,
) {
    let msg = ProtocolMsg::BindFec(BindFecMsg {
        session,
        sender,
        label,
    });
    let _ = instance.tx.protocol_output.send(msg);
}

// ===== helper functions =====

fn send_msg(instance: &mut Instance, dst: Ipv4Addr, msg: Message) {
    Debug::MsgTx(&dst, &msg).log();

    let msg = ProtocolMsg::NetTxPacket(NetTxPacketMsg { dst, msg });
    let _ = instance.tx.protocol_output.send(msg);
}
