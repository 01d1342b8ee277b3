//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bitflags::bitflags;
use derive_new::new;
use holo_ted::link::PRIORITY_LOWEST;
use holo_utils::mpls::Label;
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

// RSVP-TE message.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Message {
    Path(PathMsg),
    Resv(ResvMsg),
    PathTear(PathTearMsg),
    PathErr(PathErrMsg),
    Hello(HelloMsg),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum MessageType {
    Path,
    Resv,
    PathTear,
    PathErr,
    Hello,
}

// LSP tunnel session.
//
// Priorities are carried along but don't take part in session identity.
#[derive(Clone, Copy, Debug, new)]
#[derive(Deserialize, Serialize)]
pub struct Session {
    pub tunnel_id: u32,
    pub ext_tunnel_id: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub setup_pri: u8,
    pub holding_pri: u8,
}

// Identity of a session, as used for lookups.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct SessionKey {
    pub tunnel_id: u32,
    pub ext_tunnel_id: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

// LSP tunnel sender template. Also used as filter spec.
#[derive(Clone, Copy, Debug, Eq, Hash, new, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct SenderTemplate {
    pub src_addr: Ipv4Addr,
    pub lsp_id: u32,
}

pub type FilterSpec = SenderTemplate;

// Traffic specification. Also used as sender tspec.
#[derive(Clone, Copy, Debug, Default, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct FlowSpec {
    pub bandwidth: f64,
}

pub type SenderTspec = FlowSpec;

#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RsvpHop {
    // Logical interface handle.
    pub lih: Ipv4Addr,
    pub addr: Ipv4Addr,
}

// Explicit route hop.
#[derive(Clone, Copy, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct EroHop {
    pub node: Ipv4Addr,
    pub loose: bool,
}

#[derive(Clone, Debug, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct FlowDescriptor {
    pub filter: FilterSpec,
    pub flowspec: FlowSpec,
    // Recorded route.
    pub rro: Vec<Ipv4Addr>,
    pub label: Option<Label>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PathMsg {
    pub session: Session,
    pub sender: SenderTemplate,
    pub tspec: SenderTspec,
    pub hop: RsvpHop,
    pub ero: Vec<EroHop>,
    pub color: u32,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct ResvMsg {
    pub session: Session,
    pub hop: RsvpHop,
    pub flows: Vec<FlowDescriptor>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PathTearMsg {
    pub session: Session,
    pub sender: SenderTemplate,
    pub hop: RsvpHop,
    pub force: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PathErrMsg {
    pub session: Session,
    pub sender: SenderTemplate,
    pub tspec: SenderTspec,
    pub error_node: Ipv4Addr,
    pub error_code: u8,
}

#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PathErrCode {
    Unfeasible = 1,
    Preempted = 2,
    NexthopFailed = 3,
}

#[derive(Clone, Debug, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct HelloMsg {
    pub src_instance: u32,
    pub dst_instance: u32,
    pub flags: HelloFlags,
}

// HELLO flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct HelloFlags: u8 {
        const REQUEST = 0x01;
        const ACK = 0x02;
    }
}

// ===== impl Message =====

impl Message {
    pub fn msg_type(&self) -> MessageType {
        match self {
            Message::Path(_) => MessageType::Path,
            Message::Resv(_) => MessageType::Resv,
            Message::PathTear(_) => MessageType::PathTear,
            Message::PathErr(_) => MessageType::PathErr,
            Message::Hello(_) => MessageType::Hello,
        }
    }
}

// ===== impl MessageType =====

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Path => write!(f, "Path"),
            MessageType::Resv => write!(f, "Resv"),
            MessageType::PathTear => write!(f, "PathTear"),
            MessageType::PathErr => write!(f, "PathErr"),
            MessageType::Hello => write!(f, "Hello"),
        }
    }
}

// ===== impl Session =====

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey {
            tunnel_id: self.tunnel_id,
            ext_tunnel_id: self.ext_tunnel_id,
            dst_addr: self.dst_addr,
        }
    }

    // Holding priority can't be weaker than the setup priority.
    pub fn valid_priorities(&self) -> bool {
        self.setup_pri <= PRIORITY_LOWEST && self.holding_pri <= self.setup_pri
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Session {}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.dst_addr, self.tunnel_id, self.ext_tunnel_id
        )
    }
}

// ===== impl SenderTemplate =====

impl std::fmt::Display for SenderTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.src_addr, self.lsp_id)
    }
}

// ===== unit tests =====
