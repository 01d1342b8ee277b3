//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::{error, warn, warn_span};

use crate::collections::{PsbId, RsbId};
use crate::packet::{SenderTemplate, SessionKey};

// RSVP errors.
#[derive(Debug)]
pub enum Error {
    // Configuration
    ConfigParse(serde_json::Error),
    InvalidPriority(u8, u8),
    InvalidConfig(&'static str, f64),
    SessionPriorityMismatch(SessionKey),
    SessionNotFound(SessionKey),
    UnknownPeerInterface(String),
    Ted(holo_ted::error::Error),
    // Inter-task communication
    PsbIdNotFound(PsbId),
    RsbIdNotFound(RsbId),
    HelloPeerNotFound(Ipv4Addr),
    // Protocol
    NotRsvpPeer(Ipv4Addr),
    InvalidSessionPriority(SessionKey, u8, u8),
    UnexpectedPathErrCode(SessionKey, SenderTemplate, u8),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::ConfigParse(error) => {
                error!(error = %with_source(error), "{}", self);
            }
            Error::InvalidPriority(setup_pri, holding_pri) => {
                error!(%setup_pri, %holding_pri, "{}", self);
            }
            Error::InvalidConfig(name, value) => {
                error!(%name, %value, "{}", self);
            }
            Error::SessionPriorityMismatch(session)
            | Error::SessionNotFound(session) => {
                error!(?session, "{}", self);
            }
            Error::UnknownPeerInterface(name) => {
                error!(%name, "{}", self);
            }
            Error::Ted(error) => {
                error.log();
            }
            Error::PsbIdNotFound(psb_id) => {
                warn!(?psb_id, "{}", self);
            }
            Error::RsbIdNotFound(rsb_id) => {
                warn!(?rsb_id, "{}", self);
            }
            Error::HelloPeerNotFound(addr) => {
                warn!(address = %addr, "{}", self);
            }
            Error::NotRsvpPeer(addr) => {
                warn!(address = %addr, "{}", self);
            }
            Error::InvalidSessionPriority(session, setup_pri, holding_pri) => {
                warn!(?session, %setup_pri, %holding_pri, "{}", self);
            }
            Error::UnexpectedPathErrCode(session, sender, code) => {
                warn_span!("psb", ?session, %sender).in_scope(|| {
                    warn!(%code, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigParse(..) => {
                write!(f, "failed to parse traffic configuration")
            }
            Error::InvalidPriority(..) => {
                write!(f, "invalid setup/holding priority")
            }
            Error::InvalidConfig(..) => {
                write!(f, "invalid timer configuration")
            }
            Error::SessionPriorityMismatch(..) => {
                write!(f, "session priorities don't match existing session")
            }
            Error::SessionNotFound(..) => {
                write!(f, "session not found")
            }
            Error::UnknownPeerInterface(..) => {
                write!(f, "peer interface isn't attached to a TE link")
            }
            Error::Ted(error) => error.fmt(f),
            Error::PsbIdNotFound(..) => {
                write!(f, "PSB ID not found")
            }
            Error::RsbIdNotFound(..) => {
                write!(f, "RSB ID not found")
            }
            Error::HelloPeerNotFound(..) => {
                write!(f, "hello peer not found")
            }
            Error::NotRsvpPeer(..) => {
                write!(f, "next hop isn't an RSVP peer")
            }
            Error::InvalidSessionPriority(..) => {
                write!(f, "received session with invalid priorities")
            }
            Error::UnexpectedPathErrCode(..) => {
                write!(f, "unexpected PathErr error code")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigParse(error) => Some(error),
            Error::Ted(error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::ConfigParse(error)
    }
}

impl From<holo_ted::error::Error> for Error {
    fn from(error: holo_ted::error::Error) -> Error {
        Error::Ted(error)
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
