//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::{error, warn};

// TED errors.
#[derive(Debug)]
pub enum Error {
    ConfigParse(serde_json::Error),
    MissingPeer(String),
    DuplicateAddress(Ipv4Addr),
    InvalidBandwidth(String, f64),
    LinkNotFound(Ipv4Addr, Ipv4Addr),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::ConfigParse(error) => {
                error!(error = %with_source(error), "{}", self);
            }
            Error::MissingPeer(name) => {
                error!(%name, "{}", self);
            }
            Error::DuplicateAddress(addr) => {
                error!(address = %addr, "{}", self);
            }
            Error::InvalidBandwidth(name, bandwidth) => {
                error!(%name, %bandwidth, "{}", self);
            }
            Error::LinkNotFound(adv_router, link_id) => {
                warn!(%adv_router, %link_id, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigParse(..) => {
                write!(f, "failed to parse TED configuration")
            }
            Error::MissingPeer(..) => {
                write!(f, "point-to-point interface has no peer router")
            }
            Error::DuplicateAddress(..) => {
                write!(f, "duplicate interface address")
            }
            Error::InvalidBandwidth(..) => {
                write!(f, "invalid interface bandwidth")
            }
            Error::LinkNotFound(..) => {
                write!(f, "TE link not found")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigParse(error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::ConfigParse(error)
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
