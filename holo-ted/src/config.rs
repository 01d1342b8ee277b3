//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// Local interfaces and the routers attached to them.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TedCfg {
    pub router_id: Ipv4Addr,
    #[serde(default)]
    pub interfaces: Vec<InterfaceCfg>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceCfg {
    pub name: String,
    pub addr: Ipv4Addr,
    pub peer: Option<PeerCfg>,
    pub bandwidth: f64,
    #[serde(default = "default_metric")]
    pub metric: u32,
    #[serde(default = "default_point_to_point")]
    pub point_to_point: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PeerCfg {
    pub router_id: Ipv4Addr,
    pub addr: Ipv4Addr,
}

// ===== impl TedCfg =====

impl TedCfg {
    pub fn from_json(data: &str) -> Result<TedCfg, Error> {
        serde_json::from_str(data).map_err(Error::ConfigParse)
    }
}

// ===== helper functions =====

fn default_metric() -> u32 {
    1
}

fn default_point_to_point() -> bool {
    true
}
