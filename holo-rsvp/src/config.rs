//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// RSVP instance configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceCfg {
    // HELLO interval in seconds. Zero disables HELLO.
    #[serde(default)]
    pub hello_interval: f64,
    // HELLO dead interval in seconds.
    #[serde(default)]
    pub hello_timeout: f64,
    // Delay before retrying a failed path, in seconds.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: f64,
    // Names of the interfaces running RSVP.
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub traffic: TrafficCfg,
    // Seed for the HELLO start jitter.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficCfg {
    #[serde(default)]
    pub sessions: Vec<SessionCfg>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionCfg {
    pub tunnel_id: u32,
    pub endpoint: Ipv4Addr,
    pub setup_pri: Option<u8>,
    pub holding_pri: Option<u8>,
    #[serde(default)]
    pub paths: Vec<PathCfg>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PathCfg {
    // Defaults to the router ID.
    pub sender: Option<Ipv4Addr>,
    pub lspid: u32,
    #[serde(default)]
    pub bandwidth: f64,
    #[serde(default)]
    pub max_delay: f64,
    #[serde(default)]
    pub route: Vec<EroHopCfg>,
    #[serde(default = "default_permanent")]
    pub permanent: bool,
    // External module owning the path. Defaults to the instance itself.
    pub owner: Option<u32>,
    #[serde(default)]
    pub color: u32,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct EroHopCfg {
    pub node: Ipv4Addr,
    #[serde(default)]
    pub loose: bool,
}

// Imperative traffic commands.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum TrafficCommand {
    AddSession(SessionCfg),
    DelSession(DelSessionCfg),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DelSessionCfg {
    pub tunnel_id: u32,
    // Defaults to the router ID.
    pub extended_tunnel_id: Option<Ipv4Addr>,
    pub endpoint: Ipv4Addr,
    // LSP IDs to delete. The whole session is deleted when absent.
    pub paths: Option<Vec<u32>>,
}

// ===== impl InstanceCfg =====

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            hello_interval: 0.0,
            hello_timeout: 0.0,
            retry_interval: default_retry_interval(),
            peers: vec![],
            traffic: Default::default(),
            seed: None,
        }
    }
}

impl InstanceCfg {
    pub fn from_json(data: &str) -> Result<InstanceCfg, Error> {
        let cfg: InstanceCfg =
            serde_json::from_str(data).map_err(Error::ConfigParse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    // Checks that every timer converts to a valid duration.
    //
    // Retries need a non-zero interval, and so does the HELLO dead interval
    // when HELLO is enabled.
    pub fn validate(&self) -> Result<(), Error> {
        let timers = [
            ("hello_interval", self.hello_interval),
            ("hello_timeout", self.hello_timeout),
            ("retry_interval", self.retry_interval),
        ];
        for (name, value) in timers {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(Error::InvalidConfig(name, value));
            }
        }
        if self.retry_interval == 0.0 {
            return Err(Error::InvalidConfig(
                "retry_interval",
                self.retry_interval,
            ));
        }
        if self.hello_interval > 0.0 && self.hello_timeout == 0.0 {
            return Err(Error::InvalidConfig(
                "hello_timeout",
                self.hello_timeout,
            ));
        }

        Ok(())
    }

    pub(crate) fn hello_interval(&self) -> Duration {
        Duration::from_secs_f64(self.hello_interval)
    }

    pub(crate) fn hello_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.hello_timeout)
    }

    pub(crate) fn retry_interval(&self) -> Duration {
        Duration::from_secs_f64(self.retry_interval)
    }
}

// ===== impl TrafficCfg =====

impl TrafficCfg {
    pub fn from_json(data: &str) -> Result<TrafficCfg, Error> {
        serde_json::from_str(data).map_err(Error::ConfigParse)
    }
}

// ===== impl TrafficCommand =====

impl TrafficCommand {
    pub fn from_json(data: &str) -> Result<TrafficCommand, Error> {
        serde_json::from_str(data).map_err(Error::ConfigParse)
    }
}

// ===== helper functions =====

fn default_retry_interval() -> f64 {
    1.0
}

fn default_permanent() -> bool {
    true
}

// ===== unit tests =====
