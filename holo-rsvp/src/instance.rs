//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use holo_ted::Ted;
use holo_utils::UnboundedSender;
use holo_utils::mpls::Label;
use holo_utils::task::Scheduler;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::collections::{Psbs, Rsbs};
use crate::config::{DelSessionCfg, InstanceCfg, SessionCfg, TrafficCommand};
use crate::debug::Debug;
use crate::error::Error;
use crate::hello::Hello;
use crate::label_table::LabelTable;
use crate::packet::{SenderTemplate, Session};
use crate::tasks::messages::input::TimerMsg;
use crate::tasks::messages::{ProtocolInputMsg, ProtocolOutputMsg};
use crate::traffic::TrafficSession;
use crate::{events, hello, psb, rsb, traffic};

// PSB refresh interval.
pub const PSB_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
// RSB refresh interval.
pub const RSB_REFRESH_INTERVAL: Duration = Duration::from_secs(6);
// PSB lifetime without refreshes.
pub const PSB_TIMEOUT_INTERVAL: Duration = Duration::from_secs(16);
// RSB lifetime without refreshes.
pub const RSB_TIMEOUT_INTERVAL: Duration = Duration::from_secs(19);

// RSVP-TE instance.
pub struct Instance {
    // Instance configuration data.
    pub config: InstanceCfg,
    // Traffic Engineering Database.
    pub ted: Ted,
    // Instance state data.
    pub state: InstanceState,
    // Instance Tx channels.
    pub tx: InstanceChannelsTx,
}

#[derive(Debug)]
pub struct InstanceState {
    pub active: bool,
    // Path State Blocks.
    pub psbs: Psbs,
    // Reservation State Blocks.
    pub rsbs: Rsbs,
    // HELLO state, keyed by peer router ID.
    pub hellos: BTreeMap<Ipv4Addr, Hello>,
    // Locally originated tunnels.
    pub traffic: Vec<TrafficSession>,
    // Highest HELLO source instance used so far.
    pub max_src_instance: u32,
    pub rng: StdRng,
}

pub struct InstanceChannelsTx {
    pub sched: Box<dyn Scheduler<TimerMsg>>,
    pub lib: Box<dyn LabelTable>,
    pub protocol_output: UnboundedSender<ProtocolOutputMsg>,
}

// ===== impl Instance =====

impl Instance {
    // Creates a new instance, loading the configured traffic.
    pub fn new(
        config: InstanceCfg,
        ted: Ted,
        tx: InstanceChannelsTx,
    ) -> Result<Instance, Error> {
        Debug::InstanceCreate.log();
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut instance = Instance {
            config,
            ted,
            state: InstanceState {
                active: false,
                psbs: Default::default(),
                rsbs: Default::default(),
                hellos: Default::default(),
                traffic: Default::default(),
                max_src_instance: 0,
                rng,
            },
            tx,
        };
        let traffic = instance.config.traffic.clone();
        traffic::read_traffic(&mut instance, &traffic)?;

        Ok(instance)
    }

    // Starts the instance: brings HELLO up with every configured peer and
    // (re)signals every locally originated path.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state.active {
            return Ok(());
        }

        Debug::InstanceStart.log();
        hello::setup(self)?;
        self.state.active = true;
        traffic::retry_all(self);

        Ok(())
    }

    // Stops the instance, flushing all soft state without signalling
    // teardowns to the neighbors.
    //
    // Locally originated traffic is kept and signalled again on the next
    // start.
    pub fn stop(&mut self) {
        if !self.state.active {
            return;
        }

        Debug::InstanceStop.log();
        self.clear();
        self.state.active = false;
    }

    pub fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        // Ignore event if the instance isn't active.
        if !self.state.active {
            return;
        }

        if let Err(error) = events::process_protocol_msg(self, msg) {
            error.log();
        }
    }

    pub fn process_command(&mut self, cmd: TrafficCommand) -> Result<(), Error> {
        match cmd {
            TrafficCommand::AddSession(cfg) => self.add_session(&cfg),
            TrafficCommand::DelSession(cfg) => self.del_session(&cfg),
        }
    }

    pub fn add_session(&mut self, cfg: &SessionCfg) -> Result<(), Error> {
        traffic::add_session(self, cfg)
    }

    pub fn del_session(&mut self, cfg: &DelSessionCfg) -> Result<(), Error> {
        traffic::del_session(self, cfg)
    }

    // Signals a locally originated path, unless it's already signalled.
    pub fn create_path(&mut self, session: &Session, sender: &SenderTemplate) {
        traffic::create_path(self, session, sender);
    }

    // Returns the incoming label bound to the given LSP.
    pub fn get_in_label(
        &self,
        session: &Session,
        sender: &SenderTemplate,
    ) -> Option<Label> {
        self.state
            .rsbs
            .find_by_filter(session, sender)
            .and_then(|(_, rsb, flow_idx)| rsb.flows[flow_idx].in_label)
    }

    pub fn router_id(&self) -> Ipv4Addr {
        self.ted.router_id
    }

    pub(crate) fn now(&self) -> Duration {
        self.tx.sched.now()
    }

    pub(crate) fn next_src_instance(&mut self) -> u32 {
        self.state.max_src_instance += 1;
        self.state.max_src_instance
    }

    fn clear(&mut self) {
        for psb_id in self.state.psbs.ids_by(|_| true) {
            if let Ok((psb_idx, _)) = self.state.psbs.get_by_id(psb_id) {
                psb::remove(self, psb_idx);
            }
        }
        for rsb_id in self.state.rsbs.ids_by(|_| true) {
            if let Ok((rsb_idx, _)) = self.state.rsbs.get_by_id(rsb_id) {
                rsb::remove_all_flows(self, rsb_idx);
                rsb::remove(self, rsb_idx);
            }
        }
        hello::remove_all(self);
    }
}
