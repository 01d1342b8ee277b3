//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use holo_ted::link::PRIORITY_LOWEST;
use serde::{Deserialize, Serialize};

use crate::collections::PsbIndex;
use crate::config::{DelSessionCfg, SessionCfg, TrafficCfg};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::packet::{EroHop, SenderTemplate, SenderTspec, Session, SessionKey};
use crate::{output, psb};

// Party that gets notified about the status of a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PathOwner {
    // The RSVP instance itself.
    Local,
    // An external module, identified by the embedder.
    Module(u32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PathNotifyStatus {
    Retry,
    Unfeasible,
    Preempted,
    Failed,
    Created,
}

// Locally originated tunnel.
#[derive(Clone, Debug)]
pub struct TrafficSession {
    pub session: Session,
    pub paths: Vec<TrafficPath>,
}

// LSP of a locally originated tunnel.
#[derive(Clone, Debug)]
pub struct TrafficPath {
    pub sender: SenderTemplate,
    pub tspec: SenderTspec,
    pub max_delay: f64,
    pub ero: Vec<EroHop>,
    pub color: u32,
    pub owner: PathOwner,
    pub permanent: bool,
}

// ===== impl PathNotifyStatus =====

impl std::fmt::Display for PathNotifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathNotifyStatus::Retry => write!(f, "retry"),
            PathNotifyStatus::Unfeasible => write!(f, "unfeasible"),
            PathNotifyStatus::Preempted => write!(f, "preempted"),
            PathNotifyStatus::Failed => write!(f, "failed"),
            PathNotifyStatus::Created => write!(f, "created"),
        }
    }
}

// ===== impl TrafficSession =====

impl TrafficSession {
    fn find_path(&self, sender: &SenderTemplate) -> Option<usize> {
        self.paths.iter().position(|path| path.sender == *sender)
    }
}

// ===== global functions =====

// Loads the initial traffic description.
pub(crate) fn read_traffic(
    instance: &mut Instance,
    cfg: &TrafficCfg,
) -> Result<(), Error> {
    for session in &cfg.sessions {
        add_session(instance, session)?;
    }

    Ok(())
}

// Adds a session to the traffic database, or new paths to an existing one.
//
// Paths already known are skipped. New paths get signalled right away if
// the instance is active.
pub(crate) fn add_session(
    instance: &mut Instance,
    cfg: &SessionCfg,
) -> Result<(), Error> {
    let router_id = instance.router_id();
    let key = SessionKey {
        tunnel_id: cfg.tunnel_id,
        ext_tunnel_id: router_id,
        dst_addr: cfg.endpoint,
    };

    let sess_idx = match find_session(instance, &key) {
        Some(sess_idx) => {
            // The session already exists, its priorities can't change.
            let session = &instance.state.traffic[sess_idx].session;
            if cfg.setup_pri.is_some_and(|pri| pri != session.setup_pri)
                || cfg
                    .holding_pri
                    .is_some_and(|pri| pri != session.holding_pri)
            {
                return Err(Error::SessionPriorityMismatch(key));
            }
            sess_idx
        }
        None => {
            let setup_pri = cfg.setup_pri.unwrap_or(PRIORITY_LOWEST);
            let holding_pri = cfg.holding_pri.unwrap_or(PRIORITY_LOWEST);
            validate_priorities(setup_pri, holding_pri)?;

            Debug::TrafficSessionCreate(&key).log();
            instance.state.traffic.push(TrafficSession {
                session: Session::new(
                    key.tunnel_id,
                    key.ext_tunnel_id,
                    key.dst_addr,
                    setup_pri,
                    holding_pri,
                ),
                paths: vec![],
            });
            instance.state.traffic.len() - 1
        }
    };
    let session = instance.state.traffic[sess_idx].session;

    let mut added = vec![];
    for path_cfg in &cfg.paths {
        let sender = SenderTemplate::new(
            path_cfg.sender.unwrap_or(router_id),
            path_cfg.lspid,
        );

        // Make sure the path doesn't exist yet.
        let traffic_session = &mut instance.state.traffic[sess_idx];
        if traffic_session.find_path(&sender).is_some() {
            Debug::TrafficPathExists(&key, &sender).log();
            continue;
        }

        let path = TrafficPath {
            sender,
            tspec: SenderTspec::new(path_cfg.bandwidth),
            max_delay: path_cfg.max_delay,
            ero: path_cfg
                .route
                .iter()
                .map(|hop| EroHop::new(hop.node, hop.loose))
                .collect(),
            color: path_cfg.color,
            owner: path_cfg
                .owner
                .map(PathOwner::Module)
                .unwrap_or(PathOwner::Local),
            permanent: path_cfg.permanent,
        };
        Debug::TrafficPathCreate(&key, &sender).log();
        traffic_session.paths.push(path);
        added.push(sender);
    }

    // Schedule path creation.
    if instance.state.active {
        for sender in added {
            retry(instance, session, sender, Duration::ZERO);
        }
    }

    Ok(())
}

// Removes paths from a session, or the whole session if no path is given.
//
// Paths that are currently signalled get torn down.
pub(crate) fn del_session(
    instance: &mut Instance,
    cfg: &DelSessionCfg,
) -> Result<(), Error> {
    let key = SessionKey {
        tunnel_id: cfg.tunnel_id,
        ext_tunnel_id: cfg.extended_tunnel_id.unwrap_or(instance.router_id()),
        dst_addr: cfg.endpoint,
    };
    let sess_idx =
        find_session(instance, &key).ok_or(Error::SessionNotFound(key))?;
    let session = instance.state.traffic[sess_idx].session;

    let senders = instance.state.traffic[sess_idx]
        .paths
        .iter()
        .map(|path| path.sender)
        .filter(|sender| {
            cfg.paths
                .as_ref()
                .is_none_or(|paths| paths.contains(&sender.lsp_id))
        })
        .collect::<Vec<_>>();

    for sender in &senders {
        if let Some((psb_idx, _)) =
            instance.state.psbs.get_by_key(&session, sender)
        {
            psb::send_tear(instance, psb_idx, true);
            psb::remove(instance, psb_idx);
        }
        Debug::TrafficPathDelete(&key, sender).log();
    }

    let traffic_session = &mut instance.state.traffic[sess_idx];
    traffic_session
        .paths
        .retain(|path| !senders.contains(&path.sender));
    if cfg.paths.is_none() {
        Debug::TrafficSessionDelete(&key).log();
        instance.state.traffic.remove(sess_idx);
    }

    Ok(())
}

// Signals a locally originated path, unless it's already signalled.
pub(crate) fn create_path(
    instance: &mut Instance,
    session: &Session,
    sender: &SenderTemplate,
) {
    if instance.state.psbs.get_by_key(session, sender).is_some() {
        Debug::TrafficPathActive(&session.key(), sender).log();
        return;
    }

    // Find entry in the traffic database.
    let Some(sess_idx) = find_session(instance, &session.key()) else {
        Debug::TrafficPathUnknown(&session.key(), sender).log();
        return;
    };
    let traffic_session = &instance.state.traffic[sess_idx];
    let Some(path_idx) = traffic_session.find_path(sender) else {
        Debug::TrafficPathUnknown(&session.key(), sender).log();
        return;
    };
    let session = traffic_session.session;
    let path = traffic_session.paths[path_idx].clone();

    match psb::create_ingress(instance, &session, &path) {
        Some(psb_idx) => {
            // Send PATH downstream.
            psb::schedule_refresh(instance, psb_idx, Duration::ZERO);
        }
        None => {
            // Inform the owner of this path.
            output::path_notify(
                instance,
                path.owner,
                session,
                path.sender,
                PathNotifyStatus::Unfeasible,
                Duration::ZERO,
            );

            if path.permanent {
                let delay = instance.config.retry_interval();
                retry(instance, session, path.sender, delay);
            } else {
                remove_path(instance, &session, &path.sender);
            }
        }
    }
}

// Reacts to a problem reported for a locally originated path.
//
// The path is torn down and then either retried later or forgotten.
pub(crate) fn path_problem(instance: &mut Instance, psb_idx: PsbIndex) {
    psb::send_tear(instance, psb_idx, true);

    let psb = &instance.state.psbs[psb_idx];
    let session = psb.session;
    let sender = psb.sender;
    let permanent = find_session(instance, &session.key()).and_then(|idx| {
        let traffic_session = &instance.state.traffic[idx];
        traffic_session
            .find_path(&sender)
            .map(|path_idx| traffic_session.paths[path_idx].permanent)
    });
    match permanent {
        // Try to re-create permanent paths later.
        Some(true) => {
            let delay = instance.config.retry_interval();
            retry(instance, session, sender, delay);
        }
        Some(false) => {
            remove_path(instance, &session, &sender);
        }
        None => (),
    }

    psb::remove(instance, psb_idx);
}

// Schedules path creation for every locally originated path.
pub(crate) fn retry_all(instance: &mut Instance) {
    let paths = instance
        .state
        .traffic
        .iter()
        .flat_map(|traffic_session| {
            traffic_session
                .paths
                .iter()
                .map(|path| (traffic_session.session, path.sender))
        })
        .collect::<Vec<_>>();
    for (session, sender) in paths {
        retry(instance, session, sender, Duration::ZERO);
    }
}

// ===== helper functions =====

fn find_session(instance: &Instance, key: &SessionKey) -> Option<usize> {
    instance
        .state
        .traffic
        .iter()
        .position(|traffic_session| traffic_session.session.key() == *key)
}

// Holding priorities can't be weaker than setup priorities.
fn validate_priorities(setup_pri: u8, holding_pri: u8) -> Result<(), Error> {
    if setup_pri > PRIORITY_LOWEST
        || holding_pri > PRIORITY_LOWEST
        || holding_pri > setup_pri
    {
        return Err(Error::InvalidPriority(setup_pri, holding_pri));
    }

    Ok(())
}

fn retry(
    instance: &mut Instance,
    session: Session,
    sender: SenderTemplate,
    delay: Duration,
) {
    output::path_notify(
        instance,
        PathOwner::Local,
        session,
        sender,
        PathNotifyStatus::Retry,
        delay,
    );
}

fn remove_path(
    instance: &mut Instance,
    session: &Session,
    sender: &SenderTemplate,
) {
    let Some(sess_idx) = find_session(instance, &session.key()) else {
        return;
    };
    Debug::TrafficPathDelete(&session.key(), sender).log();
    instance.state.traffic[sess_idx]
        .paths
        .retain(|path| path.sender != *sender);
}

// ===== unit tests =====
