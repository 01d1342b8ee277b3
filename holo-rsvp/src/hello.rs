//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::task::TimerHandle;
use rand::Rng;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::packet::{HelloFlags, HelloMsg, PathErrCode};
use crate::{admission, output, psb, tasks};

// HELLO adjacency with an RSVP peer.
#[derive(Debug)]
pub struct Hello {
    pub peer: Ipv4Addr,
    pub src_instance: u32,
    pub dst_instance: u32,
    // Flags of the next HELLO to be sent.
    pub flags: HelloFlags,
    // Whether the peer is considered up and running.
    pub ok: bool,
    pub interval_timer: Option<TimerHandle>,
    pub timeout_timer: Option<TimerHandle>,
}

// ===== impl Hello =====

impl Hello {
    fn new(peer: Ipv4Addr, ok: bool) -> Hello {
        Hello {
            peer,
            src_instance: 0,
            dst_instance: 0,
            flags: HelloFlags::empty(),
            ok,
            interval_timer: None,
            timeout_timer: None,
        }
    }
}

// ===== global functions =====

// Creates the HELLO state of every configured peer interface.
//
// Without a HELLO interval all peers are considered up for good.
pub(crate) fn setup(instance: &mut Instance) -> Result<(), Error> {
    let enabled = instance.config.hello_interval > 0.0;

    let mut peers = vec![];
    for name in &instance.config.peers {
        let peer = instance
            .ted
            .interface_addr_by_name(name)
            .and_then(|addr| instance.ted.find_peer_by_local_address(addr))
            .ok_or_else(|| Error::UnknownPeerInterface(name.clone()))?;
        peers.push(peer);
    }

    for peer in peers {
        // Peers are down until we know they're ok.
        instance.state.hellos.insert(peer, Hello::new(peer, !enabled));
        Debug::HelloCreate(&peer).log();

        if enabled {
            let delay = start_jitter(instance);
            start(instance, peer, delay);
        }
    }

    Ok(())
}

// Starts sending HELLOs to the peer after the given delay.
pub(crate) fn start(instance: &mut Instance, peer: Ipv4Addr, delay: Duration) {
    let src_instance = instance.next_src_instance();
    let Some(hello) = instance.state.hellos.get_mut(&peer) else {
        return;
    };
    Debug::HelloStart(&peer, &delay).log();

    hello.src_instance = src_instance;
    hello.dst_instance = 0;
    hello.flags = HelloFlags::REQUEST;
    if let Some(timer) = hello.interval_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer =
        tasks::hello_interval_timer(peer, delay, instance.tx.sched.as_mut());
    hello.interval_timer = Some(timer);
}

// Sends a HELLO to the peer and schedules the next one.
pub(crate) fn process_interval(
    instance: &mut Instance,
    peer: Ipv4Addr,
) -> Result<(), Error> {
    let interval = instance.config.hello_interval();
    let hello = instance
        .state
        .hellos
        .get_mut(&peer)
        .ok_or(Error::HelloPeerNotFound(peer))?;

    let msg =
        HelloMsg::new(hello.src_instance, hello.dst_instance, hello.flags);
    hello.flags.remove(HelloFlags::ACK);
    let timer =
        tasks::hello_interval_timer(peer, interval, instance.tx.sched.as_mut());
    hello.interval_timer = Some(timer);

    output::send_hello(instance, peer, msg);

    Ok(())
}

// Declares the peer dead.
//
// The link to the peer goes down in the TED and every path routed over it
// is reported upstream.
pub(crate) fn process_timeout(
    instance: &mut Instance,
    peer: Ipv4Addr,
) -> Result<(), Error> {
    let hello = instance
        .state
        .hellos
        .get_mut(&peer)
        .ok_or(Error::HelloPeerNotFound(peer))?;
    Debug::HelloTimeout(&peer).log();

    // Stop sending HELLOs until the peer shows up again.
    hello.ok = false;
    hello.timeout_timer = None;
    if let Some(timer) = hello.interval_timer.take() {
        instance.tx.sched.cancel(timer);
    }

    // Update the TED and the routing table.
    let router_id = instance.router_id();
    let changed = instance.ted.set_link_state(router_id, peer, false)?;
    let index = instance.ted.link_index(router_id, peer);
    admission::announce_link_change(instance, index);
    if changed {
        instance.ted.rebuild_routing_table();
    }

    // Report the paths that go through this peer.
    let local = instance.ted.links[index].local;
    for psb_id in instance
        .state
        .psbs
        .ids_by(|psb| psb.out_iface == Some(local))
    {
        if let Ok((psb_idx, _)) = instance.state.psbs.get_by_id(psb_id) {
            output::send_path_err_psb(
                instance,
                psb_idx,
                PathErrCode::NexthopFailed,
            );
        }
    }

    Ok(())
}

// Processes a HELLO received from a peer.
pub(crate) fn process_msg(
    instance: &mut Instance,
    src: Ipv4Addr,
    msg: &HelloMsg,
) -> Result<(), Error> {
    if instance.config.hello_interval == 0.0 {
        Debug::HelloIgnored(&src).log();
        return Ok(());
    }

    let peer = instance
        .ted
        .find_primary_address(src)
        .ok_or(Error::HelloPeerNotFound(src))?;
    let hello = instance
        .state
        .hellos
        .get_mut(&peer)
        .ok_or(Error::HelloPeerNotFound(peer))?;

    let request = msg.flags.contains(HelloFlags::REQUEST);
    let mut failure = false;

    // Check whether the peer echoes our instance.
    if hello.src_instance != msg.dst_instance && msg.dst_instance != 0 {
        failure = true;
    }

    // Check whether the peer has restarted.
    if hello.dst_instance != msg.src_instance {
        if hello.dst_instance != 0 {
            failure = true;
        }
        hello.dst_instance = msg.src_instance;
    }

    if failure {
        // Instance mismatch encountered.
        Debug::HelloInstanceMismatch(&peer).log();
        let src_instance = instance.next_src_instance();
        if let Some(hello) = instance.state.hellos.get_mut(&peer) {
            hello.src_instance = src_instance;
        }
    }

    let ok = instance.state.hellos.get(&peer).is_some_and(|hello| hello.ok);
    if failure || !ok {
        if let Some(hello) = instance.state.hellos.get_mut(&peer) {
            hello.ok = true;
        }
        Debug::HelloPeerUp(&peer).log();

        recovery_event(instance, peer)?;

        // HELLOs were suspended while the peer was down, so resume them.
        let hello = instance
            .state
            .hellos
            .get_mut(&peer)
            .ok_or(Error::HelloPeerNotFound(peer))?;
        if hello.interval_timer.is_none() {
            let timer = tasks::hello_interval_timer(
                peer,
                Duration::ZERO,
                instance.tx.sched.as_mut(),
            );
            hello.interval_timer = Some(timer);
        }
    }

    let timeout = instance.config.hello_timeout();
    let hello = instance
        .state
        .hellos
        .get_mut(&peer)
        .ok_or(Error::HelloPeerNotFound(peer))?;
    if request {
        // Immediately respond to a request with an ack.
        hello.flags = HelloFlags::ACK;
        if let Some(timer) = hello.interval_timer.take() {
            instance.tx.sched.cancel(timer);
        }
        let timer = tasks::hello_interval_timer(
            peer,
            Duration::ZERO,
            instance.tx.sched.as_mut(),
        );
        hello.interval_timer = Some(timer);
    } else {
        // Next message will be regular.
        hello.flags = HelloFlags::empty();
    }

    if let Some(timer) = hello.timeout_timer.take() {
        instance.tx.sched.cancel(timer);
    }
    let timer =
        tasks::hello_timeout_timer(peer, timeout, instance.tx.sched.as_mut());
    hello.timeout_timer = Some(timer);

    Ok(())
}

// Brings the link to a restored peer back up and refreshes every path
// towards it.
pub(crate) fn recovery_event(
    instance: &mut Instance,
    peer: Ipv4Addr,
) -> Result<(), Error> {
    let router_id = instance.router_id();
    let changed = instance.ted.set_link_state(router_id, peer, true)?;
    let index = instance.ted.link_index(router_id, peer);
    admission::announce_link_change(instance, index);

    // Rebuild the routing table if the link state changed.
    if changed {
        instance.ted.rebuild_routing_table();
    }

    // Refresh all paths towards this neighbor.
    let local = instance.ted.links[index].local;
    for psb_id in instance
        .state
        .psbs
        .ids_by(|psb| psb.out_iface == Some(local))
    {
        if let Ok((psb_idx, _)) = instance.state.psbs.get_by_id(psb_id) {
            psb::schedule_refresh(instance, psb_idx, Duration::ZERO);
        }
    }

    Ok(())
}

// Removes all HELLO state.
pub(crate) fn remove_all(instance: &mut Instance) {
    for (peer, hello) in std::mem::take(&mut instance.state.hellos) {
        Debug::HelloDelete(&peer).log();
        let timers = [hello.interval_timer, hello.timeout_timer];
        for timer in timers.into_iter().flatten() {
            instance.tx.sched.cancel(timer);
        }
    }
}

// ===== helper functions =====

// Exponentially distributed delay averaging one HELLO interval, so that
// peers don't start in lockstep.
fn start_jitter(instance: &mut Instance) -> Duration {
    let interval = instance.config.hello_interval;
    let sample: f64 = instance.state.rng.random();
    Duration::from_secs_f64(((1.0 - sample).ln() * interval).abs())
}
