//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//


use std::net::Ipv4Addr;
use std::time::Duration;

use const_addrs::ip4;
use holo_rsvp::config::{InstanceCfg, TrafficCfg, TrafficCommand};
use holo_rsvp::error::Error;
use holo_rsvp::instance::{Instance, InstanceChannelsTx};
use holo_rsvp::label_table::{LabelTable, Lib};
use holo_rsvp::packet::{
    FlowDescriptor, FlowSpec, Message, PathMsg, ResvMsg, RsvpHop,
    SenderTemplate, Session,
};
use holo_rsvp::tasks::messages::ProtocolInputMsg;
use holo_rsvp::tasks::messages::input::{NetRxPacketMsg, TimerMsg};
use holo_rsvp::tasks::messages::output::ProtocolMsg;
use holo_rsvp::traffic::PathNotifyStatus;
use holo_ted::Ted;
use holo_ted::config::{InterfaceCfg, PeerCfg, TedCfg};
use holo_ted::link::PRIORITY_LEVELS;
use holo_utils::mpls::LabelOp;
use holo_utils::task::{EventQueue, TaskScheduler};
use tracing_subscriber::EnvFilter;

use crate::network::{Network, line};

const RT1: Ipv4Addr = ip4!("1.1.1.1");
const RT2: Ipv4Addr = ip4!("2.2.2.2");
const RT3: Ipv4Addr = ip4!("3.3.3.3");

// Explicitly routed tunnel from rt1 to rt3 over rt2.
const TRAFFIC_ERO: &str = r#"{
    "sessions": [{
        "tunnel_id": 1,
        "endpoint": "3.3.3.3",
        "paths": [{
            "lspid": 10,
            "bandwidth": 10.0,
            "route": [{ "node": "2.2.2.2" }, { "node": "3.3.3.3" }]
        }]
    }]
}"#;

//
// Test topology (all links 100 units of bandwidth):
//
//        eth0         eth1
//   rt1 ------ rt2 ------ rt3
//
//   eth0: 10.0.0.1 (rt1) - 10.0.0.2 (rt2)
//   eth1: 10.0.1.1 (rt2) - 10.0.1.2 (rt3)
//
fn topology(traffic: &str, base: InstanceCfg) -> Network {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let traffic = TrafficCfg::from_json(traffic).unwrap();
    Network::new(3, line(3, 100.0), move |router| {
        let mut cfg = base.clone();
        if router == 0 {
            cfg.traffic = traffic.clone();
        }
        cfg
    })
}

fn secs(secs: f64) -> Duration {
    Duration::from_secs_f64(secs)
}

fn session(tunnel_id: u32) -> Session {
    Session::new(tunnel_id, RT1, RT3, 7, 7)
}

fn sender(lsp_id: u32) -> SenderTemplate {
    SenderTemplate::new(RT1, lsp_id)
}

// Status notifications received by rt1 for the given LSP.
fn statuses(network: &Network, lsp_id: u32) -> Vec<PathNotifyStatus> {
    network.routers[0]
        .notifications()
        .into_iter()
        .filter(|msg| msg.sender == sender(lsp_id))
        .map(|msg| msg.status)
        .collect()
}

fn unresv(
    network: &Network,
    router: usize,
    adv_router: Ipv4Addr,
    link_id: Ipv4Addr,
) -> [f64; PRIORITY_LEVELS] {
    let ted = &network.routers[router].instance.ted;
    ted.links[ted.link_index(adv_router, link_id)].unresv_bandwidth
}

fn unresv_lowest(bandwidth: f64) -> [f64; PRIORITY_LEVELS] {
    let mut unresv = [100.0; PRIORITY_LEVELS];
    unresv[PRIORITY_LEVELS - 1] = bandwidth;
    unresv
}

// TED of a standalone rt1 attached to rt2 over eth0.
fn ted_rt1() -> Ted {
    let ted_cfg = TedCfg {
        router_id: RT1,
        interfaces: vec![InterfaceCfg {
            name: "eth0".to_owned(),
            addr: ip4!("10.0.0.1"),
            peer: Some(PeerCfg {
                router_id: RT2,
                addr: ip4!("10.0.0.2"),
            }),
            bandwidth: 100.0,
            metric: 1,
            point_to_point: true,
        }],
    };
    Ted::from_config(&ted_cfg, Duration::ZERO).unwrap()
}

fn command(network: &mut Network, data: &str) {
    let cmd = TrafficCommand::from_json(data).unwrap();
    network
        .with_router(0, |instance| instance.process_command(cmd))
        .unwrap();
}

// Test description:
//
// An explicitly routed LSP gets signalled end to end.
//
// Input:
//  * Traffic: rt1 -> rt3, 10 units, ERO [rt2, rt3]
// Output:
//  * rt3 pops, rt2 swaps to the label of rt3, rt1 pushes the label of rt2
//  * 10 units reserved at priority 7 on both links, as seen by all routers
//  * The path survives several refresh periods
#[test]
fn lsp_explicit_route1() {
    let mut network = topology(TRAFFIC_ERO, InstanceCfg::default());
    network.run_until(secs(2.0));

    assert!(statuses(&network, 10).contains(&PathNotifyStatus::Created));

    let label = |router: usize| {
        network.routers[router]
            .instance
            .get_in_label(&session(1), &sender(10))
            .unwrap()
    };
    let (label1, label2, label3) = (label(0), label(1), label(2));

    let lib = &network.routers[2].instance.tx.lib;
    let entry = lib.get(label3).unwrap();
    assert_eq!(entry.out_op, LabelOp::Pop);
    assert_eq!(entry.in_iface, Some(ip4!("10.0.1.2")));
    assert_eq!(entry.out_iface, None);

    let lib = &network.routers[1].instance.tx.lib;
    let entry = lib.get(label2).unwrap();
    assert_eq!(entry.out_op, LabelOp::Swap(label3));
    assert_eq!(entry.in_iface, Some(ip4!("10.0.0.2")));
    assert_eq!(entry.out_iface, Some(ip4!("10.0.1.1")));

    let lib = &network.routers[0].instance.tx.lib;
    let entry = lib.get(label1).unwrap();
    assert_eq!(entry.out_op, LabelOp::Push(label2));
    assert_eq!(entry.in_iface, None);
    assert_eq!(entry.out_iface, Some(ip4!("10.0.0.1")));
    assert!(
        network.routers[0]
            .fecs
            .iter()
            .any(|fec| fec.sender == sender(10) && fec.label == label1)
    );

    for router in 0..3 {
        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(90.0));
        assert_eq!(unresv(&network, router, RT2, RT3), unresv_lowest(90.0));
        assert_eq!(unresv(&network, router, RT2, RT1), unresv_lowest(100.0));
    }

    // Soft state is kept alive by refreshes.
    network.run_until(secs(40.0));
    for router in 0..3 {
        let instance = &network.routers[router].instance;
        assert_eq!(instance.state.psbs.len(), 1);
        assert_eq!(instance.state.rsbs.len(), 1);
    }
    assert_eq!(
        network.routers[0]
            .instance
            .get_in_label(&session(1), &sender(10)),
        Some(label1)
    );
}

// Test description:
//
// An LSP without explicit route follows the routing table built from the
// TED.
//
// Input:
//  * Traffic: rt1 -> rt3, 30 units, no ERO
// Output:
//  * The LSP is established over rt2 with 30 units reserved on both links
#[test]
fn lsp_hop_by_hop1() {
    let traffic = r#"{
        "sessions": [{
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [{ "lspid": 10, "bandwidth": 30.0 }]
        }]
    }"#;
    let mut network = topology(traffic, InstanceCfg::default());
    network.run_until(secs(2.0));

    assert_eq!(statuses(&network, 10), vec![
        PathNotifyStatus::Retry,
        PathNotifyStatus::Created
    ]);
    let psb = network.routers[1].instance.state.psbs.iter().next().unwrap();
    assert_eq!(psb.phop, RT1);
    assert_eq!(psb.out_iface, Some(ip4!("10.0.1.1")));
    let psb = network.routers[2].instance.state.psbs.iter().next().unwrap();
    assert_eq!(psb.out_iface, None);

    for router in 0..3 {
        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(70.0));
        assert_eq!(unresv(&network, router, RT2, RT3), unresv_lowest(70.0));
    }
}

// Test description:
//
// A non-permanent path that doesn't fit is rejected at the ingress and
// forgotten.
//
// Input:
//  * Traffic: rt1 -> rt3, 150 units, not permanent
// Output:
//  * One unfeasible notification, no signalling, no retries
#[test]
fn lsp_unfeasible1() {
    let traffic = r#"{
        "sessions": [{
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [{ "lspid": 10, "bandwidth": 150.0, "permanent": false }]
        }]
    }"#;
    let mut network = topology(traffic, InstanceCfg::default());
    network.run_until(secs(5.0));

    assert_eq!(statuses(&network, 10), vec![
        PathNotifyStatus::Retry,
        PathNotifyStatus::Unfeasible
    ]);
    let instance = &network.routers[0].instance;
    assert!(instance.state.psbs.is_empty());
    assert!(instance.state.traffic[0].paths.is_empty());
    assert!(network.routers[1].instance.state.psbs.is_empty());
    for router in 0..3 {
        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(100.0));
    }
}

// Test description:
//
// A high priority LSP preempts a low priority one sharing its links.
//
// Input:
//  * Traffic: rt1 -> rt3, 60 units, priorities 7/7
//  * Command (t=1s): rt1 -> rt3, 50 units, priorities 0/0
// Output:
//  * The first LSP gets established, then preempted
//  * The second LSP holds 50 units at every priority on both links
#[test]
fn lsp_preemption1() {
    let traffic = r#"{
        "sessions": [{
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [{
                "lspid": 101,
                "bandwidth": 60.0,
                "route": [{ "node": "2.2.2.2" }, { "node": "3.3.3.3" }]
            }]
        }]
    }"#;
    let mut network = topology(traffic, InstanceCfg::default());
    network.run_until(secs(1.0));
    assert!(statuses(&network, 101).contains(&PathNotifyStatus::Created));
    assert_eq!(unresv(&network, 0, RT1, RT2), unresv_lowest(40.0));

    command(
        &mut network,
        r#"{
            "command": "add-session",
            "tunnel_id": 2,
            "endpoint": "3.3.3.3",
            "setup_pri": 0,
            "holding_pri": 0,
            "paths": [{
                "lspid": 102,
                "bandwidth": 50.0,
                "route": [{ "node": "2.2.2.2" }, { "node": "3.3.3.3" }]
            }]
        }"#,
    );
    network.run_until(secs(3.0));

    let statuses101 = statuses(&network, 101);
    let created = statuses101
        .iter()
        .position(|status| *status == PathNotifyStatus::Created)
        .unwrap();
    let preempted = statuses101
        .iter()
        .position(|status| *status == PathNotifyStatus::Preempted)
        .unwrap();
    assert!(created < preempted);
    assert!(statuses(&network, 102).contains(&PathNotifyStatus::Created));

    for router in 0..3 {
        assert_eq!(unresv(&network, router, RT1, RT2), [50.0; PRIORITY_LEVELS]);
        assert_eq!(unresv(&network, router, RT2, RT3), [50.0; PRIORITY_LEVELS]);
    }
    let instance = &network.routers[0].instance;
    assert_eq!(instance.state.psbs.len(), 1);
    assert!(
        instance
            .state
            .psbs
            .get_by_key(&Session::new(2, RT1, RT3, 0, 0), &sender(102))
            .is_some()
    );
    // The preempted LSP keeps being retried.
    assert_eq!(instance.state.traffic[0].paths.len(), 1);
}

// Test description:
//
// LSPs of the same session share their reservation.
//
// Input:
//  * Traffic: rt1 -> rt3, two LSPs of 40 units each
// Output:
//  * A single RSB per router carrying both flows
//  * Only 40 units reserved on each link
#[test]
fn lsp_shared_reservation1() {
    let traffic = r#"{
        "sessions": [{
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [
                {
                    "lspid": 10,
                    "bandwidth": 40.0,
                    "route": [{ "node": "2.2.2.2" }, { "node": "3.3.3.3" }]
                },
                {
                    "lspid": 11,
                    "bandwidth": 40.0,
                    "route": [{ "node": "2.2.2.2" }, { "node": "3.3.3.3" }]
                }
            ]
        }]
    }"#;
    let mut network = topology(traffic, InstanceCfg::default());
    network.run_until(secs(2.0));

    assert!(statuses(&network, 10).contains(&PathNotifyStatus::Created));
    assert!(statuses(&network, 11).contains(&PathNotifyStatus::Created));
    for router in 0..3 {
        let instance = &network.routers[router].instance;
        assert_eq!(instance.state.psbs.len(), 2);
        assert_eq!(instance.state.rsbs.len(), 1);
        let rsb = instance.state.rsbs.iter().next().unwrap();
        assert_eq!(rsb.flows.len(), 2);

        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(60.0));
        assert_eq!(unresv(&network, router, RT2, RT3), unresv_lowest(60.0));
    }
}

// Test description:
//
// Deleting a session tears its LSPs down along the whole path.
//
// Input:
//  * Traffic: rt1 -> rt3, 10 units, ERO [rt2, rt3]
//  * Command (t=2s): delete the session
// Output:
//  * No path or reservation state left anywhere
//  * Labels removed and bandwidth released
#[test]
fn lsp_teardown1() {
    let mut network = topology(TRAFFIC_ERO, InstanceCfg::default());
    network.run_until(secs(2.0));

    let labels = (0..3)
        .map(|router| {
            network.routers[router]
                .instance
                .get_in_label(&session(1), &sender(10))
                .unwrap()
        })
        .collect::<Vec<_>>();

    command(
        &mut network,
        r#"{ "command": "del-session", "tunnel_id": 1, "endpoint": "3.3.3.3" }"#,
    );
    network.run_until(secs(3.0));

    assert!(network.routers[0].instance.state.traffic.is_empty());
    for (router, label) in labels.into_iter().enumerate() {
        let instance = &network.routers[router].instance;
        assert!(instance.state.psbs.is_empty());
        assert!(instance.state.rsbs.is_empty());
        assert!(instance.tx.lib.get(label).is_none());

        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(100.0));
        assert_eq!(unresv(&network, router, RT2, RT3), unresv_lowest(100.0));
    }

    // Unknown sessions can't be deleted.
    let cmd = TrafficCommand::from_json(
        r#"{ "command": "del-session", "tunnel_id": 1, "endpoint": "3.3.3.3" }"#,
    )
    .unwrap();
    assert!(
        network
            .with_router(0, |instance| instance.process_command(cmd))
            .is_err()
    );
}

// Test description:
//
// Deleting a single LSP of a session leaves the others in place.
//
// Input:
//  * Traffic: rt1 -> rt3, LSPs of 10 and 20 units
//  * Command (t=2s): delete the 10 units LSP
//  * Command (t=3s): add it back
// Output:
//  * The remaining LSP keeps its 20 units reservation
//  * The LSP added back gets signalled again
#[test]
fn lsp_teardown2() {
    let traffic = r#"{
        "sessions": [{
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [
                { "lspid": 10, "bandwidth": 10.0 },
                { "lspid": 20, "bandwidth": 20.0 }
            ]
        }]
    }"#;
    let mut network = topology(traffic, InstanceCfg::default());
    network.run_until(secs(2.0));
    assert_eq!(unresv(&network, 0, RT1, RT2), unresv_lowest(80.0));

    command(
        &mut network,
        r#"{
            "command": "del-session",
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [10]
        }"#,
    );
    network.run_until(secs(3.0));

    for router in 0..3 {
        let instance = &network.routers[router].instance;
        assert_eq!(instance.state.psbs.len(), 1);
        assert!(
            instance
                .state
                .psbs
                .get_by_key(&session(1), &sender(20))
                .is_some()
        );
        let rsb = instance.state.rsbs.iter().next().unwrap();
        assert_eq!(rsb.flows.len(), 1);
        assert_eq!(unresv(&network, router, RT1, RT2), unresv_lowest(80.0));
    }
    assert_eq!(network.routers[0].instance.state.traffic[0].paths.len(), 1);

    command(
        &mut network,
        r#"{
            "command": "add-session",
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "paths": [{ "lspid": 10, "bandwidth": 10.0 }]
        }"#,
    );
    network.run_until(secs(4.0));
    for router in 0..3 {
        assert_eq!(network.routers[router].instance.state.psbs.len(), 2);
    }
    assert!(
        network.routers[0]
            .instance
            .get_in_label(&session(1), &sender(10))
            .is_some()
    );

    // Priorities of an existing session can't change.
    let cmd = TrafficCommand::from_json(
        r#"{
            "command": "add-session",
            "tunnel_id": 1,
            "endpoint": "3.3.3.3",
            "setup_pri": 3,
            "holding_pri": 3
        }"#,
    )
    .unwrap();
    assert!(
        network
            .with_router(0, |instance| instance.process_command(cmd))
            .is_err()
    );
}

// Test description:
//
// A neighbor that stops answering HELLOs is declared down, and its paths
// are rerouted once it comes back.
//
// Input:
//  * Traffic: rt1 -> rt3, 10 units, ERO [rt2, rt3]
//  * HELLO interval 200ms, dead interval 500ms
//  * rt2 stopped at t=5s and restarted at t=8s
// Output:
//  * rt1 declares the link to rt2 down and reports the path as failed
//  * The link comes back up and the path is established again
#[test]
fn hello_failure1() {
    let base = InstanceCfg {
        hello_interval: 0.2,
        hello_timeout: 0.5,
        seed: Some(1),
        ..Default::default()
    };
    let mut network = topology(TRAFFIC_ERO, base);
    network.run_until(secs(5.0));
    assert!(statuses(&network, 10).contains(&PathNotifyStatus::Created));

    network.stop(1);
    network.run_until(secs(8.0));

    let failed = statuses(&network, 10)
        .iter()
        .rposition(|status| *status == PathNotifyStatus::Failed)
        .unwrap();
    let instance = &network.routers[0].instance;
    let ted = &instance.ted;
    assert!(!ted.links[ted.link_index(RT1, RT2)].state);
    assert!(instance.state.psbs.is_empty());
    assert!(instance.get_in_label(&session(1), &sender(10)).is_none());
    // The link state is flooded.
    let ted = &network.routers[2].instance.ted;
    assert!(!ted.links[ted.link_index(RT1, RT2)].state);

    network.start(1);
    network.run_until(secs(14.0));

    let created = statuses(&network, 10)
        .iter()
        .rposition(|status| *status == PathNotifyStatus::Created)
        .unwrap();
    assert!(created > failed);
    let instance = &network.routers[0].instance;
    let ted = &instance.ted;
    assert!(ted.links[ted.link_index(RT1, RT2)].state);
    assert!(instance.get_in_label(&session(1), &sender(10)).is_some());
    assert_eq!(network.routers[1].instance.state.psbs.len(), 1);
    assert_eq!(network.now(), secs(14.0));
}

// Test description:
//
// Messages carrying priorities outside the 0-7 range, or a holding
// priority weaker than the setup priority, are dropped without creating
// any state or touching the link bandwidth.
//
// Input:
//  * rt2 receives PATH messages with priorities 9/9 and 6/7
//  * rt2 receives a valid PATH (7/7) to rt3, immediately followed by a RESV
//    for the same session with priorities 8/0
// Output:
//  * No state for the invalid PATHs
//  * The invalid RESV is ignored, the reservation made by rt3 goes through
#[test]
fn invalid_priority1() {
    let mut network =
        topology(r#"{ "sessions": [] }"#, InstanceCfg::default());
    let rx = |network: &mut Network, src: Ipv4Addr, msg: Message| {
        let msg = NetRxPacketMsg { src, msg };
        network.with_router(1, |instance| {
            instance.process_protocol_msg(ProtocolInputMsg::NetRxPacket(msg))
        });
    };
    let upstream = ip4!("10.0.0.1");
    let downstream = ip4!("10.0.1.2");
    let path = |setup_pri, holding_pri| {
        Message::Path(PathMsg {
            session: Session::new(1, RT1, RT3, setup_pri, holding_pri),
            sender: sender(10),
            tspec: FlowSpec::new(10.0),
            hop: RsvpHop::new(upstream, upstream),
            ero: vec![],
            color: 0,
        })
    };

    rx(&mut network, upstream, path(9, 9));
    rx(&mut network, upstream, path(6, 7));
    network.run_until(secs(1.0));
    for router in &network.routers {
        assert!(router.instance.state.psbs.is_empty());
        assert!(router.instance.state.rsbs.is_empty());
    }

    rx(&mut network, upstream, path(7, 7));
    let resv = ResvMsg {
        session: Session::new(1, RT1, RT3, 8, 0),
        hop: RsvpHop::new(downstream, downstream),
        flows: vec![FlowDescriptor {
            filter: sender(10),
            flowspec: FlowSpec::new(10.0),
            rro: vec![],
            label: None,
        }],
    };
    rx(&mut network, downstream, Message::Resv(resv));
    assert!(network.routers[1].instance.state.rsbs.is_empty());

    network.run_until(secs(2.0));
    let rsbs = &network.routers[1].instance.state.rsbs;
    assert_eq!(rsbs.len(), 1);
    assert!(rsbs.iter().all(|rsb| rsb.session.valid_priorities()));
    assert_eq!(unresv(&network, 1, RT2, RT3), unresv_lowest(90.0));
    assert_eq!(unresv(&network, 1, RT2, RT1), unresv_lowest(100.0));
}

// Test description:
//
// The instance runs on top of the tokio timers as well.
//
// Input:
//  * Traffic: rt1 -> rt2, 10 units, ERO [rt2]
// Output:
//  * PATH message sent to rt2
#[tokio::test]
async fn task_scheduler1() {
    let ted = ted_rt1();
    let mut cfg = InstanceCfg::default();
    cfg.peers = vec!["eth0".to_owned()];
    cfg.traffic = TrafficCfg::from_json(
        r#"{
            "sessions": [{
                "tunnel_id": 1,
                "endpoint": "2.2.2.2",
                "paths": [{
                    "lspid": 10,
                    "bandwidth": 10.0,
                    "route": [{ "node": "2.2.2.2" }]
                }]
            }]
        }"#,
    )
    .unwrap();

    let (timer_tx, mut timer_rx) = tokio::sync::mpsc::unbounded_channel();
    let (output_tx, mut output_rx) = tokio::sync::mpsc::unbounded_channel();
    let tx = InstanceChannelsTx {
        sched: Box::new(TaskScheduler::new(timer_tx)),
        lib: Box::new(Lib::default()),
        protocol_output: output_tx,
    };
    let mut instance = Instance::new(cfg, ted, tx).unwrap();
    instance.start().unwrap();

    let path = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = timer_rx.recv().await.unwrap();
            instance.process_protocol_msg(ProtocolInputMsg::Timer(msg));
            while let Ok(msg) = output_rx.try_recv() {
                if let ProtocolMsg::NetTxPacket(msg) = msg
                    && let Message::Path(path) = msg.msg
                {
                    return (msg.dst, path);
                }
            }
        }
    })
    .await
    .unwrap();

    let (dst, path) = path;
    assert_eq!(dst, RT2);
    assert_eq!(path.sender, SenderTemplate::new(RT1, 10));
    assert_eq!(path.hop.lih, ip4!("10.0.0.1"));
    assert_eq!(path.tspec.bandwidth, 10.0);
}

// Test description:
//
// Unusable timer values are rejected when the instance is created.
//
// Input:
//  * Negative retry interval, NaN HELLO interval, HELLO without a dead
//    interval
// Output:
//  * Instance creation fails with a configuration error
#[test]
fn instance_config1() {
    let configs = [
        (-1.0, 0.0, 0.0),
        (1.0, f64::NAN, 1.0),
        (1.0, 0.5, 0.0),
    ];
    for (retry_interval, hello_interval, hello_timeout) in configs {
        let mut cfg = InstanceCfg::default();
        cfg.retry_interval = retry_interval;
        cfg.hello_interval = hello_interval;
        cfg.hello_timeout = hello_timeout;

        let (output_tx, _output_rx) = tokio::sync::mpsc::unbounded_channel();
        let tx = InstanceChannelsTx {
            sched: Box::new(EventQueue::<TimerMsg>::new()),
            lib: Box::new(Lib::default()),
            protocol_output: output_tx,
        };
        assert!(matches!(
            Instance::new(cfg, ted_rt1(), tx),
            Err(Error::InvalidConfig(..))
        ));
    }
}
