//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use const_addrs::{ip4, net4};
use holo_ted::Ted;
use holo_ted::config::{InterfaceCfg, PeerCfg, TedCfg};
use holo_ted::error::Error;
use holo_ted::link::{LinkValidity, PRIORITY_LOWEST, TeLink};
use holo_ted::rib::{Route, RouteProtocol};
use maplit::btreemap;

const RT1: Ipv4Addr = ip4!("1.1.1.1");
const RT2: Ipv4Addr = ip4!("2.2.2.2");
const RT3: Ipv4Addr = ip4!("3.3.3.3");
const RT4: Ipv4Addr = ip4!("4.4.4.4");

//
// Test topology:
//
//         1         5
//   rt1 ----- rt2 ----- rt4
//     \        |        /
//    4 \      1|       / 1
//       \      |      /
//        ------rt3----
//
// Link addresses are 10.0.XY.X on the rtX side of the rtX-rtY link.
//
fn topology() -> Vec<(Ipv4Addr, Ipv4Addr, u8, u32)> {
    vec![
        (RT1, RT2, 12, 1),
        (RT1, RT3, 13, 4),
        (RT2, RT3, 23, 1),
        (RT2, RT4, 24, 5),
        (RT3, RT4, 34, 1),
    ]
}

fn link_addr(router: Ipv4Addr, subnet: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, subnet, router.octets()[0])
}

fn interface(
    local: Ipv4Addr,
    peer: Ipv4Addr,
    subnet: u8,
    metric: u32,
) -> InterfaceCfg {
    InterfaceCfg {
        name: format!("eth{}", subnet),
        addr: link_addr(local, subnet),
        peer: Some(PeerCfg {
            router_id: peer,
            addr: link_addr(peer, subnet),
        }),
        bandwidth: 100.0,
        metric,
        point_to_point: true,
    }
}

// Builds the TED of rt1 after all remote links have been flooded to it.
fn ted_rt1() -> Ted {
    let mut cfg = TedCfg {
        router_id: RT1,
        interfaces: vec![],
    };
    let mut remote = vec![];
    for (a, b, subnet, metric) in topology() {
        for (local, peer) in [(a, b), (b, a)] {
            let iface = interface(local, peer, subnet, metric);
            if local == RT1 {
                cfg.interfaces.push(iface);
            } else {
                let peer_cfg = iface.peer.unwrap();
                remote.push(TeLink::new(
                    local,
                    peer,
                    iface.addr,
                    peer_cfg.addr,
                    iface.bandwidth,
                    metric,
                ));
            }
        }
    }

    let mut ted = Ted::from_config(&cfg, Duration::ZERO).unwrap();
    for (message_id, mut link) in remote.into_iter().enumerate() {
        link.message_id = message_id as u32 + 1;
        assert!(ted.update_link(link));
    }
    ted
}

fn distance(ted: &Ted, bandwidth: f64, node: Ipv4Addr) -> Option<u64> {
    ted.calculate_shortest_paths(&ted.links, bandwidth, PRIORITY_LOWEST)
        .into_iter()
        .find(|vertex| vertex.node == node)
        .and_then(|vertex| vertex.distance)
}

// Test description:
//
// Shortest-path distances and parents from rt1 on a four-router topology.
// No edge can be relaxed any further once the computation is over.
#[test]
fn shortest_paths1() {
    let ted = ted_rt1();
    let vertices =
        ted.calculate_shortest_paths(&ted.links, 0.0, PRIORITY_LOWEST);

    let distances = vertices
        .iter()
        .map(|vertex| (vertex.node, vertex.distance))
        .collect::<std::collections::BTreeMap<_, _>>();
    assert_eq!(
        distances,
        btreemap! {
            RT1 => Some(0),
            RT2 => Some(1),
            RT3 => Some(2),
            RT4 => Some(3),
        }
    );

    let parent = |node: Ipv4Addr| {
        let vertex = vertices.iter().find(|v| v.node == node).unwrap();
        vertex.parent.map(|parent| vertices[parent].node)
    };
    assert_eq!(parent(RT1), None);
    assert_eq!(parent(RT2), Some(RT1));
    assert_eq!(parent(RT3), Some(RT2));
    assert_eq!(parent(RT4), Some(RT3));

    for link in &ted.links {
        let src = distances[&link.adv_router].unwrap();
        let dst = distances[&link.link_id].unwrap();
        assert!(dst <= src + link.metric as u64);
    }
}

// Test description:
//
// Links lacking the requested bandwidth at the requested priority, or that
// are down, are pruned from the graph.
#[test]
fn shortest_paths2() {
    let mut ted = ted_rt1();
    let index = ted.link_index(RT2, RT3);
    ted.links[index].unresv_bandwidth[PRIORITY_LOWEST as usize] = 5.0;

    assert_eq!(distance(&ted, 5.0, RT3), Some(2));
    assert_eq!(distance(&ted, 10.0, RT3), Some(4));
    assert_eq!(distance(&ted, 10.0, RT4), Some(5));
    assert_eq!(distance(&ted, 200.0, RT4), None);

    assert!(ted.set_link_state(RT3, RT4, false).unwrap());
    assert!(!ted.set_link_state(RT3, RT4, false).unwrap());
    assert_eq!(distance(&ted, 10.0, RT4), Some(6));
}

// Test description:
//
// The constrained path toward the closest reachable destination is returned
// as a hop sequence starting at the local router.
#[test]
fn shortest_path1() {
    let ted = ted_rt1();

    let path = ted.calculate_shortest_path(&[RT4], &ted.links, 10.0, 7);
    assert_eq!(path, vec![RT1, RT2, RT3, RT4]);

    let path = ted.calculate_shortest_path(&[RT4, RT3], &ted.links, 10.0, 7);
    assert_eq!(path, vec![RT1, RT2, RT3]);

    let path = ted.calculate_shortest_path(&[RT4], &ted.links, 150.0, 7);
    assert!(path.is_empty());

    let path =
        ted.calculate_shortest_path(&[ip4!("9.9.9.9")], &ted.links, 0.0, 7);
    assert!(path.is_empty());
}

// Test description:
//
// Routing table rebuild installs one host route per reachable remote router,
// using the local peer on the shortest path as the nexthop, plus direct
// routes to every local peer and its interface address. Multicast routes
// survive the rebuild.
#[test]
fn routing_table1() {
    let mut ted = ted_rt1();
    let multicast = Route {
        prefix: net4!("224.0.0.0/4"),
        nexthop: None,
        iface: link_addr(RT1, 12),
        protocol: RouteProtocol::Static,
        metric: 0,
    };
    ted.rib.add(multicast.clone());
    ted.rebuild_routing_table();

    assert_eq!(ted.rib.len(), 6);
    assert_eq!(ted.rib.get(&net4!("224.0.0.0/4")), Some(&multicast));

    let route = ted.rib.lookup(RT2).unwrap();
    assert_eq!(route.nexthop, None);
    assert_eq!(route.iface, link_addr(RT1, 12));

    let route = ted.rib.lookup(RT4).unwrap();
    assert_eq!(route.prefix, net4!("4.4.4.4/32"));
    assert_eq!(route.nexthop, Some(RT2));
    assert_eq!(route.iface, link_addr(RT1, 12));
    assert_eq!(route.metric, 3);

    // rt3 is cheaper to reach through rt2, but it's a local peer.
    let route = ted.rib.lookup(RT3).unwrap();
    assert_eq!(route.nexthop, None);
    assert_eq!(route.iface, link_addr(RT1, 13));
    assert_eq!(route.metric, 4);
    assert_eq!(ted.route_interface(RT3), Some(link_addr(RT1, 13)));

    // Peer interface addresses are directly reachable too.
    assert_eq!(
        ted.route_interface(link_addr(RT3, 13)),
        Some(link_addr(RT1, 13))
    );
    assert_eq!(
        ted.route_interface(link_addr(RT2, 12)),
        Some(link_addr(RT1, 12))
    );
    assert_eq!(ted.route_interface(link_addr(RT4, 34)), None);

    // Take the rt1-rt2 link down.
    let mut link = ted.links[ted.link_index(RT1, RT2)].clone();
    link.state = false;
    link.timestamp = Duration::from_secs(1);
    assert!(ted.update_link(link));

    let route = ted.rib.lookup(RT2).unwrap();
    assert_eq!(route.nexthop, Some(RT3));
    assert_eq!(route.iface, link_addr(RT1, 13));
    assert_eq!(route.metric, 5);
    assert_eq!(ted.route_interface(link_addr(RT2, 12)), None);
    assert!(ted.rib.get(&net4!("224.0.0.0/4")).is_some());
}

// Test description:
//
// Flooded link advertisements that were already seen, or that are older than
// the stored copy, are ignored.
#[test]
fn link_validity1() {
    let mut ted = ted_rt1();
    let index = ted.link_index(RT2, RT4);
    let stored = ted.links[index].clone();

    // Same (source ID, message ID, timestamp) triple.
    assert_eq!(ted.check_link_validity(&stored), LinkValidity::Stale);
    assert!(!ted.update_link(stored.clone()));

    // Older timestamp.
    let mut older = stored.clone();
    older.source_id = RT4;
    older.timestamp = Duration::ZERO;
    ted.links[index].timestamp = Duration::from_secs(10);
    assert_eq!(ted.check_link_validity(&older), LinkValidity::Stale);

    // Newer timestamp.
    let mut newer = stored.clone();
    newer.timestamp = Duration::from_secs(20);
    newer.unresv_bandwidth[7] = 50.0;
    assert_eq!(ted.check_link_validity(&newer), LinkValidity::Newer(index));
    assert!(ted.update_link(newer));
    assert_eq!(ted.links[index].unresv_bandwidth[7], 50.0);

    // Same timestamp, higher message ID.
    let mut newer = ted.links[index].clone();
    newer.message_id += 1;
    assert_eq!(ted.check_link_validity(&newer), LinkValidity::Newer(index));

    // Unknown link.
    let unknown = TeLink::new(
        RT4,
        RT1,
        ip4!("10.0.14.4"),
        ip4!("10.0.14.1"),
        10.0,
        1,
    );
    assert_eq!(ted.check_link_validity(&unknown), LinkValidity::New);
}

// Test description:
//
// Locally modified links get a fresh (source ID, message ID, timestamp)
// triple before being flooded.
#[test]
fn link_timestamp1() {
    let mut ted = ted_rt1();
    let index = ted.link_index(RT1, RT3);
    let old = ted.links[index].clone();

    ted.update_timestamp(index, Duration::from_secs(3));
    let new = &ted.links[index];
    assert_eq!(new.source_id, RT1);
    assert!(new.message_id > old.message_id);
    assert_eq!(new.timestamp, Duration::from_secs(3));
}

// Test description:
//
// Address lookup helpers over the local links.
#[test]
fn lookups1() {
    let ted = ted_rt1();

    assert!(ted.is_local_address(RT1));
    assert!(ted.is_local_address(link_addr(RT1, 13)));
    assert!(!ted.is_local_address(link_addr(RT2, 12)));
    assert!(ted.is_local_peer(RT2));
    assert!(!ted.is_local_peer(RT4));

    assert_eq!(ted.interface_addr_by_peer(RT3), link_addr(RT1, 13));
    assert_eq!(ted.peer_remote_interface(RT3), link_addr(RT3, 13));
    assert_eq!(ted.peer_by_local_address(link_addr(RT1, 12)), RT2);
    assert_eq!(ted.interface_addr_by_name("eth13"), Some(link_addr(RT1, 13)));

    assert_eq!(ted.primary_address(link_addr(RT2, 12)), RT2);
    assert_eq!(ted.primary_address(link_addr(RT4, 34)), RT4);
    assert_eq!(ted.primary_address(RT3), RT3);
    assert_eq!(ted.find_primary_address(ip4!("192.168.0.1")), None);
    assert_eq!(
        ted.link_index_by_local(link_addr(RT1, 13)),
        ted.link_index(RT1, RT3)
    );
}

#[test]
#[should_panic]
fn lookups2() {
    let ted = ted_rt1();
    ted.interface_addr_by_peer(RT4);
}

// Test description:
//
// Invalid interface configurations are rejected without touching the
// database.
#[test]
fn initialize_links1() {
    let mut ted = ted_rt1();
    let links = ted.links.len();

    let mut cfg = TedCfg {
        router_id: RT1,
        interfaces: vec![interface(RT1, RT2, 12, 1)],
    };
    cfg.interfaces[0].peer = None;
    assert!(matches!(
        ted.initialize_links(&cfg, Duration::ZERO),
        Err(Error::MissingPeer(name)) if name == "eth12"
    ));

    let cfg = TedCfg {
        router_id: RT1,
        interfaces: vec![interface(RT1, RT2, 12, 1), interface(RT1, RT2, 12, 1)],
    };
    assert!(matches!(
        ted.initialize_links(&cfg, Duration::ZERO),
        Err(Error::DuplicateAddress(_))
    ));
    assert_eq!(ted.links.len(), links);

    // Broadcast interfaces don't need a peer.
    let mut cfg = TedCfg {
        router_id: RT1,
        interfaces: vec![interface(RT1, RT2, 12, 1), interface(RT1, RT3, 13, 1)],
    };
    cfg.interfaces[1].peer = None;
    cfg.interfaces[1].point_to_point = false;
    ted.initialize_links(&cfg, Duration::ZERO).unwrap();
    assert_eq!(ted.links.len(), 1);
    assert!(ted.is_local_address(link_addr(RT1, 13)));
}

// Test description:
//
// TED configuration is loaded from JSON.
#[test]
fn config1() {
    let data = r#"{
        "router_id": "1.1.1.1",
        "interfaces": [
            {
                "name": "eth0",
                "addr": "10.0.12.1",
                "peer": { "router_id": "2.2.2.2", "addr": "10.0.12.2" },
                "bandwidth": 100.0
            }
        ]
    }"#;
    let cfg = TedCfg::from_json(data).unwrap();
    let ted = Ted::from_config(&cfg, Duration::ZERO).unwrap();
    assert_eq!(ted.links.len(), 1);
    assert_eq!(ted.links[0].metric, 1);
    assert_eq!(ted.links[0].unresv_bandwidth, [100.0; 8]);

    assert!(matches!(
        TedCfg::from_json(r#"{ "router_id": "1.1.1.1", "color": 1 }"#),
        Err(Error::ConfigParse(_))
    ));
}
