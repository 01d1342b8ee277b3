//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod config;
pub mod debug;
pub mod error;
pub mod link;
pub mod rib;
pub mod spf;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::ip::Ipv4AddrExt;

use crate::config::TedCfg;
use crate::debug::Debug;
use crate::error::Error;
use crate::link::{LinkValidity, PRIORITY_LOWEST, TeLink};
use crate::rib::{Rib, Route, RouteProtocol};
use crate::spf::Vertex;

// Traffic Engineering Database.
#[derive(Debug)]
pub struct Ted {
    pub router_id: Ipv4Addr,
    pub links: Vec<TeLink>,
    // Local interface addresses, indexed by interface name.
    pub interfaces: BTreeMap<String, Ipv4Addr>,
    pub rib: Rib,
    max_message_id: u32,
}

// ===== impl Ted =====

impl Ted {
    pub fn new(router_id: Ipv4Addr) -> Ted {
        Ted {
            router_id,
            links: Default::default(),
            interfaces: Default::default(),
            rib: Default::default(),
            max_message_id: 0,
        }
    }

    pub fn from_config(cfg: &TedCfg, now: Duration) -> Result<Ted, Error> {
        let mut ted = Ted::new(cfg.router_id);
        ted.initialize_links(cfg, now)?;
        Ok(ted)
    }

    // Creates one TE link per local interface attached to another router.
    //
    // The configuration is validated as a whole before the database is
    // touched.
    pub fn initialize_links(
        &mut self,
        cfg: &TedCfg,
        now: Duration,
    ) -> Result<(), Error> {
        let mut addrs = vec![];
        for iface in &cfg.interfaces {
            if addrs.contains(&iface.addr) {
                return Err(Error::DuplicateAddress(iface.addr));
            }
            addrs.push(iface.addr);
            if !iface.bandwidth.is_finite() || iface.bandwidth < 0.0 {
                return Err(Error::InvalidBandwidth(
                    iface.name.clone(),
                    iface.bandwidth,
                ));
            }
            if iface.peer.is_none() && iface.point_to_point {
                return Err(Error::MissingPeer(iface.name.clone()));
            }
        }

        self.clear();
        self.router_id = cfg.router_id;
        for iface in &cfg.interfaces {
            self.interfaces.insert(iface.name.clone(), iface.addr);
            let Some(peer) = &iface.peer else {
                continue;
            };
            let link = TeLink::new(
                cfg.router_id,
                peer.router_id,
                iface.addr,
                peer.addr,
                iface.bandwidth,
                iface.metric,
            );
            self.links.push(link);
            let index = self.links.len() - 1;
            self.update_timestamp(index, now);
            Debug::LinkCreate(&self.links[index]).log();
        }
        self.rebuild_routing_table();

        Ok(())
    }

    // Removes all links, interfaces and routes.
    pub fn clear(&mut self) {
        Debug::Clear.log();
        self.links.clear();
        self.interfaces.clear();
        self.rib.clear();
    }

    pub fn interface_addrs(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.interfaces.values().copied()
    }

    pub fn interface_addr_by_name(&self, name: &str) -> Option<Ipv4Addr> {
        self.interfaces.get(name).copied()
    }

    // The router ID is treated as a loopback address.
    pub fn is_local_address(&self, addr: Ipv4Addr) -> bool {
        addr == self.router_id || self.interface_addrs().any(|a| a == addr)
    }

    pub fn is_local_peer(&self, addr: Ipv4Addr) -> bool {
        self.local_links().any(|link| link.link_id == addr)
    }

    pub fn find_interface_addr_by_peer(
        &self,
        peer: Ipv4Addr,
    ) -> Option<Ipv4Addr> {
        self.local_links()
            .find(|link| link.link_id == peer)
            .map(|link| link.local)
    }

    // Panics if `peer` isn't a local peer.
    pub fn interface_addr_by_peer(&self, peer: Ipv4Addr) -> Ipv4Addr {
        self.find_interface_addr_by_peer(peer)
            .unwrap_or_else(|| panic!("{} is not a local peer", peer))
    }

    pub fn find_peer_remote_interface(
        &self,
        peer: Ipv4Addr,
    ) -> Option<Ipv4Addr> {
        self.local_links()
            .find(|link| link.link_id == peer)
            .map(|link| link.remote)
    }

    // Panics if `peer` isn't a local peer.
    pub fn peer_remote_interface(&self, peer: Ipv4Addr) -> Ipv4Addr {
        self.find_peer_remote_interface(peer)
            .unwrap_or_else(|| panic!("{} is not a local peer", peer))
    }

    pub fn find_peer_by_local_address(
        &self,
        local: Ipv4Addr,
    ) -> Option<Ipv4Addr> {
        self.local_links()
            .find(|link| link.local == local)
            .map(|link| link.link_id)
    }

    // Panics if `local` isn't attached to a TE link.
    pub fn peer_by_local_address(&self, local: Ipv4Addr) -> Ipv4Addr {
        self.find_peer_by_local_address(local).unwrap_or_else(|| {
            panic!("no TE link attached to interface {}", local)
        })
    }

    // Maps an interface address to the router ID that owns it.
    pub fn find_primary_address(&self, addr: Ipv4Addr) -> Option<Ipv4Addr> {
        self.links.iter().find_map(|link| {
            if link.local == addr || link.adv_router == addr {
                Some(link.adv_router)
            } else if link.remote == addr || link.link_id == addr {
                Some(link.link_id)
            } else {
                None
            }
        })
    }

    // Panics if `addr` is unknown.
    pub fn primary_address(&self, addr: Ipv4Addr) -> Ipv4Addr {
        self.find_primary_address(addr)
            .unwrap_or_else(|| panic!("unknown address {}", addr))
    }

    pub fn find_link_index(
        &self,
        adv_router: Ipv4Addr,
        link_id: Ipv4Addr,
    ) -> Option<usize> {
        self.links.iter().position(|link| {
            link.adv_router == adv_router && link.link_id == link_id
        })
    }

    // Panics if the link doesn't exist.
    pub fn link_index(&self, adv_router: Ipv4Addr, link_id: Ipv4Addr) -> usize {
        self.find_link_index(adv_router, link_id).unwrap_or_else(|| {
            panic!("TE link {} -> {} not found", adv_router, link_id)
        })
    }

    pub fn find_link_index_by_local(&self, local: Ipv4Addr) -> Option<usize> {
        self.links.iter().position(|link| {
            link.adv_router == self.router_id && link.local == local
        })
    }

    // Panics if `local` isn't attached to a TE link.
    pub fn link_index_by_local(&self, local: Ipv4Addr) -> usize {
        self.find_link_index_by_local(local).unwrap_or_else(|| {
            panic!("no TE link attached to interface {}", local)
        })
    }

    // Compares a flooded link advertisement against the stored one.
    pub fn check_link_validity(&self, link: &TeLink) -> LinkValidity {
        for (index, entry) in self.links.iter().enumerate() {
            if entry.same_origin(link) {
                return LinkValidity::Stale;
            }
            if entry.same_link(link) {
                if entry.is_older_than(link) {
                    return LinkValidity::Newer(index);
                }
                return LinkValidity::Stale;
            }
        }
        LinkValidity::New
    }

    // Merges a flooded link advertisement into the database.
    //
    // Returns true if the advertisement was accepted.
    pub fn update_link(&mut self, link: TeLink) -> bool {
        let rebuild = match self.check_link_validity(&link) {
            LinkValidity::Stale => {
                Debug::LinkUpdateIgnored(&link).log();
                return false;
            }
            LinkValidity::New => {
                Debug::LinkCreate(&link).log();
                self.links.push(link);
                true
            }
            LinkValidity::Newer(index) => {
                Debug::LinkUpdate(&link).log();
                let state_changed = self.links[index].state != link.state;
                self.links[index] = link;
                state_changed
            }
        };
        if rebuild {
            self.rebuild_routing_table();
        }
        true
    }

    // Stamps a locally modified link before it gets flooded.
    pub fn update_timestamp(&mut self, index: usize, now: Duration) {
        self.max_message_id = self.max_message_id.wrapping_add(1);
        let link = &mut self.links[index];
        link.source_id = self.router_id;
        link.message_id = self.max_message_id;
        link.timestamp = now;
        Debug::LinkTimestampUpdate(link).log();
    }

    // Sets the operational state of a link.
    //
    // Returns true if the state has changed.
    pub fn set_link_state(
        &mut self,
        adv_router: Ipv4Addr,
        link_id: Ipv4Addr,
        state: bool,
    ) -> Result<bool, Error> {
        let index = self
            .find_link_index(adv_router, link_id)
            .ok_or(Error::LinkNotFound(adv_router, link_id))?;
        let link = &mut self.links[index];
        if link.state == state {
            return Ok(false);
        }
        link.state = state;
        Debug::LinkStateChange(link).log();
        Ok(true)
    }

    pub fn calculate_shortest_paths(
        &self,
        links: &[TeLink],
        bandwidth: f64,
        priority: u8,
    ) -> Vec<Vertex> {
        spf::shortest_paths(self.router_id, links, bandwidth, priority)
    }

    pub fn calculate_shortest_path(
        &self,
        destinations: &[Ipv4Addr],
        links: &[TeLink],
        bandwidth: f64,
        priority: u8,
    ) -> Vec<Ipv4Addr> {
        spf::shortest_path(
            self.router_id,
            destinations,
            links,
            bandwidth,
            priority,
        )
    }

    // Recomputes all unicast routes from the topology, ignoring TE
    // constraints. Multicast routes are preserved.
    //
    // Peers reachable over an operational local link always get a direct
    // route, even when a multi-hop path is cheaper.
    pub fn rebuild_routing_table(&mut self) {
        let vertices =
            self.calculate_shortest_paths(&self.links, 0.0, PRIORITY_LOWEST);
        let root = vertices
            .iter()
            .position(|vertex| vertex.node == self.router_id);
        let direct = self
            .local_links()
            .filter(|link| link.state)
            .cloned()
            .collect::<Vec<_>>();

        self.rib.clear_unicast();
        for (index, vertex) in vertices.iter().enumerate() {
            if Some(index) == root {
                continue;
            }
            if direct.iter().any(|link| link.link_id == vertex.node) {
                continue;
            }
            let Some(distance) = vertex.distance else {
                continue;
            };

            // Walk back the tree until the first hop after this router.
            let mut first_hop = index;
            while vertices[first_hop].parent != root {
                match vertices[first_hop].parent {
                    Some(parent) => first_hop = parent,
                    None => break,
                }
            }
            let first_hop = vertices[first_hop].node;
            let Some(iface) = direct
                .iter()
                .find(|link| link.link_id == first_hop)
                .map(|link| link.local)
            else {
                continue;
            };

            self.rib.add(Route {
                prefix: vertex.node.to_host_prefix(),
                nexthop: Some(first_hop),
                iface,
                protocol: RouteProtocol::Te,
                metric: distance,
            });
        }

        // Direct routes to the local peers and their interface addresses.
        for link in &direct {
            for addr in [link.link_id, link.remote] {
                self.rib.add(Route {
                    prefix: addr.to_host_prefix(),
                    nexthop: None,
                    iface: link.local,
                    protocol: RouteProtocol::Te,
                    metric: link.metric.into(),
                });
            }
        }

        Debug::RoutingTableRebuild(self.rib.len()).log();
    }

    // Returns the local interface used to reach `addr`.
    pub fn route_interface(&self, addr: Ipv4Addr) -> Option<Ipv4Addr> {
        self.rib.lookup(addr).map(|route| route.iface)
    }

    fn local_links(&self) -> impl Iterator<Item = &TeLink> + '_ {
        self.links
            .iter()
            .filter(move |link| link.adv_router == self.router_id)
    }
}
