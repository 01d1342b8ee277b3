//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use holo_utils::ip::Ipv4NetworkExt;
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

// Local IPv4 routing table.
#[derive(Debug, Default)]
pub struct Rib {
    routes: BTreeMap<Ipv4Network, Route>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Route {
    pub prefix: Ipv4Network,
    // `None` for directly connected destinations.
    pub nexthop: Option<Ipv4Addr>,
    pub iface: Ipv4Addr,
    pub protocol: RouteProtocol,
    pub metric: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RouteProtocol {
    Static,
    Te,
}

// ===== impl Rib =====

impl Rib {
    pub fn add(&mut self, route: Route) {
        self.routes.insert(route.prefix, route);
    }

    pub fn remove(&mut self, prefix: &Ipv4Network) -> Option<Route> {
        self.routes.remove(prefix)
    }

    pub fn get(&self, prefix: &Ipv4Network) -> Option<&Route> {
        self.routes.get(prefix)
    }

    // Longest-prefix match.
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<&Route> {
        self.routes
            .values()
            .filter(|route| route.prefix.contains(addr))
            .max_by_key(|route| route.prefix.prefix())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn clear_unicast(&mut self) {
        self.routes.retain(|prefix, _| prefix.is_multicast());
    }

    pub(crate) fn clear(&mut self) {
        self.routes.clear();
    }
}

// ===== unit tests =====
