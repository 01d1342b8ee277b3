//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::link::TeLink;

// Shortest-path tree vertex.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Vertex {
    pub node: Ipv4Addr,
    // `None` stands for an unreachable vertex.
    pub distance: Option<u64>,
    pub parent: Option<usize>,
}

#[derive(Debug)]
struct Edge {
    src: usize,
    dst: usize,
    metric: u32,
}

// ===== impl Vertex =====

impl Vertex {
    fn new(node: Ipv4Addr) -> Vertex {
        Vertex {
            node,
            distance: None,
            parent: None,
        }
    }
}

// ===== global functions =====

// Computes the shortest paths from `root` to every router present in `links`,
// considering only links that are up and have at least `bandwidth` available
// at the given priority.
pub(crate) fn shortest_paths(
    root: Ipv4Addr,
    links: &[TeLink],
    bandwidth: f64,
    priority: u8,
) -> Vec<Vertex> {
    let mut vertices = vec![];
    let mut edges = vec![];

    for link in links {
        let src = vertex_index(&mut vertices, link.adv_router);
        let dst = vertex_index(&mut vertices, link.link_id);
        if !link.state
            || link.unresv_bandwidth[priority as usize] < bandwidth
        {
            continue;
        }
        edges.push(Edge {
            src,
            dst,
            metric: link.metric,
        });
    }

    let root = vertex_index(&mut vertices, root);
    vertices[root].distance = Some(0);

    for _ in 1..vertices.len() {
        let mut modified = false;
        for edge in &edges {
            let Some(distance) = vertices[edge.src].distance else {
                continue;
            };
            let distance = distance + edge.metric as u64;
            if vertices[edge.dst]
                .distance
                .is_none_or(|current| distance < current)
            {
                vertices[edge.dst].distance = Some(distance);
                vertices[edge.dst].parent = Some(edge.src);
                modified = true;
            }
        }
        if !modified {
            break;
        }
    }

    vertices
}

// Returns the hop sequence from `root` to the closest reachable member of
// `destinations`, or an empty sequence if none is reachable.
pub(crate) fn shortest_path(
    root: Ipv4Addr,
    destinations: &[Ipv4Addr],
    links: &[TeLink],
    bandwidth: f64,
    priority: u8,
) -> Vec<Ipv4Addr> {
    let vertices = shortest_paths(root, links, bandwidth, priority);

    let mut best: Option<(u64, usize)> = None;
    for (index, vertex) in vertices.iter().enumerate() {
        let Some(distance) = vertex.distance else {
            continue;
        };
        if !destinations.contains(&vertex.node) {
            continue;
        }
        if best.is_none_or(|(best, _)| distance < best) {
            best = Some((distance, index));
        }
    }

    let mut path = vec![];
    let mut next = best.map(|(_, index)| index);
    while let Some(index) = next {
        path.push(vertices[index].node);
        next = vertices[index].parent;
    }
    path.reverse();
    path
}

fn vertex_index(vertices: &mut Vec<Vertex>, node: Ipv4Addr) -> usize {
    if let Some(index) = vertices.iter().position(|v| v.node == node) {
        return index;
    }
    vertices.push(Vertex::new(node));
    vertices.len() - 1
}
