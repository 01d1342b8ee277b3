//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use generational_arena::{Arena, Index};

use crate::error::Error;
use crate::packet::{FilterSpec, SenderTemplate, Session, SessionKey};
use crate::psb::Psb;
use crate::rsb::Rsb;

pub type PsbId = usize;
pub type PsbIndex = Index;
pub type PsbKey = (SessionKey, SenderTemplate);
pub type RsbId = usize;
pub type RsbIndex = Index;
pub type RsbKey = (SessionKey, Ipv4Addr, Option<Ipv4Addr>);

#[derive(Debug, Default)]
pub struct Psbs {
    // PSB arena.
    arena: Arena<Psb>,
    // PSB binary tree keyed by ID (1:1).
    id_tree: BTreeMap<PsbId, PsbIndex>,
    // PSB binary tree keyed by session and sender (1:1).
    key_tree: BTreeMap<PsbKey, PsbIndex>,
    // Next available ID.
    next_id: PsbId,
}

#[derive(Debug, Default)]
pub struct Rsbs {
    // RSB arena.
    arena: Arena<Rsb>,
    // RSB binary tree keyed by ID (1:1).
    id_tree: BTreeMap<RsbId, RsbIndex>,
    // RSB binary tree keyed by session, next hop and outgoing interface
    // (1:1).
    key_tree: BTreeMap<RsbKey, RsbIndex>,
    // Next available ID.
    next_id: RsbId,
}

// ===== impl Psbs =====

impl Psbs {
    pub(crate) fn insert(&mut self, psb: Psb) -> (PsbIndex, &mut Psb) {
        let id = psb.id;
        let key = psb.key();
        let psb_idx = self.arena.insert(psb);

        // Link PSB to different collections.
        self.id_tree.insert(id, psb_idx);
        self.key_tree.insert(key, psb_idx);

        (psb_idx, &mut self.arena[psb_idx])
    }

    pub(crate) fn delete(&mut self, psb_idx: PsbIndex) {
        let psb = &self.arena[psb_idx];

        // Unlink PSB from different collections.
        self.id_tree.remove(&psb.id);
        self.key_tree.remove(&psb.key());

        // Remove PSB from the arena.
        self.arena.remove(psb_idx);
    }

    // Returns a reference to the PSB corresponding to the given ID.
    pub(crate) fn get_by_id(
        &self,
        id: PsbId,
    ) -> Result<(PsbIndex, &Psb), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|psb_idx| (psb_idx, &self.arena[psb_idx]))
            .ok_or(Error::PsbIdNotFound(id))
    }

    // Returns a mutable reference to the PSB corresponding to the given ID.
    pub(crate) fn get_mut_by_id(
        &mut self,
        id: PsbId,
    ) -> Result<(PsbIndex, &mut Psb), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(move |psb_idx| (psb_idx, &mut self.arena[psb_idx]))
            .ok_or(Error::PsbIdNotFound(id))
    }

    // Returns a reference to the PSB corresponding to the given session and
    // sender.
    pub fn get_by_key(
        &self,
        session: &Session,
        sender: &SenderTemplate,
    ) -> Option<(PsbIndex, &Psb)> {
        self.key_tree
            .get(&(session.key(), *sender))
            .copied()
            .map(|psb_idx| (psb_idx, &self.arena[psb_idx]))
    }

    // Returns an iterator visiting all PSBs.
    //
    // PSBs are ordered by their IDs.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Psb> + '_ {
        self.id_tree.values().map(|psb_idx| &self.arena[*psb_idx])
    }

    // Returns the IDs of all PSBs matching the given predicate.
    pub(crate) fn ids_by(&self, f: impl Fn(&Psb) -> bool) -> Vec<PsbId> {
        self.iter().filter(|psb| f(psb)).map(|psb| psb.id).collect()
    }

    pub fn len(&self) -> usize {
        self.id_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_tree.is_empty()
    }

    // Get next PSB ID.
    pub(crate) fn next_id(&mut self) -> PsbId {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }
}

impl std::ops::Index<PsbIndex> for Psbs {
    type Output = Psb;

    fn index(&self, index: PsbIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<PsbIndex> for Psbs {
    fn index_mut(&mut self, index: PsbIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// ===== impl Rsbs =====

impl Rsbs {
    pub(crate) fn insert(&mut self, rsb: Rsb) -> (RsbIndex, &mut Rsb) {
        let id = rsb.id;
        let key = rsb.key();
        let rsb_idx = self.arena.insert(rsb);

        // Link RSB to different collections.
        self.id_tree.insert(id, rsb_idx);
        self.key_tree.insert(key, rsb_idx);

        (rsb_idx, &mut self.arena[rsb_idx])
    }

    pub(crate) fn delete(&mut self, rsb_idx: RsbIndex) {
        let rsb = &self.arena[rsb_idx];

        // Unlink RSB from different collections.
        self.id_tree.remove(&rsb.id);
        self.key_tree.remove(&rsb.key());

        // Remove RSB from the arena.
        self.arena.remove(rsb_idx);
    }

    // Returns a reference to the RSB corresponding to the given ID.
    pub(crate) fn get_by_id(
        &self,
        id: RsbId,
    ) -> Result<(RsbIndex, &Rsb), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|rsb_idx| (rsb_idx, &self.arena[rsb_idx]))
            .ok_or(Error::RsbIdNotFound(id))
    }

    // Returns a mutable reference to the RSB corresponding to the given ID.
    pub(crate) fn get_mut_by_id(
        &mut self,
        id: RsbId,
    ) -> Result<(RsbIndex, &mut Rsb), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(move |rsb_idx| (rsb_idx, &mut self.arena[rsb_idx]))
            .ok_or(Error::RsbIdNotFound(id))
    }

    // Returns a reference to the RSB corresponding to the given session, next
    // hop and outgoing interface.
    pub fn get_by_key(
        &self,
        session: &Session,
        nhop: Ipv4Addr,
        out_iface: Option<Ipv4Addr>,
    ) -> Option<(RsbIndex, &Rsb)> {
        self.key_tree
            .get(&(session.key(), nhop, out_iface))
            .copied()
            .map(|rsb_idx| (rsb_idx, &self.arena[rsb_idx]))
    }

    // Returns the first RSB holding a flow descriptor for the given session
    // and filter, along with the position of the flow descriptor.
    pub fn find_by_filter(
        &self,
        session: &Session,
        filter: &FilterSpec,
    ) -> Option<(RsbIndex, &Rsb, usize)> {
        self.id_tree
            .values()
            .map(|rsb_idx| (*rsb_idx, &self.arena[*rsb_idx]))
            .filter(|(_, rsb)| rsb.session == *session)
            .find_map(|(rsb_idx, rsb)| {
                rsb.flows
                    .iter()
                    .position(|flow| flow.filter == *filter)
                    .map(|flow_idx| (rsb_idx, rsb, flow_idx))
            })
    }

    // Returns an iterator visiting all RSBs.
    //
    // RSBs are ordered by their IDs.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Rsb> + '_ {
        self.id_tree.values().map(|rsb_idx| &self.arena[*rsb_idx])
    }

    // Returns the IDs of all RSBs matching the given predicate.
    pub(crate) fn ids_by(&self, f: impl Fn(&Rsb) -> bool) -> Vec<RsbId> {
        self.iter().filter(|rsb| f(rsb)).map(|rsb| rsb.id).collect()
    }

    pub fn len(&self) -> usize {
        self.id_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_tree.is_empty()
    }

    // Get next RSB ID.
    pub(crate) fn next_id(&mut self) -> RsbId {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }
}

impl std::ops::Index<RsbIndex> for Rsbs {
    type Output = Rsb;

    fn index(&self, index: RsbIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<RsbIndex> for Rsbs {
    fn index_mut(&mut self, index: RsbIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}
