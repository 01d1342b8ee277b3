//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use derive_new::new;
use holo_utils::mpls::{Label, LabelOp};
use serde::{Deserialize, Serialize};

// Label forwarding table the engine installs its cross-connects into.
pub trait LabelTable {
    // Installs or updates an entry. A new incoming label is allocated when
    // `in_label` is `None`.
    //
    // `None` as incoming interface matches any interface, while `None` as
    // outgoing interface stands for local delivery.
    fn install(
        &mut self,
        in_label: Option<Label>,
        in_iface: Option<Ipv4Addr>,
        out_op: LabelOp,
        out_iface: Option<Ipv4Addr>,
        color: u32,
    ) -> Label;

    fn remove(&mut self, in_label: Label);

    fn get(&self, in_label: Label) -> Option<&LibEntry>;
}

#[derive(Clone, Debug, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LibEntry {
    pub in_label: Label,
    pub in_iface: Option<Ipv4Addr>,
    pub out_op: LabelOp,
    pub out_iface: Option<Ipv4Addr>,
    pub color: u32,
}

// In-memory label forwarding table.
#[derive(Debug, Default)]
pub struct Lib {
    entries: BTreeMap<Label, LibEntry>,
}

// ===== impl Lib =====

impl Lib {
    pub fn iter(&self) -> impl Iterator<Item = &LibEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Returns the lowest unused label from the unreserved range.
    fn allocate(&self) -> Label {
        let mut next = *Label::UNRESERVED_RANGE.start();
        for label in self.entries.keys() {
            if label.get() > next {
                break;
            }
            if label.get() == next {
                next += 1;
            }
        }
        Label::new(next)
    }
}

impl LabelTable for Lib {
    fn install(
        &mut self,
        in_label: Option<Label>,
        in_iface: Option<Ipv4Addr>,
        out_op: LabelOp,
        out_iface: Option<Ipv4Addr>,
        color: u32,
    ) -> Label {
        let in_label = in_label.unwrap_or_else(|| self.allocate());
        let entry = LibEntry::new(in_label, in_iface, out_op, out_iface, color);
        self.entries.insert(in_label, entry);
        in_label
    }

    fn remove(&mut self, in_label: Label) {
        self.entries.remove(&in_label);
    }

    fn get(&self, in_label: Label) -> Option<&LibEntry> {
        self.entries.get(&in_label)
    }
}

// ===== unit tests =====
