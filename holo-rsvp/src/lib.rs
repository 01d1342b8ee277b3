//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod admission;
pub mod collections;
pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod hello;
pub mod instance;
pub mod label_table;
pub mod output;
pub mod packet;
pub mod psb;
pub mod rsb;
pub mod tasks;
pub mod traffic;
