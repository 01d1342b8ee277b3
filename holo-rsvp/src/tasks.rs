//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use holo_utils::task::{Scheduler, TimerHandle};

use crate::collections::{PsbId, RsbId};
use crate::tasks::messages::input::TimerMsg;
use crate::tasks::messages::PathNotifyMsg;

//
// RSVP tasks diagram:
//                                  +--------------+
//                   net_rx (1x) -> |              | -> (1x) net_tx
//                                  |              |
//        psb_refresh_timer (Nx) -> |              |
//        psb_timeout_timer (Nx) -> |              |
//        rsb_refresh_timer (Nx) -> |   instance   | -> (1x) path_notify
//         rsb_commit_timer (Nx) -> |              |
//        rsb_timeout_timer (Nx) -> |              | -> (1x) ted_changed
//     hello_interval_timer (Nx) -> |              |
//      hello_timeout_timer (Nx) -> |              | -> (1x) bind_fec
//        path_notify_timer (Nx) -> |              |
//                                  +--------------+
//

// RSVP inter-task message types.
pub mod messages {
    use std::net::Ipv4Addr;

    use serde::{Deserialize, Serialize};

    use crate::packet::{Message, SenderTemplate, Session};
    use crate::traffic::{PathNotifyStatus, PathOwner};

    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    // Path status notification.
    #[derive(Clone, Debug, PartialEq)]
    #[derive(Deserialize, Serialize)]
    pub struct PathNotifyMsg {
        pub owner: PathOwner,
        pub session: Session,
        pub sender: SenderTemplate,
        pub status: PathNotifyStatus,
    }

    // Input messages (scheduler/network -> instance).
    pub mod input {
        use super::*;
        use crate::collections::{PsbId, RsbId};

        #[derive(Clone, Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetRxPacket(NetRxPacketMsg),
            Timer(TimerMsg),
        }

        #[derive(Clone, Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct NetRxPacketMsg {
            pub src: Ipv4Addr,
            pub msg: Message,
        }

        #[derive(Clone, Debug, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub enum TimerMsg {
            PsbRefresh(PsbId),
            PsbTimeout(PsbId),
            RsbRefresh(RsbId),
            RsbCommit(RsbId),
            RsbTimeout(RsbId),
            HelloInterval(Ipv4Addr),
            HelloTimeout(Ipv4Addr),
            PathNotify(PathNotifyMsg),
        }
    }

    // Output messages (instance -> embedding system).
    pub mod output {
        use enum_as_inner::EnumAsInner;
        use holo_ted::link::TeLink;
        use holo_utils::mpls::Label;

        use super::*;

        #[derive(Clone, Debug, EnumAsInner)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetTxPacket(NetTxPacketMsg),
            PathNotify(PathNotifyMsg),
            TedChanged(TedChangedMsg),
            BindFec(BindFecMsg),
        }

        #[derive(Clone, Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct NetTxPacketMsg {
            pub dst: Ipv4Addr,
            pub msg: Message,
        }

        // A local TE link changed and needs to be flooded.
        #[derive(Clone, Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct TedChangedMsg {
            pub link: TeLink,
        }

        // Incoming label bound to an LSP.
        #[derive(Clone, Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct BindFecMsg {
            pub session: Session,
            pub sender: SenderTemplate,
            pub label: Label,
        }
    }
}

// ===== RSVP tasks =====

// PSB refresh timer.
pub(crate) fn psb_refresh_timer(
    psb_id: PsbId,
    delay: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(delay, TimerMsg::PsbRefresh(psb_id))
}

// PSB timeout timer.
pub(crate) fn psb_timeout_timer(
    psb_id: PsbId,
    timeout: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(timeout, TimerMsg::PsbTimeout(psb_id))
}

// RSB refresh timer.
pub(crate) fn rsb_refresh_timer(
    rsb_id: RsbId,
    delay: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(delay, TimerMsg::RsbRefresh(rsb_id))
}

// RSB commit timer. Fires on the next scheduling round.
pub(crate) fn rsb_commit_timer(
    rsb_id: RsbId,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(Duration::ZERO, TimerMsg::RsbCommit(rsb_id))
}

// RSB timeout timer.
pub(crate) fn rsb_timeout_timer(
    rsb_id: RsbId,
    timeout: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(timeout, TimerMsg::RsbTimeout(rsb_id))
}

// HELLO interval timer.
pub(crate) fn hello_interval_timer(
    peer: Ipv4Addr,
    delay: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(delay, TimerMsg::HelloInterval(peer))
}

// HELLO dead timer.
pub(crate) fn hello_timeout_timer(
    peer: Ipv4Addr,
    timeout: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(timeout, TimerMsg::HelloTimeout(peer))
}

// Status notification addressed to the instance itself.
pub(crate) fn path_notify_timer(
    msg: PathNotifyMsg,
    delay: Duration,
    sched: &mut dyn Scheduler<TimerMsg>,
) -> TimerHandle {
    sched.schedule(delay, TimerMsg::PathNotify(msg))
}
