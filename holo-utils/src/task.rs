//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;
use tokio::time::Instant;
use tracing::Instrument;

/// A handle which can be used to manipulate the task created by the
/// [`Task::spawn`] function.
///
/// By default, dropping this handle cancels the task (unless [`Task::detach`]
/// is used).
#[derive(Debug)]
pub struct Task<T> {
    join_handle: task::JoinHandle<T>,
    detached: bool,
}

/// Opaque handle identifying a timer scheduled through a [`Scheduler`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct TimerHandle(u64);

/// Timer facility used by protocol engines.
///
/// A scheduled token is delivered back to its owner once the delay expires,
/// unless the timer is cancelled first. Cancelling a timer that has already
/// fired or was already cancelled is a no-op.
pub trait Scheduler<T> {
    /// Schedules `token` to be delivered after `delay`.
    fn schedule(&mut self, delay: Duration, token: T) -> TimerHandle;

    /// Cancels a pending timer.
    fn cancel(&mut self, handle: TimerHandle);

    /// Returns the current time as seen by this scheduler.
    fn now(&self) -> Duration;
}

/// Discrete-event scheduler driven by a virtual clock.
///
/// Tokens are returned by [`EventQueue::pop`] in deadline order. Tokens
/// sharing the same deadline are returned in scheduling order.
#[derive(Debug)]
pub struct EventQueue<T> {
    now: Duration,
    next_id: u64,
    deadlines: BinaryHeap<Reverse<(Duration, u64)>>,
    pending: HashMap<u64, T>,
}

/// [`Scheduler`] backed by the tokio runtime.
///
/// Expired tokens are sent over the provided channel.
#[derive(Debug)]
pub struct TaskScheduler<T> {
    start: Instant,
    next_id: u64,
    tasks: HashMap<u64, Task<()>>,
    tx: UnboundedSender<T>,
}

// ===== impl Task =====

impl<T> Task<T> {
    /// Spawns a new asynchronous task, returning a handle for it.
    pub fn spawn<Fut>(future: Fut) -> Task<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task {
            join_handle: task::spawn(future),
            detached: false,
        }
    }

    /// Detach the task, meaning it will no longer be canceled if its handle is
    /// dropped.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    /// Returns true if the task has run to completion.
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl<T> Future for Task<T> {
    type Output = Result<T, task::JoinError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        Pin::new(&mut self.join_handle).poll(cx)
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if !self.detached {
            self.join_handle.abort();
        }
    }
}

// ===== impl EventQueue =====

impl<T> EventQueue<T> {
    pub fn new() -> EventQueue<T> {
        EventQueue {
            now: Duration::ZERO,
            next_id: 0,
            deadlines: Default::default(),
            pending: Default::default(),
        }
    }

    /// Returns the deadline of the next pending token, if any.
    pub fn peek_deadline(&mut self) -> Option<Duration> {
        while let Some(Reverse((deadline, id))) = self.deadlines.peek() {
            if self.pending.contains_key(id) {
                return Some(*deadline);
            }
            // Cancelled timer.
            self.deadlines.pop();
        }
        None
    }

    /// Removes the next pending token, advancing the clock to its deadline.
    pub fn pop(&mut self) -> Option<(Duration, T)> {
        while let Some(Reverse((deadline, id))) = self.deadlines.pop() {
            if let Some(token) = self.pending.remove(&id) {
                self.now = deadline;
                return Some((deadline, token));
            }
        }
        None
    }

    /// Moves the clock forward to `now`. The clock never goes backwards.
    pub fn advance(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Returns the number of pending tokens.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> EventQueue<T> {
        EventQueue::new()
    }
}

impl<T> Scheduler<T> for EventQueue<T> {
    fn schedule(&mut self, delay: Duration, token: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.deadlines.push(Reverse((self.now + delay, id)));
        self.pending.insert(id, token);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle.0);
    }

    fn now(&self) -> Duration {
        self.now
    }
}

// ===== impl TaskScheduler =====

impl<T> TaskScheduler<T>
where
    T: Send + 'static,
{
    pub fn new(tx: UnboundedSender<T>) -> TaskScheduler<T> {
        TaskScheduler {
            start: Instant::now(),
            next_id: 0,
            tasks: Default::default(),
            tx,
        }
    }
}

impl<T> Scheduler<T> for TaskScheduler<T>
where
    T: Send + 'static,
{
    fn schedule(&mut self, delay: Duration, token: T) -> TimerHandle {
        // Forget timers that have already fired.
        self.tasks.retain(|_, task| !task.is_finished());

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let tx = self.tx.clone();
        let task = Task::spawn(
            async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(token);
            }
            .in_current_span(),
        );
        self.tasks.insert(id, task);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        // Dropping the task aborts it.
        self.tasks.remove(&handle.0);
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

// ===== unit tests =====
