//! Group-level admission control between graph mutators and graph readers.
//!
//! Every operation on the shared graph first obtains an [`Admission`] for one
//! of three groups:
//!
//! - [`Group::Mutate`]: any number of mutators may run together.
//! - [`Group::Query`]: any number of readers may run together.
//! - [`Group::Exclusive`]: runs alone (used by reset).
//!
//! Mutators and readers never overlap: at every instant
//! `active_mutators == 0 || active_queriers == 0`. The admission guard releases
//! its slot on drop, so the counters are restored on every exit path including
//! early returns and panics.
//!
//! # Admission policies
//!
//! [`AdmissionPolicy::Greedy`] admits an operation as soon as the opposite group
//! is idle and wakes every waiter when a group drains. It is simple and has the
//! highest throughput for a single group, but a steady stream of one group can
//! postpone the other indefinitely.
//!
//! [`AdmissionPolicy::Alternating`] hands the floor back and forth in batches.
//! Each arrival draws a ticket. While the opposite group has waiters, a newcomer
//! does not join its own running group; when a group drains, the turn passes to
//! the waiting group and every waiter holding a ticket issued before the
//! hand-over is admitted together. Neither group can starve the other.
//!
//! In both policies a pending exclusive request holds back new mutators and
//! readers, so a reset is admitted once the running group drains.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// Operation class used for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Mutate,
    Query,
    Exclusive,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Mutate => "mutate",
            Group::Query => "query",
            Group::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How waiting groups are scheduled against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Admit whenever the opposite group is idle; wake all on drain.
    #[default]
    Greedy,
    /// Alternate batches between the groups while both have work.
    Alternating,
}

impl FromStr for AdmissionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(AdmissionPolicy::Greedy),
            "alternating" | "fair" => Ok(AdmissionPolicy::Alternating),
            other => Err(Error::invalid_config(format!(
                "unknown admission policy '{other}', expected 'greedy' or 'alternating'"
            ))),
        }
    }
}

/// Point-in-time view of the coordinator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub active_mutators: usize,
    pub active_queriers: usize,
    pub exclusive: bool,
    pub waiting_mutators: usize,
    pub waiting_queriers: usize,
    pub waiting_exclusive: usize,
}

impl CoordinatorSnapshot {
    /// The exclusion invariant holds for this snapshot.
    pub fn is_consistent(&self) -> bool {
        let groups_disjoint = self.active_mutators == 0 || self.active_queriers == 0;
        let exclusive_alone = !self.exclusive || (self.active_mutators == 0 && self.active_queriers == 0);
        groups_disjoint && exclusive_alone
    }
}

/// Mutate or query; the two groups that alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Mutate,
    Query,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Mutate => Side::Query,
            Side::Query => Side::Mutate,
        }
    }
}

#[derive(Debug, Default)]
struct SideState {
    active: usize,
    waiting: usize,
    next_ticket: u64,
    /// Waiters holding a ticket below this were present when the side was
    /// last handed the turn.
    admit_below: u64,
}

#[derive(Debug, Default)]
struct State {
    mutate: SideState,
    query: SideState,
    exclusive: bool,
    waiting_exclusive: usize,
    turn: Option<Side>,
}

impl State {
    fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Mutate => &self.mutate,
            Side::Query => &self.query,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Mutate => &mut self.mutate,
            Side::Query => &mut self.query,
        }
    }

    /// Register a waiter and hand out its ticket.
    fn arrive(&mut self, group: Group) -> u64 {
        match side_of(group) {
            Some(side) => {
                let state = self.side_mut(side);
                let ticket = state.next_ticket;
                state.next_ticket += 1;
                state.waiting += 1;
                ticket
            }
            None => {
                self.waiting_exclusive += 1;
                0
            }
        }
    }

    fn can_admit(&self, group: Group, ticket: u64, policy: AdmissionPolicy) -> bool {
        let Some(side) = side_of(group) else {
            return !self.exclusive && self.mutate.active == 0 && self.query.active == 0;
        };

        if self.exclusive || self.waiting_exclusive > 0 || self.side(side.other()).active > 0 {
            return false;
        }

        match policy {
            AdmissionPolicy::Greedy => true,
            AdmissionPolicy::Alternating => {
                if self.turn == Some(side.other()) {
                    return false;
                }
                self.side(side.other()).waiting == 0 || ticket < self.side(side).admit_below
            }
        }
    }

    fn admit(&mut self, group: Group) {
        match side_of(group) {
            Some(side) => {
                let state = self.side_mut(side);
                state.waiting -= 1;
                state.active += 1;
                if self.turn.is_none() {
                    self.turn = Some(side);
                }
            }
            None => {
                self.waiting_exclusive -= 1;
                self.exclusive = true;
            }
        }
    }

    /// Undo [`State::arrive`] for a waiter that gave up.
    fn abandon(&mut self, group: Group) {
        match side_of(group) {
            Some(side) => {
                self.side_mut(side).waiting -= 1;
                if self.turn == Some(side) && self.side(side).active == 0 {
                    self.hand_over(side);
                }
            }
            None => self.waiting_exclusive -= 1,
        }
    }

    /// Returns `true` when the group drained and waiters must be woken.
    fn release(&mut self, group: Group) -> bool {
        match side_of(group) {
            Some(side) => {
                let state = self.side_mut(side);
                state.active -= 1;
                if state.active == 0 {
                    self.hand_over(side);
                    true
                } else {
                    false
                }
            }
            None => {
                self.exclusive = false;
                self.hand_over(Side::Query);
                true
            }
        }
    }

    /// Pass the turn away from `drained`: to the opposite side if it has
    /// waiters, back to `drained` if only it has waiters, otherwise to nobody.
    /// Everyone already waiting on the chosen side joins its batch.
    fn hand_over(&mut self, drained: Side) {
        let next = if self.side(drained.other()).waiting > 0 {
            Some(drained.other())
        } else if self.side(drained).waiting > 0 {
            Some(drained)
        } else {
            None
        };

        if let Some(side) = next {
            let state = self.side_mut(side);
            state.admit_below = state.next_ticket;
        }
        self.turn = next;
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            active_mutators: self.mutate.active,
            active_queriers: self.query.active,
            exclusive: self.exclusive,
            waiting_mutators: self.mutate.waiting,
            waiting_queriers: self.query.waiting,
            waiting_exclusive: self.waiting_exclusive,
        }
    }
}

fn side_of(group: Group) -> Option<Side> {
    match group {
        Group::Mutate => Some(Side::Mutate),
        Group::Query => Some(Side::Query),
        Group::Exclusive => None,
    }
}

/// Admission controller shared by every operation on one graph.
#[derive(Debug, Default)]
pub struct Coordinator {
    policy: AdmissionPolicy,
    state: Mutex<State>,
    changed: Condvar,
}

impl Coordinator {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Block until `group` is admitted.
    pub fn admit(&self, group: Group) -> Admission<'_> {
        match self.enter(group, None) {
            Ok(waited) => Admission::new(self, group, waited),
            // Without a deadline `enter` only returns once admitted.
            Err(_) => unreachable!("untimed admission cannot time out"),
        }
    }

    /// Block until `group` is admitted or `timeout` elapses. On timeout the
    /// waiter is withdrawn and no counter is left changed.
    pub fn admit_within(&self, group: Group, timeout: Duration) -> Result<Admission<'_>> {
        let waited = self.enter(group, Some(Instant::now() + timeout))?;
        Ok(Admission::new(self, group, waited))
    }

    pub fn admit_mutate(&self) -> Admission<'_> {
        self.admit(Group::Mutate)
    }

    pub fn admit_query(&self) -> Admission<'_> {
        self.admit(Group::Query)
    }

    pub fn admit_exclusive(&self) -> Admission<'_> {
        self.admit(Group::Exclusive)
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.state.lock().snapshot()
    }

    fn enter(&self, group: Group, deadline: Option<Instant>) -> Result<Duration> {
        let started = Instant::now();
        let mut state = self.state.lock();
        let ticket = state.arrive(group);

        while !state.can_admit(group, ticket, self.policy) {
            match deadline {
                None => self.changed.wait(&mut state),
                Some(deadline) => {
                    let timed_out = self.changed.wait_until(&mut state, deadline).timed_out();
                    if timed_out && !state.can_admit(group, ticket, self.policy) {
                        state.abandon(group);
                        drop(state);
                        self.changed.notify_all();
                        let waited = started.elapsed();
                        warn!(%group, waited_ms = waited.as_millis() as u64, "admission timed out");
                        return Err(Error::AdmissionTimedOut { group, waited });
                    }
                }
            }
        }

        state.admit(group);
        trace!(%group, snapshot = ?state.snapshot(), "admitted");
        Ok(started.elapsed())
    }

    fn exit(&self, group: Group) {
        let mut state = self.state.lock();
        let drained = state.release(group);
        trace!(%group, snapshot = ?state.snapshot(), "released");
        drop(state);
        if drained {
            self.changed.notify_all();
        }
    }
}

/// Scoped membership in an admission group; released on drop.
#[must_use = "the admission is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct Admission<'a> {
    coordinator: &'a Coordinator,
    group: Group,
    waited: Duration,
}

impl<'a> Admission<'a> {
    fn new(coordinator: &'a Coordinator, group: Group, waited: Duration) -> Self {
        Self {
            coordinator,
            group,
            waited,
        }
    }

    pub fn group(&self) -> Group {
        self.group
    }

    /// Time spent waiting before admission.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        self.coordinator.exit(self.group);
    }
}
