/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! All shared scheduler state, gathered into one context value that is passed
//! explicitly to every component (no process-wide singletons). One mutex
//! guards everything the main loop, the I/O detour workers, and the admission
//! path touch; the scheduler spends most of its life sleeping through quanta,
//! so contention is irrelevant and a single lock removes whole classes of
//! ordering bugs. Lock scopes never contain an `.await`.

use std::{collections::HashSet, sync::Arc};

use crate::{inbox::SignalInbox,
            policy::{TierId, TierPolicy},
            process::{CurrentProcess, ProcessId},
            queues::ReadyQueues};

use super::{ReportSink, StdMutex};

pub type SafeSchedState = Arc<StdMutex<SchedState>>;

/// The mutable half of the scheduler, all behind the single mutex.
#[derive(Debug)]
pub struct SchedState {
    pub queues: ReadyQueues,
    /// Admitted and not yet terminated processes.
    pub live: usize,
    /// Processes currently held by an I/O detour worker (including ones that
    /// terminated while held; see `tombstones`).
    pub io_count: usize,
    /// Pids that terminated while a detour worker held them. The worker
    /// discards these on wake instead of reinserting.
    pub tombstones: HashSet<ProcessId>,
    pub active_tier: TierId,
    /// Outer-loop visits the active tier has left before the scheduler
    /// rotates onward.
    pub cycles_left: u64,
    /// The process being served a quantum right now, if any.
    pub current: Option<CurrentProcess>,
}

impl SchedState {
    #[must_use]
    pub fn new(policy: &TierPolicy) -> Self {
        Self {
            queues: ReadyQueues::new(policy.tier_count),
            live: 0,
            io_count: 0,
            tombstones: HashSet::new(),
            active_tier: policy.top(),
            cycles_left: policy.runs_for(policy.top()),
            current: None,
        }
    }

    /// Enqueue a freshly spawned (already suspended) child at the top tier.
    pub fn admit(&mut self, id: ProcessId) {
        self.queues.push_back(TierId(0), id);
        self.live += 1;
    }

    pub fn activate_tier(&mut self, tier: TierId, policy: &TierPolicy) {
        self.active_tier = tier;
        self.cycles_left = policy.runs_for(tier);
    }

    /// Processes genuinely blocked in the detour (worker-held minus the ones
    /// that already terminated).
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.io_count - self.tombstones.len()
    }

    #[must_use]
    pub fn counts(&self) -> RemainingCounts {
        let blocked = self.blocked_count();
        RemainingCounts {
            live: self.live,
            ready: self.live - blocked,
            blocked,
        }
    }

    /// Every live pid sits in exactly one place. Only meaningful between
    /// quanta (no current process).
    #[must_use]
    pub fn accounting_is_consistent(&self) -> bool {
        self.current.is_none()
            && self.live == self.queues.total_len() + self.blocked_count()
    }
}

/// Snapshot for the completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingCounts {
    pub live: usize,
    pub ready: usize,
    pub blocked: usize,
}

/// Handle shared by the main loop, the I/O workers, and admission. Cheap to
/// clone; everything inside is an `Arc` or `Copy`.
#[derive(Debug, Clone)]
pub struct SchedulerContext {
    pub policy: TierPolicy,
    pub safe_state: SafeSchedState,
    pub inbox: Arc<SignalInbox>,
    pub report: ReportSink,
}

impl SchedulerContext {
    #[must_use]
    pub fn new(policy: TierPolicy, report: ReportSink) -> Self {
        Self {
            safe_state: Arc::new(StdMutex::new(SchedState::new(&policy))),
            inbox: Arc::new(SignalInbox::new()),
            policy,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn admission_lands_in_the_top_tier_and_bumps_live() {
        let ctx = SchedulerContext::new(TierPolicy::default(), ReportSink::default());
        let mut state = ctx.safe_state.lock().unwrap();
        state.admit(ProcessId(11));
        state.admit(ProcessId(22));

        assert_eq!(state.live, 2);
        assert_eq!(state.queues.pop_front(TierId(0)), Some(ProcessId(11)));
        assert_eq!(state.queues.pop_front(TierId(0)), Some(ProcessId(22)));
    }

    #[test]
    fn fresh_state_starts_at_the_top_tier_with_a_full_cycle_budget() {
        let policy = TierPolicy::default();
        let state = SchedState::new(&policy);
        assert_eq!(state.active_tier, TierId(0));
        assert_eq!(state.cycles_left, 4);
        assert!(state.accounting_is_consistent());
    }

    #[test]
    fn counts_subtract_tombstoned_workers_from_blocked() {
        let policy = TierPolicy::default();
        let mut state = SchedState::new(&policy);
        state.admit(ProcessId(1));
        state.admit(ProcessId(2));
        state.queues.pop_front(TierId(0));
        state.queues.pop_front(TierId(0));

        // One pid blocked in the detour, one terminated while detoured.
        state.io_count = 2;
        state.tombstones.insert(ProcessId(2));
        state.live = 1;

        let counts = state.counts();
        assert_eq!(counts.blocked, 1);
        assert_eq!(counts.ready, 0);
        assert_eq!(counts.live, 1);
    }
}
