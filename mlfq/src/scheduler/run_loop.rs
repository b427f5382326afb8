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

//! The multi-level feedback queue main loop.
//!
//! Outer loop: rotate through the tiers, spending `runs_for(tier)` iterations
//! on each before moving on. An empty tier burns its iterations like a busy
//! one; that bounds how long lower tiers can be starved while guaranteeing
//! the rotation makes progress.
//!
//! Inner loop (one "visit"): drain the active tier one process at a time.
//! Each process gets resumed, slept through one quantum, suspended, and then
//! judged by whatever signals arrived meanwhile: an I/O request sends it on
//! the detour toward a higher tier, an exit finalizes it, and silence demotes
//! it. A demotion that would land back in the tier being visited goes to the
//! auxiliary queue instead, so nothing runs twice in a single visit.

use std::time::Duration;

use tokio::task::JoinSet;

use crate::{inbox::SignalKind,
            policy::TierId,
            process::{CurrentProcess, ProcessControl, ProcessStatus},
            scheduler::ui_str};

use super::{SchedulerContext, spawn_io_worker};

/// How long to doze when every ready queue is empty but detour workers still
/// hold live processes. Purely a wakeup cadence; correctness does not depend
/// on it.
const ALL_BLOCKED_POLL: Duration = Duration::from_millis(50);

enum OuterStep {
    Done,
    AllBlocked,
    Visit(TierId),
}

/// Serve the admitted workload until every process has terminated, then wait
/// for any straggling detour workers before returning.
pub async fn run_scheduler<C: ProcessControl>(ctx: &SchedulerContext, control: &C) {
    let mut workers = JoinSet::new();

    {
        let state = ctx.safe_state.lock().unwrap();
        tracing::debug!(
            "there are {} processes waiting to be executed, starting scheduler",
            state.live
        );
    }

    loop {
        let step = {
            let mut state = ctx.safe_state.lock().unwrap();
            debug_assert!(state.accounting_is_consistent());
            if state.live == 0 {
                OuterStep::Done
            } else if state.queues.all_empty() {
                OuterStep::AllBlocked
            } else {
                if state.cycles_left == 0 {
                    tracing::debug!(
                        "queue {} has reached its cycle limit",
                        state.active_tier
                    );
                    let next =
                        TierId((state.active_tier.0 + 1) % ctx.policy.tier_count);
                    state.activate_tier(next, &ctx.policy);
                }
                state.cycles_left -= 1;
                OuterStep::Visit(state.active_tier)
            }
        };

        match step {
            OuterStep::Done => break,
            OuterStep::AllBlocked => tokio::time::sleep(ALL_BLOCKED_POLL).await,
            OuterStep::Visit(tier) => {
                serve_tier_visit(ctx, control, &mut workers, tier).await;
            }
        }
    }

    // Workers can outlive their process (exit during the detour) and so can
    // outlive the loop. Drain them before declaring the end.
    while workers.join_next().await.is_some() {}

    tracing::debug!("end of scheduling, all processes have been executed");
}

/// One visit to `tier`: serve every process that is ready in it right now,
/// one quantum each. The tier's queue and quantum are fixed for the whole
/// visit, even though the shared state is re-locked around each step.
async fn serve_tier_visit<C: ProcessControl>(
    ctx: &SchedulerContext,
    control: &C,
    workers: &mut JoinSet<()>,
    tier: TierId,
) {
    let quantum = ctx.policy.quantum(tier);
    let quantum_units = ctx.policy.quantum_units(tier);

    loop {
        let maybe_id = {
            let mut state = ctx.safe_state.lock().unwrap();
            let popped = state.queues.pop_front(tier);
            if let Some(id) = popped {
                state.current = Some(CurrentProcess::new(id));
            }
            popped
        };
        let Some(id) = maybe_id else { break };

        ctx.report.line(ui_str::serving_msg(id, tier, quantum_units));
        control.resume(id);
        tokio::time::sleep(quantum).await;
        control.suspend(id);
        tracing::debug!("interrupted process {id}");

        apply_drained_events(ctx, control, workers, tier);
        settle_current(ctx, tier, quantum_units);
    }

    // Fold the demoted-in-place processes back in, now that the visit is
    // over. They will run on the next visit to this tier, not this one.
    let mut state = ctx.safe_state.lock().unwrap();
    state.queues.transfer_aux_into(tier);
}

/// Consume every signal that arrived during the quantum, in arrival order,
/// and apply it to the current process. Events that find the process no
/// longer owned by the scheduler (already detoured or already terminated) are
/// dropped with a trace.
fn apply_drained_events<C: ProcessControl>(
    ctx: &SchedulerContext,
    control: &C,
    workers: &mut JoinSet<()>,
    tier: TierId,
) {
    let mut state = ctx.safe_state.lock().unwrap();
    let Some(mut current) = state.current else {
        return;
    };

    for kind in ctx.inbox.drain() {
        match kind {
            SignalKind::Io => {
                if current.status == ProcessStatus::Running {
                    current.status = ProcessStatus::IoRequested;
                    state.io_count += 1;
                    debug_assert!(state.io_count <= state.live);
                    spawn_io_worker(
                        workers,
                        ctx.clone(),
                        current.id,
                        ctx.policy.higher(tier),
                    );
                } else {
                    tracing::warn!(
                        "ignoring IO signal for process {} in state {}",
                        current.id,
                        current.status
                    );
                }
            }
            SignalKind::Exit => {
                match current.status {
                    ProcessStatus::Terminated => {
                        tracing::warn!(
                            "ignoring duplicate exit signal for process {}",
                            current.id
                        );
                        continue;
                    }
                    ProcessStatus::IoRequested => {
                        // Already handed to a detour worker; the worker will
                        // see the tombstone on wake and discard the pid.
                        state.tombstones.insert(current.id);
                    }
                    ProcessStatus::Running => {}
                }
                current.status = ProcessStatus::Terminated;
                state.live -= 1;
                ctx.report.line(ui_str::finished_msg(current.id));
                control.reap(current.id);
                ctx.report.line(ui_str::remaining_msg(&state.counts()));
                tracing::debug!("queues after completion: {}", state.queues.dump());
            }
        }
    }

    state.current = Some(current);
}

/// Post-drain placement of the current process. A process that consumed no
/// event exhausted its quantum and is demoted; one that detoured or exited is
/// no longer the scheduler's to place.
fn settle_current(ctx: &SchedulerContext, tier: TierId, quantum_units: u64) {
    let mut state = ctx.safe_state.lock().unwrap();
    let Some(current) = state.current.take() else {
        return;
    };
    if current.status != ProcessStatus::Running {
        return;
    }

    ctx.report
        .line(ui_str::quantum_expired_msg(current.id, quantum_units));
    let dest = ctx.policy.lower(tier);
    if dest == tier {
        state.queues.push_aux(current.id);
        ctx.report.line(ui_str::stays_msg(current.id, tier));
    } else {
        state.queues.push_back(dest, current.id);
        ctx.report.line(ui_str::migrates_msg(current.id, tier, dest));
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::{inbox::SignalInbox,
                policy::TierPolicy,
                process::ProcessId,
                scheduler::{ReportSink, StdMutex, mock_output_to_string}};

    #[derive(Debug, Clone)]
    struct ChildModel {
        remaining_units: u64,
        io_at_slices: Vec<usize>,
        slices_run: usize,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct SliceRecord {
        id: ProcessId,
        wall_units: u64,
        consumed_units: u64,
    }

    #[derive(Debug, Default)]
    struct FakeInner {
        children: HashMap<ProcessId, ChildModel>,
        resumed_at: HashMap<ProcessId, Instant>,
        slices: Vec<SliceRecord>,
        reaped: Vec<ProcessId>,
    }

    /// Plays the OS and the children at once: "consumes" simulated CPU while
    /// resumed, and raises the same signals a real child would, timed so they
    /// sit in the inbox when the post-quantum drain runs.
    #[derive(Debug, Clone)]
    struct FakeProcessControl {
        inner: Arc<StdMutex<FakeInner>>,
        inbox: Arc<SignalInbox>,
        time_unit: std::time::Duration,
    }

    impl FakeProcessControl {
        fn new(ctx: &SchedulerContext) -> Self {
            Self {
                inner: Arc::default(),
                inbox: ctx.inbox.clone(),
                time_unit: ctx.policy.time_unit,
            }
        }

        fn admit_child(
            &self,
            ctx: &SchedulerContext,
            raw_pid: i32,
            lifetime_units: u64,
            io_at_slices: &[usize],
        ) -> ProcessId {
            let id = ProcessId(raw_pid);
            ctx.safe_state.lock().unwrap().admit(id);
            self.inner.lock().unwrap().children.insert(
                id,
                ChildModel {
                    remaining_units: lifetime_units,
                    io_at_slices: io_at_slices.to_vec(),
                    slices_run: 0,
                },
            );
            id
        }

        fn slices(&self) -> Vec<SliceRecord> {
            self.inner.lock().unwrap().slices.clone()
        }

        fn consumed_per_slice(&self, id: ProcessId) -> Vec<u64> {
            self.slices()
                .into_iter()
                .filter(|slice| slice.id == id)
                .map(|slice| slice.consumed_units)
                .collect()
        }

        fn reaped(&self) -> Vec<ProcessId> {
            self.inner.lock().unwrap().reaped.clone()
        }
    }

    impl ProcessControl for FakeProcessControl {
        fn resume(&self, id: ProcessId) {
            self.inner
                .lock()
                .unwrap()
                .resumed_at
                .insert(id, Instant::now());
        }

        fn suspend(&self, id: ProcessId) {
            let mut guard = self.inner.lock().unwrap();
            let inner = &mut *guard;
            let resumed_at = inner
                .resumed_at
                .remove(&id)
                .expect("suspend without matching resume");
            let wall_units = u64::try_from(
                resumed_at.elapsed().as_millis() / self.time_unit.as_millis(),
            )
            .unwrap();

            let child = inner.children.get_mut(&id).expect("unknown child");
            let slice_index = child.slices_run;
            child.slices_run += 1;
            let io_requested = child.io_at_slices.contains(&slice_index)
                && child.remaining_units > 0;
            // An I/O-bound slice burns one unit before yielding; a CPU-bound
            // slice burns as much of the quantum as the child has left.
            let consumed = if io_requested {
                child.remaining_units.min(1)
            } else {
                child.remaining_units.min(wall_units)
            };
            child.remaining_units -= consumed;
            let exited = child.remaining_units == 0;

            inner.slices.push(SliceRecord {
                id,
                wall_units,
                consumed_units: consumed,
            });
            drop(guard);

            if io_requested {
                self.inbox.push(SignalKind::Io);
            }
            if exited {
                self.inbox.push(SignalKind::Exit);
            }
        }

        fn reap(&self, id: ProcessId) {
            self.inner.lock().unwrap().reaped.push(id);
        }
    }

    fn paused_test_context(
        policy: TierPolicy,
    ) -> (
        SchedulerContext,
        FakeProcessControl,
        Arc<StdMutex<Vec<u8>>>,
    ) {
        let (report, buffer) = ReportSink::new_mock();
        let ctx = SchedulerContext::new(policy, report);
        let fake = FakeProcessControl::new(&ctx);
        (ctx, fake, buffer)
    }

    #[tokio::test(start_paused = true)]
    async fn empty_workload_skips_the_main_loop() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());

        run_scheduler(&ctx, &fake).await;

        assert!(fake.slices().is_empty());
        assert_eq!(mock_output_to_string(&buffer), "");
        assert!(ctx.safe_state.lock().unwrap().accounting_is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn cpu_bound_process_is_served_the_expected_quanta() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 16, &[]);

        run_scheduler(&ctx, &fake).await;

        // 2 at tier 0, 4 at tier 1, 8 at tier 2, then 2 more on the next
        // visit to tier 2.
        assert_eq!(fake.consumed_per_slice(id), [2, 4, 8, 2]);
        assert_eq!(fake.reaped(), [id]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::finished_msg(id)));
        assert!(output.contains("No remaining processes"));
    }

    #[tokio::test(start_paused = true)]
    async fn cpu_hog_is_demoted_one_tier_at_a_time_then_stays_at_the_bottom() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 20, &[]);

        run_scheduler(&ctx, &fake).await;

        assert_eq!(fake.consumed_per_slice(id), [2, 4, 8, 6]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::migrates_msg(id, TierId(0), TierId(1))));
        assert!(output.contains(&ui_str::migrates_msg(id, TierId(1), TierId(2))));
        assert!(output.contains(&ui_str::stays_msg(id, TierId(2))));
    }

    #[tokio::test(start_paused = true)]
    async fn two_cpu_bound_processes_interleave_within_each_tier() {
        let (ctx, fake, _) = paused_test_context(TierPolicy::default());
        let first = fake.admit_child(&ctx, 101, 8, &[]);
        let second = fake.admit_child(&ctx, 102, 8, &[]);

        run_scheduler(&ctx, &fake).await;

        let trace: Vec<_> = fake
            .slices()
            .into_iter()
            .map(|slice| (slice.id, slice.consumed_units))
            .collect();
        assert_eq!(
            trace,
            [
                (first, 2),
                (second, 2),
                (first, 4),
                (second, 4),
                (first, 2),
                (second, 2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn io_request_at_the_top_tier_readmits_at_the_top_tier() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 3, &[0]);

        run_scheduler(&ctx, &fake).await;

        assert_eq!(fake.consumed_per_slice(id), [1, 2]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::io_blocked_msg(id)));
        assert!(output.contains(&ui_str::io_unblocked_msg(id, TierId(0))));
    }

    #[tokio::test(start_paused = true)]
    async fn io_request_at_a_lower_tier_promotes_one_tier() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 6, &[1]);

        run_scheduler(&ctx, &fake).await;

        // Slice 0: full quantum at tier 0. Slice 1: yields for I/O at tier 1,
        // so it comes back at tier 0. Slices 2 and 3 finish it off.
        assert_eq!(fake.consumed_per_slice(id), [2, 1, 2, 1]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::io_unblocked_msg(id, TierId(0))));
    }

    #[tokio::test(start_paused = true)]
    async fn exit_mid_quantum_still_sleeps_the_full_quantum() {
        let (ctx, fake, _) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 1, &[]);

        run_scheduler(&ctx, &fake).await;

        let slices = fake.slices();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].wall_units, 2);
        assert_eq!(slices[0].consumed_units, 1);
        assert_eq!(fake.reaped(), [id]);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_during_the_io_detour_discards_the_reinsertion() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let id = fake.admit_child(&ctx, 101, 1, &[0]);

        run_scheduler(&ctx, &fake).await;

        assert_eq!(fake.reaped(), [id]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::io_blocked_msg(id)));
        assert!(output.contains(&ui_str::finished_msg(id)));
        assert!(!output.contains("no longer blocked"));

        let state = ctx.safe_state.lock().unwrap();
        assert_eq!(state.io_count, 0);
        assert!(state.tombstones.is_empty());
        assert!(state.accounting_is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn single_tier_demotes_in_place_through_the_aux_queue() {
        let policy = TierPolicy {
            tier_count: 1,
            ..Default::default()
        };
        let (ctx, fake, buffer) = paused_test_context(policy);
        let id = fake.admit_child(&ctx, 101, 4, &[]);

        run_scheduler(&ctx, &fake).await;

        assert_eq!(fake.consumed_per_slice(id), [2, 2]);
        let output = mock_output_to_string(&buffer);
        assert!(output.contains(&ui_str::stays_msg(id, TierId(0))));
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_workload_runs_every_process_to_completion() {
        let (ctx, fake, buffer) = paused_test_context(TierPolicy::default());
        let pure_cpu = fake.admit_child(&ctx, 101, 14, &[]);
        let io_bound = fake.admit_child(&ctx, 102, 5, &[0]);
        let short_cpu = fake.admit_child(&ctx, 103, 2, &[]);

        run_scheduler(&ctx, &fake).await;

        // The short CPU process exits in its first slice; the pure CPU hog
        // marches down the tiers; the I/O-bound process keeps bouncing back
        // to the top and finishes last.
        assert_eq!(fake.reaped(), [short_cpu, pure_cpu, io_bound]);
        assert_eq!(fake.consumed_per_slice(pure_cpu), [2, 4, 8]);
        let output = mock_output_to_string(&buffer);
        assert_eq!(output.matches("finished").count(), 3);
        assert!(output.contains("No remaining processes"));

        let state = ctx.safe_state.lock().unwrap();
        assert_eq!(state.live, 0);
        assert!(state.accounting_is_consistent());
    }
}
