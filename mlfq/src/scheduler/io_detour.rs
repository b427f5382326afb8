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

//! The I/O detour: a process that voluntarily released the CPU is held
//! outside every ready queue for a fixed simulated duration, then re-admitted
//! at a higher-priority tier as a reward for cooperating.
//!
//! One worker task per blocked process. Workers share only the context; they
//! reinsert under the mutex so the pid becomes visible to the main loop
//! atomically, and never before the full block duration has elapsed.

use tokio::task::JoinSet;

use crate::{policy::TierId, process::ProcessId};

use super::{SchedulerContext, ui_str};

/// Spawn the detour worker for `id`. The caller has already removed the pid
/// from the ready queues, set its status to `IoRequested`, and incremented
/// `io_count`; from here until reinsertion the worker owns the pid.
pub fn spawn_io_worker(
    workers: &mut JoinSet<()>,
    ctx: SchedulerContext,
    id: ProcessId,
    target: TierId,
) {
    workers.spawn(async move {
        ctx.report.line(ui_str::io_blocked_msg(id));
        tokio::time::sleep(ctx.policy.io_block_duration()).await;

        let mut state = ctx.safe_state.lock().unwrap();
        state.io_count -= 1;
        if state.tombstones.remove(&id) {
            // The process exited while it was blocked; its pid is gone and
            // must not re-enter a queue.
            tracing::debug!("process {id} terminated while blocked, dropping reinsertion");
        } else {
            state.queues.push_back(target, id);
            ctx.report.line(ui_str::io_unblocked_msg(id, target));
        }
    });
}
