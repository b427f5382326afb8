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

//! The seam between the scheduler core and OS job control. The core only ever
//! needs three capabilities on a child it owns: continue it, stop it, and tear
//! it down. Production uses POSIX signals via [`PosixProcessControl`]; the
//! scheduler tests substitute a fake that models child CPU consumption under a
//! paused Tokio clock.

use nix::sys::{signal::{Signal, kill},
               wait::{WaitPidFlag, waitpid}};

use super::ProcessId;

/// Process control primitives used by the scheduler loop. All three are fire
/// and forget from the core's point of view: a failure at this level means the
/// child already vanished, which the signal drain will observe on its own, so
/// implementations report the error and move on instead of propagating it into
/// the scheduling decision.
pub trait ProcessControl: Send + Sync {
    /// Let the child run. Called right before the scheduler sleeps for the
    /// quantum.
    fn resume(&self, id: ProcessId);

    /// Freeze the child. Called right after the quantum sleep, before the
    /// signal drain.
    fn suspend(&self, id: ProcessId);

    /// Terminate the child and release the OS bookkeeping for it.
    fn reap(&self, id: ProcessId);
}

/// Production [`ProcessControl`]: SIGCONT / SIGSTOP / SIGKILL + `waitpid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixProcessControl;

impl ProcessControl for PosixProcessControl {
    fn resume(&self, id: ProcessId) {
        if let Err(errno) = kill(id.as_nix_pid(), Signal::SIGCONT) {
            tracing::warn!("could not resume process {id}: {errno}");
        }
    }

    fn suspend(&self, id: ProcessId) {
        if let Err(errno) = kill(id.as_nix_pid(), Signal::SIGSTOP) {
            tracing::warn!("could not suspend process {id}: {errno}");
        }
    }

    fn reap(&self, id: ProcessId) {
        if let Err(errno) = kill(id.as_nix_pid(), Signal::SIGKILL) {
            tracing::warn!("could not kill process {id}: {errno}");
        }
        // Collect the zombie so the OS releases the pid. The child was just
        // SIGKILLed so this returns promptly.
        match waitpid(id.as_nix_pid(), Some(WaitPidFlag::empty())) {
            Ok(status) => tracing::debug!("reaped process {id}: {status:?}"),
            Err(errno) => tracing::warn!("could not reap process {id}: {errno}"),
        }
    }
}
