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

use strum_macros::Display;

/// Identifier of an admitted child process. This is the OS pid, but the
/// scheduler core never interprets it; only the [`super::ProcessControl`]
/// implementation and the admission spawner talk to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub i32);

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<nix::unistd::Pid> for ProcessId {
    fn from(pid: nix::unistd::Pid) -> Self { Self(pid.as_raw()) }
}

impl ProcessId {
    #[must_use]
    pub fn as_nix_pid(&self) -> nix::unistd::Pid { nix::unistd::Pid::from_raw(self.0) }
}

/// What the scheduler believes about the process it just ran for a quantum.
/// Exactly one process holds the "current" slot while a quantum is being
/// served; the status starts at [`ProcessStatus::Running`] and is rewritten by
/// the post-quantum signal drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProcessStatus {
    /// No event consumed this quantum. The process exhausted its slice and
    /// will be demoted.
    Running,
    /// The process asked for the I/O detour and is now owned by a worker.
    IoRequested,
    /// The process announced completion and has been reaped.
    Terminated,
}

/// The "current" slot: the single process being served a quantum right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentProcess {
    pub id: ProcessId,
    pub status: ProcessStatus,
}

impl CurrentProcess {
    #[must_use]
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            status: ProcessStatus::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn current_process_starts_in_running_state() {
        let current = CurrentProcess::new(ProcessId(42));
        assert_eq!(current.status, ProcessStatus::Running);
        assert_eq!(current.id.to_string(), "42");
    }
}
