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

//! Starts a workload child in the suspended state.
//!
//! The child must not consume CPU before its first quantum. Instead of
//! sleeping and hoping the stop lands early enough, the spawner sends SIGSTOP
//! and then blocks in `waitpid(WUNTRACED)` until the kernel confirms the child
//! is stopped. Only then is the pid safe to hand to the ready queues.

use std::process::Command;

use nix::sys::{signal::{Signal, kill},
               wait::{WaitPidFlag, WaitStatus, waitpid}};

use super::{ExecRequest, workload::AdmissionError};
use crate::process::ProcessId;

/// Spawn `request.program` with its integer argv and park it under SIGSTOP.
///
/// # Errors
///
/// - [`AdmissionError::Spawn`] when the OS cannot fork/exec the program.
/// - [`AdmissionError::Handshake`] when the stop signal or the stop
///   confirmation fails.
/// - [`AdmissionError::VanishedDuringHandshake`] when the child exits before
///   it could be stopped (it is reaped here, so no phantom pid can reach a
///   queue).
pub fn spawn_suspended(request: &ExecRequest) -> Result<ProcessId, AdmissionError> {
    let mut command = Command::new(&request.program);
    for arg in &request.args {
        command.arg(arg.to_string());
    }

    let child = command.spawn().map_err(|source| AdmissionError::Spawn {
        program: request.program.clone(),
        source,
    })?;
    let pid = ProcessId(i32::try_from(child.id()).map_err(|_| {
        AdmissionError::Spawn {
            program: request.program.clone(),
            source: std::io::Error::other("pid exceeds i32 range"),
        }
    })?);

    kill(pid.as_nix_pid(), Signal::SIGSTOP)
        .map_err(|source| AdmissionError::Handshake { pid, source })?;

    match waitpid(pid.as_nix_pid(), Some(WaitPidFlag::WUNTRACED)) {
        Ok(WaitStatus::Stopped(_, _)) => {
            tracing::debug!("child {pid} confirmed stopped, ready for admission");
            Ok(pid)
        }
        Ok(status) => Err(AdmissionError::VanishedDuringHandshake {
            program: request.program.clone(),
            pid,
            status: format!("{status:?}"),
        }),
        Err(source) => Err(AdmissionError::Handshake { pid, source }),
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn spawn_of_missing_program_reports_spawn_error() {
        let request = ExecRequest {
            program: "./definitely-not-a-real-program".into(),
            args: smallvec![1],
        };
        let result = spawn_suspended(&request);
        assert!(matches!(result, Err(AdmissionError::Spawn { .. })));
    }

    #[test]
    fn spawned_child_is_left_in_the_stopped_state() {
        // `sleep` is ubiquitous on POSIX hosts and accepts an integer arg, so
        // it doubles as a workload program here.
        let request = ExecRequest {
            program: "/bin/sleep".into(),
            args: smallvec![30],
        };
        let pid = spawn_suspended(&request).unwrap();

        // A stopped process accepts signals without running; SIGKILL + reap
        // cleans it up and proves the pid was live.
        kill(pid.as_nix_pid(), Signal::SIGKILL).unwrap();
        let status = waitpid(pid.as_nix_pid(), None).unwrap();
        assert!(matches!(status, WaitStatus::Signaled(_, Signal::SIGKILL, _)));
    }
}
