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

//! Reads the workload description and fills the top-priority ready queue.
//!
//! Admission is the only phase that creates processes. Each accepted line
//! becomes one suspended child in `Q[0]`, in input order. Parsing stops at EOF
//! or at the first line that does not begin with `e`; a line that begins with
//! `e` but does not parse is fatal.

use std::io::BufRead;

use nom::{Parser, combinator::all_consuming};
use thiserror::Error;

use super::{ExecRequest, parse_exec_line, spawn_suspended};
use crate::{process::ProcessId, scheduler::SchedulerContext};

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("could not read workload input: {0}")]
    Read(#[source] std::io::Error),

    #[error("bad workload line: {0:?}")]
    Malformed(String),

    #[error("could not spawn child program {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("stop handshake with child {pid} failed: {source}")]
    Handshake {
        pid: ProcessId,
        source: nix::errno::Errno,
    },

    #[error(
        "child {pid} ({program:?}) vanished during the admission stop handshake: {status}"
    )]
    VanishedDuringHandshake {
        program: String,
        pid: ProcessId,
        status: String,
    },
}

/// Read workload lines until EOF or the first line that does not begin with
/// `e`.
///
/// # Errors
///
/// - [`AdmissionError::Read`] when the input stream fails.
/// - [`AdmissionError::Malformed`] when a line starting with `e` is not a
///   valid `exec` line; admission aborts there, per the input contract.
pub fn read_workload(reader: impl BufRead) -> Result<Vec<ExecRequest>, AdmissionError> {
    let mut requests = vec![];
    for line in reader.lines() {
        let line = line.map_err(AdmissionError::Read)?;
        if !line.starts_with('e') {
            break;
        }
        let result = all_consuming(parse_exec_line)
            .parse(line.trim_end())
            .map(|(_, request)| request)
            .map_err(|_| ());
        match result {
            Ok(request) => requests.push(request),
            Err(()) => return Err(AdmissionError::Malformed(line)),
        }
    }
    Ok(requests)
}

/// Spawn every requested child suspended and enqueue it at the top tier.
/// A child that cannot be spawned is reported and skipped; it never reaches a
/// queue, so the live count stays truthful. Returns how many children were
/// admitted.
pub fn admit_workload(
    ctx: &SchedulerContext,
    requests: &[ExecRequest],
) -> usize {
    let mut admitted = 0;
    for request in requests {
        match spawn_suspended(request) {
            Ok(pid) => {
                {
                    let mut state = ctx.safe_state.lock().unwrap();
                    state.admit(pid);
                }
                ctx.report.line(crate::scheduler::ui_str::admitted_msg(
                    pid,
                    &request.program,
                ));
                admitted += 1;
            }
            Err(error) => {
                tracing::error!("skipping workload entry: {error}");
            }
        }
    }
    admitted
}
