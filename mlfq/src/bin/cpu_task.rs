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

//! Sample CPU-bound workload child. Burns the requested amount of CPU time,
//! then announces completion to the scheduler (its parent) with SIGUSR2 and
//! waits to be reaped.
//!
//! Progress is measured on `CLOCK_PROCESS_CPUTIME_ID`, so being SIGSTOPped
//! between quanta does not distort the lifetime: the process needs exactly
//! `units` time units of actual CPU, however they are sliced.

use std::time::Duration;

use clap::Parser;
use nix::{sys::signal::{Signal, kill},
          time::{ClockId, clock_gettime},
          unistd::getppid};

#[derive(Debug, Parser)]
#[command(bin_name = "cpu-task")]
#[command(about = "CPU-bound workload child for the mlfq scheduler")]
struct CLIArg {
    /// How many time units of CPU to burn before announcing completion.
    units: u64,

    /// Wall-clock milliseconds per time unit; match the scheduler's
    /// `--time-unit-ms`.
    #[arg(default_value_t = 1000)]
    unit_ms: u64,
}

fn main() {
    let cli_arg = CLIArg::parse();
    let lifetime = Duration::from_millis(cli_arg.units * cli_arg.unit_ms);

    burn_cpu(lifetime);

    _ = kill(getppid(), Signal::SIGUSR2);

    // The scheduler reaps us with SIGKILL once it drains the exit signal.
    loop {
        unsafe { libc::pause() };
    }
}

fn consumed_cpu() -> Duration {
    clock_gettime(ClockId::CLOCK_PROCESS_CPUTIME_ID)
        .map(|ts| {
            Duration::new(
                u64::try_from(ts.tv_sec()).unwrap_or_default(),
                u32::try_from(ts.tv_nsec()).unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

fn burn_cpu(target: Duration) {
    let mut spin = 0_u64;
    while consumed_cpu() < target {
        for _ in 0..10_000 {
            spin = std::hint::black_box(spin.wrapping_mul(6364136223846793005).wrapping_add(1));
        }
    }
}
