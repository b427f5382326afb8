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

//! Sample I/O-bound workload child. Burns CPU like [`cpu-task`], but every
//! `io_every` consumed time units it raises SIGUSR1 at the scheduler to ask
//! for the I/O detour; the scheduler then parks it in a worker and re-admits
//! it at a higher-priority tier. Ends with SIGUSR2 like every child.
//!
//! [`cpu-task`]: ../cpu_task/index.html

use std::time::Duration;

use clap::Parser;
use nix::{sys::signal::{Signal, kill},
          time::{ClockId, clock_gettime},
          unistd::getppid};

#[derive(Debug, Parser)]
#[command(bin_name = "io-task")]
#[command(about = "I/O-bound workload child for the mlfq scheduler")]
struct CLIArg {
    /// How many time units of CPU to burn before announcing completion.
    units: u64,

    /// Raise an I/O request every this many consumed time units.
    #[arg(default_value_t = 2)]
    io_every: u64,

    /// Wall-clock milliseconds per time unit; match the scheduler's
    /// `--time-unit-ms`.
    #[arg(default_value_t = 1000)]
    unit_ms: u64,
}

fn main() {
    let cli_arg = CLIArg::parse();
    let unit = Duration::from_millis(cli_arg.unit_ms);
    let lifetime = unit * u32::try_from(cli_arg.units).unwrap_or(u32::MAX);
    let io_every = unit * u32::try_from(cli_arg.io_every.max(1)).unwrap_or(u32::MAX);

    let mut next_io_at = io_every;
    while consumed_cpu() < lifetime {
        burn_cpu(next_io_at.min(lifetime));
        if consumed_cpu() >= lifetime {
            break;
        }
        // Voluntarily give up the CPU; the scheduler will stop us at the end
        // of this quantum and park us in the detour.
        _ = kill(getppid(), Signal::SIGUSR1);
        next_io_at += io_every;
    }

    _ = kill(getppid(), Signal::SIGUSR2);

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

fn burn_cpu(until: Duration) {
    let mut spin = 0_u64;
    while consumed_cpu() < until {
        for _ in 0..10_000 {
            spin = std::hint::black_box(spin.wrapping_mul(6364136223846793005).wrapping_add(1));
        }
    }
}
