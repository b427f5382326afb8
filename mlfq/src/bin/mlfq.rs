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

//! The scheduler binary. Reads workload lines of the form
//! `exec <program> (<int>[, <int>]*)` from stdin, admits every child
//! suspended into the top-priority queue, and serves them until the last one
//! announces completion. Example:
//!
//! ```text
//! printf 'exec target/debug/cpu-task (8, 100)\n' | mlfq --time-unit-ms 100
//! ```

use std::time::Duration;

use clap::Parser;
use miette::IntoDiagnostic;
use r3bl_mlfq::{PosixProcessControl, ReportSink, SchedulerContext, TierPolicy,
                admit_workload, install_signal_handlers, read_workload,
                run_scheduler, try_initialize_tracing};

use crate::clap_config::CLIArg;

#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> miette::Result<()> { main_impl() }

#[tokio::main]
async fn main_impl() -> miette::Result<()> {
    let cli_arg = CLIArg::parse();

    let _guard = try_initialize_tracing(cli_arg.global_options.enable_logging)?;

    let policy = TierPolicy {
        tier_count: usize::from(cli_arg.tiers),
        base_quantum: cli_arg.base_quantum,
        io_block_time: cli_arg.io_block_time,
        time_unit: Duration::from_millis(cli_arg.time_unit_ms),
    };
    let ctx = SchedulerContext::new(policy, ReportSink::new_stdout());

    // Handlers go in before any child exists, so no event can ever be lost to
    // a default signal disposition.
    install_signal_handlers(&ctx.inbox).into_diagnostic()?;

    let requests = read_workload(std::io::stdin().lock()).into_diagnostic()?;
    let admitted = admit_workload(&ctx, &requests);
    tracing::debug!("{admitted} of {} workload entries admitted", requests.len());

    run_scheduler(&ctx, &PosixProcessControl).await;

    Ok(())
}

/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
mod clap_config {
    use clap::{Args, Parser};

    #[derive(Debug, Parser)]
    #[command(bin_name = "mlfq")]
    #[command(
        about = "Multi-level feedback queue scheduler: time-slices child programs across priority tiers"
    )]
    #[command(version)]
    #[command(next_line_help = true)]
    /// More info: <https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template>
    #[command(
        help_template = "{about}\nVersion: {bin} {version}\n\nUSAGE:\n  mlfq [Options] < workload\n\n{all-args}\n"
    )]
    pub struct CLIArg {
        #[arg(
            long,
            default_value_t = 3,
            value_parser = clap::value_parser!(u8).range(1..=16),
            help = "Number of priority tiers"
        )]
        pub tiers: u8,

        #[arg(
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Quantum of the top tier, in time units; each lower tier doubles it"
        )]
        pub base_quantum: u64,

        #[arg(
            long,
            default_value_t = 3,
            help = "Simulated I/O block duration, in time units"
        )]
        pub io_block_time: u64,

        #[arg(
            long,
            default_value_t = 1000,
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Wall-clock milliseconds per time unit"
        )]
        pub time_unit_ms: u64,

        #[command(flatten)]
        pub global_options: GlobalOption,
    }

    #[derive(Debug, Args)]
    pub struct GlobalOption {
        #[arg(
            global = true,
            long,
            short = 'l',
            help = "Log app output to a file named `log.txt` for debugging."
        )]
        pub enable_logging: bool,
    }
}
