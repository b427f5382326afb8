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

//! Tracing initialization. The scheduler's observable report always goes to
//! stdout through the report sink; this file only wires up the debug-level
//! internals, written to a `log.txt` file when logging is enabled, so the
//! scheduler's own output stream stays clean for the workload report.

use miette::IntoDiagnostic;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing system, writing to a file named `log.txt` in the
/// working directory. Returns the appender guard, which must stay alive for
/// as long as log lines should keep flushing.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn try_initialize_tracing(enable_logging: bool) -> miette::Result<Option<WorkerGuard>> {
    if !enable_logging {
        return Ok(None);
    }

    let file_appender = tracing_appender::rolling::never(".", "log.txt");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()
        .into_diagnostic()?;

    Ok(Some(guard))
}
