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

//! # r3bl-mlfq
//!
//! A user-space multi-level feedback queue (MLFQ) process scheduler. It spawns
//! the child programs described on stdin, keeps them suspended, and time-slices
//! them with SIGCONT / SIGSTOP across priority tiers:
//!
//! - A process that exhausts its quantum is demoted one tier; lower tiers get
//!   exponentially longer quanta but exponentially fewer visits per rotation.
//! - A process that raises SIGUSR1 takes the simulated I/O detour: it leaves
//!   the ready queues, "blocks" in a concurrent worker for a fixed duration,
//!   and comes back one tier higher as a reward for yielding.
//! - A process that raises SIGUSR2 is finalized and reaped.
//!
//! Children signal asynchronously; the handlers drop one byte into a bounded
//! lock-free ring (the signal inbox) and the scheduler drains it at the safe
//! point after each quantum. All shared state lives in one
//! [`scheduler::SchedulerContext`] behind a single mutex.

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

pub mod admission;
pub mod inbox;
pub mod log;
pub mod policy;
pub mod process;
pub mod queues;
pub mod scheduler;

pub use admission::*;
pub use inbox::*;
pub use log::*;
pub use policy::*;
pub use process::*;
pub use queues::*;
pub use scheduler::*;
