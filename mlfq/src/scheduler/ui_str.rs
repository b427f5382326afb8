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

//! The observable report lines, one function per event so tests and the run
//! loop agree on the exact wording.

use crate::{policy::TierId, process::ProcessId};

use super::RemainingCounts;

#[must_use]
pub fn admitted_msg(id: ProcessId, program: &str) -> String {
    format!("Process {id} ({program}) admitted to queue 0")
}

#[must_use]
pub fn serving_msg(id: ProcessId, tier: TierId, quantum_units: u64) -> String {
    format!("Serving process {id} from queue {tier} for {quantum_units} time units")
}

#[must_use]
pub fn quantum_expired_msg(id: ProcessId, quantum_units: u64) -> String {
    format!("Process {id} exceeded its quantum of {quantum_units} time units")
}

#[must_use]
pub fn stays_msg(id: ProcessId, tier: TierId) -> String {
    format!("Process {id} will remain in queue {tier}")
}

#[must_use]
pub fn migrates_msg(id: ProcessId, from: TierId, to: TierId) -> String {
    format!("Process {id} will migrate from queue {from} to queue {to}")
}

#[must_use]
pub fn io_blocked_msg(id: ProcessId) -> String {
    format!("Process {id} is blocked by IO")
}

#[must_use]
pub fn io_unblocked_msg(id: ProcessId, tier: TierId) -> String {
    format!("Process {id} is no longer blocked by IO, back in queue {tier}")
}

#[must_use]
pub fn finished_msg(id: ProcessId) -> String {
    format!("Process {id} finished")
}

#[must_use]
pub fn remaining_msg(counts: &RemainingCounts) -> String {
    if counts.live == 0 {
        "No remaining processes".to_string()
    } else {
        format!(
            "There are {} remaining processes\n* {} in queue\n* {} blocked by IO",
            counts.live, counts.ready, counts.blocked
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn remaining_report_distinguishes_empty_from_busy() {
        let none = RemainingCounts {
            live: 0,
            ready: 0,
            blocked: 0,
        };
        assert_eq!(remaining_msg(&none), "No remaining processes");

        let busy = RemainingCounts {
            live: 3,
            ready: 2,
            blocked: 1,
        };
        assert_eq!(
            remaining_msg(&busy),
            "There are 3 remaining processes\n* 2 in queue\n* 1 blocked by IO"
        );
    }
}
