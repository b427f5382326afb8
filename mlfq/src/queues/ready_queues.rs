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

//! One FIFO of ready pids per priority tier, plus the auxiliary staging FIFO.
//!
//! The auxiliary queue exists for one reason: a process demoted at the lowest
//! tier would otherwise be re-appended to the very queue the inner loop is
//! draining, and would run twice in a single visit. Demotions-in-place go to
//! `aux` instead, and `aux` is folded back into the active tier only after the
//! visit ends.

use std::collections::VecDeque;

use crate::{policy::TierId, process::ProcessId};

#[derive(Debug, Clone)]
pub struct ReadyQueues {
    tiers: Vec<VecDeque<ProcessId>>,
    aux: VecDeque<ProcessId>,
}

impl ReadyQueues {
    #[must_use]
    pub fn new(tier_count: usize) -> Self {
        Self {
            tiers: vec![VecDeque::new(); tier_count],
            aux: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, tier: TierId, id: ProcessId) {
        self.tiers[tier.0].push_back(id);
    }

    pub fn pop_front(&mut self, tier: TierId) -> Option<ProcessId> {
        self.tiers[tier.0].pop_front()
    }

    #[must_use]
    pub fn is_empty(&self, tier: TierId) -> bool { self.tiers[tier.0].is_empty() }

    /// True when every tier FIFO is empty. The aux queue is not considered: it
    /// is empty between visits by construction.
    #[must_use]
    pub fn all_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }

    /// Ready pids across all tiers plus the aux queue.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum::<usize>() + self.aux.len()
    }

    pub fn push_aux(&mut self, id: ProcessId) { self.aux.push_back(id); }

    #[must_use]
    pub fn aux_is_empty(&self) -> bool { self.aux.is_empty() }

    /// Move every staged pid to the back of `tier`, preserving order. This is
    /// the `transfer_all(aux → Q)` step that runs after each inner visit.
    pub fn transfer_aux_into(&mut self, tier: TierId) {
        let staged = std::mem::take(&mut self.aux);
        self.tiers[tier.0].extend(staged);
    }

    /// Debug rendering of every tier's contents, oldest first.
    #[must_use]
    pub fn dump(&self) -> String {
        use std::fmt::Write as _;
        let mut acc = String::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            let _ = write!(acc, "Q[{index}]:");
            if tier.is_empty() {
                let _ = write!(acc, " empty");
            } else {
                for id in tier {
                    let _ = write!(acc, " {id}");
                }
            }
            if index + 1 < self.tiers.len() {
                let _ = write!(acc, " | ");
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pid(raw: i32) -> ProcessId { ProcessId(raw) }

    #[test]
    fn fifo_order_is_preserved_within_a_tier() {
        let mut queues = ReadyQueues::new(3);
        queues.push_back(TierId(0), pid(10));
        queues.push_back(TierId(0), pid(20));
        queues.push_back(TierId(0), pid(30));

        assert_eq!(queues.pop_front(TierId(0)), Some(pid(10)));
        assert_eq!(queues.pop_front(TierId(0)), Some(pid(20)));
        assert_eq!(queues.pop_front(TierId(0)), Some(pid(30)));
        assert_eq!(queues.pop_front(TierId(0)), None);
    }

    #[test]
    fn tiers_are_independent() {
        let mut queues = ReadyQueues::new(2);
        queues.push_back(TierId(0), pid(1));
        queues.push_back(TierId(1), pid(2));

        assert!(!queues.is_empty(TierId(0)));
        assert_eq!(queues.pop_front(TierId(1)), Some(pid(2)));
        assert!(queues.is_empty(TierId(1)));
        assert!(!queues.all_empty());
    }

    #[test]
    fn transfer_appends_staged_pids_in_order() {
        let mut queues = ReadyQueues::new(1);
        queues.push_back(TierId(0), pid(1));
        queues.push_aux(pid(2));
        queues.push_aux(pid(3));

        queues.transfer_aux_into(TierId(0));

        assert!(queues.aux_is_empty());
        assert_eq!(queues.pop_front(TierId(0)), Some(pid(1)));
        assert_eq!(queues.pop_front(TierId(0)), Some(pid(2)));
        assert_eq!(queues.pop_front(TierId(0)), Some(pid(3)));
    }

    #[test]
    fn total_len_counts_aux() {
        let mut queues = ReadyQueues::new(2);
        queues.push_back(TierId(1), pid(1));
        queues.push_aux(pid(2));
        assert_eq!(queues.total_len(), 2);
        assert!(!queues.all_empty());
    }

    #[test]
    fn dump_renders_every_tier() {
        let mut queues = ReadyQueues::new(2);
        queues.push_back(TierId(0), pid(7));
        assert_eq!(queues.dump(), "Q[0]: 7 | Q[1]: empty");
    }
}
