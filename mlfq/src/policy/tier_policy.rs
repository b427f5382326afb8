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

//! Tier arithmetic for the multi-level feedback queue. Tier `0` is the highest
//! priority. Lower tiers get exponentially longer time slices, higher tiers get
//! more visits per rotation, so every tier ends up with the same nominal time
//! budget per full sweep.

use std::time::Duration;

/// Priority tier index in `[0, tier_count)`. `TierId(0)` is the highest
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TierId(pub usize);

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The knobs that shape the scheduler: how many tiers exist, how long the
/// highest-priority slice is, how long a simulated I/O block takes, and how
/// long one simulated "time unit" lasts on the wall clock.
///
/// The derived quantities are:
/// - `quantum_units(i) = base_quantum · 2^i`
/// - `runs_for(i) = 2^(tier_count - 1 - i)`
///
/// which keep `quantum_units(i) · runs_for(i)` constant across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    pub tier_count: usize,
    /// Quantum of tier 0, in time units.
    pub base_quantum: u64,
    /// Simulated I/O block duration, in time units.
    pub io_block_time: u64,
    /// Wall-clock length of one time unit.
    pub time_unit: Duration,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            tier_count: 3,
            base_quantum: 2,
            io_block_time: 3,
            time_unit: Duration::from_secs(1),
        }
    }
}

impl TierPolicy {
    /// The tier every process is admitted into.
    #[must_use]
    pub fn top(&self) -> TierId { TierId(0) }

    #[must_use]
    pub fn lowest(&self) -> TierId { TierId(self.tier_count - 1) }

    /// Length of one slice at `tier`, in time units.
    #[must_use]
    pub fn quantum_units(&self, tier: TierId) -> u64 {
        self.base_quantum << tier.0
    }

    /// Length of one slice at `tier`, on the wall clock.
    #[must_use]
    pub fn quantum(&self, tier: TierId) -> Duration {
        self.time_unit * u32::try_from(self.quantum_units(tier)).unwrap_or(u32::MAX)
    }

    /// How many consecutive outer-loop visits `tier` receives before the
    /// scheduler rotates to the next tier. An empty tier burns its visits just
    /// like a busy one.
    #[must_use]
    pub fn runs_for(&self, tier: TierId) -> u64 {
        1 << (self.tier_count - 1 - tier.0)
    }

    /// Where a process that voluntarily gave up the CPU for I/O is re-admitted.
    /// Saturates at the top tier.
    #[must_use]
    pub fn higher(&self, tier: TierId) -> TierId {
        TierId(tier.0.saturating_sub(1))
    }

    /// Where a process that exhausted its quantum is demoted to. Saturates at
    /// the lowest tier.
    #[must_use]
    pub fn lower(&self, tier: TierId) -> TierId {
        TierId((tier.0 + 1).min(self.tier_count - 1))
    }

    #[must_use]
    pub fn io_block_duration(&self) -> Duration {
        self.time_unit * u32::try_from(self.io_block_time).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(0, 2 ; "tier 0 gets the base quantum")]
    #[test_case(1, 4 ; "tier 1 doubles it")]
    #[test_case(2, 8 ; "tier 2 doubles it again")]
    fn quantum_grows_exponentially(tier: usize, expected: u64) {
        let policy = TierPolicy::default();
        assert_eq!(policy.quantum_units(TierId(tier)), expected);
    }

    #[test_case(0, 4 ; "tier 0 gets the most visits")]
    #[test_case(1, 2 ; "tier 1 gets half")]
    #[test_case(2, 1 ; "lowest tier gets one visit")]
    fn runs_shrink_exponentially(tier: usize, expected: u64) {
        let policy = TierPolicy::default();
        assert_eq!(policy.runs_for(TierId(tier)), expected);
    }

    #[test]
    fn every_tier_gets_the_same_nominal_budget_per_rotation() {
        let policy = TierPolicy {
            tier_count: 5,
            ..Default::default()
        };
        let expected =
            policy.base_quantum * (1 << (policy.tier_count - 1));
        for tier in 0..policy.tier_count {
            let tier = TierId(tier);
            assert_eq!(
                policy.quantum_units(tier) * policy.runs_for(tier),
                expected
            );
        }
    }

    #[test]
    fn higher_saturates_at_the_top() {
        let policy = TierPolicy::default();
        assert_eq!(policy.higher(TierId(0)), TierId(0));
        assert_eq!(policy.higher(TierId(2)), TierId(1));
    }

    #[test]
    fn lower_saturates_at_the_bottom() {
        let policy = TierPolicy::default();
        assert_eq!(policy.lower(TierId(0)), TierId(1));
        assert_eq!(policy.lower(TierId(2)), TierId(2));
    }

    #[test]
    fn single_tier_policy_maps_everything_to_tier_zero() {
        let policy = TierPolicy {
            tier_count: 1,
            ..Default::default()
        };
        assert_eq!(policy.higher(TierId(0)), TierId(0));
        assert_eq!(policy.lower(TierId(0)), TierId(0));
        assert_eq!(policy.runs_for(TierId(0)), 1);
    }

    #[test]
    fn wall_clock_quantum_scales_with_the_time_unit() {
        let policy = TierPolicy {
            time_unit: Duration::from_millis(10),
            ..Default::default()
        };
        assert_eq!(policy.quantum(TierId(1)), Duration::from_millis(40));
        assert_eq!(policy.io_block_duration(), Duration::from_millis(30));
    }
}
