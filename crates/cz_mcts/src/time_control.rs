// Copyright 2024 The chess-zero Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time management for competitive search (§4.5), grounded verbatim on the
//! teacher's `libdg_mcts::time_control::mod` implementation of the
//! `UNST-N`/`EARLY-C` scheme (Baier & Winands, "Time Management for
//! Monte-Carlo Tree Search in Go"): search is allowed to run past its
//! nominal budget (`EARLY-C`... read backwards, "continue") as long as the
//! second most-visited root child could still overtake the leader in the
//! time remaining, and is otherwise free to stop as soon as a budget is
//! exhausted (`UNST-N`, "unstable no more").
//!
//! The budgeted-time formula itself --
//! `remaining_halfmoves = 59.3 + (72830 - 2330*ply) / (2644 + ply*(10+ply))`
//! -- is carried over from `original_source/sigmazero/sigmazero.cpp`,
//! which cites the same chess.stackexchange estimate of average game
//! length the teacher's Go-specific formula has no counterpart for.

use crate::node::Tree;
use std::time::{Duration, Instant};

pub enum TimeStrategyResult {
    NotExpired(u32),
    NotExtended,
    Expired,
    Extended,
}

pub trait TimeStrategy {
    /// Checks whether this time/rollout budget has expired, and if so,
    /// how many further rollouts (if any) could still overtake the
    /// current leader.
    fn try_extend(&self, tree: &Tree, root: usize) -> TimeStrategyResult;
}

/// Fixed simulation-count budget, the strategy self-play uses (§4.3's
/// `S_FAST`/`S_FULL`): never extends past the limit, since self-play has
/// no wall-clock deadline to race against.
pub struct RolloutLimit {
    limit: u32,
}

impl RolloutLimit {
    pub fn new(limit: u32) -> Self {
        RolloutLimit { limit }
    }
}

impl TimeStrategy for RolloutLimit {
    fn try_extend(&self, tree: &Tree, root: usize) -> TimeStrategyResult {
        let visits = tree.node(root).visits;
        if visits >= self.limit {
            TimeStrategyResult::Expired
        } else {
            TimeStrategyResult::NotExpired(self.limit - visits)
        }
    }
}

/// Wall-clock budget for competitive search: a hard deadline (the UCI
/// `movetime`/clock-derived budget) plus a rollout-rate estimate used to
/// convert the time remaining into an equivalent rollout count for
/// `min_promote_rollouts` to compare against.
pub struct CompetitiveTimeStrategy {
    start: Instant,
    budget: Duration,
    rollouts_per_second: f64,
}

impl CompetitiveTimeStrategy {
    pub fn new(start: Instant, budget: Duration, rollouts_per_second: f64) -> Self {
        CompetitiveTimeStrategy { start, budget, rollouts_per_second }
    }
}

impl TimeStrategy for CompetitiveTimeStrategy {
    fn try_extend(&self, _tree: &Tree, _root: usize) -> TimeStrategyResult {
        let elapsed = self.start.elapsed();
        if elapsed >= self.budget {
            TimeStrategyResult::Expired
        } else {
            let remaining_seconds = (self.budget - elapsed).as_secs_f64();
            let remaining_rollouts = (remaining_seconds * self.rollouts_per_second).round().max(0.0);
            TimeStrategyResult::NotExpired(remaining_rollouts as u32)
        }
    }
}

/// The minimum number of further rollouts required for the second most-
/// visited root child to overtake the most-visited one.
fn min_promote_rollouts(tree: &Tree, root: usize) -> u32 {
    let children = &tree.node(root).children;
    if children.len() < 2 {
        return 0;
    }

    let mut visits: Vec<u32> = children.iter().map(|&c| tree.node(c).visits).collect();
    visits.sort_unstable_by(|a, b| b.cmp(a));

    visits[0].saturating_sub(visits[1])
}

/// `original_source`'s `remaining_halfmoves` heuristic, converted into a
/// per-move time budget given the clock remaining for the side to move.
pub fn budgeted_time(ply: u32, clock_seconds: f64) -> Duration {
    let ply = ply as f64;
    let remaining_halfmoves = 59.3 + (72830.0 - 2330.0 * ply) / (2644.0 + ply * (10.0 + ply));
    let remaining_halfmoves = remaining_halfmoves.max(1.0);
    Duration::from_secs_f64((clock_seconds / remaining_halfmoves).max(0.0))
}

/// Whether the search rooted at `root` should stop, per the `UNST-N`/
/// `EARLY-C` scheme: a budget that has not yet expired never stops the
/// search early; one that has expired only keeps running if the runner-up
/// could still catch the leader in what time remains.
pub fn is_done(tree: &Tree, root: usize, strategy: &dyn TimeStrategy) -> bool {
    if tree.node(root).visits == 0 {
        return false;
    }

    match strategy.try_extend(tree, root) {
        TimeStrategyResult::NotExpired(remaining) => min_promote_rollouts(tree, root) > remaining,
        TimeStrategyResult::Extended => false,
        TimeStrategyResult::NotExtended | TimeStrategyResult::Expired => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ROOT;
    use chess::Color;

    #[test]
    fn rollout_limit_expires_once_reached() {
        let mut tree = Tree::new();
        tree.expand(ROOT, Color::White, &[(0, 1.0, false)]);
        let strategy = RolloutLimit::new(2);

        tree.backup(&[ROOT], 0.0);
        assert!(!is_done(&tree, ROOT, &strategy));

        tree.backup(&[ROOT], 0.0);
        assert!(is_done(&tree, ROOT, &strategy));
    }

    #[test]
    fn is_done_is_false_before_any_visits() {
        let tree = Tree::new();
        let strategy = RolloutLimit::new(10);
        assert!(!is_done(&tree, ROOT, &strategy));
    }

    #[test]
    fn budgeted_time_shrinks_as_the_game_progresses() {
        let early = budgeted_time(0, 600.0);
        let late = budgeted_time(80, 600.0);
        assert!(late < early);
    }

    #[test]
    fn min_promote_rollouts_is_zero_when_tied() {
        let mut tree = Tree::new();
        tree.expand(ROOT, Color::White, &[(0, 0.5, false), (1, 0.5, false)]);
        let children = tree.node(ROOT).children.clone();
        tree.backup(&[ROOT, children[0]], 0.0);
        tree.backup(&[ROOT, children[1]], 0.0);

        assert_eq!(min_promote_rollouts(&tree, ROOT), 0);
    }
}
