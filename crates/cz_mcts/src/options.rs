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

//! Search-options split, grounded on the teacher's
//! `libdg_mcts::options::{SearchOptions, StandardSearch,
//! StandardDeterministicSearch}`: one trait, two stock implementations
//! distinguishing self-play's noisy/stochastic move selection (§4.3) from
//! competitive search's deterministic one (§4.5). The teacher's
//! `PolicyChecker`/eye-detection machinery is Go-specific and has no
//! chess analogue, so it is dropped here.

pub trait SearchOptions {
    /// Root exploration noise and proportional-to-visits move sampling
    /// when `false` (self-play); no noise and always-most-visited move
    /// selection when `true` (competitive play).
    fn deterministic(&self) -> bool;

    fn c_base(&self) -> f64;
    fn c_init(&self) -> f64;
    fn dirichlet_alpha(&self) -> f64;
    fn exploration_fraction(&self) -> f64;
}

/// Self-play configuration: root noise blended in, moves sampled
/// proportional to visit count (§4.3's "Move selection").
#[derive(Clone)]
pub struct StandardSearch {
    c_base: f64,
    c_init: f64,
    dirichlet_alpha: f64,
    exploration_fraction: f64,
}

impl StandardSearch {
    pub fn new(c_base: f64, c_init: f64, dirichlet_alpha: f64, exploration_fraction: f64) -> Self {
        StandardSearch { c_base, c_init, dirichlet_alpha, exploration_fraction }
    }
}

impl Default for StandardSearch {
    fn default() -> Self {
        use cz_utils::config::{DIRICHLET_ALPHA, EXPLORATION_FRACTION, PB_C_BASE, PB_C_INIT};
        StandardSearch::new(*PB_C_BASE, *PB_C_INIT, *DIRICHLET_ALPHA, *EXPLORATION_FRACTION)
    }
}

impl SearchOptions for StandardSearch {
    fn deterministic(&self) -> bool {
        false
    }

    fn c_base(&self) -> f64 {
        self.c_base
    }

    fn c_init(&self) -> f64 {
        self.c_init
    }

    fn dirichlet_alpha(&self) -> f64 {
        self.dirichlet_alpha
    }

    fn exploration_fraction(&self) -> f64 {
        self.exploration_fraction
    }
}

/// Competitive-play configuration: no root noise, always the most-visited
/// move (§4.5).
#[derive(Clone)]
pub struct StandardDeterministicSearch {
    c_base: f64,
    c_init: f64,
}

impl StandardDeterministicSearch {
    pub fn new(c_base: f64, c_init: f64) -> Self {
        StandardDeterministicSearch { c_base, c_init }
    }
}

impl Default for StandardDeterministicSearch {
    fn default() -> Self {
        use cz_utils::config::{PB_C_BASE, PB_C_INIT};
        StandardDeterministicSearch::new(*PB_C_BASE, *PB_C_INIT)
    }
}

impl SearchOptions for StandardDeterministicSearch {
    fn deterministic(&self) -> bool {
        true
    }

    fn c_base(&self) -> f64 {
        self.c_base
    }

    fn c_init(&self) -> f64 {
        self.c_init
    }

    fn dirichlet_alpha(&self) -> f64 {
        0.0
    }

    fn exploration_fraction(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_search_is_not_deterministic() {
        assert!(!StandardSearch::default().deterministic());
    }

    #[test]
    fn standard_deterministic_search_has_no_exploration() {
        let opts = StandardDeterministicSearch::default();
        assert!(opts.deterministic());
        assert_eq!(opts.exploration_fraction(), 0.0);
    }
}
