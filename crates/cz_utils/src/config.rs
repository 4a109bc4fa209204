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

//! Tunable knobs, each backed by an environment variable with a documented
//! default. Read once at process start and cached behind `lazy_static`, the
//! same pattern the rest of the engine uses for global state.

use std::env;
use std::str::FromStr;

fn from_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

lazy_static! {
    /// PUCT exploration base (`c_base` in §4.2).
    pub static ref PB_C_BASE: f64 = from_env("CZ_PB_C_BASE", 19652.0);

    /// PUCT exploration init (`c_init` in §4.2).
    pub static ref PB_C_INIT: f64 = from_env("CZ_PB_C_INIT", 1.25);

    /// Dirichlet noise shape parameter applied to root priors in self-play.
    pub static ref DIRICHLET_ALPHA: f64 = from_env("CZ_DIRICHLET_ALPHA", 0.3);

    /// Blend fraction between prior and Dirichlet noise at the root.
    pub static ref EXPLORATION_FRACTION: f64 = from_env("CZ_EXPLORATION_FRACTION", 0.25);

    /// Number of independent self-play workers advanced in lockstep.
    pub static ref BATCH_SIZE: usize = from_env("CZ_BATCH_SIZE", 256);

    /// Simulation count for a full (training-record-emitting) search.
    pub static ref S_FULL: usize = from_env("CZ_S_FULL", 800);

    /// Simulation count for a fast (non-recording) search.
    pub static ref S_FAST: usize = from_env("CZ_S_FAST", 100);

    /// Probability that an outer self-play iteration is a fast search.
    pub static ref P_FAST: f64 = from_env("CZ_P_FAST", 0.25);

    /// Replay window capacity.
    pub static ref WINDOW_SIZE: usize = from_env("CZ_WINDOW_SIZE", 1024);

    /// Training minibatch size.
    pub static ref MINIBATCH_SIZE: usize = from_env("CZ_MINIBATCH_SIZE", 256);

    /// Training steps between checkpoint saves.
    pub static ref SAVE_RATE: u64 = from_env("CZ_SAVE_RATE", 16);

    /// Saves between timestamped historical checkpoint copies.
    pub static ref CHECKPOINT_RATE: u64 = from_env("CZ_CHECKPOINT_RATE", 256);

    /// Maximum plies before a self-play game is forced to terminate.
    pub static ref MAX_PLIES: usize = from_env("CZ_MAX_PLIES", 512);

    /// SGD learning rate.
    pub static ref LEARNING_RATE: f64 = from_env("CZ_LEARNING_RATE", 0.01);

    /// SGD momentum.
    pub static ref MOMENTUM: f64 = from_env("CZ_MOMENTUM", 0.9);

    /// SGD weight decay.
    pub static ref WEIGHT_DECAY: f64 = from_env("CZ_WEIGHT_DECAY", 1e-4);

    /// Convolutional filter count (`F` in §4.1).
    pub static ref NUM_FILTERS: i64 = from_env("CZ_NUM_FILTERS", 128);

    /// Residual block count (`R` in §4.1).
    pub static ref NUM_BLOCKS: i64 = from_env("CZ_NUM_BLOCKS", 10);

    /// History plies stacked into the position image (`H` in §3).
    pub static ref HISTORY_LENGTH: usize = from_env("CZ_HISTORY_LENGTH", 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        assert_eq!(*PB_C_BASE, 19652.0);
        assert_eq!(*PB_C_INIT, 1.25);
        assert_eq!(*DIRICHLET_ALPHA, 0.3);
        assert_eq!(*EXPLORATION_FRACTION, 0.25);
        assert_eq!(*S_FULL, 800);
        assert_eq!(*S_FAST, 100);
        assert_eq!(*WINDOW_SIZE, 1024);
        assert_eq!(*MINIBATCH_SIZE, 256);
        assert_eq!(*SAVE_RATE, 16);
        assert_eq!(*CHECKPOINT_RATE, 256);
    }
}
