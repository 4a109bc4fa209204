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

//! A process-wide PRNG, for the handful of call sites that need shared
//! randomness (the self-play fast/full coin flip) rather than a
//! per-thread `rand::thread_rng()`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;

lazy_static! {
    static ref GLOBAL_RNG: Mutex<StdRng> = Mutex::new(StdRng::from_entropy());
}

/// Runs `f` with exclusive access to the process-wide RNG.
pub fn with_global_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut rng = GLOBAL_RNG.lock().unwrap();
    f(&mut rng)
}

/// Reseeds the process-wide RNG. Intended for reproducible test runs.
pub fn seed_global_rng(seed: u64) {
    let mut rng = GLOBAL_RNG.lock().unwrap();
    *rng = StdRng::seed_from_u64(seed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeding_is_reproducible() {
        seed_global_rng(42);
        let a: u32 = with_global_rng(|rng| rng.gen());

        seed_global_rng(42);
        let b: u32 = with_global_rng(|rng| rng.gen());

        assert_eq!(a, b);
    }
}
