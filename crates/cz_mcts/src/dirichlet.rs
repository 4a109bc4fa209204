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

//! Root exploration noise (§4.2): `n` independent `Gamma(alpha, 1)` draws,
//! normalized to sum to one, is the standard construction of a
//! `Dirichlet(alpha)` sample. Grounded on
//! `original_source/sigmazero/mcts/node.cpp`'s `add_exploration_noise`,
//! which draws the same per-child gammas but blends them into priors
//! without normalizing first -- a real Dirichlet sample needs the
//! normalization, so it is added here.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Draws one `Dirichlet(alpha)` sample of dimension `n`. Returns a
/// uniform vector if `n == 0` or the gamma draws all underflow to zero.
pub fn sample(alpha: f64, n: usize, rng: &mut impl Rng) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let gamma = Gamma::new(alpha, 1.0).expect("dirichlet alpha must be positive");
    let draws: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();
    let sum: f64 = draws.iter().sum();

    if sum < 1e-12 {
        vec![1.0 / n as f64; n]
    } else {
        draws.into_iter().map(|d| d / sum).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sample_sums_to_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = sample(0.3, 20, &mut rng);

        let sum: f64 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(noise.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn empty_dimension_yields_empty_sample() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample(0.3, 0, &mut rng).is_empty());
    }
}
