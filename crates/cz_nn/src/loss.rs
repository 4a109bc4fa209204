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

//! The combined value+policy loss and the SGD optimizer setup (§4.1),
//! matching the trainer's hyperparameters: momentum 0.9, weight decay
//! 1e-4, learning rate held constant at ~1e-2 per run.

use crate::net::Network;
use tch::nn::{self, OptimizerConfig};
use tch::Tensor;

/// `L = sum((z - v)^2) + CrossEntropy(rho, pi)`, summed (not averaged)
/// over the batch, where `rho` are raw policy logits.
pub fn combined_loss(value: &Tensor, policy_logits: &Tensor, target_value: &Tensor, target_policy: &Tensor) -> Tensor {
    let value_loss = (target_value - value).pow_tensor_scalar(2).sum(tch::Kind::Float);
    let log_probs = policy_logits.log_softmax(-1, tch::Kind::Float);
    let policy_loss = -(target_policy * log_probs).sum(tch::Kind::Float);
    value_loss + policy_loss
}

pub fn build_optimizer(network: &Network, learning_rate: f64, momentum: f64, weight_decay: f64) -> nn::Optimizer {
    let mut optimizer = nn::Sgd {
        momentum,
        dampening: 0.0,
        wd: weight_decay,
        nesterov: false,
    }
    .build(network.var_store(), learning_rate)
    .expect("SGD optimizer configuration is always valid");
    optimizer.set_momentum(momentum);
    optimizer
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn loss_is_zero_for_a_perfect_prediction() {
        let value = Tensor::of_slice(&[0.5f32]).view([1, 1]);
        let target_value = Tensor::of_slice(&[0.5f32]).view([1, 1]);

        let logits = Tensor::of_slice(&[10.0f32, -10.0, -10.0]).view([1, 3]);
        let target_policy = Tensor::of_slice(&[1.0f32, 0.0, 0.0]).view([1, 3]);

        let loss = combined_loss(&value, &logits, &target_value, &target_policy);
        let loss_value: f64 = loss.double_value(&[]);
        assert!(loss_value < 1e-3);
    }

    #[test]
    fn loss_increases_with_value_error() {
        let good = combined_loss(
            &Tensor::of_slice(&[0.0f32]).view([1, 1]),
            &Tensor::of_slice(&[0.0f32, 0.0]).view([1, 2]),
            &Tensor::of_slice(&[0.0f32]).view([1, 1]),
            &Tensor::of_slice(&[0.5f32, 0.5]).view([1, 2]),
        );
        let bad = combined_loss(
            &Tensor::of_slice(&[1.0f32]).view([1, 1]),
            &Tensor::of_slice(&[0.0f32, 0.0]).view([1, 2]),
            &Tensor::of_slice(&[0.0f32]).view([1, 1]),
            &Tensor::of_slice(&[0.5f32, 0.5]).view([1, 2]),
        );

        let good_value: f64 = good.double_value(&[]);
        let bad_value: f64 = bad.double_value(&[]);
        assert!(bad_value > good_value);
        let _ = Kind::Float;
        let _ = Device::Cpu;
    }
}
