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

//! The dual-head residual network (§4.1): an input convolution, `R`
//! residual blocks, and a value head and a policy head sharing the
//! resulting trunk.

use cz_chess::action::NUM_ACTIONS;
use tch::nn::{self, ModuleT};
use tch::{Device, Tensor};

const BOARD_CELLS: i64 = 64;

struct ConvBlock {
    conv: nn::Conv2D,
    bn: nn::BatchNorm,
}

impl ConvBlock {
    fn new(vs: &nn::Path, in_channels: i64, out_channels: i64, kernel: i64) -> Self {
        let padding = kernel / 2;
        let conv_cfg = nn::ConvConfig { padding, bias: false, ..Default::default() };
        ConvBlock {
            conv: nn::conv2d(vs / "conv", in_channels, out_channels, kernel, conv_cfg),
            bn: nn::batch_norm2d(vs / "bn", out_channels, Default::default()),
        }
    }

    fn forward(&self, xs: &Tensor, train: bool) -> Tensor {
        xs.apply(&self.conv).apply_t(&self.bn, train).relu()
    }
}

struct ResidualBlock {
    conv1: nn::Conv2D,
    bn1: nn::BatchNorm,
    conv2: nn::Conv2D,
    bn2: nn::BatchNorm,
}

impl ResidualBlock {
    fn new(vs: &nn::Path, channels: i64) -> Self {
        let conv_cfg = nn::ConvConfig { padding: 1, bias: false, ..Default::default() };
        ResidualBlock {
            conv1: nn::conv2d(vs / "conv1", channels, channels, 3, conv_cfg),
            bn1: nn::batch_norm2d(vs / "bn1", channels, Default::default()),
            conv2: nn::conv2d(vs / "conv2", channels, channels, 3, conv_cfg),
            bn2: nn::batch_norm2d(vs / "bn2", channels, Default::default()),
        }
    }

    fn forward(&self, xs: &Tensor, train: bool) -> Tensor {
        let residual = xs;
        let ys = xs
            .apply(&self.conv1)
            .apply_t(&self.bn1, train)
            .relu()
            .apply(&self.conv2)
            .apply_t(&self.bn2, train);
        (ys + residual).relu()
    }
}

struct ValueHead {
    conv: nn::Conv2D,
    bn: nn::BatchNorm,
    fc1: nn::Linear,
    fc2: nn::Linear,
}

impl ValueHead {
    fn new(vs: &nn::Path, channels: i64) -> Self {
        let conv_cfg = nn::ConvConfig { bias: false, ..Default::default() };
        ValueHead {
            conv: nn::conv2d(vs / "conv", channels, 1, 1, conv_cfg),
            bn: nn::batch_norm2d(vs / "bn", 1, Default::default()),
            fc1: nn::linear(vs / "fc1", BOARD_CELLS, 256, Default::default()),
            fc2: nn::linear(vs / "fc2", 256, 1, Default::default()),
        }
    }

    fn forward(&self, trunk: &Tensor, train: bool) -> Tensor {
        let batch = trunk.size()[0];
        trunk
            .apply(&self.conv)
            .apply_t(&self.bn, train)
            .relu()
            .view([batch, BOARD_CELLS])
            .apply(&self.fc1)
            .relu()
            .apply(&self.fc2)
            .tanh()
    }
}

struct PolicyHead {
    conv: nn::Conv2D,
    bn: nn::BatchNorm,
    fc: nn::Linear,
}

impl PolicyHead {
    fn new(vs: &nn::Path, channels: i64) -> Self {
        let conv_cfg = nn::ConvConfig { bias: false, ..Default::default() };
        PolicyHead {
            conv: nn::conv2d(vs / "conv", channels, 2, 1, conv_cfg),
            bn: nn::batch_norm2d(vs / "bn", 2, Default::default()),
            fc: nn::linear(vs / "fc", 2 * BOARD_CELLS, NUM_ACTIONS as i64, Default::default()),
        }
    }

    fn forward(&self, trunk: &Tensor, train: bool) -> Tensor {
        let batch = trunk.size()[0];
        trunk
            .apply(&self.conv)
            .apply_t(&self.bn, train)
            .relu()
            .view([batch, 2 * BOARD_CELLS])
            .apply(&self.fc)
    }
}

/// Sizing knobs for `Network::new`. Defaults match §4.1: `F=128` filters,
/// `R=10` residual blocks.
pub struct NetworkConfig {
    pub in_channels: i64,
    pub filters: i64,
    pub blocks: i64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig { in_channels: 21, filters: 128, blocks: 10 }
    }
}

pub struct Network {
    vs: nn::VarStore,
    input: ConvBlock,
    residual: Vec<ResidualBlock>,
    value_head: ValueHead,
    policy_head: PolicyHead,
}

impl Network {
    pub fn new(device: Device, config: NetworkConfig) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let input = ConvBlock::new(&(&root / "input"), config.in_channels, config.filters, 3);
        let residual = (0..config.blocks)
            .map(|i| ResidualBlock::new(&(&root / "residual" / i), config.filters))
            .collect();
        let value_head = ValueHead::new(&(&root / "value"), config.filters);
        let policy_head = PolicyHead::new(&(&root / "policy"), config.filters);

        Network { vs, input, residual, value_head, policy_head }
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    /// `forward(batch: [B,C,8,8]) -> (value: [B,1], policy_logits: [B,4672])`.
    /// Pure given fixed weights; accepts any `B >= 1`.
    pub fn forward(&self, batch: &Tensor, train: bool) -> (Tensor, Tensor) {
        let mut trunk = self.input.forward(batch, train);
        for block in &self.residual {
            trunk = block.forward(&trunk, train);
        }

        let value = self.value_head.forward(&trunk, train);
        let policy_logits = self.policy_head.forward(&trunk, train);
        (value, policy_logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_accepts_a_single_position_batch() {
        let config = NetworkConfig { in_channels: 21, filters: 8, blocks: 2 };
        let net = Network::new(Device::Cpu, config);

        let batch = Tensor::zeros(&[1, 21, 8, 8], (tch::Kind::Float, Device::Cpu));
        let (value, policy) = net.forward(&batch, false);

        assert_eq!(value.size(), vec![1, 1]);
        assert_eq!(policy.size(), vec![1, NUM_ACTIONS as i64]);
    }

    #[test]
    fn forward_accepts_a_larger_batch() {
        let config = NetworkConfig { in_channels: 21, filters: 8, blocks: 2 };
        let net = Network::new(Device::Cpu, config);

        let batch = Tensor::zeros(&[4, 21, 8, 8], (tch::Kind::Float, Device::Cpu));
        let (value, policy) = net.forward(&batch, false);

        assert_eq!(value.size(), vec![4, 1]);
        assert_eq!(policy.size(), vec![4, NUM_ACTIONS as i64]);
    }
}
