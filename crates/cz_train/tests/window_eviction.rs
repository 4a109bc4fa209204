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

//! With `W=4` and 10 synthetic records fed through the trainer's window,
//! after the 10th arrival the window must hold exactly records 7..10 and
//! every sampled minibatch must draw only from them.

use cz_nn::net::{Network, NetworkConfig};
use cz_replay::codec::WireTensor;
use cz_replay::ReplayRecord;
use cz_train::{TrainLoop, TrainLoopConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::Device;

fn record(value: f32) -> ReplayRecord {
    ReplayRecord {
        image: WireTensor::new(vec![2, 8, 8], vec![0.0; 128]),
        value,
        policy: WireTensor::new(vec![3], vec![1.0, 0.0, 0.0]),
    }
}

#[test]
fn window_holds_only_the_last_four_of_ten_arrivals() {
    let network = Network::new(Device::Cpu, NetworkConfig { in_channels: 2, filters: 4, blocks: 1 });
    let config = TrainLoopConfig {
        model_path: std::env::temp_dir().join(format!("cz_train_window_eviction_{}.pt", std::process::id())),
        window_size: 4,
        minibatch_size: 64,
        save_rate: 0,
        checkpoint_rate: 0,
        learning_rate: 0.01,
        momentum: 0.9,
        weight_decay: 1e-4,
        train_before_full: false,
    };
    let mut train_loop = TrainLoop::new(network, config);

    for i in 1..=10 {
        train_loop.ingest(record(i as f32));
    }

    assert!(train_loop.window().is_full());
    assert_eq!(train_loop.window().len(), 4);

    let mut rng = StdRng::seed_from_u64(11);
    let sampled = train_loop.window().sample(64, &mut rng);
    assert_eq!(sampled.len(), 64);
    for record in sampled {
        assert!(record.value >= 7.0 && record.value <= 10.0);
    }
}
