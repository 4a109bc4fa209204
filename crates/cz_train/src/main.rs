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

//! The trainer binary (§4.4): `<binary> <model-path> [replay-file]...`,
//! reading from stdin when no replay files are given -- grounded on
//! `original_source/sigmazero/training.cpp`'s `main`.

use cz_replay::codec::decode_record;
use cz_train::{TrainLoop, TrainLoopConfig};
use cz_utils::config::{
    CHECKPOINT_RATE, HISTORY_LENGTH, LEARNING_RATE, MINIBATCH_SIZE, MOMENTUM, NUM_BLOCKS, NUM_FILTERS, SAVE_RATE,
    WEIGHT_DECAY, WINDOW_SIZE,
};
use cz_utils::queue::SyncQueue;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tch::Device;

fn select_device() -> Device {
    if tch::Cuda::is_available() {
        log::info!("using CUDA");
        Device::Cuda(0)
    } else {
        log::info!("using CPU");
        Device::Cpu
    }
}

fn main() {
    cz_utils::logging::init();

    let mut args = std::env::args().skip(1);
    let model_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            log::error!("usage: cz_train <model-path> [replay-file]...");
            std::process::exit(1);
        }
    };
    let replay_paths: Vec<PathBuf> = args.map(PathBuf::from).collect();

    let device = select_device();
    let in_channels = cz_chess::image::num_channels(*HISTORY_LENGTH) as i64;
    let network_config =
        cz_nn::net::NetworkConfig { in_channels, filters: *NUM_FILTERS, blocks: *NUM_BLOCKS };
    let mut network = cz_nn::net::Network::new(device, network_config);

    if model_path.exists() {
        cz_nn::checkpoint::load(&mut network, &model_path).expect("failed to load existing checkpoint");
        log::info!("loaded existing model from {}", model_path.display());
    } else {
        cz_nn::checkpoint::save(&network, &model_path).expect("failed to write initial checkpoint");
        log::info!("wrote freshly initialized model to {}", model_path.display());
    }

    let config = TrainLoopConfig {
        model_path: model_path.clone(),
        window_size: *WINDOW_SIZE,
        minibatch_size: *MINIBATCH_SIZE,
        save_rate: *SAVE_RATE,
        checkpoint_rate: *CHECKPOINT_RATE,
        learning_rate: *LEARNING_RATE,
        momentum: *MOMENTUM,
        weight_decay: *WEIGHT_DECAY,
        train_before_full: false,
    };
    let mut train_loop = TrainLoop::new(network, config);

    let queue = SyncQueue::bounded(4096);
    let _readers = cz_train::intake::spawn_readers(&replay_paths, &queue);

    let mut rng = StdRng::from_entropy();
    loop {
        let line = match queue.recv() {
            Ok(line) => line,
            Err(_) => {
                log::info!("replay intake exhausted, trainer exiting");
                return;
            }
        };

        let record = match decode_record(&line) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("skipping malformed replay line: {err}");
                continue;
            }
        };

        train_loop.ingest(record);
        if let Some(loss) = train_loop.maybe_step(&mut rng) {
            log::info!("step {}: loss = {:.4}", train_loop.steps(), loss);
        }
    }
}
