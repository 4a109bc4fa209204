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

//! The engine capability set (§9's "inheritance hierarchies" design note):
//! `name`/`author`/`setup`/`search`/`reset` plus an options bag, the same
//! five operations as `original_source/uci/uci.hpp`'s `engine` virtual
//! base, expressed as a trait over `&self` so the protocol loop's command
//! thread and its spawned search thread can share one engine without a
//! single coarse lock serializing them.

use crate::options::{OptionKind, Options};
use cz_chess::game::Game;
use cz_mcts::options::StandardDeterministicSearch;
use cz_mcts::uci_search::{search, SearchInfo, SearchLimit, SearchResult};
use cz_nn::checkpoint;
use cz_nn::net::{Network, NetworkConfig};
use cz_nn::predictor::NetworkPredictor;
use cz_utils::config::{
    DIRICHLET_ALPHA, EXPLORATION_FRACTION, HISTORY_LENGTH, NUM_BLOCKS, NUM_FILTERS, PB_C_BASE, PB_C_INIT,
};
use cz_utils::error::ProtocolError;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, RwLock};
use std::time::SystemTime;
use tch::Device;

pub trait Engine {
    fn name(&self) -> &str;
    fn author(&self) -> &str;
    /// One `option name ...` line per registered option, ready to print
    /// verbatim after `id author` in response to `uci`.
    fn options_announcement(&self) -> String;
    fn set_option(&self, name: &str, value: &str) -> Result<(), ProtocolError>;
    fn setup(&self, game: Game);
    fn search(&self, limit: &SearchLimit, info: &mut dyn SearchInfo, ponder: &AtomicBool, stop: &AtomicBool) -> SearchResult;
    fn reset(&self);
}

fn select_device() -> Device {
    if tch::Cuda::is_available() {
        Device::Cuda(0)
    } else {
        Device::Cpu
    }
}

/// Default search-limit knobs advertised under `uci`: `MultiPV`, `Move
/// Overhead`, `Threads`, `Hash` (all fixed at the teacher's "single
/// principal variation, single search thread" configuration, since this
/// engine has no multi-PV or multi-threaded search mode) plus the five
/// MCTS tuning knobs named in §6.
fn default_options() -> Options {
    let mut options = Options::new();
    options.add("MultiPV", OptionKind::Spin { value: 1, min: 1, max: 1 });
    options.add("Move Overhead", OptionKind::Spin { value: 30, min: 0, max: 5000 });
    options.add("Threads", OptionKind::Spin { value: 1, min: 1, max: 1 });
    options.add("Hash", OptionKind::Spin { value: 1, min: 1, max: 1 });
    options.add("PB C Base", OptionKind::FloatRange { value: *PB_C_BASE, min: 1.0, max: 1_000_000.0 });
    options.add("PB C Init", OptionKind::FloatRange { value: *PB_C_INIT, min: 0.0, max: 10.0 });
    options.add("Dirichlet Alpha", OptionKind::FloatRange { value: *DIRICHLET_ALPHA, min: 0.0, max: 1.0 });
    options.add(
        "Exploration Fraction",
        OptionKind::FloatRange { value: *EXPLORATION_FRACTION, min: 0.0, max: 1.0 },
    );
    options.add("Sampling Moves", OptionKind::Spin { value: 0, min: 0, max: 10_000 });
    options
}

/// The competitive-play engine: a network whose weights are hot-reloaded
/// from `model_path` between searches (mirroring self-play's live-reload
/// loop, but polled once per `setup`/`go` rather than continuously, since
/// a UCI engine otherwise has nothing else to do between moves), the
/// current game under consideration, and the tunable options above.
pub struct ChessZeroEngine {
    model_path: PathBuf,
    network: RwLock<Network>,
    last_seen: Mutex<Option<SystemTime>>,
    game: Mutex<Game>,
    options: Mutex<Options>,
}

// `tch::Tensor` (reachable through `Network`'s layers) is `Send` but not
// `Sync`; the protocol loop nonetheless shares this engine between the
// command thread and a spawned search thread. Safe per §5's shared-
// resource policy: the network is never written to while a search thread
// holds the read lock, only between searches via `reload_if_changed`,
// which itself takes the write lock -- the same invariant the teacher's
// `ThreadContext` asserts for its raw tree/event-queue pointers.
unsafe impl Sync for ChessZeroEngine {}

impl ChessZeroEngine {
    pub fn new(model_path: PathBuf) -> Self {
        let device = select_device();
        let in_channels = cz_chess::image::num_channels(*HISTORY_LENGTH) as i64;
        let mut network = Network::new(device, NetworkConfig { in_channels, filters: *NUM_FILTERS, blocks: *NUM_BLOCKS });
        let mut last_seen = None;

        if model_path.exists() {
            if let Err(err) = checkpoint::load(&mut network, &model_path) {
                log::warn!("failed to load model at {}: {}", model_path.display(), err);
            } else {
                last_seen = std::fs::metadata(&model_path).ok().and_then(|m| m.modified().ok());
            }
        } else {
            log::warn!("no model found at {}, starting from randomly initialized weights", model_path.display());
        }

        ChessZeroEngine {
            model_path,
            network: RwLock::new(network),
            last_seen: Mutex::new(last_seen),
            game: Mutex::new(Game::starting_position()),
            options: Mutex::new(default_options()),
        }
    }

    fn reload_if_changed(&self) {
        let mut network = self.network.write().expect("network lock poisoned");
        let mut last_seen = self.last_seen.lock().expect("last_seen lock poisoned");
        *last_seen = checkpoint::reload_if_changed(&mut network, &self.model_path, *last_seen);
    }
}

impl Engine for ChessZeroEngine {
    fn name(&self) -> &str {
        "chess-zero"
    }

    fn author(&self) -> &str {
        "chess-zero contributors"
    }

    fn options_announcement(&self) -> String {
        self.options.lock().expect("options lock poisoned").to_uci_lines()
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), ProtocolError> {
        self.options.lock().expect("options lock poisoned").set(name, value)
    }

    fn setup(&self, game: Game) {
        self.reload_if_changed();
        *self.game.lock().expect("game lock poisoned") = game;
    }

    fn search(&self, limit: &SearchLimit, info: &mut dyn SearchInfo, ponder: &AtomicBool, stop: &AtomicBool) -> SearchResult {
        let game = self.game.lock().expect("game lock poisoned").clone();
        let network = self.network.read().expect("network lock poisoned");
        let predictor = NetworkPredictor::new(&network, *HISTORY_LENGTH);

        let options = self.options.lock().expect("options lock poisoned");
        let search_options = StandardDeterministicSearch::new(options.get_f64("PB C Base"), options.get_f64("PB C Init"));
        drop(options);

        search(&game, &predictor, &search_options, limit, info, stop, ponder)
    }

    fn reset(&self) {
        *self.game.lock().expect("game lock poisoned") = Game::starting_position();
    }
}
