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

//! `cz_uci [model-path]`: a UCI frontend backed by the checkpoint at
//! `model-path` (default `model.pt`), hot-reloaded between searches.

use cz_uci::engine::ChessZeroEngine;
use cz_uci::protocol;
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    cz_utils::logging::init();

    let model_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("model.pt"));

    let engine = Arc::new(ChessZeroEngine::new(model_path));
    let code = protocol::run(engine);
    std::process::exit(code);
}
