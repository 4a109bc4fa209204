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

//! PUCT tree search (§4.2), the batched self-play driver (§4.3), and the
//! competitive UCI search wrapper (§4.5).

pub mod dirichlet;
pub mod node;
pub mod options;
pub mod search;
pub mod self_play;
pub mod time_control;
pub mod uci_search;

pub use node::{Node, Tree, ROOT};
pub use options::{SearchOptions, StandardDeterministicSearch, StandardSearch};
pub use search::{apply_evaluation, select_leaf, simulate_once, Selection};
