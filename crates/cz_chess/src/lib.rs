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

//! Chess-specific leaves of the dependency graph: the move/action
//! bijection, the position image encoder, and the history-aware game
//! wrapper around the rules library.

#[macro_use]
extern crate lazy_static;

pub mod action;
pub mod game;
pub mod image;

pub use chess::{Board, ChessMove, Color, Piece, Square};
pub use game::Game;
