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

//! §8 scenario 1 ("Deterministic single-ply search"), exercised at the
//! `cz_uci` crate boundary: `ChessZeroEngine::search` on the Fool's-mate
//! position must return a legal move. Network shape is shrunk via env
//! vars before the engine is constructed, since the defaults are sized
//! for real training, not a test binary.

use cz_uci::engine::{ChessZeroEngine, Engine};
use cz_mcts::uci_search::{SearchInfo, SearchLimit};
use chess::ChessMove;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;

struct NullInfo;
impl SearchInfo for NullInfo {
    fn nodes(&mut self, _count: u64) {}
    fn score(&mut self, _centipawns: i32) {}
    fn pv(&mut self, _moves: &[ChessMove]) {}
    fn message(&mut self, _text: &str) {}
}

#[test]
fn search_from_fools_mate_returns_a_legal_move() {
    std::env::set_var("CZ_NUM_FILTERS", "4");
    std::env::set_var("CZ_NUM_BLOCKS", "1");
    std::env::set_var("CZ_HISTORY_LENGTH", "1");

    let engine = ChessZeroEngine::new(std::env::temp_dir().join("cz_uci_test_nonexistent_model.pt"));

    let board =
        chess::Board::from_str("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
    engine.setup(cz_chess::game::Game::new(board));

    let limit = SearchLimit { nodes: Some(16), ..Default::default() };
    let stop = AtomicBool::new(false);
    let ponder = AtomicBool::new(false);
    let mut info = NullInfo;

    let result = engine.search(&limit, &mut info, &ponder, &stop);

    let legal: Vec<ChessMove> = chess::MoveGen::new_legal(&board).collect();
    assert!(legal.contains(&result.best_move));
}

#[test]
fn reset_restores_the_starting_position_for_the_next_search() {
    std::env::set_var("CZ_NUM_FILTERS", "4");
    std::env::set_var("CZ_NUM_BLOCKS", "1");
    std::env::set_var("CZ_HISTORY_LENGTH", "1");

    let engine = ChessZeroEngine::new(std::env::temp_dir().join("cz_uci_test_nonexistent_model.pt"));

    let board = chess::Board::from_str("8/8/8/8/8/8/8/k1K4R w - - 0 1").unwrap();
    engine.setup(cz_chess::game::Game::new(board));
    engine.reset();

    let limit = SearchLimit { nodes: Some(16), ..Default::default() };
    let stop = AtomicBool::new(false);
    let ponder = AtomicBool::new(false);
    let mut info = NullInfo;

    let result = engine.search(&limit, &mut info, &ponder, &stop);
    let legal: Vec<ChessMove> = chess::MoveGen::new_legal(&chess::Board::default()).collect();
    assert!(legal.contains(&result.best_move));
}
