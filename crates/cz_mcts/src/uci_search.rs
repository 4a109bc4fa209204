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

//! Competitive (UCI) search (§4.5): a single-position wrapper around the
//! tree search that runs until told to stop, reporting progress as it
//! goes. Grounded on `original_source/uci/uci.hpp`'s `search_limit`/
//! `search_info`/`search_result` shapes and `sigmazero.cpp`'s
//! `stop_search` predicate (time budget derived from the remaining clock,
//! `stop`/`ponder` polled once per simulation, never mid-simulation), with
//! the teacher's `StandardDeterministicSearch` supplying the "no root
//! noise, always most-visited" policy via `SearchOptions`.

use crate::node::{Tree, ROOT};
use crate::options::SearchOptions;
use crate::{search, time_control};
use chess::ChessMove;
use cz_chess::action::action_to_move;
use cz_chess::game::Game;
use cz_nn::predictor::Predictor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Mirrors `uci::search_limit`: every field is optional except `infinite`,
/// which defaults to bounded search.
#[derive(Clone, Debug, Default)]
pub struct SearchLimit {
    pub movetime: Option<Duration>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub white_clock: Option<Duration>,
    pub black_clock: Option<Duration>,
    pub infinite: bool,
}

pub struct SearchResult {
    pub best_move: ChessMove,
    pub ponder_move: Option<ChessMove>,
}

/// The info sink the search reports progress through, mirroring
/// `uci::search_info`'s `nodes`/`score`/`line`/`message` methods (depth
/// and bounds/mate reporting are left to the caller, since this search
/// has no notion of a classical search depth beyond simulation count).
pub trait SearchInfo {
    fn nodes(&mut self, count: u64);
    fn score(&mut self, centipawns: i32);
    fn pv(&mut self, moves: &[ChessMove]);
    fn message(&mut self, text: &str);
}

/// Maps a `[-1,+1]` value estimate onto a centipawn-like integer for
/// display, the same order of magnitude as a material-based evaluation.
fn value_to_centipawns(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * 1000.0).round() as i32
}

fn principal_variation(tree: &Tree, game: &Game) -> Vec<ChessMove> {
    const MAX_PV_LENGTH: usize = 8;
    let mut pv = Vec::new();
    let mut node = ROOT;
    let mut scratch = game.clone();

    while pv.len() < MAX_PV_LENGTH {
        let Some(child) = tree.most_visited_child(node) else { break };
        let board = *scratch.current();
        let action = tree.node(child).action.expect("non-root node has an action");
        let mv = action_to_move(&board, action);
        pv.push(mv);
        scratch.push(mv);
        node = child;
    }
    pv
}

/// Runs simulations against `game` until `stop` is set, the time budget
/// (from `limit` or the side-to-move's clock) is exhausted, or a node/
/// depth limit is reached -- unless `limit.infinite` or `ponder` is set,
/// in which case only `stop` ends the search. Always performs at least
/// one simulation, so the position is guaranteed expanded before a move
/// is chosen.
pub fn search<P: Predictor>(
    game: &Game,
    predictor: &P,
    options: &dyn SearchOptions,
    limit: &SearchLimit,
    info: &mut dyn SearchInfo,
    stop: &AtomicBool,
    ponder: &AtomicBool,
) -> SearchResult {
    let mut tree = Tree::new();
    let start = Instant::now();

    let budget = limit.movetime.unwrap_or_else(|| {
        let clock = match game.side_to_move() {
            chess::Color::White => limit.white_clock,
            chess::Color::Black => limit.black_clock,
        }
        .unwrap_or(Duration::from_secs(10));
        time_control::budgeted_time(game.ply() as u32, clock.as_secs_f64())
    });

    info.message(&format!("budgeted time: {:.3}s", budget.as_secs_f64()));

    let mut simulations: u64 = 0;
    loop {
        search::simulate_once(&mut tree, game, predictor, options.c_base(), options.c_init());
        simulations += 1;

        if let Some(best) = tree.most_visited_child(ROOT) {
            info.nodes(simulations);
            info.score(value_to_centipawns(-tree.node(best).mean_value()));
            info.pv(&principal_variation(&tree, game));
        }

        if stop.load(Ordering::Relaxed) {
            info.message("stopping search: stop flag set");
            break;
        }

        let unlimited = limit.infinite || ponder.load(Ordering::Relaxed);
        if unlimited {
            continue;
        }

        if let Some(node_limit) = limit.nodes {
            if simulations >= node_limit {
                info.message("stopping search: node limit reached");
                break;
            }
        }
        if let Some(depth_limit) = limit.depth {
            if simulations >= depth_limit as u64 {
                info.message("stopping search: depth limit reached");
                break;
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= budget {
            info.message("stopping search: time budget exceeded");
            break;
        }

        let rate = (simulations as f64 / elapsed.as_secs_f64().max(1e-6)).max(1.0);
        let strategy = time_control::CompetitiveTimeStrategy::new(start, budget, rate);
        if time_control::is_done(&tree, ROOT, &strategy) {
            info.message("stopping search: unlikely to change best move before budget expires");
            break;
        }
    }

    let board = *game.current();
    let best_child = tree.most_visited_child(ROOT).expect("at least one simulation always runs");
    let best_action = tree.node(best_child).action.expect("non-root node has an action");
    let best_move = action_to_move(&board, best_action);

    let ponder_move = tree.most_visited_child(best_child).map(|grandchild| {
        let mut scratch = game.clone();
        scratch.push(best_move);
        let scratch_board = *scratch.current();
        let action = tree.node(grandchild).action.expect("non-root node has an action");
        action_to_move(&scratch_board, action)
    });

    SearchResult { best_move, ponder_move }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cz_nn::predictor::UniformPredictor;
    use crate::options::StandardDeterministicSearch;

    struct NullInfo;
    impl SearchInfo for NullInfo {
        fn nodes(&mut self, _count: u64) {}
        fn score(&mut self, _centipawns: i32) {}
        fn pv(&mut self, _moves: &[ChessMove]) {}
        fn message(&mut self, _text: &str) {}
    }

    #[test]
    fn search_returns_a_legal_move_from_fools_mate() {
        use std::str::FromStr;
        let board =
            chess::Board::from_str("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let game = Game::new(board);

        let options = StandardDeterministicSearch::default();
        let limit = SearchLimit { nodes: Some(64), ..Default::default() };
        let stop = AtomicBool::new(false);
        let ponder = AtomicBool::new(false);
        let mut info = NullInfo;

        let result = search(&game, &UniformPredictor, &options, &limit, &mut info, &stop, &ponder);

        let legal: Vec<ChessMove> = chess::MoveGen::new_legal(&board).collect();
        assert!(legal.contains(&result.best_move));
    }

    #[test]
    fn stop_flag_set_before_search_still_returns_one_simulation_worth_of_move() {
        let game = Game::starting_position();
        let board = *game.current();
        let options = StandardDeterministicSearch::default();
        let limit = SearchLimit::default();
        let stop = AtomicBool::new(true);
        let ponder = AtomicBool::new(false);
        let mut info = NullInfo;

        let result = search(&game, &UniformPredictor, &options, &limit, &mut info, &stop, &ponder);
        let legal: Vec<ChessMove> = chess::MoveGen::new_legal(&board).collect();
        assert!(legal.contains(&result.best_move));
    }
}
