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

//! The UCI command dispatch loop (§6), grounded directly on
//! `original_source/common/uci/uci.cpp`'s `main(engine&)`: a main thread
//! reads stdin lines and dispatches `uci`/`isready`/`setoption`/
//! `ucinewgame`/`position`/`go`/`stop`/`ponderhit`/`quit`; `go` spawns a
//! detached search thread; an output-serializer thread owns stdout, fed
//! by a `SyncQueue` of already-formatted lines (the `push_message`/
//! `output_thread_main` pairing in `uci/output_thread.hpp`).

use crate::engine::Engine;
use cz_chess::game::Game;
use cz_mcts::uci_search::{SearchInfo, SearchLimit, SearchResult};
use cz_utils::queue::SyncQueue;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Renders search progress as `info ...` lines onto the shared output
/// queue, mirroring `uci::search_info`'s `nodes`/`score`/`line`/`message`
/// methods (depth/seldepth/currmove reporting have no counterpart in this
/// search, which has no classical iterative-deepening notion of depth).
struct ChannelSearchInfo {
    sender: crossbeam_channel::Sender<String>,
}

impl ChannelSearchInfo {
    fn push(&self, line: String) {
        let _ = self.sender.send(line);
    }
}

impl SearchInfo for ChannelSearchInfo {
    fn nodes(&mut self, count: u64) {
        self.push(format!("info nodes {count}"));
    }

    fn score(&mut self, centipawns: i32) {
        self.push(format!("info score cp {centipawns}"));
    }

    fn pv(&mut self, moves: &[chess::ChessMove]) {
        if moves.is_empty() {
            return;
        }
        let line: Vec<String> = moves.iter().map(|mv| mv.to_string()).collect();
        self.push(format!("info pv {}", line.join(" ")));
    }

    fn message(&mut self, text: &str) {
        self.push(format!("info string {text}"));
    }
}

fn render_bestmove(result: &SearchResult) -> String {
    match result.ponder_move {
        Some(ponder) => format!("bestmove {} ponder {}", result.best_move, ponder),
        None => format!("bestmove {}", result.best_move),
    }
}

fn parse_position(stream: &mut std::str::SplitWhitespace) -> Option<Game> {
    let first = stream.next()?;
    let board = if first == "startpos" {
        chess::Board::default()
    } else if first == "fen" {
        let mut fen_tokens = Vec::new();
        let mut consumed_moves_token = false;
        for token in stream.by_ref() {
            if token == "moves" {
                consumed_moves_token = true;
                break;
            }
            fen_tokens.push(token);
        }
        let board = chess::Board::from_str(&fen_tokens.join(" ")).ok()?;
        if consumed_moves_token {
            return apply_moves(board, stream);
        }
        board
    } else {
        return None;
    };

    match stream.next() {
        Some("moves") => apply_moves(board, stream),
        _ => Some(Game::new(board)),
    }
}

fn apply_moves(board: chess::Board, stream: &mut std::str::SplitWhitespace) -> Option<Game> {
    let mut game = Game::new(board);
    for lan in stream {
        let mv = chess::ChessMove::from_str(lan).ok()?;
        game.push(mv);
    }
    Some(game)
}

/// Returns the parsed limit and whether the `ponder` sub-token was
/// present, since `SearchLimit` itself carries no ponder flag (ponder is
/// a property of how the search's result is used, not of its stopping
/// condition).
fn parse_go(stream: &mut std::str::SplitWhitespace) -> (SearchLimit, bool) {
    let mut limit = SearchLimit::default();
    let mut ponder_requested = false;

    while let Some(token) = stream.next() {
        match token {
            "searchmoves" => {
                // Consumes only the move tokens, so a following keyword
                // (e.g. `depth`) is left in `stream` for the match below to
                // see rather than being eaten as an unrecognized move.
                loop {
                    let mut probe = stream.clone();
                    match probe.next() {
                        Some(t) if chess::ChessMove::from_str(t).is_ok() => {
                            stream.next();
                        }
                        _ => break,
                    }
                }
            }
            "ponder" => ponder_requested = true,
            "wtime" => limit.white_clock = stream.next().and_then(|v| v.parse().ok()).map(Duration::from_millis),
            "btime" => limit.black_clock = stream.next().and_then(|v| v.parse().ok()).map(Duration::from_millis),
            "winc" | "binc" | "movestogo" | "mate" => {
                stream.next();
            }
            "depth" => limit.depth = stream.next().and_then(|v| v.parse().ok()),
            "nodes" => limit.nodes = stream.next().and_then(|v| v.parse().ok()),
            "movetime" => limit.movetime = stream.next().and_then(|v| v.parse().ok()).map(Duration::from_millis),
            "infinite" => limit.infinite = true,
            _ => {}
        }
    }

    (limit, ponder_requested)
}

/// Runs the UCI command loop against `engine` until `quit`, returning the
/// process exit code (always `0` on a normal `quit`, per §6).
pub fn run(engine: Arc<dyn Engine + Send + Sync>) -> i32 {
    let output_queue = SyncQueue::bounded(4096);
    let output_sender = output_queue.sender();
    let output_thread = thread::spawn(move || {
        while let Ok(line) = output_queue.recv() {
            println!("{line}");
        }
    });

    let stop = Arc::new(AtomicBool::new(true));
    let ponder = Arc::new(AtomicBool::new(false));

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let mut stream = line.split_whitespace();
        let Some(command) = stream.next() else { continue };

        match command {
            "uci" => {
                let _ = output_sender.send(format!("id name {}", engine.name()));
                let _ = output_sender.send(format!("id author {}", engine.author()));
                let announcement = engine.options_announcement();
                if !announcement.is_empty() {
                    let _ = output_sender.send(announcement);
                }
                let _ = output_sender.send("uciok".to_string());
            }
            "isready" => {
                let _ = output_sender.send("readyok".to_string());
            }
            "setoption" => {
                // `setoption name <N> value <V>`: `extract_until` in the
                // original collects every token up to the literal
                // `value`, allowing multi-word option names.
                let tokens: Vec<&str> = stream.collect();
                if tokens.first() != Some(&"name") {
                    let _ = output_sender.send("info string malformed setoption command".to_string());
                    continue;
                }
                let value_pos = tokens.iter().position(|&t| t == "value");
                let (name_tokens, value_tokens) = match value_pos {
                    Some(pos) => (&tokens[1..pos], &tokens[pos + 1..]),
                    None => (&tokens[1..], &[][..]),
                };
                let name = name_tokens.join(" ");
                let value = value_tokens.join(" ");
                if let Err(err) = engine.set_option(&name, &value) {
                    let _ = output_sender.send(format!("info string {err}"));
                }
            }
            "ucinewgame" => {
                // per §7, a genuinely malformed command is simply
                // ignored; `ucinewgame` always succeeds.
            }
            "position" => {
                if let Some(game) = parse_position(&mut stream) {
                    engine.setup(game);
                } else {
                    let _ = output_sender.send("info string malformed position command".to_string());
                }
            }
            "go" => {
                let (limit, ponder_requested) = parse_go(&mut stream);
                stop.store(false, Ordering::Relaxed);
                ponder.store(ponder_requested, Ordering::Relaxed);

                let engine = Arc::clone(&engine);
                let stop = Arc::clone(&stop);
                let ponder = Arc::clone(&ponder);
                let sender = output_sender.clone();
                thread::spawn(move || {
                    let mut info = ChannelSearchInfo { sender: sender.clone() };
                    let result = engine.search(&limit, &mut info, &ponder, &stop);
                    let _ = sender.send(render_bestmove(&result));
                });
            }
            "stop" => stop.store(true, Ordering::Relaxed),
            "ponderhit" => ponder.store(false, Ordering::Relaxed),
            "quit" => break,
            _ => {
                let _ = output_sender.send(format!("info string unrecognized command `{command}`"));
            }
        }
    }

    stop.store(true, Ordering::Relaxed);
    drop(output_sender);
    let _ = output_thread.join();
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_handles_startpos_with_moves() {
        let line = "startpos moves e2e4 e7e5";
        let mut stream = line.split_whitespace();
        let game = parse_position(&mut stream).unwrap();
        assert_eq!(game.ply(), 2);
    }

    #[test]
    fn parse_position_handles_fen_without_moves() {
        let line = "fen rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        let mut stream = line.split_whitespace();
        let game = parse_position(&mut stream).unwrap();
        assert_eq!(game.ply(), 0);
    }

    #[test]
    fn parse_go_reads_clock_and_limit_fields() {
        let line = "wtime 60000 btime 55000 depth 4";
        let mut stream = line.split_whitespace();
        let (limit, ponder_requested) = parse_go(&mut stream);
        assert_eq!(limit.white_clock, Some(Duration::from_millis(60000)));
        assert_eq!(limit.black_clock, Some(Duration::from_millis(55000)));
        assert_eq!(limit.depth, Some(4));
        assert!(!ponder_requested);
    }

    #[test]
    fn parse_go_recognizes_infinite() {
        let mut stream = "infinite".split_whitespace();
        let (limit, _) = parse_go(&mut stream);
        assert!(limit.infinite);
    }

    #[test]
    fn parse_go_recognizes_ponder() {
        let mut stream = "ponder wtime 60000 btime 60000".split_whitespace();
        let (_, ponder_requested) = parse_go(&mut stream);
        assert!(ponder_requested);
    }

    #[test]
    fn parse_go_does_not_swallow_depth_after_searchmoves() {
        let mut stream = "searchmoves e2e4 g1f3 depth 6".split_whitespace();
        let (limit, _) = parse_go(&mut stream);
        assert_eq!(limit.depth, Some(6));
    }
}
