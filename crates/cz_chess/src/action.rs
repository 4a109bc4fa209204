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

//! The 64 x 73 = 4672-way move/action bijection (§3, §4.6).
//!
//! Each origin square carries 73 action types: 56 "queen" moves (8 compass
//! directions x 7 distances), 8 knight L-shapes, and 9 underpromotions (3
//! forward directions x {knight, bishop, rook}). Queen promotions reuse the
//! sliding code of the underlying pawn push -- only under- promotions get
//! their own action type.
//!
//! The table is built once (`ACTIONS`) and indexed both ways: forward by a
//! `(square, dx, dy[, magnitude])` tuple lookup, backward by direct index.
//! `ACTIONS_FLIPPED` is the rank-mirrored relabeling used so the network
//! always sees "self at bottom": encoding a black move computes the action
//! from the absolute board frame and then maps it through this table;
//! decoding does the same lookup in reverse (the table is an involution).

use chess::{Board, ChessMove, Color, Piece, Square};
use std::collections::HashMap;

pub const NUM_ACTIONS: usize = 64 * 73;

const QUEEN_DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const KNIGHT_DIRECTIONS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const UNDERPROMOTIONS: [Piece; 3] = [Piece::Knight, Piece::Bishop, Piece::Rook];

#[derive(Clone, Copy, Debug)]
enum Entry {
    Queen { pos: usize, dx: i32, dy: i32, magnitude: i32 },
    Knight { pos: usize, dx: i32, dy: i32 },
    Underpromotion { pos: usize, dx: i32, piece_index: usize },
}

struct EncodingTable {
    entries: Vec<Entry>,
    queen_actions: HashMap<(usize, i32, i32, i32), usize>,
    knight_actions: HashMap<(usize, i32, i32), usize>,
    underpromotion_actions: HashMap<(usize, i32, usize), usize>,
    flipped: Vec<usize>,
}

impl EncodingTable {
    fn build() -> Self {
        let mut entries = Vec::with_capacity(NUM_ACTIONS);
        let mut queen_actions = HashMap::new();
        let mut knight_actions = HashMap::new();
        let mut underpromotion_actions = HashMap::new();

        for pos in 0..64 {
            let mut action = pos * 73;

            for &(dx, dy) in QUEEN_DIRECTIONS.iter() {
                for magnitude in 1..=7 {
                    queen_actions.insert((pos, dx, dy, magnitude), action);
                    entries.push(Entry::Queen { pos, dx, dy, magnitude });
                    action += 1;
                }
            }
            for &(dx, dy) in KNIGHT_DIRECTIONS.iter() {
                knight_actions.insert((pos, dx, dy), action);
                entries.push(Entry::Knight { pos, dx, dy });
                action += 1;
            }
            for dx in -1..=1 {
                for piece_index in 0..3 {
                    underpromotion_actions.insert((pos, dx, piece_index), action);
                    entries.push(Entry::Underpromotion { pos, dx, piece_index });
                    action += 1;
                }
            }
        }

        let mut flipped = vec![0usize; NUM_ACTIONS];
        for pos in 0..64 {
            let x = pos % 8;
            let y = pos / 8;
            let flipped_pos = (7 - y) * 8 + x;
            let mut action = pos * 73;

            for &(dx, dy) in QUEEN_DIRECTIONS.iter() {
                for magnitude in 1..=7 {
                    flipped[action] = queen_actions[&(flipped_pos, dx, -dy, magnitude)];
                    action += 1;
                }
            }
            for &(dx, dy) in KNIGHT_DIRECTIONS.iter() {
                flipped[action] = knight_actions[&(flipped_pos, dx, -dy)];
                action += 1;
            }
            for dx in -1..=1 {
                for piece_index in 0..3 {
                    flipped[action] = underpromotion_actions[&(flipped_pos, dx, piece_index)];
                    action += 1;
                }
            }
        }

        EncodingTable {
            entries,
            queen_actions,
            knight_actions,
            underpromotion_actions,
            flipped,
        }
    }
}

lazy_static! {
    static ref TABLE: EncodingTable = EncodingTable::build();
}

/// Maps the action index to the one that results from mirroring the board
/// along the rank axis. Applying it twice is the identity.
fn flip(action: usize) -> usize {
    TABLE.flipped[action]
}

/// Encodes a move made from `board` into the canonical "self at bottom"
/// action space.
pub fn move_to_action(board: &Board, mv: ChessMove) -> usize {
    let raw = action_from_move(mv);
    if board.side_to_move() == Color::Black {
        flip(raw)
    } else {
        raw
    }
}

/// Decodes a canonical action index back into a legal-looking move for the
/// side to move in `board`. The inverse of `move_to_action` for any move
/// produced by the bijection's construction.
pub fn action_to_move(board: &Board, action: usize) -> ChessMove {
    let raw = if board.side_to_move() == Color::Black {
        flip(action)
    } else {
        action
    };
    move_from_action(board, raw)
}

fn action_from_move(mv: ChessMove) -> usize {
    let from = mv.get_source();
    let to = mv.get_dest();
    let delta_x = to.get_file().to_index() as i32 - from.get_file().to_index() as i32;
    let delta_y = to.get_rank().to_index() as i32 - from.get_rank().to_index() as i32;
    let pos = from.to_index();

    if let Some(promotion) = mv.get_promotion() {
        if promotion != Piece::Queen {
            let piece_index = match promotion {
                Piece::Knight => 0,
                Piece::Bishop => 1,
                Piece::Rook => 2,
                _ => unreachable!("pawns only underpromote to knight, bishop or rook"),
            };
            return TABLE.underpromotion_actions[&(pos, delta_x, piece_index)];
        }
    }

    if delta_x.abs() != delta_y.abs() && delta_x != 0 && delta_y != 0 {
        return TABLE.knight_actions[&(pos, delta_x, delta_y)];
    }

    let dir_x = if delta_x != 0 { delta_x / delta_x.abs() } else { 0 };
    let dir_y = if delta_y != 0 { delta_y / delta_y.abs() } else { 0 };
    let magnitude = delta_x.abs().max(delta_y.abs());

    TABLE.queen_actions[&(pos, dir_x, dir_y, magnitude)]
}

fn move_from_action(board: &Board, action: usize) -> ChessMove {
    match TABLE.entries[action] {
        Entry::Underpromotion { pos, dx, piece_index } => {
            let from = Square::new(pos as u8);
            let x = pos % 8;
            let y = pos / 8;
            let y_promotion = if y == 1 { 0 } else { 7 };
            let to = Square::new((x as i32 + dx + y_promotion * 8) as u8);
            ChessMove::new(from, to, Some(UNDERPROMOTIONS[piece_index]))
        }
        Entry::Knight { pos, dx, dy } => {
            let from = Square::new(pos as u8);
            let x = pos % 8;
            let y = pos / 8;
            let to = Square::new((x as i32 + dx + (y as i32 + dy) * 8) as u8);
            ChessMove::new(from, to, None)
        }
        Entry::Queen { pos, dx, dy, magnitude } => {
            let from = Square::new(pos as u8);
            let x = pos % 8;
            let y = pos / 8;
            let to_y = y as i32 + dy * magnitude;
            let to = Square::new((x as i32 + dx * magnitude + to_y * 8) as u8);

            let promotion = if board.piece_on(from) == Some(Piece::Pawn) && (to_y == 0 || to_y == 7) {
                Some(Piece::Queen)
            } else {
                None
            };
            ChessMove::new(from, to, promotion)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{ChessMove, Square};
    use std::str::FromStr;

    #[test]
    fn bijection_holds_for_legal_moves_from_start_position() {
        let board = Board::default();
        let mut legal = chess::MoveGen::new_legal(&board);

        assert!(legal.len() > 0);
        for mv in legal.by_ref() {
            let action = move_to_action(&board, mv);
            assert_eq!(action_to_move(&board, action), mv);
        }
    }

    #[test]
    fn bijection_holds_for_black_to_move() {
        let board = Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();

        for mv in chess::MoveGen::new_legal(&board) {
            let action = move_to_action(&board, mv);
            assert_eq!(action_to_move(&board, action), mv);
        }
    }

    /// §8 scenario 3: the move/action bijection over the standard perft
    /// test suite (Kiwipete and friends), not just the two positions
    /// above -- these positions were chosen for perft specifically
    /// because they exercise castling, en passant and promotions that a
    /// single handcrafted position tends to miss.
    #[test]
    fn bijection_holds_across_the_perft_suite() {
        const PERFT_POSITIONS: &[&str] = &[
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        ];

        for fen in PERFT_POSITIONS {
            let board = Board::from_str(fen).unwrap();
            for mv in chess::MoveGen::new_legal(&board) {
                let action = move_to_action(&board, mv);
                assert_eq!(action_to_move(&board, action), mv, "round-trip failed for {mv} in {fen}");
            }
        }
    }

    #[test]
    fn underpromotion_round_trips() {
        let board = Board::from_str("8/P7/8/8/8/8/8/k1K5 w - - 0 1").unwrap();
        let mv = ChessMove::new(Square::A7, Square::A8, Some(Piece::Rook));

        let action = move_to_action(&board, mv);
        assert_eq!(action_to_move(&board, action), mv);
    }

    #[test]
    fn flip_is_an_involution() {
        for action in 0..NUM_ACTIONS {
            assert_eq!(flip(flip(action)), action);
        }
    }
}
