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

//! `Game` is the append-only move history wrapper the design calls for in
//! §3: the rules library gives us a bare `Board` with no move count or
//! repetition bookkeeping, so we keep our own position history alongside
//! it and synthesize both from that.

use chess::{Board, BoardStatus, ChessMove, Color};

/// An ordered sequence of positions from a starting FEN, the position
/// currently on top, and enough history to answer repetition and
/// half/full-move queries without consulting the rules library.
#[derive(Clone, Debug)]
pub struct Game {
    history: Vec<Board>,
    moves: Vec<ChessMove>,
    halfmove_clock: u16,
    fullmove_number: u16,
}

impl Game {
    pub fn new(starting: Board) -> Self {
        Game {
            history: vec![starting],
            moves: Vec::new(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn starting_position() -> Self {
        Game::new(Board::default())
    }

    /// The position on top of the history stack.
    pub fn current(&self) -> &Board {
        self.history.last().expect("history is never empty")
    }

    pub fn side_to_move(&self) -> Color {
        self.current().side_to_move()
    }

    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Walks up to `h` plies of history, most recent first, padding with
    /// `None` once the start of the game is reached.
    pub fn history(&self, h: usize) -> Vec<Option<&Board>> {
        let mut out = Vec::with_capacity(h);
        let len = self.history.len();
        for i in 0..h {
            if i < len {
                out.push(Some(&self.history[len - 1 - i]));
            } else {
                out.push(None);
            }
        }
        out
    }

    /// Like `history`, but each present ply is paired with how many times
    /// that exact position had occurred by that point in the game.
    pub fn history_with_repetitions(&self, h: usize) -> Vec<Option<(&Board, u8)>> {
        let len = self.history.len();
        let mut out = Vec::with_capacity(h);
        for i in 0..h {
            if i < len {
                let idx = len - 1 - i;
                let board = &self.history[idx];
                let count = self.history[..=idx]
                    .iter()
                    .filter(|b| *b == board)
                    .count()
                    .min(u8::MAX as usize) as u8;
                out.push(Some((board, count)));
            } else {
                out.push(None);
            }
        }
        out
    }

    /// How many times the current position has occurred before in this
    /// game's history (including the current occurrence). The `chess`
    /// crate tracks no such count itself, so it is synthesized here.
    pub fn repetition_count(&self) -> u8 {
        let current = self.current();
        self.history
            .iter()
            .filter(|board| *board == current)
            .count()
            .min(u8::MAX as usize) as u8
    }

    /// Appends `mv` to the history. Caller is responsible for only passing
    /// legal moves; the rules library is assumed correct per the design's
    /// out-of-scope boundary.
    pub fn push(&mut self, mv: ChessMove) {
        let board = *self.current();
        let is_capture = board.piece_on(mv.get_dest()).is_some();
        let is_pawn_move = board.piece_on(mv.get_source()) == Some(chess::Piece::Pawn);

        let next = board.make_move_new(mv);
        if board.side_to_move() == Color::Black {
            self.fullmove_number += 1;
        }
        self.halfmove_clock = if is_capture || is_pawn_move {
            0
        } else {
            self.halfmove_clock + 1
        };

        self.moves.push(mv);
        self.history.push(next);
    }

    /// Threefold repetition, by the rules-library-independent count this
    /// wrapper keeps for itself (see `repetition_count`).
    pub fn is_draw_by_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    /// Fifty-move rule, tracked the same way: the rules library hands us a
    /// bare `Board` with no clock, so `Game` maintains it.
    pub fn is_draw_by_fifty_move_rule(&self) -> bool {
        self.halfmove_clock >= 100
    }

    pub fn is_terminal(&self) -> bool {
        self.current().status() != BoardStatus::Ongoing
            || self.is_draw_by_repetition()
            || self.is_draw_by_fifty_move_rule()
    }

    pub fn status(&self) -> BoardStatus {
        self.current().status()
    }

    /// Rules-defined terminal value from the perspective of the side to
    /// move at the current (terminal) position: `-1` if checkmated, `0`
    /// on any draw condition (stalemate, threefold repetition, fifty-move
    /// rule). Panics if the position is not terminal.
    pub fn terminal_value(&self) -> f32 {
        if self.status() == BoardStatus::Checkmate {
            -1.0
        } else if self.is_terminal() {
            0.0
        } else {
            panic!("terminal_value called on a non-terminal position")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn repetition_count_tracks_repeated_positions() {
        let mut game = Game::starting_position();
        let knight_out = ChessMove::from_str("g1f3").unwrap();
        let knight_back = ChessMove::from_str("f3g1").unwrap();
        let reply_out = ChessMove::from_str("g8f6").unwrap();
        let reply_back = ChessMove::from_str("f6g8").unwrap();

        assert_eq!(game.repetition_count(), 1);
        game.push(knight_out);
        game.push(reply_out);
        game.push(knight_back);
        game.push(reply_back);
        assert_eq!(game.repetition_count(), 2);
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let mut game = Game::starting_position();
        let knight_out = ChessMove::from_str("g1f3").unwrap();
        let knight_back = ChessMove::from_str("f3g1").unwrap();
        let reply_out = ChessMove::from_str("g8f6").unwrap();
        let reply_back = ChessMove::from_str("f6g8").unwrap();

        for _ in 0..2 {
            game.push(knight_out);
            game.push(reply_out);
            game.push(knight_back);
            game.push(reply_back);
        }

        assert!(game.is_draw_by_repetition());
        assert!(game.is_terminal());
        assert_eq!(game.terminal_value(), 0.0);
    }

    #[test]
    fn fullmove_number_increments_after_black_moves() {
        let mut game = Game::starting_position();
        assert_eq!(game.fullmove_number(), 1);

        game.push(ChessMove::from_str("e2e4").unwrap());
        assert_eq!(game.fullmove_number(), 1);

        game.push(ChessMove::from_str("e7e5").unwrap());
        assert_eq!(game.fullmove_number(), 2);
    }

    #[test]
    fn halfmove_clock_resets_on_capture_or_pawn_move() {
        let mut game = Game::starting_position();
        game.push(ChessMove::from_str("e2e4").unwrap());
        assert_eq!(game.halfmove_clock(), 0);

        game.push(ChessMove::from_str("g8f6").unwrap());
        assert_eq!(game.halfmove_clock(), 1);
    }
}
