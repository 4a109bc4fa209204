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

//! `image_of` turns a `Game` into the fixed-shape `[C, 8, 8]` tensor fed to
//! the network (§3). Planes, in order, for each of the `H` most recent
//! plies (most recent first):
//!
//!  1-6.   our piece types (pawn, knight, bishop, rook, queen, king)
//!  7-12.  opponent piece types, same order
//!  13.    this position has occurred at least twice before
//!  14.    this position has occurred at least three times before
//!
//! followed by seven constant-valued planes shared across the whole image:
//!
//!  - side to move (all ones if black)
//!  - fullmove number, normalized by 200 and clamped to [0, 1]
//!  - four castling rights (white king/queen-side, black king/queen-side)
//!  - halfmove clock, normalized by 100 and clamped to [0, 1]
//!
//! Squares and plane rows are mirrored along the rank axis whenever the
//! side to move is black, so the network is always handed a "self at
//! bottom" frame -- the same convention `action.rs` uses for the move
//! encoding.

use crate::game::Game;
use chess::{Board, CastleRights, Color, Piece};

const PLANES_PER_PLY: usize = 14;
const CONSTANT_PLANES: usize = 7;

pub fn num_channels(history_length: usize) -> usize {
    PLANES_PER_PLY * history_length + CONSTANT_PLANES
}

/// Produces the `[C, 8, 8]` image as a flat, row-major `f32` buffer of
/// length `num_channels(h) * 64`.
pub fn image_of(game: &Game, h: usize) -> Vec<f32> {
    let channels = num_channels(h);
    let mut image = vec![0.0f32; channels * 64];
    let flip = game.side_to_move() == Color::Black;

    for (ply, entry) in game.history_with_repetitions(h).into_iter().enumerate() {
        let base = ply * PLANES_PER_PLY;
        if let Some((board, repetitions)) = entry {
            write_board_planes(&mut image, base, board, game.side_to_move(), flip);
            if repetitions >= 2 {
                fill_plane(&mut image, base + 12, 1.0);
            }
            if repetitions >= 3 {
                fill_plane(&mut image, base + 13, 1.0);
            }
        }
    }

    let constant_base = PLANES_PER_PLY * h;
    let board = game.current();

    if game.side_to_move() == Color::Black {
        fill_plane(&mut image, constant_base, 1.0);
    }

    let fullmove_value = (game.fullmove_number() as f32 / 200.0).min(1.0);
    fill_plane(&mut image, constant_base + 1, fullmove_value);

    let rights = [
        has_castle_right(board, Color::White, true),
        has_castle_right(board, Color::White, false),
        has_castle_right(board, Color::Black, true),
        has_castle_right(board, Color::Black, false),
    ];
    for (i, has_right) in rights.iter().enumerate() {
        if *has_right {
            fill_plane(&mut image, constant_base + 2 + i, 1.0);
        }
    }

    let halfmove_value = (game.halfmove_clock() as f32 / 100.0).min(1.0);
    fill_plane(&mut image, constant_base + 6, halfmove_value);

    image
}

fn has_castle_right(board: &Board, color: Color, kingside: bool) -> bool {
    let rights = board.castle_rights(color);
    match (rights, kingside) {
        (CastleRights::Both, _) => true,
        (CastleRights::KingSide, true) => true,
        (CastleRights::QueenSide, false) => true,
        _ => false,
    }
}

fn write_board_planes(image: &mut [f32], base: usize, board: &Board, us: Color, flip: bool) {
    const PIECES: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    for square_index in 0..64 {
        let square = chess::Square::new(square_index as u8);
        if let Some(piece) = board.piece_on(square) {
            let color = board.color_on(square).unwrap();
            let piece_slot = PIECES.iter().position(|p| *p == piece).unwrap();
            let plane = if color == us { piece_slot } else { 6 + piece_slot };

            let cell = if flip { mirror_rank(square_index) } else { square_index };
            image[(base + plane) * 64 + cell] = 1.0;
        }
    }
}

fn fill_plane(image: &mut [f32], plane: usize, value: f32) {
    for cell in 0..64 {
        image[plane * 64 + cell] = value;
    }
}

fn mirror_rank(square_index: usize) -> usize {
    let file = square_index % 8;
    let rank = square_index / 8;
    (7 - rank) * 8 + file
}
