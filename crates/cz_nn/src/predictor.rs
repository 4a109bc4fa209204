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

//! `Predictor` is the seam between the tree search and the network: given
//! a batch of positions it returns, per position, a value and a
//! legal-policy projection. `NetworkPredictor` is the real implementation;
//! the mocks below stand in for it in tests, the same role teacher's
//! `RandomPredictor`/`NanPredictor` play in `libdg_mcts`'s test module.

use crate::net::Network;
use cz_chess::action::{move_to_action, NUM_ACTIONS};
use cz_chess::game::Game;
use tch::{Kind, Tensor};

/// One evaluation result: value from the perspective of the position's
/// side to move, plus `(action, prior)` pairs for every legal move,
/// priors summing to 1.
pub type Evaluation = (f32, Vec<(usize, f32)>);

pub trait Predictor {
    fn evaluate_batch(&self, games: &[&Game]) -> Vec<Evaluation>;

    fn evaluate(&self, game: &Game) -> Evaluation {
        self.evaluate_batch(&[game]).remove(0)
    }
}

/// Projects raw policy logits onto the legal moves of `game`: illegal
/// logits are never exponentiated (§4.1's "Legal-policy projection").
pub fn legal_policy(game: &Game, logits: &[f32; NUM_ACTIONS]) -> Vec<(usize, f32)> {
    let board = game.current();
    let legal_actions: Vec<usize> = chess::MoveGen::new_legal(board)
        .map(|mv| move_to_action(board, mv))
        .collect();

    if legal_actions.is_empty() {
        return Vec::new();
    }

    let max_logit = legal_actions
        .iter()
        .map(|&a| logits[a])
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = legal_actions.iter().map(|&a| (logits[a] - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();

    legal_actions.into_iter().zip(exps).map(|(a, e)| (a, e / sum)).collect()
}

pub struct NetworkPredictor<'a> {
    network: &'a Network,
    history_length: usize,
}

impl<'a> NetworkPredictor<'a> {
    pub fn new(network: &'a Network, history_length: usize) -> Self {
        NetworkPredictor { network, history_length }
    }
}

impl<'a> Predictor for NetworkPredictor<'a> {
    fn evaluate_batch(&self, games: &[&Game]) -> Vec<Evaluation> {
        if games.is_empty() {
            return Vec::new();
        }

        let images: Vec<f32> = games
            .iter()
            .flat_map(|game| cz_chess::image::image_of(game, self.history_length))
            .collect();
        let channels = cz_chess::image::num_channels(self.history_length) as i64;
        let batch_size = games.len() as i64;

        let batch = Tensor::of_slice(&images)
            .view([batch_size, channels, 8, 8])
            .to_device(self.network.device())
            .to_kind(Kind::Float);

        let (value, policy_logits) = self.network.forward(&batch, false);
        let value: Vec<f32> = value.view([batch_size]).into();
        let policy_logits: Vec<f32> = policy_logits.into();

        games
            .iter()
            .enumerate()
            .map(|(i, game)| {
                let row_start = i * NUM_ACTIONS;
                let mut row = [0.0f32; NUM_ACTIONS];
                row.copy_from_slice(&policy_logits[row_start..row_start + NUM_ACTIONS]);
                (value[i], legal_policy(game, &row))
            })
            .collect()
    }
}

/// Always returns a uniform value and a uniform legal policy. Useful where
/// a test only cares about the search mechanics, not the network's
/// opinion.
#[cfg(any(test, feature = "test-support"))]
pub struct UniformPredictor;

#[cfg(any(test, feature = "test-support"))]
impl Predictor for UniformPredictor {
    fn evaluate_batch(&self, games: &[&Game]) -> Vec<Evaluation> {
        games
            .iter()
            .map(|game| {
                let board = game.current();
                let legal: Vec<usize> = chess::MoveGen::new_legal(board)
                    .map(|mv| move_to_action(board, mv))
                    .collect();
                let n = legal.len().max(1) as f32;
                (0.0, legal.into_iter().map(|a| (a, 1.0 / n)).collect())
            })
            .collect()
    }
}

/// Scores positions by a handcrafted material count, ignoring the actual
/// network entirely -- grounded on the teacher's `NanPredictor`/
/// `RandomPredictor` test-mock pattern (`libdg_mcts/lib.rs`), used by the
/// PUCT-preference end-to-end scenario in §8.
#[cfg(any(test, feature = "test-support"))]
pub struct MaterialPredictor;

#[cfg(any(test, feature = "test-support"))]
impl MaterialPredictor {
    fn material_value(board: &chess::Board, perspective: chess::Color) -> f32 {
        use chess::Piece;

        let piece_value = |p: Piece| -> f32 {
            match p {
                Piece::Pawn => 1.0,
                Piece::Knight => 3.0,
                Piece::Bishop => 3.0,
                Piece::Rook => 5.0,
                Piece::Queen => 9.0,
                Piece::King => 0.0,
            }
        };

        let mut total = 0.0;
        for square_index in 0..64u8 {
            let square = chess::Square::new(square_index);
            if let Some(piece) = board.piece_on(square) {
                let color = board.color_on(square).unwrap();
                let sign = if color == perspective { 1.0 } else { -1.0 };
                total += sign * piece_value(piece);
            }
        }
        (total / 39.0).clamp(-1.0, 1.0)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Predictor for MaterialPredictor {
    fn evaluate_batch(&self, games: &[&Game]) -> Vec<Evaluation> {
        games
            .iter()
            .map(|game| {
                let board = game.current();
                let value = Self::material_value(board, game.side_to_move());
                let legal: Vec<usize> = chess::MoveGen::new_legal(board)
                    .map(|mv| move_to_action(board, mv))
                    .collect();
                let n = legal.len().max(1) as f32;
                (value, legal.into_iter().map(|a| (a, 1.0 / n)).collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_predictor_priors_sum_to_one() {
        let game = Game::starting_position();
        let (_, priors) = UniformPredictor.evaluate(&game);

        let sum: f32 = priors.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn material_predictor_prefers_material_advantage() {
        use std::str::FromStr;
        let ahead = Game::new(chess::Board::from_str("8/8/8/8/8/8/1Q6/k1K5 w - - 0 1").unwrap());
        let even = Game::new(chess::Board::from_str("8/8/8/8/8/8/8/k1K5 w - - 0 1").unwrap());

        let (value_ahead, _) = MaterialPredictor.evaluate(&ahead);
        let (value_even, _) = MaterialPredictor.evaluate(&even);

        assert!(value_ahead > value_even);
    }
}
