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

//! The dual-head network, its checkpoint I/O, the `Predictor` seam to the
//! tree search, and the training loss/optimizer.

pub mod checkpoint;
pub mod loss;
pub mod net;
pub mod predictor;

pub use net::{Network, NetworkConfig};
pub use predictor::{Evaluation, Predictor};
