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

//! Process-wide utilities shared by the self-play, training and UCI
//! binaries: configuration, error types, a global PRNG, a synchronized
//! queue, logging setup and the trainer/self-play window-fill signal.

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod error;
pub mod logging;
pub mod queue;
pub mod rng;
pub mod window_signal;

pub use error::{CheckpointError, CodecError, ProtocolError, SearchError};
