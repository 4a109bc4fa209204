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

//! The error taxonomy, one variant set per subsystem boundary. Nothing here
//! propagates across a boundary uncaught -- callers log and recover per
//! §7 of the design.

use thiserror::Error;

/// Errors surfaced while handling a UCI command.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized option `{0}`")]
    UnknownOption(String),

    #[error("value `{value}` out of range for option `{name}`")]
    OutOfRange { name: String, value: String },

    #[error("malformed command: {0}")]
    Malformed(String),
}

/// Errors surfaced while decoding a replay record or a wire-format tensor.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("tensor shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("malformed replay line: {0}")]
    MalformedLine(String),
}

/// Errors surfaced while loading or saving a model checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to deserialize checkpoint at {path}: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors surfaced by the tree search itself.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("action {action} decoded to a move not present in the legal move list")]
    IllegalAction { action: usize },

    #[error("network evaluation failed: {0}")]
    Evaluation(String),
}
