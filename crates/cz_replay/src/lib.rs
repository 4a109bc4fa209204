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

//! The replay wire codec (§6) and the trainer's sliding window (§3, §4.4).

pub mod codec;
pub mod window;

pub use codec::{decode_record, decode_tensor, encode_record, encode_tensor, ReplayRecord, WireTensor};
pub use window::ReplayWindow;
