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

//! Logging setup shared by all three binaries. Operational narration goes
//! through `log`; the UCI binary's stdout is reserved for protocol
//! traffic and never touched here.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger. Safe to call more than once; only the
/// first call has any effect. Level is controlled by `RUST_LOG`, defaulting
/// to `info`.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Stderr)
            .init();
    });
}
