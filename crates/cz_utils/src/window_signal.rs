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

//! The trainer's replay-window-fill signal (§4.3's closing sentence:
//! "During initial window-fill all iterations emit records"), a plain
//! existence-polled flag file sitting next to the model checkpoint. The
//! trainer creates it while its replay window is below capacity and
//! removes it once full; self-play polls for it the same way it already
//! polls the checkpoint's mtime, and `cz_selfplay`'s own
//! `while !model_path.exists()` wait-for-initial-model loop is the direct
//! precedent for signalling process state through a file's presence
//! rather than its contents.

use std::fs;
use std::path::{Path, PathBuf};

fn signal_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.file_name().and_then(|n| n.to_str()).unwrap_or("model").to_string();
    name.push_str(".filling");
    model_path.with_file_name(name)
}

/// Called by the trainer whenever the window's full/filling state may have
/// changed. Idempotent: creating an already-present flag or removing an
/// already-absent one is a no-op.
pub fn publish_filling(model_path: &Path, filling: bool) {
    let path = signal_path(model_path);
    if filling {
        if let Err(err) = fs::write(&path, b"") {
            log::warn!("failed to publish window-fill signal {}: {}", path.display(), err);
        }
    } else if let Err(err) = fs::remove_file(&path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to clear window-fill signal {}: {}", path.display(), err);
        }
    }
}

/// Called by self-play before each outer iteration: true while the
/// trainer's replay window has not yet reached capacity.
pub fn is_filling(model_path: &Path) -> bool {
    signal_path(model_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_path() -> PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("cz_utils_window_signal_test_{}_{}.pt", std::process::id(), unique))
    }

    #[test]
    fn publishing_filling_makes_is_filling_true() {
        let path = model_path();
        assert!(!is_filling(&path));

        publish_filling(&path, true);
        assert!(is_filling(&path));

        publish_filling(&path, false);
        assert!(!is_filling(&path));

        fs::remove_file(signal_path(&path)).ok();
    }

    #[test]
    fn clearing_an_already_clear_signal_is_not_an_error() {
        let path = model_path();
        publish_filling(&path, false);
        assert!(!is_filling(&path));
    }
}
