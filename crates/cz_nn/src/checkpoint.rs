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

//! Checkpoint I/O and the live mtime-polling reload loop self-play and UCI
//! use to pick up new weights (§4.1, §4.3, §5).

use crate::net::Network;
use cz_utils::error::CheckpointError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Writes all weights and buffers to `path`, via a temp-file-then-rename
/// so a reader observing a later mtime always sees a complete file.
pub fn save(network: &Network, path: &Path) -> Result<(), CheckpointError> {
    let tmp_path = path.with_extension("tmp");
    network
        .var_store()
        .save(&tmp_path)
        .map_err(|source| CheckpointError::Deserialize {
            path: tmp_path.display().to_string(),
            source: anyhow::anyhow!(source),
        })?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Loads weights from `path` into `network` in place.
pub fn load(network: &mut Network, path: &Path) -> Result<(), CheckpointError> {
    network
        .var_store_mut()
        .load(path)
        .map_err(|source| CheckpointError::Deserialize {
            path: path.display().to_string(),
            source: anyhow::anyhow!(source),
        })
}

/// Copies the live checkpoint to a timestamped path for historical record,
/// e.g. `model_2024-05-01T12-00-00.pt`.
pub fn archive(path: &Path, timestamp: &str) -> Result<PathBuf, CheckpointError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("pt");
    let archived = path.with_file_name(format!("{stem}_{timestamp}.{extension}"));
    fs::copy(path, &archived)?;
    Ok(archived)
}

/// Polls `path`'s last-write time, reloading `network` whenever it is newer
/// than `last_seen`. Returns the mtime actually observed (unchanged if no
/// reload happened). A reload failure is logged and the previous weights
/// retained, per §4.3's "Live reload" paragraph.
pub fn reload_if_changed(
    network: &mut Network,
    path: &Path,
    last_seen: Option<SystemTime>,
) -> Option<SystemTime> {
    let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => mtime,
        Err(err) => {
            log::warn!("failed to stat checkpoint {}: {}", path.display(), err);
            return last_seen;
        }
    };

    if Some(mtime) == last_seen {
        return last_seen;
    }

    match load(network, path) {
        Ok(()) => {
            log::info!("reloaded checkpoint {}", path.display());
            Some(mtime)
        }
        Err(err) => {
            log::warn!("failed to reload checkpoint {}: {}", path.display(), err);
            last_seen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetworkConfig;
    use tch::{Device, Tensor};

    fn tiny_network() -> Network {
        Network::new(Device::Cpu, NetworkConfig { in_channels: 21, filters: 4, blocks: 1 })
    }

    #[test]
    fn round_trip_preserves_forward_output() {
        let dir = tempdir();
        let path = dir.join("model.pt");

        let network = tiny_network();
        save(&network, &path).unwrap();

        let mut reloaded = tiny_network();
        load(&mut reloaded, &path).unwrap();

        let batch = Tensor::zeros(&[1, 21, 8, 8], (tch::Kind::Float, Device::Cpu));
        let (v1, p1) = network.forward(&batch, false);
        let (v2, p2) = reloaded.forward(&batch, false);

        assert!(bool::from((v1 - v2).abs().max().le(1e-5)));
        assert!(bool::from((p1 - p2).abs().max().le(1e-5)));
    }

    #[test]
    fn reload_skips_unchanged_mtime() {
        let dir = tempdir();
        let path = dir.join("model.pt");
        let network = tiny_network();
        save(&network, &path).unwrap();

        let mut reader = tiny_network();
        let first = reload_if_changed(&mut reader, &path, None);
        assert!(first.is_some());

        let second = reload_if_changed(&mut reader, &path, first);
        assert_eq!(first, second);
    }

    fn tempdir() -> PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut dir = std::env::temp_dir();
        dir.push(format!("cz_nn_checkpoint_test_{}_{}", std::process::id(), unique));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
