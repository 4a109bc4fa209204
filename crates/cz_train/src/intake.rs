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

//! One reader thread per replay input stream (§4.4, §5), each blocked on
//! `BufRead::lines` and pushing raw lines onto a shared queue -- grounded
//! on `original_source/sigmazero/training.cpp`'s `replay_receiver`
//! threads, one per `std::ifstream` (or `std::cin` when no files are
//! given), each pushing onto a `sync_queue<std::string>`.

use cz_utils::queue::SyncQueue;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

fn drain<R: BufRead>(mut reader: R, sender: crossbeam_channel::Sender<String>, source: &str) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']);
                if sender.send(trimmed.to_string()).is_err() {
                    log::info!("replay intake queue closed, stopping reader for {source}");
                    return;
                }
            }
            Err(err) => {
                log::warn!("read error on replay stream {source}: {err}");
                break;
            }
        }
    }
    log::info!("replay stream {source} exhausted");
}

/// Spawns one reader thread per path in `paths`, or a single stdin reader
/// if `paths` is empty, each pushing lines onto `queue`. Returns the
/// spawned threads' handles so a caller can join them on shutdown.
pub fn spawn_readers(paths: &[PathBuf], queue: &SyncQueue<String>) -> Vec<JoinHandle<()>> {
    if paths.is_empty() {
        let sender = queue.sender();
        return vec![thread::spawn(move || drain(BufReader::new(io::stdin()), sender, "stdin"))];
    }

    paths
        .iter()
        .map(|path| {
            let sender = queue.sender();
            let path = path.clone();
            thread::spawn(move || match File::open(&path) {
                Ok(file) => drain(BufReader::new(file), sender, &path.display().to_string()),
                Err(err) => log::error!("failed to open replay stream {}: {}", path.display(), err),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_pushes_every_line_then_returns_on_eof() {
        let queue = SyncQueue::bounded(8);
        let data = "one\ntwo\nthree\n";
        drain(data.as_bytes(), queue.sender(), "test");

        assert_eq!(queue.recv().unwrap(), "one");
        assert_eq!(queue.recv().unwrap(), "two");
        assert_eq!(queue.recv().unwrap(), "three");
    }
}
