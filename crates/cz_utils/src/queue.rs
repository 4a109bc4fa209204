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

//! A bounded, closeable FIFO queue used everywhere the design calls for a
//! "synchronized queue": the self-play output serializer, the trainer's
//! per-stream replay intake, and the UCI info-message sink.

use crossbeam_channel::{self, Receiver, RecvError, SendError, Sender};

/// A multi-producer, single-consumer queue that can be closed to unblock
/// any thread parked in `recv`.
pub struct SyncQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> SyncQueue<T> {
    /// Creates a queue holding at most `capacity` items before `send`
    /// blocks.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        SyncQueue { tx, rx }
    }

    /// Returns a cloneable handle producers can use to push items.
    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }

    /// Blocks until an item is available or the queue is closed, in which
    /// case `Err(RecvError)` is returned.
    pub fn recv(&self) -> Result<T, RecvError> {
        self.rx.recv()
    }

    /// Pushes an item, blocking if the queue is at capacity.
    pub fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.tx.send(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fifo_order_is_preserved() {
        let queue = SyncQueue::bounded(8);
        for i in 0..4 {
            queue.send(i).unwrap();
        }

        for expected in 0..4 {
            assert_eq!(queue.recv().unwrap(), expected);
        }
    }

    #[test]
    fn closing_unblocks_receivers() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        let handle = thread::spawn(move || rx.recv().is_err());
        drop(tx);

        assert!(handle.join().unwrap());
    }
}
