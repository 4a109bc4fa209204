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

//! The sliding replay window (§3, §4.4): a bounded FIFO of the most
//! recent `W` records, sampled uniformly with replacement for minibatches.
//! Grounded on `original_source/sigmazero/training.cpp`'s
//! `torch::indexing::Slice(-window_size)` trim-to-last-W and
//! `torch::randint(window_size, {batch_size})` uniform sampling, expressed
//! here with a `VecDeque` rather than the teacher's stacked tensors since
//! this crate keeps records as plain Rust values until training time.

use crate::codec::ReplayRecord;
use rand::Rng;
use std::collections::VecDeque;

pub struct ReplayWindow {
    capacity: usize,
    records: VecDeque<ReplayRecord>,
}

impl ReplayWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a replay window must hold at least one record");
        ReplayWindow { capacity, records: VecDeque::with_capacity(capacity) }
    }

    /// Appends `record`, evicting the oldest record if the window is full.
    pub fn push(&mut self, record: ReplayRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the window holds a full `capacity` records (§4.4 step 2's
    /// "no training steps run until the window is full").
    pub fn is_full(&self) -> bool {
        self.records.len() == self.capacity
    }

    /// Samples `size` records uniformly at random, with replacement.
    pub fn sample(&self, size: usize, rng: &mut impl Rng) -> Vec<&ReplayRecord> {
        if self.records.is_empty() {
            return Vec::new();
        }
        (0..size).map(|_| &self.records[rng.gen_range(0..self.records.len())]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireTensor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(value: f32) -> ReplayRecord {
        ReplayRecord {
            image: WireTensor::new(vec![1], vec![0.0]),
            value,
            policy: WireTensor::new(vec![1], vec![1.0]),
        }
    }

    #[test]
    fn window_holds_only_the_last_capacity_records() {
        let mut window = ReplayWindow::new(4);
        for i in 0..10 {
            window.push(record(i as f32));
        }

        assert!(window.is_full());
        let values: Vec<f32> = (0..window.len()).map(|i| window.records[i].value).collect();
        assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn window_is_not_full_below_capacity() {
        let mut window = ReplayWindow::new(4);
        window.push(record(1.0));
        window.push(record(2.0));
        assert!(!window.is_full());
    }

    #[test]
    fn sample_only_draws_from_the_current_window() {
        let mut window = ReplayWindow::new(4);
        for i in 0..10 {
            window.push(record(i as f32));
        }

        let mut rng = StdRng::seed_from_u64(3);
        let sampled = window.sample(100, &mut rng);

        assert_eq!(sampled.len(), 100);
        for record in sampled {
            assert!(record.value >= 6.0 && record.value <= 9.0);
        }
    }
}
