// ============================================
// Training Buffer (sliding window)
// ============================================
//
// Bounded FIFO of rated samples waiting for the next retrain.
//
// push:  when more than `window_size` samples are already held, the oldest
//        is evicted before the new one lands, so at most window_size + 1
//        samples are ever held.
// drain: hands back everything, oldest first, and leaves the buffer empty.

use crate::models::RatedSample;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrainingBuffer {
    window_size: usize,
    samples: VecDeque<RatedSample>,
}

impl Default for TrainingBuffer {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TrainingBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            samples: VecDeque::with_capacity(window_size + 1),
        }
    }

    /// Maximum number of samples held at once.
    pub fn capacity(&self) -> usize {
        self.window_size + 1
    }

    pub fn push(&mut self, sample: RatedSample) {
        if self.samples.len() > self.window_size {
            if let Some(evicted) = self.samples.pop_front() {
                debug!(reward = evicted.reward, "Evicted oldest training sample");
            }
        }
        self.samples.push_back(sample);
    }

    /// Put a batch back (oldest first), still honouring the window.
    pub fn requeue(&mut self, batch: Vec<RatedSample>) {
        for sample in batch {
            self.push(sample);
        }
    }

    pub fn drain_all(&mut self) -> Vec<RatedSample> {
        self.samples.drain(..).collect()
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RatedSample> {
        self.samples.iter()
    }
}
