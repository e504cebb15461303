use std::collections::VecDeque;

use sprout_core::SensorReading;

/// Fixed-capacity FIFO of recent readings; the oldest reading is evicted first.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    readings: VecDeque<SensorReading>,
    capacity: usize,
}

impl SensorHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Start a history that already contains `reading`.
    pub fn seeded(capacity: usize, reading: SensorReading) -> Self {
        let mut history = Self::new(capacity);
        history.push(reading);
        history
    }

    pub fn push(&mut self, reading: SensorReading) {
        while self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter()
    }

    pub fn to_vec(&self) -> Vec<SensorReading> {
        self.readings.iter().copied().collect()
    }
}
