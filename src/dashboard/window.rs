use std::collections::VecDeque;

use crate::sensor::{GAS_CHANNEL_COUNT, Reading};

/// Most recent readings, oldest first, capped at a fixed length.
#[derive(Debug, Clone)]
pub struct ReadingWindow {
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl ReadingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Up to `count` newest readings, newest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &Reading> {
        self.readings.iter().rev().take(count)
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.temperature).collect()
    }

    pub fn humidities(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.humidity).collect()
    }

    /// One series per gas channel.
    pub fn gas_series(&self) -> Vec<Vec<f64>> {
        (0..GAS_CHANNEL_COUNT)
            .map(|channel| self.readings.iter().map(|r| r.gases[channel]).collect())
            .collect()
    }
}
