//! Per-channel moving-average smoothing.

use std::collections::VecDeque;

/// Bounded history of one channel.
#[derive(Debug, Clone, Default)]
pub struct SmoothingBuffer {
    samples: VecDeque<f32>,
}

impl SmoothingBuffer {
    pub fn with_capacity(window: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Push `value` and return the mean of the last `window` samples.
    ///
    /// A window of 0 or 1 returns `value` unchanged and leaves the history alone.
    pub fn update(&mut self, value: f32, window: usize) -> f32 {
        if window <= 1 {
            return value;
        }
        self.samples.push_back(value);
        while self.samples.len() > window {
            self.samples.pop_front();
        }
        let sum: f32 = self.samples.iter().sum();
        sum / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Mean of `values`, or `None` when empty.
pub fn moving_average(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

/// One `SmoothingBuffer` per channel.
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    buffers: Vec<SmoothingBuffer>,
    window: usize,
}

impl ChannelFilter {
    pub fn new(channels: usize, window: usize) -> Self {
        Self {
            buffers: (0..channels)
                .map(|_| SmoothingBuffer::with_capacity(window))
                .collect(),
            window: window.max(1),
        }
    }

    /// Smooth `values` in place. Extra values beyond the channel count pass through.
    pub fn apply(&mut self, values: &mut [f32]) {
        for (buf, v) in self.buffers.iter_mut().zip(values.iter_mut()) {
            *v = buf.update(*v, self.window);
        }
    }

    pub fn reset(&mut self) {
        self.buffers.iter_mut().for_each(SmoothingBuffer::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_last_four() {
        let mut b = SmoothingBuffer::default();
        let out: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .into_iter()
            .map(|v| b.update(v, 4))
            .collect();
        assert_eq!(out, vec![1.0, 1.5, 2.0, 2.5, 3.5]);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn window_one_is_identity() {
        let mut b = SmoothingBuffer::default();
        for v in [0.3, 0.9, 0.1] {
            assert_eq!(b.update(v, 1), v);
        }
        assert!(b.is_empty());
    }

    #[test]
    fn shrinking_window_trims_history() {
        let mut b = SmoothingBuffer::default();
        for v in [1.0, 2.0, 3.0, 4.0] {
            b.update(v, 4);
        }
        assert_eq!(b.update(6.0, 2), 5.0);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn moving_average_of_empty_is_none() {
        assert_eq!(moving_average(&[]), None);
        assert_eq!(moving_average(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn channels_are_smoothed_independently() {
        let mut f = ChannelFilter::new(2, 2);
        let mut a = [1.0, 0.0];
        f.apply(&mut a);
        let mut b = [0.0, 1.0];
        f.apply(&mut b);
        assert_eq!(b, [0.5, 0.5]);
        f.reset();
        let mut c = [0.2, 0.4];
        f.apply(&mut c);
        assert_eq!(c, [0.2, 0.4]);
    }
}
